use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::EvolveError;
use crate::render::Rasterizer;
use crate::simulation::{RunState, Simulation, StatsSnapshot};

/// lifecycle commands for a background-threaded run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    Pause,
    Stop,
}

/// one message per completed generation, plus a terminal `Fatal` on abort
pub enum EngineUpdate {
    Tick {
        stats: StatsSnapshot,
        /// fittest individual's pixels, straight RGBA (Arc avoids a copy per frame)
        preview: Arc<[u8]>,
        preview_size: u32,
    },
    Fatal(EvolveError),
}

/// channel ends plus the join handle for a spawned engine thread
pub struct EngineHandle {
    pub commands: Sender<EngineCommand>,
    pub updates: Receiver<EngineUpdate>,
    pub thread: thread::JoinHandle<()>,
}

/// run a simulation on a dedicated thread. commands are polled between
/// generations, so pause and stop take effect at generation boundaries. the
/// thread exits on `Stop`, on a fatal error, or when the command sender is
/// dropped.
pub fn spawn_engine<R>(mut sim: Simulation<R>, preview_size: u32) -> std::io::Result<EngineHandle>
where
    R: Rasterizer + Send + Sync + 'static,
{
    let (command_tx, command_rx) = mpsc::channel();
    let (update_tx, update_rx) = mpsc::channel();

    let thread = thread::Builder::new().name("engine".to_owned()).spawn(move || {
        loop {
            profiling::scope!("engine_thread_loop");

            match command_rx.try_recv() {
                Ok(EngineCommand::Start) => {
                    if let Err(err) = sim.start() {
                        let _ = update_tx.send(EngineUpdate::Fatal(err));
                        break;
                    }
                }
                Ok(EngineCommand::Pause) => sim.pause(),
                Ok(EngineCommand::Stop) | Err(TryRecvError::Disconnected) => {
                    sim.stop();
                    break;
                }
                Err(TryRecvError::Empty) => {}
            }

            if sim.state() == RunState::Running {
                let tick = sim.tick().and_then(|stats| {
                    let preview = sim
                        .preview(preview_size, preview_size)?
                        .ok_or(EvolveError::EmptyPopulation)?;
                    Ok((stats, preview))
                });
                match tick {
                    Ok((stats, preview)) => {
                        // receiver gone: nobody is listening, wind down
                        if update_tx
                            .send(EngineUpdate::Tick {
                                stats,
                                preview: Arc::from(preview),
                                preview_size,
                            })
                            .is_err()
                        {
                            sim.stop();
                            break;
                        }
                    }
                    Err(err) => {
                        sim.stop();
                        let _ = update_tx.send(EngineUpdate::Fatal(err));
                        break;
                    }
                }
            } else {
                // avoid busy-waiting while stopped or paused
                thread::sleep(Duration::from_millis(10));
            }
        }
    })?;

    Ok(EngineHandle {
        commands: command_tx,
        updates: update_rx,
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::target::TargetImage;
    use crate::testutil::FlatRasterizer;
    use image::{Rgba, RgbaImage};

    fn small_sim() -> Simulation<FlatRasterizer> {
        let config = Config {
            population_size: 4,
            polygon_count: 2,
            vertex_count: 3,
            working_resolution: 4,
            ..Config::default()
        };
        let target = TargetImage::from_image(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        Simulation::new(config, FlatRasterizer, target).unwrap()
    }

    #[test]
    fn engine_thread_ticks_and_stops() {
        let handle = spawn_engine(small_sim(), 8).unwrap();
        handle.commands.send(EngineCommand::Start).unwrap();

        match handle.updates.recv().unwrap() {
            EngineUpdate::Tick {
                stats,
                preview,
                preview_size,
            } => {
                assert!(stats.generation_count >= 1);
                assert_eq!(preview_size, 8);
                assert_eq!(preview.len(), 8 * 8 * 4);
            }
            EngineUpdate::Fatal(err) => panic!("unexpected fatal update: {err}"),
        }

        handle.commands.send(EngineCommand::Stop).unwrap();
        handle.thread.join().unwrap();
    }

    #[test]
    fn dropping_the_command_sender_winds_the_thread_down() {
        let handle = spawn_engine(small_sim(), 4).unwrap();
        drop(handle.commands);
        handle.thread.join().unwrap();
    }
}
