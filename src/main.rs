use std::error::Error;
use std::path::PathBuf;

use polyvolve::{format_ms, Config, CpuRenderer, Simulation, TargetImage};

struct Args {
    image: PathBuf,
    generations: u64,
    output: PathBuf,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let image = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| "usage: polyvolve <image> [generations] [output.png]".to_owned())?;
    let generations = match args.next() {
        Some(n) => n.parse().map_err(|_| format!("not a generation count: {n}"))?,
        None => 200,
    };
    let output = args.next().map_or_else(|| PathBuf::from("evolved.png"), PathBuf::from);
    Ok(Args {
        image,
        generations,
        output,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // configure Rayon's global thread pool once at startup so worker threads get nice names like "rayon-0".
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let args = parse_args()?;
    let target = TargetImage::open(&args.image)?;
    let (w, h) = target.dimensions();
    log::info!("target {}: {w}x{h}", args.image.display());

    let config = Config {
        working_resolution: 128,
        ..Config::default()
    };
    let renderer = CpuRenderer {
        fill_polygons: config.fill_polygons,
        ..CpuRenderer::default()
    };
    let mut sim = Simulation::new(config, renderer, target)?;
    sim.start()?;

    for _ in 0..args.generations {
        let stats = sim.tick()?;
        if stats.generation_count % 25 == 0 {
            println!(
                "gen {:>5}  fitness {:6.2}%  best {:6.2}%  {}/gen  {}/improvement  elapsed {}",
                stats.generation_count,
                stats.current_fitness,
                stats.highest_fitness,
                format_ms(stats.time_per_generation_ms),
                format_ms(stats.time_per_improvement_ms),
                stats.format_elapsed(),
            );
        }
    }

    const OUTPUT_SIZE: u32 = 512;
    let pixels = sim
        .preview(OUTPUT_SIZE, OUTPUT_SIZE)?
        .ok_or("no population to render")?;
    let out = image::RgbaImage::from_raw(OUTPUT_SIZE, OUTPUT_SIZE, pixels)
        .ok_or("preview buffer has the wrong size")?;
    out.save(&args.output)?;
    println!("wrote {}", args.output.display());

    sim.stop();
    Ok(())
}
