use log::{LevelFilter, error, info};
use scanchart::{Chart, ChartSettings, Mods};
use std::error::Error;
use std::fs;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let mut mods = Mods::default();
    let mut paths: Vec<String> = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--mods" {
            let value = args.next().ok_or("--mods requires a value")?;
            mods = value.parse::<Mods>()?;
        } else {
            paths.push(arg);
        }
    }
    if paths.is_empty() {
        return Err("usage: scanchart [--mods fast,slow,flipx,flipy,flipall] <chart>...".into());
    }

    let settings = ChartSettings {
        mods,
        ..ChartSettings::default()
    };

    for path in &paths {
        let text = fs::read_to_string(path)?;
        match Chart::new(&text, settings) {
            Ok(chart) => {
                info!(
                    "{}: {} chart, {} notes, {} pages, {} tempo changes, {:.3}s, music offset {:.3}s",
                    path,
                    chart.format(),
                    chart.notes().len(),
                    chart.pages().len(),
                    chart.tempo().entries().len(),
                    chart.end_time(),
                    chart.music_offset()
                );
                println!("{}  {}", chart.fingerprint(), path);
            }
            Err(err) => {
                error!("failed to load {}: {}", path, err);
                return Err(Box::new(err));
            }
        }
    }
    Ok(())
}
