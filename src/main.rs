// fblayer preview - Main Entry Point
//
// Opens a desktop window that stands in for the display and runs the
// configured surfaces against the software compositor.

use fblayer::{run_preview, FbConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("fblayer preview v{}", env!("CARGO_PKG_VERSION"));

    let config = FbConfig::load_or_default();
    run_preview(config)?;

    log::info!("Preview window closed.");
    Ok(())
}
