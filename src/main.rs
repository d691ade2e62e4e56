use movingtexture::{CliArgs, DemoConfig, Engine, ErrorKind};
use std::process::ExitCode;

// Main configures logging, reads the settings, and hands off to the engine,
// which owns the window, the GPU and the frame loop until the window closes.
fn main() -> ExitCode {
    // RUST_LOG overrides this, and also lets wgpu's own logs through.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            println!("{err}\n\n{}", movingtexture::config::USAGE);
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        println!("{}", movingtexture::config::USAGE);
        return ExitCode::SUCCESS;
    }

    let result = DemoConfig::resolve(&args).and_then(|config| Engine::start(&config));
    match result {
        Ok(frames) => {
            log::info!("window closed after {frames} frames");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            let headline = match err.kind() {
                ErrorKind::Config => "Invalid configuration!",
                ErrorKind::Init => "Could not initialize the window!",
                ErrorKind::Load => "Failed to load texture!",
            };
            println!("{headline} {err}");
            ExitCode::FAILURE
        }
    }
}
