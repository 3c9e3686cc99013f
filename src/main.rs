use clap::Parser;
use pulseviz::{app, audio, config::Config};

fn main() -> anyhow::Result<()> {
    // Frames own stdout; diagnostics go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cfg = Config::parse();
    if cfg.list_devices {
        return audio::list_input_devices();
    }
    app::run(cfg)
}
