use clap::Parser;
use tracker_app::app::{run, AppConfig, Cli};

fn main() {
    tracker_app::init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::from_env().unwrap_or_default();
    if let Err(err) = run(cli, config) {
        eprintln!("habit_tracker: {err:#}");
        std::process::exit(1);
    }
}
