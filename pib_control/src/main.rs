//! # PIB Control
//!
//! Ground-test harness for the PIB control brain: loads the configuration
//! snapshot, stands up the supervisor and runs the paced tick loop with
//! outbound traffic in the log.

use std::path::PathBuf;

use clap::Parser;
use pib_common::config::PibConfig;
use pib_control::runner::{rt_setup, Runner, RunnerError};
use pib_control::supervisor::Pib;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "pib_control", about = "Profiler Interface Board control brain")]
struct Args {
    /// Configuration snapshot (TOML).
    #[arg(long, default_value = "pib.toml")]
    config: PathBuf,

    /// Tick rate [Hz].
    #[arg(long, default_value_t = 1)]
    rate_hz: u32,

    /// CPU core for the tick loop (`rt` feature).
    #[arg(long, default_value_t = 0)]
    cpu_core: usize,

    /// SCHED_FIFO priority (`rt` feature).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,
}

fn main() -> Result<(), RunnerError> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match PibConfig::load(&args.config) {
        Ok(config) => {
            info!("Loaded config from {}", args.config.display());
            config
        }
        Err(e) => {
            warn!("Error loading config ({e}), using flight defaults");
            PibConfig::default()
        }
    };

    rt_setup(args.cpu_core, args.rt_priority)?;

    let mut runner = Runner::new(Pib::new(config), args.rate_hz)?;
    info!("Starting PIB control loop at {} Hz", args.rate_hz);
    runner.run()
}
