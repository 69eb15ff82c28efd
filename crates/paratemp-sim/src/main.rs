use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    double_well::{self, DoubleWellArgs},
    ladder::{self, LadderArgs},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod trace;

#[derive(Parser, Debug)]
#[command(name = "paratemp-sim", about = "Replica-exchange demo driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample the 1-D double well E(x) = (x^2 - 1)^2 with parallel tempering.
    DoubleWell(DoubleWellArgs),
    /// Print a geometric temperature ladder as JSON.
    Ladder(LadderArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::DoubleWell(args) => double_well::run(&args).map(|_| ()),
        Command::Ladder(args) => ladder::run(&args),
    }
}
