use std::error::Error;

use clap::Args;
use paratemp_engine::{LadderKind, LadderSpec};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct LadderArgs {
    /// Coldest temperature.
    #[arg(long, default_value_t = 0.5)]
    pub t_min: f64,
    /// Hottest temperature.
    #[arg(long, default_value_t = 5.0)]
    pub t_max: f64,
    /// Number of replica slots.
    #[arg(long, default_value_t = 8)]
    pub replicas: usize,
    /// Ladder construction rule.
    #[arg(long, default_value = "geometric")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
struct LadderReport {
    kind: String,
    temperatures: Vec<f64>,
    betas: Vec<f64>,
}

pub fn run(args: &LadderArgs) -> Result<(), Box<dyn Error>> {
    let report = build_report(args)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn build_report(args: &LadderArgs) -> Result<LadderReport, Box<dyn Error>> {
    let kind: LadderKind = args.kind.parse()?;
    let ladder = LadderSpec::ranged(kind, args.t_min, args.t_max, args.replicas).build()?;
    Ok(LadderReport {
        kind: kind.to_string(),
        betas: ladder.betas(),
        temperatures: ladder.into_vec(),
    })
}
