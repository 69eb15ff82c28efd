use std::fmt;
use std::str::FromStr;

use paratemp_core::{ErrorInfo, PtError};
use serde::{Deserialize, Serialize};

/// Equilibrium distribution used to weigh configurations during exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Distribution {
    /// `pi(x) ~ exp(-beta E(x))`.
    #[default]
    Boltzmann,
    /// `pi(x) ~ [1 - (1 - q) beta E(x)]^(1 / (1 - q))`, zero outside its support.
    Tsallis {
        /// Non-extensivity parameter; `q == 1` is the Boltzmann limit and is rejected.
        #[serde(default = "default_q")]
        q: f64,
    },
}

fn default_q() -> f64 {
    1.2
}

impl Distribution {
    /// Validated Tsallis distribution.
    pub fn tsallis(q: f64) -> Result<Self, PtError> {
        let dist = Distribution::Tsallis { q };
        dist.validate()?;
        Ok(dist)
    }

    /// Resolves a distribution by name; `q` is only consulted for Tsallis.
    pub fn from_name(name: &str, q: f64) -> Result<Self, PtError> {
        match name.parse::<DistributionKind>()? {
            DistributionKind::Boltzmann => Ok(Distribution::Boltzmann),
            DistributionKind::Tsallis => Distribution::tsallis(q),
        }
    }

    /// Checks the parameters of the distribution.
    pub fn validate(&self) -> Result<(), PtError> {
        match self {
            Distribution::Boltzmann => Ok(()),
            Distribution::Tsallis { q } if *q == 1.0 => Err(PtError::InvalidConfiguration(
                ErrorInfo::new("tsallis-q-one", "Tsallis with q = 1 reduces to Boltzmann")
                    .with_hint("request the boltzmann distribution explicitly"),
            )),
            Distribution::Tsallis { q } if !q.is_finite() => Err(PtError::InvalidConfiguration(
                ErrorInfo::new("tsallis-q-non-finite", "Tsallis q must be finite")
                    .with_context("q", q.to_string()),
            )),
            Distribution::Tsallis { .. } => Ok(()),
        }
    }

    /// `log pi` up to an additive constant; `-inf` outside the support.
    pub fn log_weight(&self, energy: f64, beta: f64) -> f64 {
        match self {
            Distribution::Boltzmann => -beta * energy,
            Distribution::Tsallis { q } => {
                let base = 1.0 - (1.0 - q) * beta * energy;
                if base <= 0.0 {
                    f64::NEG_INFINITY
                } else {
                    base.ln() / (1.0 - q)
                }
            }
        }
    }

    /// Short name used in logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Distribution::Boltzmann => "boltzmann",
            Distribution::Tsallis { .. } => "tsallis",
        }
    }
}

/// Distribution family names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionKind {
    /// See [`Distribution::Boltzmann`].
    Boltzmann,
    /// See [`Distribution::Tsallis`].
    Tsallis,
}

impl FromStr for DistributionKind {
    type Err = PtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boltzmann" => Ok(DistributionKind::Boltzmann),
            "tsallis" => Ok(DistributionKind::Tsallis),
            other => Err(PtError::InvalidConfiguration(
                ErrorInfo::new("unknown-distribution", format!("unknown distribution '{other}'"))
                    .with_hint("supported: boltzmann, tsallis"),
            )),
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionKind::Boltzmann => f.write_str("boltzmann"),
            DistributionKind::Tsallis => f.write_str("tsallis"),
        }
    }
}
