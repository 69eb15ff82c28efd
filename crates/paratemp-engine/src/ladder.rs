use std::fmt;
use std::str::FromStr;

use paratemp_core::{ErrorInfo, PtError};
use serde::{Deserialize, Serialize};

/// Strictly increasing sequence of positive temperatures, one per replica slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureLadder {
    temperatures: Vec<f64>,
}

impl TemperatureLadder {
    /// Accepts an explicit list of temperatures, sorting it ascending.
    ///
    /// Rejects fewer than two entries, non-finite or non-positive values and
    /// duplicates.
    pub fn explicit(temperatures: &[f64]) -> Result<Self, PtError> {
        if temperatures.len() < 2 {
            return Err(PtError::InvalidConfiguration(
                ErrorInfo::new("ladder-too-short", "at least two temperatures are required")
                    .with_context("len", temperatures.len().to_string()),
            ));
        }
        if let Some(bad) = temperatures
            .iter()
            .find(|t| !t.is_finite() || **t <= 0.0)
        {
            return Err(PtError::InvalidConfiguration(
                ErrorInfo::new("ladder-non-positive", "temperatures must be finite and positive")
                    .with_context("value", bad.to_string()),
            ));
        }
        let mut sorted = temperatures.to_vec();
        sorted.sort_by(f64::total_cmp);
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PtError::InvalidConfiguration(
                ErrorInfo::new("ladder-duplicate", "temperatures must be distinct")
                    .with_context("value", pair[0].to_string()),
            ));
        }
        Ok(Self {
            temperatures: sorted,
        })
    }

    /// Number of slots in the ladder.
    pub fn len(&self) -> usize {
        self.temperatures.len()
    }

    /// Always false: a constructed ladder holds at least two temperatures.
    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
    }

    /// Temperatures in ascending order.
    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    /// Inverse temperatures, slot by slot (descending).
    pub fn betas(&self) -> Vec<f64> {
        self.temperatures.iter().map(|t| 1.0 / t).collect()
    }

    /// Consumes the ladder, returning the temperatures.
    pub fn into_vec(self) -> Vec<f64> {
        self.temperatures
    }
}

/// Builds a geometric ladder `T_i = t_min * r^i` with `r = (t_max / t_min)^(1/(n-1))`.
pub fn build_geometric(t_min: f64, t_max: f64, n: usize) -> Result<TemperatureLadder, PtError> {
    if n < 2 {
        return Err(PtError::InvalidConfiguration(
            ErrorInfo::new("ladder-too-short", "a geometric ladder needs at least two replicas")
                .with_context("replicas", n.to_string()),
        ));
    }
    if !t_min.is_finite() || !t_max.is_finite() || t_min <= 0.0 || t_max <= 0.0 {
        return Err(PtError::InvalidConfiguration(
            ErrorInfo::new("ladder-non-positive", "temperatures must be finite and positive")
                .with_context("t_min", t_min.to_string())
                .with_context("t_max", t_max.to_string()),
        ));
    }
    if t_max <= t_min {
        return Err(PtError::InvalidConfiguration(
            ErrorInfo::new("ladder-inverted", "t_max must exceed t_min")
                .with_context("t_min", t_min.to_string())
                .with_context("t_max", t_max.to_string()),
        ));
    }
    let ratio = (t_max / t_min).powf(1.0 / (n - 1) as f64);
    let temperatures: Vec<f64> = (0..n).map(|i| t_min * ratio.powi(i as i32)).collect();
    // t_max/t_min too close to 1 for the requested n collapses neighbours.
    if temperatures.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(PtError::InvalidConfiguration(
            ErrorInfo::new("ladder-duplicate", "geometric spacing collapsed neighbouring temperatures")
                .with_context("replicas", n.to_string()),
        ));
    }
    Ok(TemperatureLadder { temperatures })
}

/// Named ladder construction rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LadderKind {
    /// Constant ratio between neighbouring temperatures.
    #[default]
    Geometric,
}

impl FromStr for LadderKind {
    type Err = PtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geometric" => Ok(LadderKind::Geometric),
            other => Err(PtError::InvalidConfiguration(
                ErrorInfo::new("unknown-ladder", format!("unsupported ladder type '{other}'"))
                    .with_hint("supported: geometric"),
            )),
        }
    }
}

impl fmt::Display for LadderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LadderKind::Geometric => f.write_str("geometric"),
        }
    }
}

/// How the engine obtains its temperature ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LadderSpec {
    /// Explicit temperatures supplied by the caller (re-sorted ascending).
    Explicit {
        /// Temperatures, one per replica slot.
        temperatures: Vec<f64>,
    },
    /// Temperatures generated between `t_min` and `t_max`.
    Geometric {
        /// Coldest temperature.
        t_min: f64,
        /// Hottest temperature.
        t_max: f64,
        /// Number of replica slots.
        #[serde(default = "default_replicas")]
        replicas: usize,
    },
}

fn default_replicas() -> usize {
    8
}

impl Default for LadderSpec {
    fn default() -> Self {
        LadderSpec::Geometric {
            t_min: 0.5,
            t_max: 5.0,
            replicas: default_replicas(),
        }
    }
}

impl LadderSpec {
    /// Ranged spec built with a named ladder kind.
    pub fn ranged(kind: LadderKind, t_min: f64, t_max: f64, replicas: usize) -> Self {
        match kind {
            LadderKind::Geometric => LadderSpec::Geometric {
                t_min,
                t_max,
                replicas,
            },
        }
    }

    /// Resolves the spec into a validated ladder.
    pub fn build(&self) -> Result<TemperatureLadder, PtError> {
        match self {
            LadderSpec::Explicit { temperatures } => TemperatureLadder::explicit(temperatures),
            LadderSpec::Geometric {
                t_min,
                t_max,
                replicas,
            } => build_geometric(*t_min, *t_max, *replicas),
        }
    }
}
