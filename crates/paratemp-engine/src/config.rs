use paratemp_core::{ErrorInfo, PtError};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::determinism::{RngPolicy, RngSource};
use crate::distribution::{Distribution, DistributionKind};
use crate::exchange::SwapScheme;
use crate::ladder::{LadderKind, LadderSpec};
use crate::run::RunOptions;

/// YAML-configurable parameters governing an engine and its run loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Temperature ladder specification.
    #[serde(default)]
    pub ladder: LadderSpec,
    /// Equilibrium distribution used for exchanges.
    #[serde(default)]
    pub distribution: Distribution,
    /// Iteration budget and swap policy.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Master seed and random-number policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
}

impl EngineConfig {
    /// Parses a YAML document; missing fields take their defaults.
    ///
    /// Distribution, ladder and scheme names go through the same
    /// case-insensitive parsers as the string API, so an unknown name is an
    /// [`PtError::InvalidConfiguration`]. Malformed YAML and mistyped fields
    /// are [`PtError::Serde`] errors.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PtError> {
        let mut document: Value = serde_yaml::from_str(yaml).map_err(parse_error)?;
        canonicalize_name(&mut document, "distribution", "type", |name| {
            Ok(name.parse::<DistributionKind>()?.to_string())
        })?;
        canonicalize_name(&mut document, "ladder", "type", |name| {
            if name.eq_ignore_ascii_case("explicit") {
                Ok("explicit".to_string())
            } else {
                Ok(name.parse::<LadderKind>()?.to_string())
            }
        })?;
        canonicalize_name(&mut document, "schedule", "scheme", |name| {
            Ok(name.parse::<SwapScheme>()?.to_string())
        })?;
        serde_yaml::from_value(document).map_err(parse_error)
    }

    /// Renders the configuration as YAML.
    pub fn to_yaml_string(&self) -> Result<String, PtError> {
        serde_yaml::to_string(self)
            .map_err(|err| PtError::Serde(ErrorInfo::new("config-serialize", err.to_string())))
    }

    /// Checks everything that can be checked without a model.
    pub fn validate(&self) -> Result<(), PtError> {
        self.distribution.validate()?;
        self.ladder.build()?;
        if self.seed_policy.parallel && self.seed_policy.rng == RngPolicy::Shared {
            return Err(PtError::InvalidConfiguration(
                ErrorInfo::new(
                    "parallel-shared-rng",
                    "parallel local updates need per-replica random streams",
                )
                .with_hint("set seed_policy.rng to per-replica"),
            ));
        }
        Ok(())
    }
}

fn parse_error(err: serde_yaml::Error) -> PtError {
    PtError::Serde(ErrorInfo::new("config-parse", err.to_string()))
}

/// Rewrites `section.field` to the canonical spelling returned by `resolve`.
///
/// Missing sections and non-string values are left for serde to judge.
fn canonicalize_name<F>(
    document: &mut Value,
    section: &str,
    field: &str,
    resolve: F,
) -> Result<(), PtError>
where
    F: FnOnce(&str) -> Result<String, PtError>,
{
    let Some(slot) = document.get_mut(section).and_then(|table| table.get_mut(field)) else {
        return Ok(());
    };
    let Some(name) = slot.as_str() else {
        return Ok(());
    };
    let canonical = resolve(name).map_err(|err| match err {
        PtError::InvalidConfiguration(info) => {
            PtError::InvalidConfiguration(info.with_context("field", format!("{section}.{field}")))
        }
        other => other,
    })?;
    *slot = Value::String(canonical);
    Ok(())
}

/// Iteration budget of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Number of outer iterations.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Local update rounds per iteration.
    #[serde(default = "default_local_steps")]
    pub local_steps: usize,
    /// Neighbour pairing used by every swap round.
    #[serde(default)]
    pub scheme: SwapScheme,
}

fn default_iterations() -> usize {
    1000
}

fn default_local_steps() -> usize {
    1
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            local_steps: default_local_steps(),
            scheme: SwapScheme::default(),
        }
    }
}

impl ScheduleConfig {
    /// Run options matching the schedule, without cancellation.
    pub fn options(&self) -> RunOptions {
        RunOptions::new(self.iterations, self.local_steps, self.scheme)
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded alongside results.
    #[serde(default)]
    pub label: Option<String>,
    /// Shared stream or one stream per replica slot.
    #[serde(default)]
    pub rng: RngPolicy,
    /// Dispatch local updates over a thread pool (requires `per-replica`).
    #[serde(default)]
    pub parallel: bool,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
            rng: RngPolicy::default(),
            parallel: false,
        }
    }
}

impl SeedPolicy {
    /// Random source implied by the policy.
    pub fn rng_source(&self) -> RngSource {
        RngSource::seeded(self.rng, self.master_seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.schedule.scheme, SwapScheme::All);
        assert_eq!(config.distribution, Distribution::Boltzmann);
        assert_eq!(config.ladder.build().unwrap().len(), 8);
    }

    #[test]
    fn yaml_round_trips_through_defaults() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(EngineConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn unknown_names_are_configuration_errors() {
        let cases = [
            ("distribution:\n  type: gibbs\n", "unknown-distribution", "distribution.type"),
            ("ladder:\n  type: spiral\n", "unknown-ladder", "ladder.type"),
            ("schedule:\n  scheme: random\n", "unknown-scheme", "schedule.scheme"),
        ];
        for (yaml, code, field) in cases {
            let err = EngineConfig::from_yaml_str(yaml).unwrap_err();
            assert!(err.is_invalid_configuration(), "{yaml}: {err}");
            assert_eq!(err.code(), code);
            assert_eq!(err.info().context["field"], field);
        }
    }

    #[test]
    fn names_match_case_insensitively() {
        let yaml = "ladder:\n  type: Geometric\n  t_min: 1.0\n  t_max: 4.0\n  replicas: 3\n\
                    distribution:\n  type: TSALLIS\n  q: 1.5\nschedule:\n  scheme: Even-Odd\n";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.distribution, Distribution::Tsallis { q: 1.5 });
        assert_eq!(config.schedule.scheme, SwapScheme::EvenOdd);
        assert_eq!(config.ladder.build().unwrap().len(), 3);

        let explicit =
            EngineConfig::from_yaml_str("ladder:\n  type: Explicit\n  temperatures: [2.0, 1.0]\n")
                .unwrap();
        assert_eq!(explicit.ladder.build().unwrap().temperatures(), &[1.0, 2.0]);
    }

    #[test]
    fn syntax_and_type_errors_stay_serde_errors() {
        for yaml in ["ladder: [unclosed", "schedule:\n  iterations: many\n", "distribution:\n  type: 7\n"] {
            let err = EngineConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, PtError::Serde(_)), "{yaml}: {err}");
            assert_eq!(err.code(), "config-parse");
        }
    }

    #[test]
    fn parallel_with_shared_streams_is_rejected() {
        let mut config = EngineConfig::default();
        config.seed_policy.parallel = true;
        assert_eq!(config.validate().unwrap_err().code(), "parallel-shared-rng");
        config.seed_policy.rng = RngPolicy::PerReplica;
        config.validate().unwrap();
    }
}
