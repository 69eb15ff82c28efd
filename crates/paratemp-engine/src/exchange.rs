use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use paratemp_core::{ErrorInfo, PtError, RngHandle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::capability::{EnergyFunction, LocalUpdate};
use crate::config::EngineConfig;
use crate::determinism::{RngPolicy, RngSource};
use crate::distribution::Distribution;
use crate::ladder::{LadderSpec, TemperatureLadder};
use crate::replica::{InitialStates, Replica};

/// Neighbour pairing policy for a swap round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SwapScheme {
    /// Every neighbour pair, lowest first.
    #[default]
    All,
    /// A fair coin picks either the even-offset or the odd-offset pairs.
    EvenOdd,
}

impl FromStr for SwapScheme {
    type Err = PtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(SwapScheme::All),
            "even-odd" => Ok(SwapScheme::EvenOdd),
            other => Err(PtError::InvalidConfiguration(
                ErrorInfo::new("unknown-scheme", format!("unknown swap scheme '{other}'"))
                    .with_hint("supported: all, even-odd"),
            )),
        }
    }
}

impl fmt::Display for SwapScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapScheme::All => f.write_str("all"),
            SwapScheme::EvenOdd => f.write_str("even-odd"),
        }
    }
}

/// Attempt/accept counters for one neighbour pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PairStats {
    /// Number of exchange proposals.
    pub attempts: u64,
    /// Number of accepted proposals.
    pub accepted: u64,
}

impl PairStats {
    /// `accepted / attempts`, or `0.0` before the first attempt.
    pub fn rate(&self) -> f64 {
        ratio(self.accepted, self.attempts)
    }
}

/// Flattened per-pair statistics, suitable for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    /// Lower slot of the pair.
    pub lower: usize,
    /// Upper slot of the pair.
    pub upper: usize,
    /// Number of exchange proposals.
    pub attempts: u64,
    /// Number of accepted proposals.
    pub accepted: u64,
    /// Acceptance rate.
    pub rate: f64,
}

/// Snapshot of the global and per-pair exchange counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapStatistics {
    /// Total exchange proposals.
    pub attempts: u64,
    /// Total accepted proposals.
    pub accepted: u64,
    /// Global acceptance rate.
    pub rate: f64,
    /// Per-pair counters ordered by pair.
    pub pairs: Vec<PairSummary>,
}

/// Result of one counted exchange proposal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapOutcome {
    /// Lower slot of the pair.
    pub lower: usize,
    /// Upper slot of the pair.
    pub upper: usize,
    /// Log of the Metropolis-Hastings ratio (may be infinite or NaN).
    pub log_ratio: f64,
    /// Acceptance probability in `[0, 1]`.
    pub acceptance: f64,
    /// Whether the contents of the two slots were exchanged.
    pub accepted: bool,
}

/// Log of the generalized exchange ratio
/// `[pi_i(x_j) pi_j(x_i)] / [pi_i(x_i) pi_j(x_j)]`.
///
/// For Boltzmann weights this is `(beta_i - beta_j) * (energy_i - energy_j)`.
pub fn log_acceptance(
    distribution: &Distribution,
    energy_i: f64,
    beta_i: f64,
    energy_j: f64,
    beta_j: f64,
) -> f64 {
    let numerator =
        distribution.log_weight(energy_j, beta_i) + distribution.log_weight(energy_i, beta_j);
    let denominator =
        distribution.log_weight(energy_i, beta_i) + distribution.log_weight(energy_j, beta_j);
    numerator - denominator
}

/// Maps a log-ratio to `min(1, exp(log_ratio))`.
///
/// A NaN ratio arises only when both configurations are outside the support
/// and counts as a certain rejection.
pub fn acceptance_probability(log_ratio: f64) -> f64 {
    if log_ratio.is_nan() {
        0.0
    } else if log_ratio >= 0.0 {
        1.0
    } else {
        log_ratio.exp()
    }
}

/// Owns the replica ensemble and performs local updates and exchanges.
pub struct ExchangeEngine<S, L> {
    replicas: Vec<Replica<S>>,
    ladder: TemperatureLadder,
    distribution: Distribution,
    local_update: L,
    rng: RngHandle,
    slot_rngs: Option<Vec<RngHandle>>,
    pair_stats: BTreeMap<(usize, usize), PairStats>,
    n_swap_attempts: u64,
    n_swaps_accepted: u64,
}

impl<S, L> fmt::Debug for ExchangeEngine<S, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeEngine")
            .field("temperatures", &self.ladder.temperatures())
            .field("distribution", &self.distribution)
            .field("n_swap_attempts", &self.n_swap_attempts)
            .field("n_swaps_accepted", &self.n_swaps_accepted)
            .finish_non_exhaustive()
    }
}

impl<S, L> ExchangeEngine<S, L>
where
    L: LocalUpdate<S>,
{
    /// Builds the ensemble, evaluating `energy_fn` once per slot.
    ///
    /// Every configuration check runs before the first energy evaluation, so
    /// a misconfigured engine fails without touching the model.
    pub fn new<E>(
        energy_fn: &E,
        local_update: L,
        ladder: &LadderSpec,
        distribution: Distribution,
        initial: InitialStates<S>,
        rng: RngSource,
    ) -> Result<Self, PtError>
    where
        E: EnergyFunction<S> + ?Sized,
        S: Clone,
    {
        distribution.validate()?;
        let ladder = ladder.build()?;
        if let Some(supplied) = initial.mismatch(ladder.len()) {
            return Err(PtError::InvalidConfiguration(
                ErrorInfo::new(
                    "init-states-mismatch",
                    "number of initial states must equal the number of replicas",
                )
                .with_context("replicas", ladder.len().to_string())
                .with_context("supplied", supplied.to_string()),
            ));
        }

        let betas = ladder.betas();
        let mut replicas = Vec::with_capacity(ladder.len());
        for (index, (state, beta)) in initial
            .into_states(ladder.len())
            .into_iter()
            .zip(betas)
            .enumerate()
        {
            let energy = energy_fn.energy(&state)?;
            replicas.push(Replica::new(state, energy, beta, index));
        }

        let policy = rng.policy();
        let (rng, slot_rngs) = rng.into_streams(ladder.len());
        info!(
            replicas = ladder.len(),
            t_min = ladder.temperatures()[0],
            t_max = ladder.temperatures()[ladder.len() - 1],
            distribution = distribution.name(),
            rng_policy = ?policy,
            "replica-exchange engine initialised"
        );

        Ok(Self {
            replicas,
            ladder,
            distribution,
            local_update,
            rng,
            slot_rngs,
            pair_stats: BTreeMap::new(),
            n_swap_attempts: 0,
            n_swaps_accepted: 0,
        })
    }

    /// Builds an engine from a validated [`EngineConfig`].
    pub fn from_config<E>(
        config: &EngineConfig,
        energy_fn: &E,
        local_update: L,
        initial: InitialStates<S>,
    ) -> Result<Self, PtError>
    where
        E: EnergyFunction<S> + ?Sized,
        S: Clone,
    {
        Self::new(
            energy_fn,
            local_update,
            &config.ladder,
            config.distribution,
            initial,
            config.seed_policy.rng_source(),
        )
    }

    /// Runs `n_steps` rounds of local updates over every slot in slot order.
    ///
    /// A failing update aborts immediately; slots already advanced keep their
    /// new contents.
    pub fn step_local(&mut self, n_steps: usize) -> Result<(), PtError> {
        for _ in 0..n_steps {
            match self.slot_rngs.as_mut() {
                Some(streams) => {
                    for (replica, rng) in self.replicas.iter_mut().zip(streams.iter_mut()) {
                        advance(&self.local_update, replica, rng)?;
                    }
                }
                None => {
                    for replica in self.replicas.iter_mut() {
                        advance(&self.local_update, replica, &mut self.rng)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Proposes exchanging the contents of slots `i` and `j`.
    ///
    /// Returns `None`, without drawing or counting, when `i == j` or either
    /// index is out of range.
    pub fn attempt_swap_pair(&mut self, i: usize, j: usize) -> Option<SwapOutcome> {
        let n = self.replicas.len();
        if i == j || i >= n || j >= n {
            return None;
        }
        let (rep_i, rep_j) = (&self.replicas[i], &self.replicas[j]);
        let log_ratio = log_acceptance(
            &self.distribution,
            rep_i.energy,
            rep_i.beta,
            rep_j.energy,
            rep_j.beta,
        );
        let acceptance = acceptance_probability(log_ratio);
        let accepted = self.rng.uniform() < acceptance;

        let key = (i.min(j), i.max(j));
        let stats = self.pair_stats.entry(key).or_default();
        stats.attempts += 1;
        self.n_swap_attempts += 1;
        if accepted {
            stats.accepted += 1;
            self.n_swaps_accepted += 1;
            let (a, b) = pair_mut(&mut self.replicas, i, j);
            std::mem::swap(&mut a.state, &mut b.state);
            std::mem::swap(&mut a.energy, &mut b.energy);
        }
        debug!(lower = key.0, upper = key.1, log_ratio, accepted, "swap attempt");

        Some(SwapOutcome {
            lower: key.0,
            upper: key.1,
            log_ratio,
            acceptance,
            accepted,
        })
    }

    /// Runs one swap round over the neighbour pairs selected by `scheme`.
    pub fn attempt_swaps(&mut self, scheme: SwapScheme) -> Vec<SwapOutcome> {
        let m = self.replicas.len();
        if m < 2 {
            return Vec::new();
        }
        let (start, stride) = match scheme {
            SwapScheme::All => (0, 1),
            SwapScheme::EvenOdd => {
                if self.rng.coin() {
                    (0, 2)
                } else {
                    (1, 2)
                }
            }
        };
        (start..m - 1)
            .step_by(stride)
            .filter_map(|i| self.attempt_swap_pair(i, i + 1))
            .collect()
    }
}

impl<S, L> ExchangeEngine<S, L>
where
    S: Send,
    L: LocalUpdate<S> + Sync,
{
    /// Parallel variant of [`ExchangeEngine::step_local`] on the ambient rayon pool.
    ///
    /// Requires [`RngPolicy::PerReplica`]; the resulting ensemble is identical
    /// to the serial dispatch under the same seed. When several slots fail,
    /// which error is returned is unspecified.
    pub fn step_local_parallel(&mut self, n_steps: usize) -> Result<(), PtError> {
        let Some(streams) = self.slot_rngs.as_mut() else {
            return Err(PtError::InvalidConfiguration(
                ErrorInfo::new(
                    "parallel-shared-rng",
                    "parallel local updates need per-replica random streams",
                )
                .with_hint("set seed_policy.rng to per-replica"),
            ));
        };
        let local_update = &self.local_update;
        self.replicas
            .par_iter_mut()
            .zip(streams.par_iter_mut())
            .try_for_each(|(replica, rng)| {
                for _ in 0..n_steps {
                    advance(local_update, replica, rng)?;
                }
                Ok(())
            })
    }
}

impl<S, L> ExchangeEngine<S, L> {
    /// Replica slots, coldest first.
    pub fn replicas(&self) -> &[Replica<S>] {
        &self.replicas
    }

    /// Number of replica slots.
    pub fn n_replicas(&self) -> usize {
        self.replicas.len()
    }

    /// Ladder temperatures, ascending.
    pub fn temperatures(&self) -> &[f64] {
        self.ladder.temperatures()
    }

    /// Inverse temperature of every slot.
    pub fn betas(&self) -> Vec<f64> {
        self.replicas.iter().map(|replica| replica.beta).collect()
    }

    /// Current energy of every slot.
    pub fn energies(&self) -> Vec<f64> {
        self.replicas.iter().map(|replica| replica.energy).collect()
    }

    /// Distribution used for exchange acceptance.
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Random-number policy the engine was built with.
    pub fn rng_policy(&self) -> RngPolicy {
        if self.slot_rngs.is_some() {
            RngPolicy::PerReplica
        } else {
            RngPolicy::Shared
        }
    }

    /// Total exchange proposals so far.
    pub fn n_swap_attempts(&self) -> u64 {
        self.n_swap_attempts
    }

    /// Total accepted exchanges so far.
    pub fn n_swaps_accepted(&self) -> u64 {
        self.n_swaps_accepted
    }

    /// Global acceptance rate; `0.0` before the first attempt.
    pub fn swap_acceptance_rate(&self) -> f64 {
        ratio(self.n_swaps_accepted, self.n_swap_attempts)
    }

    /// Acceptance rate of every pair attempted at least once.
    pub fn pair_acceptance_rates(&self) -> BTreeMap<(usize, usize), f64> {
        self.pair_stats
            .iter()
            .map(|(pair, stats)| (*pair, stats.rate()))
            .collect()
    }

    /// Raw per-pair counters.
    pub fn pair_stats(&self) -> &BTreeMap<(usize, usize), PairStats> {
        &self.pair_stats
    }

    /// Serializable snapshot of all exchange counters.
    pub fn statistics(&self) -> SwapStatistics {
        SwapStatistics {
            attempts: self.n_swap_attempts,
            accepted: self.n_swaps_accepted,
            rate: self.swap_acceptance_rate(),
            pairs: self
                .pair_stats
                .iter()
                .map(|(&(lower, upper), stats)| PairSummary {
                    lower,
                    upper,
                    attempts: stats.attempts,
                    accepted: stats.accepted,
                    rate: stats.rate(),
                })
                .collect(),
        }
    }

    /// Owned copy of the ensemble.
    pub fn snapshot(&self) -> Vec<Replica<S>>
    where
        S: Clone,
    {
        self.replicas.clone()
    }

    /// Consumes the engine, returning the ensemble.
    pub fn into_replicas(self) -> Vec<Replica<S>> {
        self.replicas
    }
}

fn advance<S, L>(local_update: &L, replica: &mut Replica<S>, rng: &mut RngHandle) -> Result<(), PtError>
where
    L: LocalUpdate<S> + ?Sized,
{
    let (state, energy) = local_update.step(&replica.state, replica.beta, rng)?;
    replica.state = state;
    replica.energy = energy;
    Ok(())
}

fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

fn ratio(accepted: u64, attempts: u64) -> f64 {
    if attempts == 0 {
        0.0
    } else {
        accepted as f64 / attempts as f64
    }
}
