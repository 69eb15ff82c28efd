use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use paratemp_core::PtError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::capability::LocalUpdate;
use crate::exchange::{ExchangeEngine, PairSummary, SwapScheme};
use crate::replica::Replica;

/// Shared flag checked between iterations to stop a run early.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the run stops before its next iteration.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Iteration budget and swap policy for [`ExchangeEngine::run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Outer iterations (local phase, swap round, callback).
    pub iterations: usize,
    /// Local update rounds per iteration.
    pub local_steps: usize,
    /// Neighbour pairing for every swap round.
    pub scheme: SwapScheme,
    /// Optional cooperative cancellation.
    pub cancel: Option<CancellationFlag>,
}

impl RunOptions {
    /// Options without cancellation.
    pub fn new(iterations: usize, local_steps: usize, scheme: SwapScheme) -> Self {
        Self {
            iterations,
            local_steps,
            scheme,
            cancel: None,
        }
    }

    /// Attaches a cancellation flag.
    pub fn with_cancel(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Summary returned to callers after a run completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Iterations that ran to completion.
    pub iterations: usize,
    /// Whether the run stopped early on a cancellation request.
    pub cancelled: bool,
    /// Ladder temperatures, ascending.
    pub temperatures: Vec<f64>,
    /// Name of the equilibrium distribution.
    pub distribution: String,
    /// Global exchange acceptance rate.
    pub swap_acceptance_rate: f64,
    /// Total exchange proposals since construction.
    pub swap_attempts: u64,
    /// Total accepted exchanges since construction.
    pub swaps_accepted: u64,
    /// Per-pair counters ordered by pair.
    pub pairs: Vec<PairSummary>,
    /// Energy held by every slot at the end of the run.
    pub final_energies: Vec<f64>,
}

impl<S, L> ExchangeEngine<S, L>
where
    L: LocalUpdate<S>,
{
    /// Runs the iteration loop without an observer.
    pub fn run(&mut self, options: &RunOptions) -> Result<RunSummary, PtError> {
        self.run_observed(options, |_, _, _| Ok(()))
    }

    /// Runs the iteration loop, calling `observer` after every swap round.
    ///
    /// The observer sees the settled ensemble through shared references and
    /// finishes before the next iteration starts. An observer error aborts
    /// the run and is returned unchanged.
    pub fn run_observed<C>(&mut self, options: &RunOptions, observer: C) -> Result<RunSummary, PtError>
    where
        C: FnMut(usize, &[Replica<S>], &Self) -> Result<(), PtError>,
    {
        self.drive(options, |engine, steps| engine.step_local(steps), observer)
    }
}

impl<S, L> ExchangeEngine<S, L>
where
    S: Send,
    L: LocalUpdate<S> + Sync,
{
    /// [`ExchangeEngine::run_observed`] with local updates fanned out over rayon.
    ///
    /// Fails up front under the shared random-number policy.
    pub fn run_parallel<C>(&mut self, options: &RunOptions, observer: C) -> Result<RunSummary, PtError>
    where
        C: FnMut(usize, &[Replica<S>], &Self) -> Result<(), PtError>,
    {
        // zero steps validates the policy without touching the ensemble
        self.step_local_parallel(0)?;
        self.drive(
            options,
            |engine, steps| engine.step_local_parallel(steps),
            observer,
        )
    }
}

impl<S, L> ExchangeEngine<S, L>
where
    L: LocalUpdate<S>,
{
    fn drive<F, C>(
        &mut self,
        options: &RunOptions,
        mut local_phase: F,
        mut observer: C,
    ) -> Result<RunSummary, PtError>
    where
        F: FnMut(&mut Self, usize) -> Result<(), PtError>,
        C: FnMut(usize, &[Replica<S>], &Self) -> Result<(), PtError>,
    {
        info!(
            iterations = options.iterations,
            local_steps = options.local_steps,
            scheme = %options.scheme,
            "starting replica-exchange run"
        );
        let mut completed = 0;
        let mut cancelled = false;
        for iteration in 0..options.iterations {
            if options
                .cancel
                .as_ref()
                .is_some_and(CancellationFlag::is_cancelled)
            {
                warn!(iteration, "run cancelled");
                cancelled = true;
                break;
            }
            local_phase(self, options.local_steps)?;
            self.attempt_swaps(options.scheme);
            observer(iteration, self.replicas(), self)?;
            completed += 1;
        }
        let summary = self.summary(completed, cancelled);
        info!(
            iterations = summary.iterations,
            swap_acceptance_rate = summary.swap_acceptance_rate,
            "replica-exchange run finished"
        );
        Ok(summary)
    }
}

impl<S, L> ExchangeEngine<S, L> {
    /// Summary of the engine's current state.
    pub fn summary(&self, iterations: usize, cancelled: bool) -> RunSummary {
        let statistics = self.statistics();
        RunSummary {
            iterations,
            cancelled,
            temperatures: self.temperatures().to_vec(),
            distribution: self.distribution().name().to_string(),
            swap_acceptance_rate: statistics.rate,
            swap_attempts: statistics.attempts,
            swaps_accepted: statistics.accepted,
            pairs: statistics.pairs,
            final_energies: self.energies(),
        }
    }
}
