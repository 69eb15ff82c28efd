use std::cell::Cell;

use paratemp_engine::{
    CancellationFlag, Distribution, ExchangeEngine, InitialStates, LadderKind, LadderSpec,
    PtError, RngHandle, RngPolicy, RngSource, RunOptions, SwapScheme,
};
use rand_distr::{Distribution as _, Normal};

fn double_well(x: &f64) -> Result<f64, PtError> {
    Ok((x * x - 1.0).powi(2))
}

fn metropolis(x: &f64, beta: f64, rng: &mut RngHandle) -> Result<(f64, f64), PtError> {
    let current = double_well(x)?;
    let step = Normal::new(0.0, 0.5)
        .map_err(|err| PtError::external("proposal", err.to_string()))?
        .sample(rng);
    let proposal = x + step;
    let candidate = double_well(&proposal)?;
    let log_ratio = -beta * (candidate - current);
    if log_ratio >= 0.0 || rng.uniform() < log_ratio.exp() {
        Ok((proposal, candidate))
    } else {
        Ok((*x, current))
    }
}

type Step = fn(&f64, f64, &mut RngHandle) -> Result<(f64, f64), PtError>;

fn engine(policy: RngPolicy, seed: u64) -> ExchangeEngine<f64, Step> {
    ExchangeEngine::new(
        &double_well,
        metropolis as Step,
        &LadderSpec::ranged(LadderKind::Geometric, 0.05, 5.0, 8),
        Distribution::Boltzmann,
        InitialStates::Shared(0.0),
        RngSource::seeded(policy, seed),
    )
    .unwrap()
}

#[test]
fn same_seed_gives_identical_runs() {
    let options = RunOptions::new(200, 5, SwapScheme::EvenOdd);
    let mut a = engine(RngPolicy::Shared, 42);
    let mut b = engine(RngPolicy::Shared, 42);
    let summary_a = a.run(&options).unwrap();
    let summary_b = b.run(&options).unwrap();
    assert_eq!(summary_a, summary_b);
    assert_eq!(a.snapshot(), b.snapshot());

    let mut c = engine(RngPolicy::Shared, 43);
    c.run(&options).unwrap();
    assert_ne!(a.snapshot(), c.snapshot());
}

#[test]
fn parallel_dispatch_matches_serial_per_replica_streams() {
    let options = RunOptions::new(150, 4, SwapScheme::All);
    let mut serial = engine(RngPolicy::PerReplica, 7);
    let mut parallel = engine(RngPolicy::PerReplica, 7);
    let serial_summary = serial.run(&options).unwrap();
    let parallel_summary = parallel.run_parallel(&options, |_, _, _| Ok(())).unwrap();
    assert_eq!(serial_summary, parallel_summary);
    assert_eq!(serial.snapshot(), parallel.snapshot());
}

#[test]
fn run_parallel_requires_per_replica_streams() {
    let mut shared = engine(RngPolicy::Shared, 7);
    let err = shared
        .run_parallel(&RunOptions::new(3, 1, SwapScheme::All), |_, _, _| Ok(()))
        .unwrap_err();
    assert_eq!(err.code(), "parallel-shared-rng");
    assert_eq!(shared.n_swap_attempts(), 0);
}

#[test]
fn observer_sees_every_settled_iteration() {
    let mut engine = engine(RngPolicy::Shared, 3);
    let mut seen = Vec::new();
    let summary = engine
        .run_observed(
            &RunOptions::new(25, 2, SwapScheme::All),
            |iteration, replicas, engine| {
                assert_eq!(replicas.len(), engine.n_replicas());
                // `All` attempts every pair once per iteration
                assert_eq!(engine.n_swap_attempts(), (iteration as u64 + 1) * 7);
                for (slot, replica) in replicas.iter().enumerate() {
                    assert_eq!(replica.index(), slot);
                    assert_eq!(replica.beta(), 1.0 / engine.temperatures()[slot]);
                    assert!((replica.energy() - double_well(replica.state())?).abs() < 1e-12);
                }
                seen.push(iteration);
                Ok(())
            },
        )
        .unwrap();
    assert_eq!(seen, (0..25).collect::<Vec<_>>());
    assert_eq!(summary.iterations, 25);
    assert!(!summary.cancelled);
    assert_eq!(summary.swap_attempts, 175);
    assert_eq!(summary.pairs.len(), 7);
    assert_eq!(summary.final_energies, engine.energies());
    assert_eq!(summary.distribution, "boltzmann");
}

#[test]
fn local_update_failure_aborts_the_run() {
    let calls = Cell::new(0usize);
    let flaky = |x: &f64, _beta: f64, _rng: &mut RngHandle| -> Result<(f64, f64), PtError> {
        calls.set(calls.get() + 1);
        if calls.get() == 10 {
            Err(PtError::external("solver-diverged", "local step diverged"))
        } else {
            Ok((*x + 1.0, *x + 1.0))
        }
    };
    let energy = |x: &f64| -> Result<f64, PtError> { Ok(*x) };
    let mut engine = ExchangeEngine::new(
        &energy,
        flaky,
        &LadderSpec::Explicit {
            temperatures: vec![1.0, 2.0, 3.0, 4.0],
        },
        Distribution::Boltzmann,
        InitialStates::Shared(0.0),
        RngSource::Shared(RngHandle::from_seed(1)),
    )
    .unwrap();
    let mut observed = 0;
    let err = engine
        .run_observed(&RunOptions::new(5, 1, SwapScheme::All), |_, _, _| {
            observed += 1;
            Ok(())
        })
        .unwrap_err();
    assert_eq!(err, PtError::external("solver-diverged", "local step diverged"));
    // iterations 0 and 1 complete (8 calls), the third fails on its second slot
    assert_eq!(observed, 2);
    assert_eq!(calls.get(), 10);
    // the slot updated before the failure keeps its new content
    assert_eq!(engine.replicas()[0].energy() + engine.replicas()[1].energy(), 5.0);
}

#[test]
fn observer_failure_aborts_the_run() {
    let mut engine = engine(RngPolicy::Shared, 11);
    let mut calls = 0;
    let err = engine
        .run_observed(&RunOptions::new(100, 1, SwapScheme::All), |iteration, _, _| {
            calls += 1;
            if iteration == 3 {
                return Err(PtError::external("observer", "disk full"));
            }
            Ok(())
        })
        .unwrap_err();
    assert_eq!(err.code(), "observer");
    assert_eq!(calls, 4);
    assert_eq!(engine.n_swap_attempts(), 4 * 7);
}

#[test]
fn cancellation_stops_between_iterations() {
    let mut engine = engine(RngPolicy::Shared, 5);
    let cancel = CancellationFlag::new();
    let options = RunOptions::new(1000, 1, SwapScheme::EvenOdd).with_cancel(cancel.clone());
    let summary = engine
        .run_observed(&options, |iteration, _, _| {
            if iteration == 9 {
                cancel.cancel();
            }
            Ok(())
        })
        .unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.iterations, 10);
}

#[test]
fn cold_replica_settles_in_a_well() {
    let mut engine = engine(RngPolicy::Shared, 2024);
    let mut cold = Vec::new();
    engine
        .run_observed(&RunOptions::new(2000, 10, SwapScheme::All), |iteration, replicas, _| {
            if iteration >= 500 {
                cold.push(*replicas[0].state());
            }
            Ok(())
        })
        .unwrap();
    let mean_abs = cold.iter().map(|x| x.abs()).sum::<f64>() / cold.len() as f64;
    assert!((mean_abs - 1.0).abs() < 0.15, "mean |x| at T=0.05 was {mean_abs}");
    let left = cold.iter().filter(|x| **x < 0.0).count();
    // exchanges with hot replicas let the cold chain visit both wells
    assert!(left > 0 && left < cold.len());
    assert!(engine.swap_acceptance_rate() > 0.0);
}
