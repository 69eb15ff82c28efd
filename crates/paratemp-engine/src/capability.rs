use paratemp_core::{PtError, RngHandle};

/// Energy evaluation for a caller-defined configuration.
///
/// Called once per slot when an engine is constructed. Any error is returned
/// to the caller of the constructor unchanged.
pub trait EnergyFunction<S: ?Sized> {
    /// Evaluates `E(state)`.
    fn energy(&self, state: &S) -> Result<f64, PtError>;
}

impl<S: ?Sized, F> EnergyFunction<S> for F
where
    F: Fn(&S) -> Result<f64, PtError>,
{
    fn energy(&self, state: &S) -> Result<f64, PtError> {
        self(state)
    }
}

/// Single-temperature Markov step.
///
/// Implementations must leave the beta-conditioned equilibrium distribution
/// invariant; the engine stores whatever `(state, energy)` comes back without
/// any accept/reject logic of its own.
pub trait LocalUpdate<S> {
    /// Advances `state` by one step at inverse temperature `beta`.
    fn step(&self, state: &S, beta: f64, rng: &mut RngHandle) -> Result<(S, f64), PtError>;
}

impl<S, F> LocalUpdate<S> for F
where
    F: Fn(&S, f64, &mut RngHandle) -> Result<(S, f64), PtError>,
{
    fn step(&self, state: &S, beta: f64, rng: &mut RngHandle) -> Result<(S, f64), PtError> {
        self(state, beta, rng)
    }
}
