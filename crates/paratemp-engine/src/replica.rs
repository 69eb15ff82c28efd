use serde::{Deserialize, Serialize};

/// One Markov chain's snapshot, stored in a fixed ladder slot.
///
/// `beta` and `index` belong to the slot and never move during exchanges;
/// only `state` and `energy` travel between slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replica<S> {
    pub(crate) state: S,
    pub(crate) energy: f64,
    pub(crate) beta: f64,
    pub(crate) index: usize,
}

impl<S> Replica<S> {
    pub(crate) fn new(state: S, energy: f64, beta: f64, index: usize) -> Self {
        Self {
            state,
            energy,
            beta,
            index,
        }
    }

    /// Current configuration held by the slot.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Energy of [`Replica::state`].
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Inverse temperature of the slot.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Temperature of the slot.
    pub fn temperature(&self) -> f64 {
        1.0 / self.beta
    }

    /// Ladder position assigned when the engine was built.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Consumes the replica, returning its configuration.
    pub fn into_state(self) -> S {
        self.state
    }
}

/// Initial configuration(s) handed to the engine constructor.
#[derive(Debug, Clone)]
pub enum InitialStates<S> {
    /// One configuration cloned into every slot.
    Shared(S),
    /// One configuration per slot, coldest first.
    PerSlot(Vec<S>),
}

impl<S: Clone> InitialStates<S> {
    /// Number of supplied configurations when it disagrees with `slots`.
    pub(crate) fn mismatch(&self, slots: usize) -> Option<usize> {
        match self {
            InitialStates::PerSlot(states) if states.len() != slots => Some(states.len()),
            _ => None,
        }
    }

    pub(crate) fn into_states(self, slots: usize) -> Vec<S> {
        match self {
            InitialStates::Shared(state) => vec![state; slots],
            InitialStates::PerSlot(states) => states,
        }
    }
}
