#![deny(missing_docs)]
#![doc = "Shared error taxonomy and deterministic RNG handle for the paratemp engine."]

pub mod errors;
pub mod rng;

pub use errors::{ErrorInfo, PtError};
pub use rng::{derive_substream_seed, RngHandle};
