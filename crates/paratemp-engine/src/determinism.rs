use paratemp_core::{derive_substream_seed, RngHandle};
use serde::{Deserialize, Serialize};

/// Which random streams drive local updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RngPolicy {
    /// A single stream drives local updates (slot order), coin flips and swap draws.
    #[default]
    Shared,
    /// Every slot owns a private stream for local updates; swaps use the engine stream.
    PerReplica,
}

/// Random source handed to the engine constructor.
#[derive(Debug, Clone)]
pub enum RngSource {
    /// Caller-owned stream used for every draw.
    Shared(RngHandle),
    /// Streams derived from a master seed, one per slot plus one for exchanges.
    PerReplica {
        /// Seed all substreams are derived from.
        master_seed: u64,
    },
}

impl RngSource {
    /// Builds the source for `policy` from a master seed.
    pub fn seeded(policy: RngPolicy, master_seed: u64) -> Self {
        match policy {
            RngPolicy::Shared => RngSource::Shared(RngHandle::from_seed(master_seed)),
            RngPolicy::PerReplica => RngSource::PerReplica { master_seed },
        }
    }

    /// Policy implied by the source.
    pub fn policy(&self) -> RngPolicy {
        match self {
            RngSource::Shared(_) => RngPolicy::Shared,
            RngSource::PerReplica { .. } => RngPolicy::PerReplica,
        }
    }

    /// Splits the source into the exchange stream and optional per-slot streams.
    pub(crate) fn into_streams(self, slots: usize) -> (RngHandle, Option<Vec<RngHandle>>) {
        match self {
            RngSource::Shared(rng) => (rng, None),
            RngSource::PerReplica { master_seed } => {
                let streams = (0..slots)
                    .map(|slot| RngHandle::from_seed(replica_seed(master_seed, slot)))
                    .collect();
                (RngHandle::from_seed(exchange_seed(master_seed)), Some(streams))
            }
        }
    }
}

/// Derives the deterministic seed used for a specific replica slot.
pub fn replica_seed(master_seed: u64, slot: usize) -> u64 {
    derive_substream_seed(master_seed, slot as u64)
}

/// Seed of the stream used for coin flips and swap acceptance draws.
pub fn exchange_seed(master_seed: u64) -> u64 {
    derive_substream_seed(master_seed ^ 0xA5A5_A5A5_A5A5_A5A5, u64::MAX)
}
