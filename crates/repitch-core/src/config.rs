//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::types::{MAX_BLOCK_SIZE, RING_CAPACITY, SAMPLE_RATE};

/// Policy for satisfying the host's output demand when the stretcher has
/// produced fewer samples than requested
///
/// Both policies are deliberate designs, not bug/fix pairs. `Buffered`
/// trades latency for continuity; `Strict` keeps latency minimal at the
/// cost of whole silent blocks during warm-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortfallPolicy {
    /// Drain stretcher output into a ring buffer and read fixed blocks
    /// from it. A shortfall produces a zero-filled *prefix*, never a
    /// shifted or truncated signal.
    #[default]
    Buffered,
    /// Request the full block directly from the stretcher. If fewer
    /// samples are available the entire block is emitted as silence.
    Strict,
}

impl ShortfallPolicy {
    /// Get display name for UI / logs
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Buffered => "Buffered (ring)",
            Self::Strict => "Strict (no buffer)",
        }
    }
}

/// Configuration for a [`RePitch`](crate::bridge::RePitch) instance
///
/// All sizes are fixed at construction; nothing here can change while the
/// engine is processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Host sample rate in Hz
    pub sample_rate: u32,
    /// Ring buffer capacity in samples (power of two)
    pub ring_capacity: usize,
    /// Largest host block size the engine is dimensioned for, in samples.
    /// The stretcher's undrained-output queue is sized from this;
    /// callbacks must not request more.
    pub max_block_size: usize,
    /// Output shortfall handling policy
    pub shortfall_policy: ShortfallPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            ring_capacity: RING_CAPACITY,
            max_block_size: MAX_BLOCK_SIZE,
            shortfall_policy: ShortfallPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create a config for the given host sample rate, with defaults for
    /// everything else
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }
}
