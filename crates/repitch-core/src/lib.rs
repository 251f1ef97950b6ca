//! repitch-core - vari-speed pitch compensation engine
//!
//! Bridges a fixed-size, fixed-period audio callback with a chunked
//! pitch-shifting engine while tracking the host's vari-speed transport,
//! so perceived pitch stays constant as playback speed changes.

pub mod bridge;
pub mod config;
pub mod error;
pub mod ring;
pub mod stretch;
pub mod transport;
pub mod types;

pub use bridge::RePitch;
pub use config::{EngineConfig, ShortfallPolicy};
pub use error::{RepitchError, RepitchResult};
pub use ring::RingBuffer;
pub use stretch::{SignalsmithStretcher, Stretcher};
pub use transport::{PositionReport, SyncState, TransportTracker};
pub use types::*;
