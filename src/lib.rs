//! The control-surface core of a CS-10 ⇄ MMC/MTC bridge.
//!
//! Everything except [`seq`] is substrate-independent: the state machine in
//! [`surface`] consumes decoded events and emits through the [`PortSink`]
//! seam, so it can be driven by the ALSA sequencer layer or by a test
//! harness alike.

pub mod address;
pub mod errors;
pub mod jog;
pub mod mixer;
pub mod persist;
pub mod ports;
pub mod smpte;
pub mod surface;
pub mod sysex;

#[cfg(target_os = "linux")]
pub mod seq;

pub use errors::InitError;
pub use mixer::{MixerState, TrackControl, TrackState};
pub use ports::PortSink;
pub use smpte::SmpteTime;
pub use surface::Surface;
