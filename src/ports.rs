//! The seam between the state machine and the MIDI substrate.

use std::time::Duration;

/// Where the surface's outbound traffic goes.
///
/// Implementations are best-effort: a failed write is logged by the
/// substrate and never retried, so every method is infallible from the
/// caller's viewpoint. All traffic emitted while handling a single inbound
/// event must reach the wire before the next event is read.
pub trait PortSink {
    /// Sysex bytes for the physical surface (LEDs and display digits).
    fn surface_sysex(&mut self, bytes: &[u8]);

    /// Sysex bytes for the host (MMC commands).
    fn host_sysex(&mut self, bytes: &[u8]);

    /// A control-change for the host (virtual-control traffic).
    fn host_control(&mut self, channel: u8, param: u8, value: u8);

    /// Pause between interpolation steps while restoring a snapshot. The
    /// surface is deliberately unresponsive for the duration.
    fn pause(&mut self, duration: Duration);
}
