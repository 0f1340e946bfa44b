//! The ALSA sequencer substrate.
//!
//! One duplex, blocking client with two ports: `cs10-io` faces the physical
//! surface and `mmc-io` faces the workstation. Everything the state machine
//! emits goes out as a direct event to the owning port's subscribers and is
//! drained immediately, so the wire order follows emission order. Exactly
//! one blocking read is in flight at a time; each inbound event is handled
//! to completion before the next is read.

use std::ffi::CString;
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use alsa::seq::{Addr, EvCtrl, Event, EventType, PortCap, PortSubscribe, PortType, Seq};
use log::{debug, warn};

use crate::errors::InitError;
use crate::ports::PortSink;
use crate::surface::Surface;

const CLIENT_NAME: &str = "cs10";
const CONTROL_PORT_NAME: &str = "cs10-io";
const HOST_PORT_NAME: &str = "mmc-io";

static PREVIOUS_HANDLER: AtomicUsize = AtomicUsize::new(0);

extern "C" fn on_sigterm(_signal: libc::c_int) {
    // The event loop sits in a blocking read that the kernel restarts after
    // a handler returns, so a stop flag would never be observed while idle.
    // Restore whatever was installed before us and terminate right here;
    // the sequencer client and its ports are released with the process.
    unsafe {
        libc::signal(
            libc::SIGTERM,
            PREVIOUS_HANDLER.load(Ordering::SeqCst) as libc::sighandler_t,
        );
    }
    process::exit(0);
}

/// An inbound event, reduced to what the dispatcher needs.
enum Inbound {
    /// A new subscriber appeared; repaint so it sees consistent LEDs.
    Repaint,
    /// A control-change from the physical surface.
    SurfaceControl { param: u8, value: u8 },
    /// A virtual-control move from a peer on the host port.
    HostControl { channel: u8, param: u8, value: u8 },
    /// A sysex on the host port.
    HostSysex(Vec<u8>),
    /// An MTC quarter frame on the host port.
    QuarterFrame(u8),
    /// Non-controller traffic from the surface, relayed to the host side.
    Forward(Event<'static>),
    Ignored,
}

/// The sequencer client and its two ports.
pub struct SeqBridge {
    seq: Seq,
    control_port: i32,
    host_port: i32,
}

impl SeqBridge {
    /// Open the client and create both ports. Either failure is fatal.
    pub fn open() -> Result<SeqBridge, InitError> {
        let seq = Seq::open(None, None, false).map_err(|err| {
            warn!("cannot open sequencer: {}", err);
            InitError::SequencerUnavailable
        })?;
        let client_name =
            CString::new(CLIENT_NAME).ok().expect("client name must not contain null bytes");
        seq.set_client_name(&client_name)
            .map_err(|_| InitError::SequencerUnavailable)?;

        let caps = PortCap::READ | PortCap::WRITE | PortCap::SUBS_READ | PortCap::SUBS_WRITE;
        let port_type = PortType::MIDI_GENERIC | PortType::APPLICATION;
        let control_port = seq
            .create_simple_port(
                &CString::new(CONTROL_PORT_NAME)
                    .ok()
                    .expect("port name must not contain null bytes"),
                caps,
                port_type,
            )
            .map_err(|err| {
                warn!("cannot create control port: {}", err);
                InitError::PortCreationFailed
            })?;
        let host_port = seq
            .create_simple_port(
                &CString::new(HOST_PORT_NAME)
                    .ok()
                    .expect("port name must not contain null bytes"),
                caps,
                port_type,
            )
            .map_err(|err| {
                warn!("cannot create host port: {}", err);
                InitError::PortCreationFailed
            })?;

        Ok(SeqBridge {
            seq,
            control_port,
            host_port,
        })
    }

    /// Install the SIGTERM hook. When the signal fires the previous
    /// disposition is restored and the process exits.
    pub fn install_signal_handler() {
        let handler = on_sigterm as extern "C" fn(libc::c_int);
        let previous = unsafe { libc::signal(libc::SIGTERM, handler as libc::sighandler_t) };
        PREVIOUS_HANDLER.store(previous as usize, Ordering::SeqCst);
    }

    /// Subscribe the control port to a hardware client in both directions,
    /// best-effort.
    pub fn connect_hardware(&self, client: i32, port: i32) {
        let me = match self.seq.client_id() {
            Ok(id) => id,
            Err(err) => {
                warn!("cannot query client id: {}", err);
                return;
            }
        };
        let hardware = Addr { client, port };
        let local = Addr {
            client: me,
            port: self.control_port,
        };
        for (sender, dest) in [(hardware, local), (local, hardware)] {
            match PortSubscribe::empty() {
                Ok(subscription) => {
                    subscription.set_sender(sender);
                    subscription.set_dest(dest);
                    if let Err(err) = self.seq.subscribe_port(&subscription) {
                        warn!(
                            "cannot connect {}:{} -> {}:{}: {}",
                            sender.client, sender.port, dest.client, dest.port, err
                        );
                    }
                }
                Err(err) => warn!("cannot allocate subscription: {}", err),
            }
        }
    }

    /// Run the dispatcher until the substrate fails. SIGTERM never returns
    /// here; its handler exits the process directly.
    pub fn run(&mut self, surface: &mut Surface) {
        surface.repaint(self);

        loop {
            let inbound = {
                let mut input = self.seq.input();
                match input.event_input() {
                    Ok(event) => self.classify(event),
                    Err(err) => {
                        if err.errno() == libc::EINTR {
                            continue;
                        }
                        warn!("sequencer input failed: {}", err);
                        break;
                    }
                }
            };

            match inbound {
                Inbound::Repaint => surface.repaint(self),
                Inbound::SurfaceControl { param, value } => {
                    surface.handle_control_input(self, param, value)
                }
                Inbound::HostControl {
                    channel,
                    param,
                    value,
                } => surface.receive_virtual_control(self, channel, param, value),
                Inbound::HostSysex(bytes) => surface.receive_host_sysex(self, &bytes),
                Inbound::QuarterFrame(data) => surface.receive_qframe(self, data),
                Inbound::Forward(event) => self.forward(event),
                Inbound::Ignored => {}
            }
        }
    }

    fn classify(&self, event: Event) -> Inbound {
        if event.get_type() == EventType::PortSubscribed {
            return Inbound::Repaint;
        }

        let dest = event.get_dest();
        if dest.port == self.host_port {
            match event.get_type() {
                EventType::Sysex => match event.get_ext() {
                    Some(bytes) => Inbound::HostSysex(bytes.to_vec()),
                    None => Inbound::Ignored,
                },
                EventType::Qframe => match event.get_data::<EvCtrl>() {
                    Some(data) => Inbound::QuarterFrame((data.value & 0x7f) as u8),
                    None => Inbound::Ignored,
                },
                EventType::Controller => match event.get_data::<EvCtrl>() {
                    Some(data) if data.param <= 0x7f => Inbound::HostControl {
                        channel: data.channel,
                        param: data.param as u8,
                        value: (data.value & 0x7f) as u8,
                    },
                    _ => Inbound::Ignored,
                },
                _ => Inbound::Ignored,
            }
        } else if dest.port == self.control_port {
            match event.get_type() {
                EventType::Controller => match event.get_data::<EvCtrl>() {
                    Some(data) if data.param <= 0x7f => Inbound::SurfaceControl {
                        param: data.param as u8,
                        value: (data.value & 0x7f) as u8,
                    },
                    _ => Inbound::Ignored,
                },
                // The surface also produces non-controller traffic (notes
                // from the footswitch jack, etc.); relay it untouched.
                _ => Inbound::Forward(event.into_owned()),
            }
        } else {
            Inbound::Ignored
        }
    }

    fn forward(&mut self, mut event: Event<'static>) {
        event.set_source(self.host_port);
        event.set_subs();
        event.set_direct();
        self.emit(event);
    }

    fn send_sysex(&mut self, port: i32, bytes: &[u8]) {
        let mut event = Event::new_ext(EventType::Sysex, bytes);
        event.set_source(port);
        event.set_subs();
        event.set_direct();
        self.emit(event);
    }

    fn emit(&mut self, mut event: Event) {
        if let Err(err) = self.seq.event_output(&mut event) {
            debug!("dropped outbound event: {}", err);
            return;
        }
        if let Err(err) = self.seq.drain_output() {
            debug!("outbound drain failed: {}", err);
        }
    }
}

impl PortSink for SeqBridge {
    fn surface_sysex(&mut self, bytes: &[u8]) {
        self.send_sysex(self.control_port, bytes);
    }

    fn host_sysex(&mut self, bytes: &[u8]) {
        self.send_sysex(self.host_port, bytes);
    }

    fn host_control(&mut self, channel: u8, param: u8, value: u8) {
        let mut event = Event::new(
            EventType::Controller,
            &EvCtrl {
                channel,
                param: u32::from(param),
                value: i32::from(value),
            },
        );
        event.set_source(self.host_port);
        event.set_subs();
        event.set_direct();
        self.emit(event);
    }

    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

impl Drop for SeqBridge {
    fn drop(&mut self) {
        // LIFO teardown; the handle itself closes when `seq` drops.
        let _ = self.seq.delete_port(self.host_port);
        let _ = self.seq.delete_port(self.control_port);
    }
}
