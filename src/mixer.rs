//! The virtual mixer.
//!
//! Four banks of eight physical strips multiplex onto 32 virtual tracks.
//! Each track carries ten controls, enumerated by [`TrackControl`], which
//! also defines the wire encoding used for virtual-controller traffic on
//! the host port: bank selects the MIDI channel, and the controller number
//! packs the physical strip together with the control.

pub const NUM_BANKS: usize = 4;
pub const PHYSICAL_TRACKS: usize = 8;
pub const VIRTUAL_TRACKS: usize = NUM_BANKS * PHYSICAL_TRACKS;
pub const NUM_KNOBS: usize = 6;

/// First MIDI channel used for virtual-controller traffic; bank `n` uses
/// channel `CONTROL_CHANNEL_BASE + n`.
pub const CONTROL_CHANNEL_BASE: u8 = 0;

use crate::address;

/// One of the ten controls on a virtual track, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackControl {
    Armed,
    Mute,
    Solo,
    Fader,
    BoostCut,
    Frequency,
    Bandwidth,
    SendOne,
    SendTwo,
    Pan,
}

impl TrackControl {
    /// Controls per track; also the stride of the controller-number grid.
    pub const COUNT: u8 = 10;

    const ALL: [TrackControl; 10] = [
        TrackControl::Armed,
        TrackControl::Mute,
        TrackControl::Solo,
        TrackControl::Fader,
        TrackControl::BoostCut,
        TrackControl::Frequency,
        TrackControl::Bandwidth,
        TrackControl::SendOne,
        TrackControl::SendTwo,
        TrackControl::Pan,
    ];

    /// All ten controls in wire order.
    pub fn iter() -> impl Iterator<Item = TrackControl> {
        Self::ALL.into_iter()
    }

    /// Position of this control in the wire grid.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Inverse of [`index`](Self::index).
    pub fn from_index(index: u8) -> Option<TrackControl> {
        Self::ALL.get(index as usize).copied()
    }

    /// Control addressed by a physical knob controller number.
    pub fn from_knob_addr(addr: u8) -> Option<TrackControl> {
        if !(address::FIRST_KNOB..=address::LAST_KNOB).contains(&addr) {
            return None;
        }
        Self::from_index(addr - address::FIRST_KNOB + TrackControl::BoostCut.index())
    }

    /// Continuous controls carry their value on the wire; the three toggles
    /// are transmitted as press/release pulses instead.
    pub fn is_continuous(self) -> bool {
        !matches!(
            self,
            TrackControl::Armed | TrackControl::Mute | TrackControl::Solo
        )
    }
}

/// Per-track state. Everything starts at zero and is mutated by physical
/// input, by peer controller messages, and by snapshot restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackState {
    pub armed: bool,
    pub mute: bool,
    pub solo: bool,
    pub fader: u8,
    pub knobs: [u8; NUM_KNOBS],
}

impl TrackState {
    /// Raw value of one control; toggles read back as 0 or 1.
    pub fn value(&self, control: TrackControl) -> u8 {
        match control {
            TrackControl::Armed => self.armed as u8,
            TrackControl::Mute => self.mute as u8,
            TrackControl::Solo => self.solo as u8,
            TrackControl::Fader => self.fader,
            TrackControl::BoostCut => self.knobs[0],
            TrackControl::Frequency => self.knobs[1],
            TrackControl::Bandwidth => self.knobs[2],
            TrackControl::SendOne => self.knobs[3],
            TrackControl::SendTwo => self.knobs[4],
            TrackControl::Pan => self.knobs[5],
        }
    }

    /// Store a raw wire value; any nonzero value latches a toggle on.
    pub fn set_value(&mut self, control: TrackControl, value: u8) {
        match control {
            TrackControl::Armed => self.armed = value != 0,
            TrackControl::Mute => self.mute = value != 0,
            TrackControl::Solo => self.solo = value != 0,
            TrackControl::Fader => self.fader = value,
            TrackControl::BoostCut => self.knobs[0] = value,
            TrackControl::Frequency => self.knobs[1] = value,
            TrackControl::Bandwidth => self.knobs[2] = value,
            TrackControl::SendOne => self.knobs[3] = value,
            TrackControl::SendTwo => self.knobs[4] = value,
            TrackControl::Pan => self.knobs[5] = value,
        }
    }
}

/// The 32 virtual tracks. The physical view is always the slice
/// `tracks[bank * PHYSICAL_TRACKS ..][..PHYSICAL_TRACKS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixerState {
    pub tracks: [TrackState; VIRTUAL_TRACKS],
}

impl Default for MixerState {
    fn default() -> MixerState {
        MixerState {
            tracks: [TrackState::default(); VIRTUAL_TRACKS],
        }
    }
}

/// Wire encoding of one virtual-control move.
pub fn encode_virtual_control(track: usize, control: TrackControl) -> (u8, u8) {
    let bank = track / PHYSICAL_TRACKS;
    let strip = track % PHYSICAL_TRACKS;
    (
        CONTROL_CHANNEL_BASE + bank as u8,
        strip as u8 * TrackControl::COUNT + control.index(),
    )
}

/// Inverse of [`encode_virtual_control`]. Controller numbers outside the
/// 8-strip × 10-control grid, or channels outside the four banks, are
/// rejected.
pub fn decode_virtual_control(channel: u8, param: u8) -> Option<(usize, TrackControl)> {
    let bank = channel.checked_sub(CONTROL_CHANNEL_BASE)?;
    if usize::from(bank) >= NUM_BANKS || param >= PHYSICAL_TRACKS as u8 * TrackControl::COUNT {
        return None;
    }
    let track = usize::from(param / TrackControl::COUNT) + usize::from(bank) * PHYSICAL_TRACKS;
    let control = TrackControl::from_index(param % TrackControl::COUNT)?;
    Some((track, control))
}
