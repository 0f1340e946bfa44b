//! The control-surface state machine.
//!
//! One [`Surface`] exclusively owns the mixer, the transport state and the
//! panel state for the lifetime of the process. Every inbound event is
//! handled to completion here; outbound traffic leaves through the
//! [`PortSink`] the caller passes in, which keeps the machine independent
//! of the MIDI substrate (and testable without one).

use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::address as addr;
use crate::jog::JogWheel;
use crate::mixer::{self, MixerState, TrackControl, NUM_BANKS, PHYSICAL_TRACKS, VIRTUAL_TRACKS};
use crate::persist::{self, NUM_SLOTS};
use crate::ports::PortSink;
use crate::smpte::{QuarterFrameAssembler, SmpteTime};
use crate::sysex::{self, HostSysex, MmcCommand, MMC_DEVICE_ALL};

/// Delay between interpolation steps when walking a continuous control
/// toward a snapshot value, so the peer (and any motorised fader tracking
/// it) never sees a jump.
pub const RESTORE_STEP_DELAY: Duration = Duration::from_millis(5);

/// The five-state ring behind the Mode button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Select,
    Locate,
    Mute,
    Solo,
    Nullify,
}

impl Mode {
    fn next(self) -> Mode {
        match self {
            Mode::Select => Mode::Locate,
            Mode::Locate => Mode::Mute,
            Mode::Mute => Mode::Solo,
            Mode::Solo => Mode::Nullify,
            Mode::Nullify => Mode::Select,
        }
    }
}

/// What the two-digit display is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Smpte,
    Bank,
}

impl DisplayMode {
    fn toggled(self) -> DisplayMode {
        match self {
            DisplayMode::Smpte => DisplayMode::Bank,
            DisplayMode::Bank => DisplayMode::Smpte,
        }
    }
}

/// Which field of the transport time the display is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmpteField {
    Hours,
    Minutes,
    Seconds,
    Frames,
}

impl SmpteField {
    fn next(self) -> SmpteField {
        match self {
            SmpteField::Hours => SmpteField::Minutes,
            SmpteField::Minutes => SmpteField::Seconds,
            SmpteField::Seconds => SmpteField::Frames,
            SmpteField::Frames => SmpteField::Hours,
        }
    }

    fn prev(self) -> SmpteField {
        match self {
            SmpteField::Hours => SmpteField::Frames,
            SmpteField::Minutes => SmpteField::Hours,
            SmpteField::Seconds => SmpteField::Minutes,
            SmpteField::Frames => SmpteField::Seconds,
        }
    }
}

/// The whole bridge state: mixer, transport and panel.
pub struct Surface {
    mixer: MixerState,

    current_time: SmpteTime,
    qframe: QuarterFrameAssembler,
    play_from: SmpteTime,
    record_from: SmpteTime,
    saved_snapshots: [MixerState; NUM_SLOTS],
    saved_positions: [SmpteTime; NUM_SLOTS],

    bank: usize,
    mode: Mode,
    display_mode: DisplayMode,
    smpte_field: SmpteField,
    selected_track: usize,
    shift_held: bool,
    record_held: bool,
    ignore_record_release: bool,
    jog: JogWheel,
    // Last digits written to the display, to suppress redundant writes.
    display_ones: u8,
    display_tens: u8,

    settings_path: Option<PathBuf>,
}

impl Surface {
    /// Build a surface with everything zeroed, then pull any previously
    /// saved snapshots and positions from `settings_path`.
    pub fn new(settings_path: Option<PathBuf>) -> Surface {
        let mut surface = Surface {
            mixer: MixerState::default(),
            current_time: SmpteTime::default(),
            qframe: QuarterFrameAssembler::default(),
            play_from: SmpteTime::default(),
            record_from: SmpteTime::default(),
            saved_snapshots: [MixerState::default(); NUM_SLOTS],
            saved_positions: [SmpteTime::default(); NUM_SLOTS],
            bank: 0,
            mode: Mode::Select,
            display_mode: DisplayMode::Smpte,
            smpte_field: SmpteField::Hours,
            selected_track: 0,
            shift_held: false,
            record_held: false,
            ignore_record_release: false,
            jog: JogWheel::default(),
            display_ones: 0,
            display_tens: 0,
            settings_path,
        };
        if let Some(path) = surface.settings_path.clone() {
            persist::load(
                &path,
                &mut surface.saved_snapshots,
                &mut surface.saved_positions,
            );
        }
        surface
    }

    pub fn mixer(&self) -> &MixerState {
        &self.mixer
    }

    pub fn current_time(&self) -> SmpteTime {
        self.current_time
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn bank(&self) -> usize {
        self.bank
    }

    pub fn selected_track(&self) -> usize {
        self.selected_track
    }

    // ── Inbound dispatch ────────────────────────────────────────────────

    /// Dispatch one control-change from the physical surface. Unknown
    /// controller numbers are dropped.
    pub fn handle_control_input(&mut self, io: &mut impl PortSink, param: u8, value: u8) {
        match param {
            addr::FIRST_BUTTON..=addr::LAST_BUTTON => self.handle_button(io, param, value),
            addr::FIRST_FADER..=addr::LAST_FADER => self.handle_fader(io, param, value),
            addr::FIRST_KNOB..=addr::LAST_KNOB => self.handle_knob(io, param, value),
            addr::WHEEL => self.handle_wheel(io, value),
            _ => debug!("dropped surface input {:#04x} = {}", param, value),
        }
    }

    /// One button edge from the surface.
    pub fn handle_button(&mut self, io: &mut impl PortSink, button: u8, value: u8) {
        debug!("button {:#04x} value {}", button, value);

        if (addr::FIRST_TRACK_BUTTON..=addr::LAST_TRACK_BUTTON).contains(&button) {
            if value == addr::BUTTON_UP {
                self.track_button(io, addr::button_to_track(button));
            }
            return;
        }

        if (addr::FIRST_F_BUTTON..=addr::LAST_F_BUTTON).contains(&button) {
            self.function_button(io, usize::from(button - addr::FIRST_F_BUTTON));
            return;
        }

        match button {
            addr::SHIFT_BUTTON => self.shift_held = value == addr::BUTTON_DOWN,

            addr::REW_BUTTON if value == addr::BUTTON_UP => {
                if self.shift_held {
                    self.mmc_goto(io, SmpteTime::ZERO);
                } else {
                    self.mmc_command(io, MmcCommand::Rewind);
                }
            }

            addr::FF_BUTTON if value == addr::BUTTON_UP => {
                self.mmc_command(io, MmcCommand::FastForward)
            }

            addr::STOP_BUTTON if value == addr::BUTTON_UP => self.mmc_command(io, MmcCommand::Stop),

            addr::PLAY_BUTTON if value == addr::BUTTON_UP => {
                if self.shift_held {
                    self.mmc_goto(io, self.play_from);
                } else {
                    self.play_from = self.current_time;
                    self.mmc_command(io, MmcCommand::Play);
                }
            }

            addr::RECORD_BUTTON => {
                self.record_held = value == addr::BUTTON_DOWN;
                if !self.record_held {
                    if self.ignore_record_release {
                        // This release ended a save chord, not a transport
                        // request.
                        self.ignore_record_release = false;
                    } else if self.shift_held {
                        self.mmc_goto(io, self.record_from);
                    } else {
                        self.record_from = self.current_time;
                        self.mmc_command(io, MmcCommand::RecordPause);
                    }
                }
            }

            addr::MODE_BUTTON if value == addr::BUTTON_UP => {
                self.mode = self.mode.next();
                self.repaint(io);
            }

            addr::RIGHT_BUTTON if value == addr::BUTTON_UP => {
                if self.display_mode == DisplayMode::Bank {
                    self.bank = (self.bank + 1) % NUM_BANKS;
                    self.display_bank(io);
                    self.repaint(io);
                } else {
                    self.smpte_field = self.smpte_field.next();
                    self.display_time(io);
                }
            }

            addr::LEFT_BUTTON if value == addr::BUTTON_UP => {
                if self.display_mode == DisplayMode::Bank {
                    self.bank = (self.bank + NUM_BANKS - 1) % NUM_BANKS;
                    self.display_bank(io);
                    self.repaint(io);
                } else {
                    self.smpte_field = self.smpte_field.prev();
                    self.display_time(io);
                }
            }

            addr::UP_BUTTON | addr::DOWN_BUTTON if value == addr::BUTTON_UP => {
                self.display_mode = self.display_mode.toggled();
                if self.display_mode == DisplayMode::Bank {
                    self.set_led(io, addr::TENS_DEC_LED, addr::LED_OFF);
                    self.set_led(io, addr::ONES_DEC_LED, addr::LED_OFF);
                    self.display_bank(io);
                } else {
                    self.display_time(io);
                }
            }

            _ => {}
        }
    }

    fn track_button(&mut self, io: &mut impl PortSink, track: usize) {
        match self.mode {
            Mode::Select | Mode::Nullify => {
                self.set_led(io, addr::track_led(self.selected_track), addr::LED_OFF);
                self.selected_track = track;
                self.set_led(io, addr::track_led(track), addr::LED_ON);
            }
            Mode::Locate => self.toggle_track_control(io, track, TrackControl::Armed),
            Mode::Mute => self.toggle_track_control(io, track, TrackControl::Mute),
            Mode::Solo => self.toggle_track_control(io, track, TrackControl::Solo),
        }
    }

    fn toggle_track_control(&mut self, io: &mut impl PortSink, track: usize, control: TrackControl) {
        let virtual_track = self.bank * PHYSICAL_TRACKS + track;
        let state = &mut self.mixer.tracks[virtual_track];
        let on = state.value(control) == 0;
        state.set_value(control, on as u8);

        // The peer interprets toggles, so one press/release pulse flips it.
        self.issue_virtual_control(io, virtual_track, control, addr::BUTTON_DOWN);
        self.issue_virtual_control(io, virtual_track, control, addr::BUTTON_UP);

        self.set_led(
            io,
            addr::track_led(track),
            if on { addr::LED_ON } else { addr::LED_OFF },
        );
    }

    fn function_button(&mut self, io: &mut impl PortSink, slot: usize) {
        if self.shift_held {
            if self.record_held {
                self.ignore_record_release = true;
                self.saved_positions[slot] = self.current_time;
                self.save_settings();
            } else {
                self.mmc_goto(io, self.saved_positions[slot]);
            }
        } else if self.record_held {
            self.ignore_record_release = true;
            self.saved_snapshots[slot] = self.mixer;
            self.save_settings();
        } else {
            self.restore_snapshot(io, slot);
            self.display_bank(io);
        }
    }

    /// One fader move. In Nullify mode only the null indicators react; the
    /// operator aligns the physical fader with the stored value before
    /// leaving the mode.
    pub fn handle_fader(&mut self, io: &mut impl PortSink, fader: u8, value: u8) {
        debug!("fader {:#04x} value {}", fader, value);

        let track = self.bank * PHYSICAL_TRACKS + addr::fader_to_track(fader);
        if self.mode == Mode::Nullify {
            let stored = self.mixer.tracks[track].fader;
            let (down, up) = if value < stored {
                (addr::LED_OFF, addr::LED_ON)
            } else if value > stored {
                (addr::LED_ON, addr::LED_OFF)
            } else {
                (addr::LED_OFF, addr::LED_OFF)
            };
            self.set_led(io, addr::DOWN_NULL_LED, down);
            self.set_led(io, addr::UP_NULL_LED, up);
        } else {
            self.mixer.tracks[track].fader = value;
            self.issue_virtual_control(io, track, TrackControl::Fader, value);
        }
    }

    /// One knob move; knobs always act on the selected track.
    pub fn handle_knob(&mut self, io: &mut impl PortSink, knob: u8, value: u8) {
        debug!("knob {:#04x} value {}", knob, value);

        let Some(control) = TrackControl::from_knob_addr(knob) else {
            return;
        };
        let track = self.bank * PHYSICAL_TRACKS + self.selected_track;
        if self.mode == Mode::Nullify {
            let stored = self.mixer.tracks[track].value(control);
            let (left, right) = if value < stored {
                (addr::LED_OFF, addr::LED_ON)
            } else if value > stored {
                (addr::LED_ON, addr::LED_OFF)
            } else {
                (addr::LED_OFF, addr::LED_OFF)
            };
            self.set_led(io, addr::LEFT_WHEEL_LED, left);
            self.set_led(io, addr::RIGHT_WHEEL_LED, right);
        } else {
            self.mixer.tracks[track].set_value(control, value);
            self.issue_virtual_control(io, track, control, value);
        }
    }

    /// One jog-wheel report.
    pub fn handle_wheel(&mut self, io: &mut impl PortSink, value: u8) {
        debug!("wheel value {}", value);
        if let Some(step) = self.jog.feed(value) {
            io.host_sysex(&sysex::mmc_step(MMC_DEVICE_ALL, step));
        }
    }

    /// A sysex from the host port. Only MTC full frames and MMC locate are
    /// acted on; everything else is dropped.
    pub fn receive_host_sysex(&mut self, io: &mut impl PortSink, data: &[u8]) {
        match sysex::decode_host_sysex(data) {
            Some(HostSysex::FullFrame(time)) | Some(HostSysex::Locate(time)) => {
                // Rate flags only ever come from quarter frames.
                self.current_time.hours = time.hours;
                self.current_time.minutes = time.minutes;
                self.current_time.seconds = time.seconds;
                self.current_time.frames = time.frames;
                self.update_display_time(io);
                debug!("transport time {}", self.current_time);
            }
            None => debug!("ignored host sysex ({} bytes)", data.len()),
        }
    }

    /// One MTC quarter-frame data byte from the host port.
    pub fn receive_qframe(&mut self, io: &mut impl PortSink, data: u8) {
        if let Some(time) = self.qframe.feed(data) {
            self.current_time = time;
            self.update_display_time(io);
            debug!("transport time {}", self.current_time);
        }
    }

    /// A virtual-control move from a peer, for any bank.
    pub fn receive_virtual_control(
        &mut self,
        io: &mut impl PortSink,
        channel: u8,
        param: u8,
        value: u8,
    ) {
        let Some((track, control)) = mixer::decode_virtual_control(channel, param) else {
            debug!("dropped host control ch {} param {}", channel, param);
            return;
        };
        self.mixer.tracks[track].set_value(control, value);
        if !control.is_continuous() {
            self.repaint(io);
        }
    }

    // ── Outbound helpers ────────────────────────────────────────────────

    fn set_led(&self, io: &mut impl PortSink, led: u8, value: u8) {
        io.surface_sysex(&sysex::led_set(led, value));
    }

    fn mmc_command(&self, io: &mut impl PortSink, command: MmcCommand) {
        io.host_sysex(&sysex::mmc_command(MMC_DEVICE_ALL, command));
    }

    fn mmc_goto(&self, io: &mut impl PortSink, time: SmpteTime) {
        io.host_sysex(&sysex::mmc_goto(MMC_DEVICE_ALL, time));
    }

    fn issue_virtual_control(
        &self,
        io: &mut impl PortSink,
        track: usize,
        control: TrackControl,
        value: u8,
    ) {
        let (channel, param) = mixer::encode_virtual_control(track, control);
        io.host_control(channel, param, value);
    }

    // ── Snapshots ───────────────────────────────────────────────────────

    /// Drive the host to a saved snapshot, then adopt it as the live state.
    ///
    /// Toggles are pulsed only where saved and live disagree; continuous
    /// controls walk one unit at a time with a bounded pause after each
    /// step. No inbound event is processed during the walk.
    fn restore_snapshot(&mut self, io: &mut impl PortSink, slot: usize) {
        let target = self.saved_snapshots[slot];
        for track in 0..VIRTUAL_TRACKS {
            for control in TrackControl::iter() {
                if control.is_continuous() {
                    loop {
                        let current = self.mixer.tracks[track].value(control);
                        let wanted = target.tracks[track].value(control);
                        if current == wanted {
                            break;
                        }
                        let next = if current > wanted {
                            current - 1
                        } else {
                            current + 1
                        };
                        self.mixer.tracks[track].set_value(control, next);
                        self.issue_virtual_control(io, track, control, next);
                        io.pause(RESTORE_STEP_DELAY);
                    }
                } else if self.mixer.tracks[track].value(control)
                    != target.tracks[track].value(control)
                {
                    self.issue_virtual_control(io, track, control, addr::BUTTON_DOWN);
                    self.issue_virtual_control(io, track, control, addr::BUTTON_UP);
                }
            }
        }
        self.mixer = target;
    }

    fn save_settings(&self) {
        let Some(path) = &self.settings_path else {
            return;
        };
        if let Err(err) = persist::save(path, &self.saved_snapshots, &self.saved_positions) {
            log::warn!("failed to save settings to {}: {}", path.display(), err);
        }
    }

    // ── LEDs and display ────────────────────────────────────────────────

    /// Repaint the mode LEDs, the track LEDs and the null indicators for
    /// the current mode. Called on every mode or bank change, and whenever
    /// a new subscriber appears.
    pub fn repaint(&self, io: &mut impl PortSink) {
        self.set_led(io, addr::SELECT_LED, addr::LED_OFF);
        self.set_led(io, addr::LOCATE_LED, addr::LED_OFF);
        self.set_led(io, addr::MUTE_LED, addr::LED_OFF);
        self.set_led(io, addr::SOLO_LED, addr::LED_OFF);

        match self.mode {
            Mode::Select => {
                self.set_led(io, addr::SELECT_LED, addr::LED_ON);
                self.clear_null_leds(io);
                self.paint_selected_track(io);
            }
            Mode::Locate => {
                self.set_led(io, addr::LOCATE_LED, addr::LED_ON);
                self.clear_null_leds(io);
                self.paint_track_flags(io, TrackControl::Armed);
            }
            Mode::Mute => {
                self.set_led(io, addr::MUTE_LED, addr::LED_ON);
                self.clear_null_leds(io);
                self.paint_track_flags(io, TrackControl::Mute);
            }
            Mode::Solo => {
                self.set_led(io, addr::SOLO_LED, addr::LED_ON);
                self.clear_null_leds(io);
                self.paint_track_flags(io, TrackControl::Solo);
            }
            Mode::Nullify => {
                self.set_led(io, addr::SELECT_LED, addr::LED_ON);
                self.set_led(io, addr::LOCATE_LED, addr::LED_ON);
                self.set_led(io, addr::MUTE_LED, addr::LED_ON);
                self.set_led(io, addr::SOLO_LED, addr::LED_ON);
                self.set_led(io, addr::DOWN_NULL_LED, addr::LED_ON);
                self.set_led(io, addr::UP_NULL_LED, addr::LED_ON);
                self.set_led(io, addr::LEFT_WHEEL_LED, addr::LED_ON);
                self.set_led(io, addr::RIGHT_WHEEL_LED, addr::LED_ON);
                self.paint_selected_track(io);
            }
        }
    }

    fn clear_null_leds(&self, io: &mut impl PortSink) {
        self.set_led(io, addr::DOWN_NULL_LED, addr::LED_OFF);
        self.set_led(io, addr::UP_NULL_LED, addr::LED_OFF);
        self.set_led(io, addr::LEFT_WHEEL_LED, addr::LED_OFF);
        self.set_led(io, addr::RIGHT_WHEEL_LED, addr::LED_OFF);
    }

    fn paint_selected_track(&self, io: &mut impl PortSink) {
        for track in 0..PHYSICAL_TRACKS {
            self.set_led(io, addr::track_led(track), addr::LED_OFF);
        }
        self.set_led(io, addr::track_led(self.selected_track), addr::LED_ON);
    }

    fn paint_track_flags(&self, io: &mut impl PortSink, control: TrackControl) {
        for track in 0..PHYSICAL_TRACKS {
            let lit =
                self.mixer.tracks[self.bank * PHYSICAL_TRACKS + track].value(control) != 0;
            self.set_led(
                io,
                addr::track_led(track),
                if lit { addr::LED_ON } else { addr::LED_OFF },
            );
        }
    }

    /// Show the bank number; the tens digit is blanked. The digit cache is
    /// not touched here, it only mediates SMPTE updates.
    fn display_bank(&self, io: &mut impl PortSink) {
        self.set_led(io, addr::ONES_SSD, addr::HEX_TO_SSD[self.bank % 10]);
        self.set_led(io, addr::TENS_SSD, 0);
    }

    fn smpte_field_value(&self) -> u8 {
        match self.smpte_field {
            SmpteField::Hours => self.current_time.hours,
            SmpteField::Minutes => self.current_time.minutes,
            SmpteField::Seconds => self.current_time.seconds,
            SmpteField::Frames => self.current_time.frames,
        }
    }

    /// Full SMPTE refresh: both decimal points (which identify the shown
    /// field) and both digits, unconditionally.
    fn display_time(&mut self, io: &mut impl PortSink) {
        let data = self.smpte_field_value();
        let (tens_dp, ones_dp) = match self.smpte_field {
            SmpteField::Hours => (addr::LED_ON, addr::LED_ON),
            SmpteField::Minutes => (addr::LED_ON, addr::LED_OFF),
            SmpteField::Seconds => (addr::LED_OFF, addr::LED_ON),
            SmpteField::Frames => (addr::LED_OFF, addr::LED_OFF),
        };
        self.set_led(io, addr::TENS_DEC_LED, tens_dp);
        self.set_led(io, addr::ONES_DEC_LED, ones_dp);

        self.set_led(io, addr::ONES_SSD, addr::HEX_TO_SSD[usize::from(data % 10)]);
        self.set_led(io, addr::TENS_SSD, addr::HEX_TO_SSD[usize::from(data / 10)]);
        self.display_ones = data % 10;
        self.display_tens = data / 10;
    }

    /// Re-emit only the digits that changed since the last write. A no-op
    /// outside SMPTE display mode.
    fn update_display_time(&mut self, io: &mut impl PortSink) {
        if self.display_mode != DisplayMode::Smpte {
            return;
        }
        let data = self.smpte_field_value();
        let ones = data % 10;
        let tens = data / 10;
        if ones != self.display_ones {
            self.set_led(io, addr::ONES_SSD, addr::HEX_TO_SSD[usize::from(ones)]);
            self.display_ones = ones;
        }
        if tens != self.display_tens {
            self.set_led(io, addr::TENS_SSD, addr::HEX_TO_SSD[usize::from(tens)]);
            self.display_tens = tens;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address as addr;
    use crate::mixer::TrackState;

    /// A sink that records everything the surface emits.
    #[derive(Default)]
    struct Recorder {
        surface: Vec<Vec<u8>>,
        host: Vec<Vec<u8>>,
        controls: Vec<(u8, u8, u8)>,
        pauses: Vec<Duration>,
    }

    impl PortSink for Recorder {
        fn surface_sysex(&mut self, bytes: &[u8]) {
            self.surface.push(bytes.to_vec());
        }

        fn host_sysex(&mut self, bytes: &[u8]) {
            self.host.push(bytes.to_vec());
        }

        fn host_control(&mut self, channel: u8, param: u8, value: u8) {
            self.controls.push((channel, param, value));
        }

        fn pause(&mut self, duration: Duration) {
            self.pauses.push(duration);
        }
    }

    impl Recorder {
        fn clear(&mut self) {
            self.surface.clear();
            self.host.clear();
            self.controls.clear();
            self.pauses.clear();
        }
    }

    fn led(address: u8, value: u8) -> Vec<u8> {
        sysex::led_set(address, value).to_vec()
    }

    fn press(surface: &mut Surface, io: &mut Recorder, button: u8) {
        surface.handle_button(io, button, addr::BUTTON_DOWN);
        surface.handle_button(io, button, addr::BUTTON_UP);
    }

    fn surface() -> (Surface, Recorder) {
        (Surface::new(None), Recorder::default())
    }

    #[test]
    fn select_then_fader() {
        let (mut surface, mut io) = surface();

        press(&mut surface, &mut io, 0x02);
        assert_eq!(surface.selected_track, 2);
        assert!(io.surface.contains(&led(0x00, addr::LED_OFF)));
        assert!(io.surface.contains(&led(0x02, addr::LED_ON)));

        io.clear();
        surface.handle_fader(&mut io, 0x42, 100);
        assert_eq!(surface.mixer.tracks[2].fader, 100);
        assert_eq!(io.controls, [(0, 23, 100)]);
    }

    #[test]
    fn mode_ring_returns_to_select() {
        let (mut surface, mut io) = surface();
        let expected = [Mode::Locate, Mode::Mute, Mode::Solo, Mode::Nullify, Mode::Select];
        for mode in expected {
            press(&mut surface, &mut io, addr::MODE_BUTTON);
            assert_eq!(surface.mode, mode);
        }
    }

    #[test]
    fn nullify_fader_only_drives_null_leds() {
        let (mut surface, mut io) = surface();
        surface.handle_fader(&mut io, 0x40, 50);
        assert_eq!(surface.mixer.tracks[0].fader, 50);

        // Four presses: Select -> Locate -> Mute -> Solo -> Nullify.
        for _ in 0..4 {
            press(&mut surface, &mut io, addr::MODE_BUTTON);
        }
        assert_eq!(surface.mode, Mode::Nullify);

        io.clear();
        surface.handle_fader(&mut io, 0x40, 40);
        assert_eq!(surface.mixer.tracks[0].fader, 50);
        assert!(io.controls.is_empty());
        assert!(io.host.is_empty());
        assert_eq!(
            io.surface,
            [led(addr::DOWN_NULL_LED, addr::LED_OFF), led(addr::UP_NULL_LED, addr::LED_ON)]
        );

        // Above the stored value the polarity flips.
        io.clear();
        surface.handle_fader(&mut io, 0x40, 60);
        assert_eq!(
            io.surface,
            [led(addr::DOWN_NULL_LED, addr::LED_ON), led(addr::UP_NULL_LED, addr::LED_OFF)]
        );

        // Aligned: both dark.
        io.clear();
        surface.handle_fader(&mut io, 0x40, 50);
        assert_eq!(
            io.surface,
            [led(addr::DOWN_NULL_LED, addr::LED_OFF), led(addr::UP_NULL_LED, addr::LED_OFF)]
        );
    }

    #[test]
    fn nullify_knob_only_drives_wheel_leds() {
        let (mut surface, mut io) = surface();
        surface.handle_knob(&mut io, 0x4d, 30);
        assert_eq!(surface.mixer.tracks[0].knobs[5], 30);

        for _ in 0..4 {
            press(&mut surface, &mut io, addr::MODE_BUTTON);
        }
        io.clear();
        surface.handle_knob(&mut io, 0x4d, 10);
        assert_eq!(surface.mixer.tracks[0].knobs[5], 30);
        assert!(io.controls.is_empty());
        assert_eq!(
            io.surface,
            [led(addr::LEFT_WHEEL_LED, addr::LED_OFF), led(addr::RIGHT_WHEEL_LED, addr::LED_ON)]
        );
    }

    #[test]
    fn snapshot_save_and_interpolated_restore() {
        let (mut surface, mut io) = surface();
        surface.handle_fader(&mut io, 0x40, 100);

        // Record + F1 saves the snapshot and arms the release guard.
        surface.handle_button(&mut io, addr::RECORD_BUTTON, addr::BUTTON_DOWN);
        press(&mut surface, &mut io, 0x0a);
        assert_eq!(surface.saved_snapshots[0].tracks[0].fader, 100);
        assert!(surface.ignore_record_release);

        // The guarded release must not touch the transport.
        io.clear();
        surface.handle_button(&mut io, addr::RECORD_BUTTON, addr::BUTTON_UP);
        assert!(!surface.ignore_record_release);
        assert!(io.host.is_empty());

        // Pull the fader away, then restore.
        surface.handle_fader(&mut io, 0x40, 0);
        io.clear();
        press(&mut surface, &mut io, 0x0a);

        assert_eq!(surface.mixer.tracks[0].fader, 100);
        assert_eq!(surface.mixer, surface.saved_snapshots[0]);
        let walk: Vec<_> = io.controls.iter().filter(|(_, param, _)| *param == 3).collect();
        assert_eq!(walk.len(), 100);
        assert_eq!(*walk[0], (0, 3, 1));
        assert_eq!(*walk[99], (0, 3, 100));
        assert_eq!(io.pauses.len(), 100);
        assert!(io.pauses.iter().all(|p| *p == RESTORE_STEP_DELAY));
    }

    #[test]
    fn snapshot_restore_pulses_only_changed_toggles() {
        let (mut surface, mut io) = surface();

        // Mute track 0 (bank 0) and save.
        press(&mut surface, &mut io, addr::MODE_BUTTON);
        press(&mut surface, &mut io, addr::MODE_BUTTON);
        assert_eq!(surface.mode, Mode::Mute);
        press(&mut surface, &mut io, 0x00);
        assert!(surface.mixer.tracks[0].mute);

        surface.handle_button(&mut io, addr::RECORD_BUTTON, addr::BUTTON_DOWN);
        press(&mut surface, &mut io, 0x0b);
        surface.handle_button(&mut io, addr::RECORD_BUTTON, addr::BUTTON_UP);

        // Flip the mute back off, then restore slot 1.
        press(&mut surface, &mut io, 0x00);
        assert!(!surface.mixer.tracks[0].mute);

        io.clear();
        press(&mut surface, &mut io, 0x0b);
        assert!(surface.mixer.tracks[0].mute);
        // Exactly one press/release pair, for the one toggle that differed.
        assert_eq!(io.controls, [(0, 1, addr::BUTTON_DOWN), (0, 1, addr::BUTTON_UP)]);
    }

    #[test]
    fn snapshot_round_trip_is_byte_exact() {
        let (mut surface, mut io) = surface();
        surface.handle_fader(&mut io, 0x43, 77);
        surface.handle_knob(&mut io, 0x48, 12);
        press(&mut surface, &mut io, addr::MODE_BUTTON); // Locate
        press(&mut surface, &mut io, 0x05); // arm track 5

        surface.handle_button(&mut io, addr::RECORD_BUTTON, addr::BUTTON_DOWN);
        press(&mut surface, &mut io, 0x12); // F9
        surface.handle_button(&mut io, addr::RECORD_BUTTON, addr::BUTTON_UP);
        let saved = surface.saved_snapshots[8];

        // Arbitrary mutations.
        surface.handle_fader(&mut io, 0x43, 3);
        surface.handle_fader(&mut io, 0x40, 90);
        press(&mut surface, &mut io, 0x05); // disarm
        press(&mut surface, &mut io, 0x02); // arm another

        press(&mut surface, &mut io, 0x12);
        assert_eq!(surface.mixer, saved);
    }

    #[test]
    fn function_button_saves_and_recalls_positions() {
        let (mut surface, mut io) = surface();
        let time = SmpteTime {
            flags: 0,
            hours: 0,
            minutes: 1,
            seconds: 0,
            frames: 0,
        };
        surface.current_time = time;

        // Shift + Record + F2: save the position.
        surface.handle_button(&mut io, addr::SHIFT_BUTTON, addr::BUTTON_DOWN);
        surface.handle_button(&mut io, addr::RECORD_BUTTON, addr::BUTTON_DOWN);
        press(&mut surface, &mut io, 0x0b);
        surface.handle_button(&mut io, addr::RECORD_BUTTON, addr::BUTTON_UP);
        assert_eq!(surface.saved_positions[1], time);

        // Shift + F2: locate to it. The handler fires on both edges, so the
        // locate goes out twice.
        io.clear();
        press(&mut surface, &mut io, 0x0b);
        let goto = sysex::mmc_goto(MMC_DEVICE_ALL, time).to_vec();
        assert_eq!(io.host, vec![goto.clone(), goto]);
    }

    #[test]
    fn full_frame_updates_time_and_display() {
        let (mut surface, mut io) = surface();
        // Hours -> Minutes -> Seconds.
        press(&mut surface, &mut io, addr::RIGHT_BUTTON);
        press(&mut surface, &mut io, addr::RIGHT_BUTTON);
        assert_eq!(surface.smpte_field, SmpteField::Seconds);
        // Seconds field: the ones decimal point marks it.
        assert!(io.surface.contains(&led(addr::TENS_DEC_LED, addr::LED_OFF)));
        assert!(io.surface.contains(&led(addr::ONES_DEC_LED, addr::LED_ON)));

        io.clear();
        surface.receive_host_sysex(
            &mut io,
            &[0xf0, 0x7f, 0x7f, 0x01, 0x01, 0x01, 0x02, 0x03, 0x04, 0xf7],
        );
        assert_eq!(
            (
                surface.current_time.hours,
                surface.current_time.minutes,
                surface.current_time.seconds,
                surface.current_time.frames
            ),
            (1, 2, 3, 4)
        );
        // Seconds display 03: only the ones digit changed from 0.
        assert_eq!(io.surface, [led(addr::ONES_SSD, addr::HEX_TO_SSD[3])]);
        assert_eq!((surface.display_tens, surface.display_ones), (0, 3));
    }

    #[test]
    fn locate_sysex_updates_time() {
        let (mut surface, mut io) = surface();
        let packet = sysex::mmc_goto(
            MMC_DEVICE_ALL,
            SmpteTime {
                flags: 0,
                hours: 9,
                minutes: 8,
                seconds: 7,
                frames: 6,
            },
        );
        surface.receive_host_sysex(&mut io, &packet);
        assert_eq!(surface.current_time.hours, 9);
        assert_eq!(surface.current_time.frames, 6);
    }

    #[test]
    fn quarter_frames_commit_and_refresh_display() {
        let (mut surface, mut io) = surface();
        // Display hours; feed a full quarter-frame set for 05:00:00:00.
        let slices: [u8; 8] = [0x00, 0x10, 0x20, 0x30, 0x40, 0x50, 0x65, 0x70];
        for &slice in &slices[..7] {
            surface.receive_qframe(&mut io, slice);
        }
        assert_eq!(surface.current_time, SmpteTime::ZERO);

        io.clear();
        surface.receive_qframe(&mut io, slices[7]);
        assert_eq!(surface.current_time.hours, 5);
        assert_eq!(io.surface, [led(addr::ONES_SSD, addr::HEX_TO_SSD[5])]);
        assert_eq!((surface.display_tens, surface.display_ones), (0, 5));
    }

    #[test]
    fn display_cache_suppresses_identical_digits() {
        let (mut surface, mut io) = surface();
        surface.receive_host_sysex(
            &mut io,
            &[0xf0, 0x7f, 0x7f, 0x01, 0x01, 0x07, 0x00, 0x00, 0x00, 0xf7],
        );
        assert_eq!((surface.display_tens, surface.display_ones), (0, 7));

        // Same hours again: nothing to re-emit.
        io.clear();
        surface.receive_host_sysex(
            &mut io,
            &[0xf0, 0x7f, 0x7f, 0x01, 0x01, 0x07, 0x30, 0x00, 0x00, 0xf7],
        );
        assert!(io.surface.is_empty());
    }

    #[test]
    fn jog_wheel_emits_step_after_threshold() {
        let (mut surface, mut io) = surface();
        surface.handle_wheel(&mut io, 0x03);
        assert!(io.host.is_empty());
        surface.handle_wheel(&mut io, 0x03);
        assert_eq!(io.host, [sysex::mmc_step(MMC_DEVICE_ALL, 0x03).to_vec()]);
    }

    #[test]
    fn shift_play_replays_without_latching() {
        let (mut surface, mut io) = surface();
        let mark = SmpteTime {
            flags: 0,
            hours: 0,
            minutes: 1,
            seconds: 0,
            frames: 0,
        };
        surface.play_from = mark;

        surface.handle_button(&mut io, addr::SHIFT_BUTTON, addr::BUTTON_DOWN);
        press(&mut surface, &mut io, addr::PLAY_BUTTON);
        assert_eq!(io.host, [sysex::mmc_goto(MMC_DEVICE_ALL, mark).to_vec()]);
        assert_eq!(surface.play_from, mark);

        surface.handle_button(&mut io, addr::SHIFT_BUTTON, addr::BUTTON_UP);
        surface.receive_host_sysex(
            &mut io,
            &[0xf0, 0x7f, 0x7f, 0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0xf7],
        );
        io.clear();
        press(&mut surface, &mut io, addr::PLAY_BUTTON);
        assert_eq!(surface.play_from.minutes, 2);
        assert_eq!(
            io.host,
            [sysex::mmc_command(MMC_DEVICE_ALL, MmcCommand::Play).to_vec()]
        );
    }

    #[test]
    fn shift_rewind_locates_to_zero() {
        let (mut surface, mut io) = surface();
        surface.handle_button(&mut io, addr::SHIFT_BUTTON, addr::BUTTON_DOWN);
        press(&mut surface, &mut io, addr::REW_BUTTON);
        assert_eq!(
            io.host,
            [sysex::mmc_goto(MMC_DEVICE_ALL, SmpteTime::ZERO).to_vec()]
        );

        surface.handle_button(&mut io, addr::SHIFT_BUTTON, addr::BUTTON_UP);
        io.clear();
        press(&mut surface, &mut io, addr::REW_BUTTON);
        assert_eq!(
            io.host,
            [sysex::mmc_command(MMC_DEVICE_ALL, MmcCommand::Rewind).to_vec()]
        );
    }

    #[test]
    fn record_release_latches_and_issues_record_pause() {
        let (mut surface, mut io) = surface();
        surface.receive_host_sysex(
            &mut io,
            &[0xf0, 0x7f, 0x7f, 0x01, 0x01, 0x00, 0x00, 0x30, 0x00, 0xf7],
        );
        io.clear();
        surface.handle_button(&mut io, addr::RECORD_BUTTON, addr::BUTTON_DOWN);
        surface.handle_button(&mut io, addr::RECORD_BUTTON, addr::BUTTON_UP);
        assert_eq!(surface.record_from.seconds, 0x30);
        assert_eq!(
            io.host,
            [sysex::mmc_command(MMC_DEVICE_ALL, MmcCommand::RecordPause).to_vec()]
        );
    }

    #[test]
    fn bank_steps_wrap_in_both_directions() {
        let (mut surface, mut io) = surface();
        press(&mut surface, &mut io, addr::UP_BUTTON);
        assert_eq!(surface.display_mode, DisplayMode::Bank);
        // Entering bank display clears both decimal points.
        assert!(io.surface.contains(&led(addr::TENS_DEC_LED, addr::LED_OFF)));
        assert!(io.surface.contains(&led(addr::ONES_DEC_LED, addr::LED_OFF)));

        press(&mut surface, &mut io, addr::LEFT_BUTTON);
        assert_eq!(surface.bank, 3);
        for _ in 0..3 {
            press(&mut surface, &mut io, addr::RIGHT_BUTTON);
        }
        assert_eq!(surface.bank, 2);

        // The display shows the bank in the ones digit, tens blanked.
        io.clear();
        press(&mut surface, &mut io, addr::RIGHT_BUTTON);
        assert!(io.surface.contains(&led(addr::ONES_SSD, addr::HEX_TO_SSD[3])));
        assert!(io.surface.contains(&led(addr::TENS_SSD, 0)));
    }

    #[test]
    fn bank_selects_the_virtual_track_slice() {
        let (mut surface, mut io) = surface();
        press(&mut surface, &mut io, addr::UP_BUTTON);
        press(&mut surface, &mut io, addr::RIGHT_BUTTON);
        assert_eq!(surface.bank, 1);

        io.clear();
        surface.handle_fader(&mut io, 0x41, 64);
        assert_eq!(surface.mixer.tracks[9].fader, 64);
        // Bank 1 traffic goes out on channel 1.
        assert_eq!(io.controls, [(1, 13, 64)]);
    }

    #[test]
    fn locate_mode_toggles_armed_with_a_pulse_pair() {
        let (mut surface, mut io) = surface();
        press(&mut surface, &mut io, addr::MODE_BUTTON);
        assert_eq!(surface.mode, Mode::Locate);

        io.clear();
        press(&mut surface, &mut io, 0x04);
        assert!(surface.mixer.tracks[4].armed);
        assert_eq!(io.controls, [(0, 40, addr::BUTTON_DOWN), (0, 40, addr::BUTTON_UP)]);
        assert!(io.surface.contains(&led(0x04, addr::LED_ON)));

        io.clear();
        press(&mut surface, &mut io, 0x04);
        assert!(!surface.mixer.tracks[4].armed);
        assert!(io.surface.contains(&led(0x04, addr::LED_OFF)));
    }

    #[test]
    fn peer_control_updates_any_bank_and_repaints_toggles() {
        let (mut surface, mut io) = surface();
        // Bank 2, strip 4, mute: channel 2, controller 41.
        surface.receive_virtual_control(&mut io, 2, 41, 0x7f);
        assert!(surface.mixer.tracks[20].mute);
        // Toggle updates repaint the panel.
        assert!(!io.surface.is_empty());

        // A fader move is stored without a repaint.
        io.clear();
        surface.receive_virtual_control(&mut io, 1, 13, 99);
        assert_eq!(surface.mixer.tracks[9].fader, 99);
        assert!(io.surface.is_empty());

        // Out-of-range traffic is dropped.
        io.clear();
        surface.receive_virtual_control(&mut io, 4, 0, 1);
        surface.receive_virtual_control(&mut io, 0, 80, 1);
        assert!(io.surface.is_empty());
        assert_eq!(surface.mixer.tracks[0], TrackState::default());
    }

    #[test]
    fn repaint_reflects_mode_table() {
        let (mut surface, mut io) = surface();
        press(&mut surface, &mut io, addr::MODE_BUTTON); // Locate
        press(&mut surface, &mut io, 0x03); // arm track 3

        io.clear();
        surface.repaint(&mut io);
        assert!(io.surface.contains(&led(addr::LOCATE_LED, addr::LED_ON)));
        assert!(io.surface.contains(&led(0x03, addr::LED_ON)));
        assert!(io.surface.contains(&led(0x02, addr::LED_OFF)));

        // Nullify lights all four mode LEDs and the null indicators.
        for _ in 0..3 {
            press(&mut surface, &mut io, addr::MODE_BUTTON);
        }
        io.clear();
        surface.repaint(&mut io);
        for mode_led in [addr::SELECT_LED, addr::LOCATE_LED, addr::MUTE_LED, addr::SOLO_LED] {
            assert!(io.surface.contains(&led(mode_led, addr::LED_ON)));
        }
        for null_led in [
            addr::DOWN_NULL_LED,
            addr::UP_NULL_LED,
            addr::LEFT_WHEEL_LED,
            addr::RIGHT_WHEEL_LED,
        ] {
            assert!(io.surface.contains(&led(null_led, addr::LED_ON)));
        }
    }
}
