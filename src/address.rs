//! The CS-10 address map.
//!
//! Every control on the surface reports as a control-change with a fixed
//! controller number, and every indicator is addressed through the vendor
//! sysex packet in [`crate::sysex`]. The numbers below come straight from
//! the device manual.

/// Value an LED address is set to when lit.
pub const LED_ON: u8 = 0x7f;
/// Value an LED address is set to when dark.
pub const LED_OFF: u8 = 0x00;

/// Value a button reports when pressed.
pub const BUTTON_DOWN: u8 = 0x7f;
/// Value a button reports when released.
pub const BUTTON_UP: u8 = 0x00;

// Buttons, as controller numbers on the control port.
pub const FIRST_BUTTON: u8 = 0x00;
pub const LAST_BUTTON: u8 = 0x1e;

pub const FIRST_TRACK_BUTTON: u8 = 0x00;
pub const LAST_TRACK_BUTTON: u8 = 0x07;

pub const MODE_BUTTON: u8 = 0x08;
pub const SHIFT_BUTTON: u8 = 0x09;

pub const FIRST_F_BUTTON: u8 = 0x0a;
pub const LAST_F_BUTTON: u8 = 0x12;

pub const REW_BUTTON: u8 = 0x13;
pub const FF_BUTTON: u8 = 0x14;
pub const STOP_BUTTON: u8 = 0x15;
pub const PLAY_BUTTON: u8 = 0x16;
pub const RECORD_BUTTON: u8 = 0x17;
pub const LEFT_WHEEL_BUTTON: u8 = 0x18;
pub const RIGHT_WHEEL_BUTTON: u8 = 0x19;
pub const UP_BUTTON: u8 = 0x1a;
pub const DOWN_BUTTON: u8 = 0x1b;
pub const LEFT_BUTTON: u8 = 0x1c;
pub const RIGHT_BUTTON: u8 = 0x1d;
pub const FOOTSWITCH: u8 = 0x1e;

// Continuous controls.
pub const FIRST_FADER: u8 = 0x40;
pub const LAST_FADER: u8 = 0x47;
pub const FIRST_KNOB: u8 = 0x48;
pub const LAST_KNOB: u8 = 0x4d;
pub const WHEEL: u8 = 0x60;

// Indicator addresses, used inside the LED sysex packet. Track LEDs occupy
// addresses 0x00..=0x07, mirroring the track button numbers.
pub const SELECT_LED: u8 = 0x08;
pub const LOCATE_LED: u8 = 0x09;
pub const MUTE_LED: u8 = 0x0a;
pub const SOLO_LED: u8 = 0x0b;
pub const DOWN_NULL_LED: u8 = 0x0c;
pub const UP_NULL_LED: u8 = 0x0d;
pub const LEFT_WHEEL_LED: u8 = 0x0e;
pub const RIGHT_WHEEL_LED: u8 = 0x0f;
pub const ONES_SSD: u8 = 0x10;
pub const TENS_SSD: u8 = 0x11;
pub const RECORD_LED: u8 = 0x12;
pub const TENS_DEC_LED: u8 = 0x13;
pub const ONES_DEC_LED: u8 = 0x14;

/// Seven-segment patterns for the hex digits, plus a blank at index 16.
pub const HEX_TO_SSD: [u8; 17] = [
    0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07, 0x7f, 0x6f, 0x77, 0x7c, 0x39, 0x5e, 0x79,
    0x71, 0x00,
];

/// LED address of a physical track strip.
pub fn track_led(track: usize) -> u8 {
    track as u8
}

/// Physical track strip addressed by a track button.
pub fn button_to_track(button: u8) -> usize {
    button as usize
}

/// Physical track strip addressed by a fader.
pub fn fader_to_track(fader: u8) -> usize {
    (fader - FIRST_FADER) as usize
}
