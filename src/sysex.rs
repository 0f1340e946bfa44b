//! System-exclusive codec.
//!
//! Builders for the byte-exact packets the bridge emits (the CS-10 LED
//! packet and the MMC family), and a decoder for the two host-port sysex
//! shapes it reacts to: MTC full frames and MMC locate.

use crate::smpte::SmpteTime;

/// MMC device id that addresses every listening device.
pub const MMC_DEVICE_ALL: u8 = 0x7f;

/// The MMC command set. The bridge itself only issues a handful of these,
/// but the full inventory is part of the codec surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MmcCommand {
    Stop = 0x01,
    Play = 0x02,
    DeferredPlay = 0x03,
    FastForward = 0x04,
    Rewind = 0x05,
    PunchIn = 0x06,
    PunchOut = 0x07,
    RecordPause = 0x08,
    Pause = 0x09,
    Eject = 0x0a,
    Chase = 0x0b,
    ErrorReset = 0x0c,
    Reset = 0x0d,
}

/// Set one indicator on the surface. `value` is `LED_ON`/`LED_OFF` for
/// plain LEDs, or a raw segment pattern for the two display digits.
pub fn led_set(addr: u8, value: u8) -> [u8; 7] {
    [0xf0, 0x15, 0x15, 0x00, addr, value, 0xf7]
}

/// A bare MMC transport command.
pub fn mmc_command(device: u8, command: MmcCommand) -> [u8; 6] {
    [0xf0, 0x7f, device, 0x06, command as u8, 0xf7]
}

/// Locate the transport to an absolute time (subframes always zero).
pub fn mmc_goto(device: u8, time: SmpteTime) -> [u8; 13] {
    [
        0xf0,
        0x7f,
        device,
        0x06,
        0x44,
        0x06,
        0x01,
        time.hours,
        time.minutes,
        time.seconds,
        time.frames,
        0x00,
        0xf7,
    ]
}

/// Locate the transport to one of the device-side preset marks.
pub fn mmc_locate_preset(device: u8, preset: u8) -> [u8; 9] {
    [0xf0, 0x7f, device, 0x06, 0x44, 0x02, 0x00, 0x08 + preset, 0xf7]
}

/// Arm a set of recorder tracks; the two masks cover eight tracks.
pub fn mmc_track_enable(device: u8, mask1: u8, mask2: u8) -> [u8; 11] {
    [
        0xf0, 0x7f, device, 0x06, 0x40, 0x04, 0x4f, 0x02, mask1, mask2, 0xf7,
    ]
}

/// Shuttle at a given speed; `01 00 00` is normal play speed.
pub fn mmc_shuttle(device: u8, speed1: u8, speed2: u8, speed3: u8) -> [u8; 10] {
    [
        0xf0, 0x7f, device, 0x06, 0x47, 0x03, speed1, speed2, speed3, 0xf7,
    ]
}

/// Step the transport by a 7-bit sign-magnitude frame count.
pub fn mmc_step(device: u8, steps: u8) -> [u8; 8] {
    [0xf0, 0x7f, device, 0x06, 0x48, 0x01, steps, 0xf7]
}

/// A host-port sysex the bridge reacts to. Both carry an absolute
/// transport position; the rate flags are not part of either packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSysex {
    /// MTC full frame.
    FullFrame(SmpteTime),
    /// MMC locate: the host jumped the transport.
    Locate(SmpteTime),
}

/// Decode a host-port sysex. The device id byte is not checked. Anything
/// that is not one of the two known shapes yields `None` and is dropped by
/// the caller.
pub fn decode_host_sysex(data: &[u8]) -> Option<HostSysex> {
    match data {
        [0xf0, 0x7f, _, 0x01, 0x01, hours, minutes, seconds, frames, 0xf7] => {
            Some(HostSysex::FullFrame(SmpteTime {
                flags: 0,
                hours: *hours,
                minutes: *minutes,
                seconds: *seconds,
                frames: *frames,
            }))
        }
        [0xf0, 0x7f, _, 0x06, 0x44, 0x06, 0x01, hours, minutes, seconds, frames, ..] => {
            Some(HostSysex::Locate(SmpteTime {
                flags: 0,
                hours: *hours,
                minutes: *minutes,
                seconds: *seconds,
                frames: *frames,
            }))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_packet_layout() {
        assert_eq!(
            led_set(0x10, 0x3f),
            [0xf0, 0x15, 0x15, 0x00, 0x10, 0x3f, 0xf7]
        );
    }

    #[test]
    fn mmc_command_layout() {
        assert_eq!(
            mmc_command(MMC_DEVICE_ALL, MmcCommand::Play),
            [0xf0, 0x7f, 0x7f, 0x06, 0x02, 0xf7]
        );
        assert_eq!(mmc_command(MMC_DEVICE_ALL, MmcCommand::Stop)[4], 0x01);
        assert_eq!(mmc_command(MMC_DEVICE_ALL, MmcCommand::Reset)[4], 0x0d);
    }

    #[test]
    fn mmc_goto_layout() {
        let time = SmpteTime {
            flags: 0,
            hours: 1,
            minutes: 2,
            seconds: 3,
            frames: 4,
        };
        assert_eq!(
            mmc_goto(MMC_DEVICE_ALL, time),
            [0xf0, 0x7f, 0x7f, 0x06, 0x44, 0x06, 0x01, 1, 2, 3, 4, 0x00, 0xf7]
        );
    }

    #[test]
    fn mmc_locate_preset_layout() {
        assert_eq!(
            mmc_locate_preset(MMC_DEVICE_ALL, 3),
            [0xf0, 0x7f, 0x7f, 0x06, 0x44, 0x02, 0x00, 0x0b, 0xf7]
        );
    }

    #[test]
    fn mmc_track_enable_layout() {
        assert_eq!(
            mmc_track_enable(MMC_DEVICE_ALL, 0x60, 0x3f),
            [0xf0, 0x7f, 0x7f, 0x06, 0x40, 0x04, 0x4f, 0x02, 0x60, 0x3f, 0xf7]
        );
    }

    #[test]
    fn mmc_shuttle_layout() {
        assert_eq!(
            mmc_shuttle(MMC_DEVICE_ALL, 0x01, 0x00, 0x00),
            [0xf0, 0x7f, 0x7f, 0x06, 0x47, 0x03, 0x01, 0x00, 0x00, 0xf7]
        );
    }

    #[test]
    fn mmc_step_layout() {
        assert_eq!(
            mmc_step(MMC_DEVICE_ALL, 0x47),
            [0xf0, 0x7f, 0x7f, 0x06, 0x48, 0x01, 0x47, 0xf7]
        );
    }

    #[test]
    fn decodes_full_frame() {
        let packet = [0xf0, 0x7f, 0x7f, 0x01, 0x01, 0x01, 0x02, 0x03, 0x04, 0xf7];
        match decode_host_sysex(&packet) {
            Some(HostSysex::FullFrame(time)) => {
                assert_eq!((time.hours, time.minutes, time.seconds, time.frames), (1, 2, 3, 4));
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn decodes_locate() {
        let packet = mmc_goto(MMC_DEVICE_ALL, SmpteTime {
            flags: 0,
            hours: 0,
            minutes: 1,
            seconds: 0,
            frames: 0,
        });
        match decode_host_sysex(&packet) {
            Some(HostSysex::Locate(time)) => {
                assert_eq!((time.hours, time.minutes, time.seconds, time.frames), (0, 1, 0, 0));
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_shapes() {
        // Wrong sub-id.
        assert_eq!(
            decode_host_sysex(&[0xf0, 0x7f, 0x7f, 0x02, 0x01, 1, 2, 3, 4, 0xf7]),
            None
        );
        // Truncated locate: six prefix bytes only.
        assert_eq!(
            decode_host_sysex(&[0xf0, 0x7f, 0x7f, 0x06, 0x44, 0x06, 0x01]),
            None
        );
        // Arbitrary vendor traffic.
        assert_eq!(decode_host_sysex(&[0xf0, 0x41, 0x10, 0xf7]), None);
        assert_eq!(decode_host_sysex(&[]), None);
    }
}
