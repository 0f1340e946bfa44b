//! Saved snapshots and transport positions.
//!
//! The settings file is process-local state: a flat dump of the nine
//! snapshot slots followed by the nine position slots, with no header and
//! no version. Every field is a single byte, so endianness never arises.
//! A missing or short file is tolerated on load; whatever prefix is
//! present is applied and the remaining slots stay zero-initialized.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::mixer::{MixerState, TrackState, NUM_KNOBS, VIRTUAL_TRACKS};
use crate::smpte::SmpteTime;

/// One slot per function button.
pub const NUM_SLOTS: usize = 9;

/// Filename of the settings file under the data directory.
pub const SETTINGS_FILENAME: &str = "cs10-linux.dat";

const TRACK_BYTES: usize = 4 + NUM_KNOBS;
const MIXER_BYTES: usize = TRACK_BYTES * VIRTUAL_TRACKS;
const POSITION_BYTES: usize = 5;

/// Resolve the default settings path and make sure its directory exists.
/// `$XDG_DATA_HOME/cs10` wins; otherwise `$HOME/.local/share/cs10`.
pub fn default_settings_path() -> Option<PathBuf> {
    let dir = match env::var_os("XDG_DATA_HOME") {
        Some(data) if !data.is_empty() => PathBuf::from(data).join("cs10"),
        _ => PathBuf::from(env::var_os("HOME")?).join(".local/share/cs10"),
    };
    if let Err(err) = fs::create_dir_all(&dir) {
        warn!("cannot create data directory {}: {}", dir.display(), err);
    }
    Some(dir.join(SETTINGS_FILENAME))
}

fn push_track(buf: &mut Vec<u8>, track: &TrackState) {
    buf.push(track.armed as u8);
    buf.push(track.mute as u8);
    buf.push(track.solo as u8);
    buf.push(track.fader);
    buf.extend_from_slice(&track.knobs);
}

fn track_from(bytes: &[u8]) -> TrackState {
    let mut knobs = [0u8; NUM_KNOBS];
    knobs.copy_from_slice(&bytes[4..TRACK_BYTES]);
    TrackState {
        armed: bytes[0] != 0,
        mute: bytes[1] != 0,
        solo: bytes[2] != 0,
        fader: bytes[3],
        knobs,
    }
}

/// Rewrite the settings file with the given slots.
pub fn save(
    path: &Path,
    snapshots: &[MixerState; NUM_SLOTS],
    positions: &[SmpteTime; NUM_SLOTS],
) -> io::Result<()> {
    let mut buf = Vec::with_capacity(MIXER_BYTES * NUM_SLOTS + POSITION_BYTES * NUM_SLOTS);
    for snapshot in snapshots {
        for track in &snapshot.tracks {
            push_track(&mut buf, track);
        }
    }
    for position in positions {
        buf.extend_from_slice(&[
            position.flags,
            position.hours,
            position.minutes,
            position.seconds,
            position.frames,
        ]);
    }
    fs::write(path, &buf)
}

/// Apply whatever the settings file holds onto the given slots. Slots (or
/// tails of slots) the file does not cover are left untouched.
pub fn load(
    path: &Path,
    snapshots: &mut [MixerState; NUM_SLOTS],
    positions: &mut [SmpteTime; NUM_SLOTS],
) {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!("no settings loaded from {}: {}", path.display(), err);
            return;
        }
    };

    let mut chunks = bytes.chunks_exact(TRACK_BYTES);
    'snapshots: for snapshot in snapshots.iter_mut() {
        for track in snapshot.tracks.iter_mut() {
            match chunks.next() {
                Some(chunk) => *track = track_from(chunk),
                None => break 'snapshots,
            }
        }
    }

    let consumed = MIXER_BYTES * NUM_SLOTS;
    if bytes.len() < consumed {
        debug!(
            "settings file {} is short ({} bytes); tail left zeroed",
            path.display(),
            bytes.len()
        );
        return;
    }

    let mut chunks = bytes[consumed..].chunks_exact(POSITION_BYTES);
    for position in positions.iter_mut() {
        match chunks.next() {
            Some(chunk) => {
                *position = SmpteTime {
                    flags: chunk[0],
                    hours: chunk[1],
                    minutes: chunk[2],
                    seconds: chunk[3],
                    frames: chunk[4],
                }
            }
            None => break,
        }
    }
}
