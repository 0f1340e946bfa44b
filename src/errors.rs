use std::error::Error;
use std::fmt;

/// An error that can occur while bringing up the sequencer client or its
/// two ports. Both are fatal: the bridge is useless without its substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The sequencer could not be opened.
    SequencerUnavailable,
    /// The client came up but a port could not be created.
    PortCreationFailed,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            InitError::SequencerUnavailable => "the ALSA sequencer could not be opened".fmt(f),
            InitError::PortCreationFailed => "a sequencer port could not be created".fmt(f),
        }
    }
}

impl Error for InitError {}
