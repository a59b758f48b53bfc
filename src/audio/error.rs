// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
/// Error types for sound loading, playback and decoding.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {path}: {source}")]
    FileNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sample rate mismatch: {path} is {actual}Hz, engine runs at {expected}Hz")]
    SampleRateMismatch {
        path: String,
        expected: u32,
        actual: u32,
    },

    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u16),

    #[error("Invalid {format} stream: {reason}")]
    InvalidStream {
        format: &'static str,
        reason: String,
    },

    #[error("MP3 decoding error: {0}")]
    Mp3(#[from] symphonia::core::errors::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioError {
    /// Shorthand for a malformed QOA stream.
    pub(crate) fn invalid_qoa<S: Into<String>>(reason: S) -> Self {
        AudioError::InvalidStream {
            format: "QOA",
            reason: reason.into(),
        }
    }

    /// Shorthand for a malformed MP3 stream.
    pub(crate) fn invalid_mp3<S: Into<String>>(reason: S) -> Self {
        AudioError::InvalidStream {
            format: "MP3",
            reason: reason.into(),
        }
    }
}
