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

use std::{fmt, path::Path, str::FromStr};

use serde::Deserialize;

use super::error::AudioError;

/// Compressed container formats the engine can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Quite OK Audio.
    Qoa,
    /// MPEG-1/2 Layer III.
    Mp3,
}

impl Format {
    /// Resolves the format from a file extension (case-insensitive).
    pub fn from_path(path: &str) -> Result<Format, AudioError> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| AudioError::UnsupportedFormat(format!("{}: no file extension", path)))?;
        Format::from_str(extension)
    }

    /// Convert to string representation
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Qoa => "qoa",
            Format::Mp3 => "mp3",
        }
    }
}

impl FromStr for Format {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "qoa" => Ok(Format::Qoa),
            "mp3" => Ok(Format::Mp3),
            _ => Err(AudioError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output or source channel layout. Only mono and stereo are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    /// Number of interleaved samples per frame.
    pub fn count(self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

impl TryFrom<u16> for Channels {
    type Error = AudioError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            other => Err(AudioError::UnsupportedChannels(other)),
        }
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channels::Mono => write!(f, "mono"),
            Channels::Stereo => write!(f, "stereo"),
        }
    }
}

/// What happens when an instance reaches the end of its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Play once, then free the slot.
    #[default]
    Once,
    /// Rewind and keep playing until stopped.
    Loop,
}

/// How a sound's PCM is produced for each instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundType {
    /// Each instance reopens the file and decodes it incrementally.
    #[default]
    Streamed,
    /// The file is decoded once at load; instances read the shared PCM.
    Preloaded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("music/theme.qoa").unwrap(), Format::Qoa);
        assert_eq!(Format::from_path("JUMP.MP3").unwrap(), Format::Mp3);
        assert_eq!(Format::from_path("a.b/c.Qoa").unwrap(), Format::Qoa);
    }

    #[test]
    fn test_format_from_path_invalid() {
        assert!(matches!(
            Format::from_path("sound.wav"),
            Err(AudioError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            Format::from_path("sound"),
            Err(AudioError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_format_display() {
        assert_eq!(format!("{}", Format::Qoa), "qoa");
        assert_eq!(format!("{}", Format::Mp3), "mp3");
    }

    #[test]
    fn test_channels_try_from() {
        assert_eq!(Channels::try_from(1).unwrap(), Channels::Mono);
        assert_eq!(Channels::try_from(2).unwrap(), Channels::Stereo);
        assert!(matches!(
            Channels::try_from(6),
            Err(AudioError::UnsupportedChannels(6))
        ));
        assert_eq!(Channels::Stereo.count(), 2);
    }
}
