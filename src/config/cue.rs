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
use serde::Deserialize;

use super::error::ConfigError;
use crate::audio::{PlaybackMode, SoundType};

const DEFAULT_VOLUME: u8 = 255;
const DEFAULT_PAN: u8 = 127;

/// A sound to play: which file, and how.
#[derive(Deserialize, Clone, Debug)]
pub struct Cue {
    /// Path of the sound, relative to the assets directory.
    file: String,

    /// Instance volume, 0-255 (default: 255).
    volume: Option<u8>,

    /// Pan, 0 is hard left and 255 hard right (default: 127).
    pan: Option<u8>,

    /// Either "once" or "loop" (default: once).
    #[serde(default)]
    mode: PlaybackMode,

    /// Either "streamed" or "preloaded" (default: streamed).
    #[serde(default, rename = "type")]
    sound_type: SoundType,
}

impl Cue {
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn volume(&self) -> u8 {
        self.volume.unwrap_or(DEFAULT_VOLUME)
    }

    pub fn pan(&self) -> u8 {
        self.pan.unwrap_or(DEFAULT_PAN)
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn sound_type(&self) -> SoundType {
        self.sound_type
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.file.trim().is_empty() {
            return Err(ConfigError::Invalid("cue file must not be empty".into()));
        }
        Ok(())
    }
}
