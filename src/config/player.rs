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
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use super::audio::Audio;
use super::cue::Cue;
use super::error::ConfigError;

/// The configuration for a pocketmix session: engine settings plus the cues
/// to play.
#[derive(Deserialize, Clone, Debug)]
pub struct Player {
    /// The engine and output configuration.
    #[serde(default)]
    audio: Audio,

    /// Directory the cue files live in. Relative paths are resolved against
    /// the directory holding the configuration file.
    assets: Option<String>,

    /// The cues, started in order.
    #[serde(default)]
    cues: Vec<Cue>,
}

impl Player {
    /// Parses and validates a player configuration file.
    pub fn deserialize(path: &Path) -> Result<Player, ConfigError> {
        let player = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Player>()?;
        player.validate()?;
        Ok(player)
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Resolves the assets directory for a configuration loaded from
    /// `config_path`.
    pub fn assets_dir(&self, config_path: &Path) -> PathBuf {
        let assets = Path::new(self.assets.as_deref().unwrap_or("."));
        if assets.is_absolute() {
            return assets.to_path_buf();
        }
        config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(assets)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.audio.validate()?;
        self.cues.iter().try_for_each(Cue::validate)
    }
}
