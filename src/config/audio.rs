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

const DEFAULT_DEVICE: &str = "default";
const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_CHANNELS: u16 = 2;
const DEFAULT_MAX_INSTANCES: usize = 32;
const DEFAULT_MASTER_VOLUME: u8 = 255;
const DEFAULT_BUFFER_SIZE: usize = 512;

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Audio {
    /// The output device. "default" picks the host's default device.
    device: Option<String>,

    /// Engine sample rate in Hz (default: 44100). Every loaded sound must match it.
    sample_rate: Option<u32>,

    /// Output channel count, 1 or 2 (default: 2).
    channels: Option<u16>,

    /// Number of instance slots (default: 32).
    max_instances: Option<usize>,

    /// Initial master volume, 0-255 (default: 255).
    master_volume: Option<u8>,

    /// Frames per mix period for the output stream (default: 512).
    buffer_size: Option<usize>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: Some(device.to_string()),
            ..Default::default()
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// Returns the engine sample rate (default: 44100)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the output channel count (default: 2)
    pub fn channels(&self) -> u16 {
        self.channels.unwrap_or(DEFAULT_CHANNELS)
    }

    /// Returns the number of instance slots (default: 32)
    pub fn max_instances(&self) -> usize {
        self.max_instances.unwrap_or(DEFAULT_MAX_INSTANCES)
    }

    /// Returns the initial master volume (default: 255)
    pub fn master_volume(&self) -> u8 {
        self.master_volume.unwrap_or(DEFAULT_MASTER_VOLUME)
    }

    /// Returns the mix period in frames (default: 512)
    pub fn buffer_size(&self) -> usize {
        self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE)
    }

    /// Checks the values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.channels(), 1 | 2) {
            return Err(ConfigError::Invalid(format!(
                "channels must be 1 or 2, got {}",
                self.channels()
            )));
        }
        if self.sample_rate() == 0 {
            return Err(ConfigError::Invalid("sample_rate must be non-zero".into()));
        }
        if self.max_instances() == 0 {
            return Err(ConfigError::Invalid(
                "max_instances must be at least 1".into(),
            ));
        }
        if self.buffer_size() == 0 {
            return Err(ConfigError::Invalid("buffer_size must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Audio {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize::<Audio>()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let audio = Audio::new("default");
        assert_eq!(audio.device(), "default");
        assert_eq!(audio.sample_rate(), 44100);
        assert_eq!(audio.channels(), 2);
        assert_eq!(audio.max_instances(), 32);
        assert_eq!(audio.master_volume(), 255);
        assert_eq!(audio.buffer_size(), 512);
        assert!(audio.validate().is_ok());
    }

    #[test]
    fn test_parse_overrides() {
        let audio = parse(
            r#"
            device: "USB Audio"
            sample_rate: 22050
            channels: 1
            max_instances: 8
            master_volume: 128
            buffer_size: 256
            "#,
        );
        assert_eq!(audio.device(), "USB Audio");
        assert_eq!(audio.sample_rate(), 22050);
        assert_eq!(audio.channels(), 1);
        assert_eq!(audio.max_instances(), 8);
        assert_eq!(audio.master_volume(), 128);
        assert_eq!(audio.buffer_size(), 256);
        assert!(audio.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        for yaml in [
            "channels: 3",
            "channels: 0",
            "sample_rate: 0",
            "max_instances: 0",
            "buffer_size: 0",
        ] {
            assert!(
                matches!(parse(yaml).validate(), Err(ConfigError::Invalid(_))),
                "{yaml} should be rejected"
            );
        }
    }
}
