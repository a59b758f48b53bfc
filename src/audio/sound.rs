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

//! Loaded sound assets.
//!
//! A [`SoundAsset`] records where a sound lives and what it contains. Playing
//! it builds a fresh decoder: streamed sounds reopen their file, preloaded
//! sounds share PCM decoded once at load.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::decoder::{self, Decoder, PreloadedDecoder, StreamInfo};
use super::error::AudioError;
use super::format::{Channels, Format, SoundType};
use crate::fs::{FileHandle, FileSystem};

/// Immutable description of a loaded sound, shared by its playing instances.
pub struct SoundAsset {
    path: String,
    fs: Arc<dyn FileSystem>,
    format: Format,
    info: StreamInfo,
    sound_type: SoundType,
    pcm: Option<Arc<[i16]>>,
}

impl SoundAsset {
    /// Probes the file once to learn its layout. Preloaded sounds are fully
    /// decoded here.
    pub(crate) fn load(
        fs: Arc<dyn FileSystem>,
        path: &str,
        sound_type: SoundType,
        engine_rate: u32,
    ) -> Result<Self, AudioError> {
        let format = Format::from_path(path)?;
        let handle = open_file(fs.as_ref(), path)?;
        let mut decoder = decoder::open_decoder(format, handle)?;
        let mut info = decoder.info();

        if info.sample_rate != engine_rate {
            return Err(AudioError::SampleRateMismatch {
                path: path.to_string(),
                expected: engine_rate,
                actual: info.sample_rate,
            });
        }

        let pcm = match sound_type {
            SoundType::Streamed => None,
            SoundType::Preloaded => {
                let pcm = decoder::preload(decoder.as_mut())?;
                info.total_frames = (pcm.len() / info.channels.count()) as u64;
                Some(pcm)
            }
        };

        info!(
            path,
            format = %format,
            channels = info.channels.count(),
            sample_rate = info.sample_rate,
            frames = info.total_frames,
            sound_type = ?sound_type,
            "Sound loaded"
        );

        Ok(Self {
            path: path.to_string(),
            fs,
            format,
            info,
            sound_type,
            pcm,
        })
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    /// Builds a decoder positioned at the start of the sound.
    pub(crate) fn open_decoder(&self) -> Result<Box<dyn Decoder>, AudioError> {
        match &self.pcm {
            Some(pcm) => Ok(Box::new(PreloadedDecoder::new(
                pcm.clone(),
                self.info.sample_rate,
                self.info.channels,
            ))),
            None => {
                let handle = open_file(self.fs.as_ref(), &self.path)?;
                decoder::open_decoder(self.format, handle)
            }
        }
    }
}

impl fmt::Debug for SoundAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundAsset")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("info", &self.info)
            .field("sound_type", &self.sound_type)
            .finish()
    }
}

fn open_file(fs: &dyn FileSystem, path: &str) -> Result<Box<dyn FileHandle>, AudioError> {
    fs.open(path).map_err(|source| AudioError::FileNotFound {
        path: path.to_string(),
        source,
    })
}

/// The caller's handle to a loaded sound. Pass it back to
/// [`AudioEngine::unload`](super::AudioEngine::unload) to release it; any
/// instances still playing it are stopped first.
#[derive(Debug)]
pub struct Sound {
    pub(crate) asset: Arc<SoundAsset>,
}

impl Sound {
    pub fn path(&self) -> &str {
        &self.asset.path
    }

    pub fn format(&self) -> Format {
        self.asset.format
    }

    pub fn channels(&self) -> Channels {
        self.asset.info.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.asset.info.sample_rate
    }

    /// Total frames, or 0 when the container does not declare a length.
    pub fn total_frames(&self) -> u64 {
        self.asset.info.total_frames
    }

    pub fn sound_type(&self) -> SoundType {
        self.asset.sound_type
    }

    /// Playback length, if known.
    pub fn duration(&self) -> Option<Duration> {
        match self.asset.info.total_frames {
            0 => None,
            frames => Some(Duration::from_secs_f64(
                frames as f64 / self.asset.info.sample_rate as f64,
            )),
        }
    }
}
