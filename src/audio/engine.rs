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

//! The audio engine: sound loading, instance control and mixing.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::error::AudioError;
use super::format::{Channels, PlaybackMode, SoundType};
use super::mixer::{self, Gains};
use super::pool::{Instance, InstanceId, InstancePool};
use super::sound::{Sound, SoundAsset};
use crate::config;
use crate::fs::FileSystem;

/// Default number of simultaneously playing instances.
pub const DEFAULT_MAX_INSTANCES: usize = 32;

/// Owns the instance pool and mixes it into 16-bit PCM.
///
/// One engine is shared (usually through an `Arc`) between the application
/// thread, which loads and plays sounds, and the audio callback, which calls
/// [`AudioEngine::mix`]. A single mutex guards every slot and decoder; it is
/// held for the decode part of a mix period and for each control call.
pub struct AudioEngine {
    sample_rate: u32,
    channels: Channels,
    pool: Mutex<InstancePool>,
    master_volume: AtomicU8,
    /// Wide accumulator reused across mix periods.
    accumulator: Mutex<Vec<i32>>,
}

impl AudioEngine {
    /// Creates an engine with the default pool size.
    pub fn new(sample_rate: u32, channels: Channels) -> Self {
        Self::with_capacity(sample_rate, channels, DEFAULT_MAX_INSTANCES)
    }

    /// Creates an engine with room for `max_instances` simultaneous instances.
    pub fn with_capacity(sample_rate: u32, channels: Channels, max_instances: usize) -> Self {
        info!(
            sample_rate,
            channels = channels.count(),
            max_instances,
            "Audio engine initialized"
        );
        Self {
            sample_rate,
            channels,
            pool: Mutex::new(InstancePool::new(max_instances)),
            master_volume: AtomicU8::new(u8::MAX),
            accumulator: Mutex::new(Vec::new()),
        }
    }

    /// Creates an engine from the audio section of the configuration.
    pub fn from_config(config: &config::Audio) -> Result<Self, AudioError> {
        let engine = Self::with_capacity(
            config.sample_rate(),
            Channels::try_from(config.channels())?,
            config.max_instances(),
        );
        engine.set_master_volume(config.master_volume());
        Ok(engine)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn max_instances(&self) -> usize {
        self.pool.lock().capacity()
    }

    /// Loads a sound. The file's sample rate must match the engine's.
    pub fn load(
        &self,
        fs: Arc<dyn FileSystem>,
        path: &str,
        sound_type: SoundType,
    ) -> Result<Sound, AudioError> {
        let asset = SoundAsset::load(fs, path, sound_type, self.sample_rate)?;
        Ok(Sound {
            asset: Arc::new(asset),
        })
    }

    /// Stops every instance of the sound, then releases it.
    pub fn unload(&self, sound: Sound) {
        let stopped = self.pool.lock().remove_asset(&sound.asset);
        info!(path = sound.path(), stopped, "Sound unloaded");
    }

    /// Starts a new instance of `sound`. If every slot is busy, the oldest
    /// instance is evicted. On error the pool is left unchanged.
    pub fn play(
        &self,
        sound: &Sound,
        volume: u8,
        pan: u8,
        mode: PlaybackMode,
    ) -> Result<InstanceId, AudioError> {
        // Open the file before taking the lock so the callback is not stalled
        // behind filesystem I/O.
        let decoder = sound.asset.open_decoder()?;
        let instance = Instance::new(sound.asset.clone(), decoder, volume, pan, mode);
        Ok(self.pool.lock().insert(instance))
    }

    /// Stops an instance. Stale handles are ignored.
    pub fn stop(&self, id: InstanceId) {
        if self.pool.lock().remove(id).is_some() {
            debug!(instance = %id, "Instance stopped");
        }
    }

    /// Stops every playing instance.
    pub fn stop_all(&self) {
        let stopped = self.pool.lock().clear();
        debug!(stopped, "All instances stopped");
    }

    pub fn set_volume(&self, id: InstanceId, volume: u8) {
        if let Some(instance) = self.pool.lock().get_mut(id) {
            instance.volume = volume;
        }
    }

    pub fn set_pan(&self, id: InstanceId, pan: u8) {
        if let Some(instance) = self.pool.lock().get_mut(id) {
            instance.pan = pan;
        }
    }

    /// True while the instance holds its slot.
    pub fn is_playing(&self, id: InstanceId) -> bool {
        self.pool.lock().is_playing(id)
    }

    /// Number of instances currently playing.
    pub fn active_instances(&self) -> usize {
        self.pool.lock().active()
    }

    pub fn set_master_volume(&self, volume: u8) {
        self.master_volume.store(volume, Ordering::Relaxed);
    }

    pub fn master_volume(&self) -> u8 {
        self.master_volume.load(Ordering::Relaxed)
    }

    /// Fills `output` with the next period of interleaved PCM laid out as
    /// `channels`. The frame count is `output.len() / channels.count()`; any
    /// trailing partial frame is zeroed.
    pub fn mix(&self, output: &mut [i16], channels: Channels) {
        let step = channels.count();
        let frames = output.len() / step;
        let samples = frames * step;

        let mut accumulator = self.accumulator.lock();
        accumulator.clear();
        accumulator.resize(samples, 0);

        {
            let mut pool = self.pool.lock();
            for (slot, entry) in pool.slots_mut() {
                let Some(instance) = entry.as_mut() else {
                    continue;
                };
                if !Self::mix_instance(instance, &mut accumulator, frames, channels) {
                    debug!(id = instance.id(), slot, "Instance finished");
                    *entry = None;
                }
            }
        }

        let master = self.master_volume();
        mixer::finalize(&accumulator, &mut output[..samples], master);
        output[samples..].fill(0);
    }

    /// Decodes one period of an instance into the accumulator, looping as
    /// needed. Returns false once the instance should be freed.
    fn mix_instance(
        instance: &mut Instance,
        accumulator: &mut [i32],
        frames: usize,
        channels: Channels,
    ) -> bool {
        let gains = Gains::new(instance.pan, instance.volume, channels);
        let step = channels.count();
        let mut written = 0;
        let mut rewound = false;

        while written < frames {
            let window = &mut accumulator[written * step..];
            match instance
                .decoder
                .decode_frames(window, frames - written, channels, gains)
            {
                Ok(0) => match instance.mode {
                    PlaybackMode::Once => return false,
                    PlaybackMode::Loop if rewound => {
                        warn!(id = instance.id(), "Looping sound produced no audio, stopping");
                        return false;
                    }
                    PlaybackMode::Loop => {
                        if let Err(e) = instance.decoder.reset() {
                            error!(id = instance.id(), err = %e, "Failed to rewind looping sound");
                            return false;
                        }
                        rewound = true;
                    }
                },
                Ok(decoded) => {
                    written += decoded;
                    rewound = false;
                }
                Err(e) => {
                    error!(id = instance.id(), err = %e, "Decode failed, stopping instance");
                    return false;
                }
            }
        }

        true
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("pool", &*self.pool.lock())
            .field("master_volume", &self.master_volume())
            .finish()
    }
}
