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

//! Offline rendering of an engine into a WAV file.

use std::path::Path;

use tracing::info;

use super::engine::AudioEngine;
use super::error::AudioError;

/// Mixes `engine` period by period into a 16-bit WAV at `path`. Stops after
/// `max_frames` frames, or earlier once no instance is left playing. Returns
/// the number of frames written.
pub fn render_wav(
    engine: &AudioEngine,
    path: &Path,
    max_frames: u64,
    period_frames: usize,
) -> Result<u64, AudioError> {
    let channels = engine.channels();
    let spec = hound::WavSpec {
        channels: channels.count() as u16,
        sample_rate: engine.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;

    let period_frames = period_frames.max(1);
    let mut period = vec![0i16; period_frames * channels.count()];
    let mut written = 0u64;

    while written < max_frames {
        let frames = (max_frames - written).min(period_frames as u64) as usize;
        let samples = &mut period[..frames * channels.count()];
        engine.mix(samples, channels);

        let mut sample_writer = writer.get_i16_writer(samples.len() as u32);
        for &sample in samples.iter() {
            sample_writer.write_sample(sample);
        }
        sample_writer.flush()?;
        written += frames as u64;

        if engine.active_instances() == 0 {
            break;
        }
    }

    writer.finalize()?;
    info!(path = ?path, frames = written, "Render complete");
    Ok(written)
}
