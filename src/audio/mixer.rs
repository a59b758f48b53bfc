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
// Fixed-point mixing primitives shared by every decoder, and the post-process
// pass that turns the wide accumulator into 16-bit output.

use super::format::Channels;

/// Mixed peaks below this multiple of i16::MAX are left unscaled.
const HEADROOM: f32 = 1.05;

/// Per-instance gains in 1/256 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gains {
    pub pan_left: i32,
    pub pan_right: i32,
    pub volume: i32,
}

impl Gains {
    /// Computes the gains for an instance with the given pan and volume
    /// mixed into an output with the given layout.
    pub fn new(pan: u8, volume: u8, output: Channels) -> Self {
        let (pan_left, pan_right) = match output {
            // Panning is meaningless when both sides end up summed.
            Channels::Mono => (255, 255),
            Channels::Stereo => pan_gains(pan),
        };
        Self {
            pan_left,
            pan_right,
            volume: volume as i32,
        }
    }
}

/// Linear pan law. 0 is hard left, 127 centre, 255 hard right.
pub fn pan_gains(pan: u8) -> (i32, i32) {
    let normalized = (pan as f32 - 127.0) / 128.0;
    let left = (255.0 * (1.0 - normalized) / 2.0) as u8;
    let right = (255.0 * (1.0 + normalized) / 2.0) as u8;
    (left as i32, right as i32)
}

/// Applies gains to one source frame and adds it to the first frame of `output`.
/// Returns the number of output samples consumed.
#[inline]
pub fn mix_frame(output: &mut [i32], target: Channels, left: i32, right: i32, gains: Gains) -> usize {
    let left = (((left * gains.pan_left) >> 8) * gains.volume) >> 8;
    let right = (((right * gains.pan_right) >> 8) * gains.volume) >> 8;

    match target {
        Channels::Mono => {
            output[0] += (left + right) >> 1;
            1
        }
        Channels::Stereo => {
            output[0] += left;
            output[1] += right;
            2
        }
    }
}

/// Mixes interleaved 16-bit source frames into `output`.
/// Returns the number of frames mixed.
pub fn mix_interleaved(
    output: &mut [i32],
    source: &[i16],
    source_channels: Channels,
    target: Channels,
    gains: Gains,
) -> usize {
    let out_step = target.count();
    let frames = (source.len() / source_channels.count()).min(output.len() / out_step);

    match source_channels {
        Channels::Mono => {
            for (frame, &sample) in source[..frames].iter().enumerate() {
                let sample = sample as i32;
                mix_frame(&mut output[frame * out_step..], target, sample, sample, gains);
            }
        }
        Channels::Stereo => {
            for (frame, pair) in source[..frames * 2].chunks_exact(2).enumerate() {
                mix_frame(
                    &mut output[frame * out_step..],
                    target,
                    pair[0] as i32,
                    pair[1] as i32,
                    gains,
                );
            }
        }
    }

    frames
}

/// Returns the linear scale that brings `peak` back into the 16-bit range, or
/// 1.0 if the peak is within the headroom margin.
pub fn attenuation(peak: i64) -> f32 {
    let max = i16::MAX as f32;
    if peak as f32 > max * HEADROOM {
        max / peak as f32
    } else {
        1.0
    }
}

/// Exponential fold-back for samples still outside the 16-bit range.
#[inline]
pub fn soft_clip(sample: i32) -> i32 {
    let max = i16::MAX as i32;
    let min = i16::MIN as i32;
    if sample > max {
        let excess = (sample - max) as f32 / max as f32;
        max - (max as f32 * (1.0 - (-excess).exp())) as i32
    } else if sample < min {
        let excess = (min - sample) as f32 / max as f32;
        min + (max as f32 * (1.0 - (-excess).exp())) as i32
    } else {
        sample
    }
}

/// Converts the wide accumulator into 16-bit PCM: peak attenuation, master
/// volume, soft clipping. `output` and `accum` must be the same length.
pub fn finalize(accum: &[i32], output: &mut [i16], master_volume: u8) {
    let peak = accum
        .iter()
        .map(|&sample| (sample as i64).abs())
        .max()
        .unwrap_or(0);
    let scale = attenuation(peak);
    let master = master_volume as i64;

    for (out, &sample) in output.iter_mut().zip(accum.iter()) {
        let scaled = (sample as i64 * master) >> 8;
        let scaled = (scaled as f32 * scale) as i32;
        *out = soft_clip(scaled) as i16;
    }
}
