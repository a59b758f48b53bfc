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

//! A small QOA encoder for building decoder fixtures.

use crate::audio::decoder::qoa::{
    clamp_s16, max_frame_size, Lms, DEQUANT, FRAME_LEN, LMS_LEN, MAGIC, SLICE_LEN,
};

const RECIPROCALS: [i64; 16] = [
    65536, 9363, 3121, 1457, 781, 475, 311, 216, 156, 117, 90, 71, 57, 47, 39, 32,
];

const QUANT: [usize; 17] = [7, 7, 7, 5, 5, 3, 3, 1, 0, 0, 2, 2, 4, 4, 6, 6, 6];

/// An encoded stream and the PCM a conforming decoder must reproduce from it.
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub reconstructed: Vec<i16>,
}

/// Divide by the scalefactor, rounding away from zero.
fn div(v: i32, scalefactor: usize) -> i32 {
    let reciprocal = RECIPROCALS[scalefactor];
    let n = ((v as i64 * reciprocal + (1 << 15)) >> 16) as i32;
    n + (v.signum() - n.signum())
}

/// Encode interleaved PCM. The file header declares the true sample count.
pub fn encode(samples: &[i16], channels: usize, sample_rate: u32) -> Encoded {
    encode_declaring(samples, channels, sample_rate, (samples.len() / channels) as u32)
}

/// Encode interleaved PCM with an arbitrary sample count in the file header.
pub fn encode_declaring(
    samples: &[i16],
    channels: usize,
    sample_rate: u32,
    declared: u32,
) -> Encoded {
    assert!(channels > 0 && samples.len() % channels == 0);
    let total = samples.len() / channels;

    let mut bytes = Vec::with_capacity(8 + total / FRAME_LEN * max_frame_size(channels));
    let mut reconstructed = vec![0i16; samples.len()];
    bytes.extend_from_slice(&(((MAGIC as u64) << 32) | declared as u64).to_be_bytes());

    let mut lms = vec![
        Lms {
            history: [0; LMS_LEN],
            weights: [0, 0, -(1 << 13), 1 << 14],
        };
        channels
    ];

    let mut frame_start = 0;
    while frame_start < total {
        let frame_len = FRAME_LEN.min(total - frame_start);
        let slices = frame_len.div_ceil(SLICE_LEN);
        let frame_size = 8 + LMS_LEN * 4 * channels + 8 * slices * channels;

        let header = ((channels as u64) << 56)
            | ((sample_rate as u64) << 32)
            | ((frame_len as u64) << 16)
            | frame_size as u64;
        bytes.extend_from_slice(&header.to_be_bytes());

        for state in lms.iter_mut() {
            let mut history = 0u64;
            let mut weights = 0u64;
            for i in 0..LMS_LEN {
                // Keep exactly what the decoder will read back.
                state.history[i] = state.history[i] as i16 as i32;
                state.weights[i] = state.weights[i] as i16 as i32;
                history = (history << 16) | (state.history[i] as u16 as u64);
                weights = (weights << 16) | (state.weights[i] as u16 as u64);
            }
            bytes.extend_from_slice(&history.to_be_bytes());
            bytes.extend_from_slice(&weights.to_be_bytes());
        }

        let mut sample_index = 0;
        while sample_index < frame_len {
            let slice_len = SLICE_LEN.min(frame_len - sample_index);
            for c in 0..channels {
                let mut best_error = u64::MAX;
                let mut best_slice = 0u64;
                let mut best_lms = lms[c];
                let mut best_pcm = [0i16; SLICE_LEN];

                for scalefactor in 0..16 {
                    let mut trial = lms[c];
                    let mut slice = scalefactor as u64;
                    let mut error = 0u64;
                    let mut pcm = [0i16; SLICE_LEN];

                    for (i, out) in pcm.iter_mut().enumerate().take(slice_len) {
                        let frame = frame_start + sample_index + i;
                        let sample = samples[frame * channels + c] as i32;
                        let predicted = trial.predict();
                        let residual = sample - predicted;
                        let scaled = div(residual, scalefactor).clamp(-8, 8);
                        let quantized = QUANT[(scaled + 8) as usize];
                        let dequantized = DEQUANT[scalefactor][quantized];
                        let value = clamp_s16(predicted + dequantized);

                        let diff = (sample - value) as i64;
                        error += (diff * diff) as u64;
                        if error > best_error {
                            break;
                        }

                        trial.update(value, dequantized);
                        slice = (slice << 3) | quantized as u64;
                        *out = value as i16;
                    }

                    if error < best_error {
                        best_error = error;
                        best_slice = slice;
                        best_lms = trial;
                        best_pcm = pcm;
                    }
                }

                lms[c] = best_lms;
                best_slice <<= (SLICE_LEN - slice_len) * 3;
                bytes.extend_from_slice(&best_slice.to_be_bytes());

                for (i, &value) in best_pcm.iter().enumerate().take(slice_len) {
                    let frame = frame_start + sample_index + i;
                    reconstructed[frame * channels + c] = value;
                }
            }
            sample_index += SLICE_LEN;
        }

        frame_start += frame_len;
    }

    Encoded {
        bytes,
        reconstructed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_div_rounds_away_from_zero() {
        assert_eq!(div(0, 3), 0);
        assert_eq!(div(1, 0), 1);
        assert_eq!(div(-1, 0), -1);
        assert_eq!(div(10, 1), 1);
        assert_eq!(div(-10, 1), -1);
        // 1 / 7 rounds to zero, then gets pushed away from it.
        assert_eq!(div(1, 1), 1);
        assert_eq!(div(-1, 1), -1);
    }

    #[test]
    fn test_frame_sizes() {
        let pcm = vec![0i16; FRAME_LEN + 25];
        let encoded = encode(&pcm, 1, 44100);
        let full = 8 + 16 + 256 * 8;
        let tail = 8 + 16 + 2 * 8;
        assert_eq!(encoded.bytes.len(), 8 + full + tail);
        assert_eq!(encoded.reconstructed.len(), pcm.len());
    }
}
