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

//! Fixture builders shared by the test suites.

pub mod mp3;
pub mod qoa;

use std::f32::consts::PI;

/// Generate a mono sine wave at the given peak amplitude.
pub fn sine(frequency: f32, amplitude: i16, sample_rate: u32, frames: usize) -> Vec<i16> {
    (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (amplitude as f32 * (2.0 * PI * frequency * t).sin()) as i16
        })
        .collect()
}

/// Interleave two mono channels into one stereo buffer.
pub fn interleave(left: &[i16], right: &[i16]) -> Vec<i16> {
    assert_eq!(left.len(), right.len(), "channels must have the same length");
    left.iter()
        .zip(right.iter())
        .flat_map(|(&l, &r)| [l, r])
        .collect()
}

/// Calculate the signal-to-noise ratio of `decoded` against `original` in dB.
pub fn snr_db(original: &[i16], decoded: &[i16]) -> f64 {
    assert_eq!(original.len(), decoded.len());
    let signal: f64 = original.iter().map(|&s| (s as f64).powi(2)).sum();
    let noise: f64 = original
        .iter()
        .zip(decoded.iter())
        .map(|(&o, &d)| (o as f64 - d as f64).powi(2))
        .sum();
    if noise == 0.0 {
        return f64::INFINITY;
    }
    10.0 * (signal / noise).log10()
}
