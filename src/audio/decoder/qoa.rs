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
//! Streaming decoder for the Quite OK Audio format.
//!
//! A QOA file is an 8-byte file header followed by independent frames. Each
//! frame carries a header, the LMS predictor state of every channel, and up to
//! 256 slices per channel. A slice packs a 4-bit scalefactor and twenty 3-bit
//! quantized residuals into one big-endian u64.
use tracing::debug;

use super::traits::{BlockDecoder, Staging, StreamInfo};
use crate::audio::error::AudioError;
use crate::audio::format::Channels;
use crate::fs::FileHandle;

pub const MAGIC: u32 = 0x716f_6166; // "qoaf"
pub const FILE_HEADER_SIZE: u64 = 8;
pub const FRAME_HEADER_SIZE: usize = 8;
pub const LMS_LEN: usize = 4;
pub const SLICE_LEN: usize = 20;
pub const SLICES_PER_FRAME: usize = 256;
pub const FRAME_LEN: usize = SLICES_PER_FRAME * SLICE_LEN;

pub const SCALEFACTORS: [i32; 16] = [
    1, 7, 21, 45, 84, 138, 211, 304, 421, 562, 731, 928, 1157, 1419, 1715, 2048,
];

/// `round(scalefactor * {0.75, -0.75, 2.5, -2.5, 4.5, -4.5, 7, -7})`, rounding
/// half away from zero.
pub const DEQUANT: [[i32; 8]; 16] = [
    [1, -1, 3, -3, 5, -5, 7, -7],
    [5, -5, 18, -18, 32, -32, 49, -49],
    [16, -16, 53, -53, 95, -95, 147, -147],
    [34, -34, 113, -113, 203, -203, 315, -315],
    [63, -63, 210, -210, 378, -378, 588, -588],
    [104, -104, 345, -345, 621, -621, 966, -966],
    [158, -158, 528, -528, 950, -950, 1477, -1477],
    [228, -228, 760, -760, 1368, -1368, 2128, -2128],
    [316, -316, 1053, -1053, 1895, -1895, 2947, -2947],
    [422, -422, 1405, -1405, 2529, -2529, 3934, -3934],
    [548, -548, 1828, -1828, 3290, -3290, 5117, -5117],
    [696, -696, 2320, -2320, 4176, -4176, 6496, -6496],
    [868, -868, 2893, -2893, 5207, -5207, 8099, -8099],
    [1064, -1064, 3548, -3548, 6386, -6386, 9933, -9933],
    [1286, -1286, 4288, -4288, 7718, -7718, 12005, -12005],
    [1536, -1536, 5120, -5120, 9216, -9216, 14336, -14336],
];

/// Size in bytes of a full frame for the given channel count.
pub fn max_frame_size(channels: usize) -> usize {
    FRAME_HEADER_SIZE + LMS_LEN * 4 * channels + 8 * SLICES_PER_FRAME * channels
}

/// Sign-sign LMS predictor state for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lms {
    pub history: [i32; LMS_LEN],
    pub weights: [i32; LMS_LEN],
}

impl Lms {
    pub fn predict(&self) -> i32 {
        let mut prediction: i32 = 0;
        for (weight, history) in self.weights.iter().zip(self.history.iter()) {
            prediction = prediction.wrapping_add(weight.wrapping_mul(*history));
        }
        prediction >> 13
    }

    pub fn update(&mut self, sample: i32, residual: i32) {
        let delta = residual >> 4;
        for (weight, history) in self.weights.iter_mut().zip(self.history.iter()) {
            *weight = weight.wrapping_add(if *history < 0 { -delta } else { delta });
        }
        self.history.copy_within(1.., 0);
        self.history[LMS_LEN - 1] = sample;
    }
}

#[inline]
pub fn clamp_s16(v: i32) -> i32 {
    v.clamp(i16::MIN as i32, i16::MAX as i32)
}

#[inline]
fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_be_bytes(raw)
}

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameHeader {
    channels: u16,
    sample_rate: u32,
    samples: usize,
    size: usize,
}

impl FrameHeader {
    fn parse(raw: u64) -> Self {
        Self {
            channels: ((raw >> 56) & 0xff) as u16,
            sample_rate: ((raw >> 32) & 0xff_ffff) as u32,
            samples: ((raw >> 16) & 0xffff) as usize,
            size: (raw & 0xffff) as usize,
        }
    }
}

/// Incremental QOA decoder over a file handle. One frame is decoded into the
/// staging buffer per refill.
pub struct QoaDecoder {
    handle: Box<dyn FileHandle>,
    info: StreamInfo,
    frame: Vec<u8>,
    lms: Vec<Lms>,
    staging: Staging,
    frames_decoded: u64,
}

impl QoaDecoder {
    /// Validates the file header and the first frame header, then positions
    /// the handle at the first frame.
    pub fn open(mut handle: Box<dyn FileHandle>) -> Result<Self, AudioError> {
        let mut header = [0u8; FILE_HEADER_SIZE as usize + FRAME_HEADER_SIZE];
        if handle.read_full(&mut header)? < header.len() {
            return Err(AudioError::invalid_qoa("file is shorter than its headers"));
        }

        let file_header = read_u64(&header, 0);
        if (file_header >> 32) as u32 != MAGIC {
            return Err(AudioError::invalid_qoa("missing 'qoaf' magic"));
        }
        let total_frames = file_header & 0xffff_ffff;

        let first = FrameHeader::parse(read_u64(&header, FILE_HEADER_SIZE as usize));
        if first.channels == 0 {
            return Err(AudioError::invalid_qoa("first frame declares no channels"));
        }
        let channels = Channels::try_from(first.channels)?;
        if first.sample_rate == 0 {
            return Err(AudioError::invalid_qoa("first frame declares a zero sample rate"));
        }

        handle.seek(FILE_HEADER_SIZE)?;

        let count = channels.count();
        Ok(Self {
            handle,
            info: StreamInfo {
                sample_rate: first.sample_rate,
                channels,
                total_frames,
            },
            frame: vec![0u8; max_frame_size(count)],
            lms: vec![Lms::default(); count],
            staging: Staging::with_capacity(FRAME_LEN * count),
            frames_decoded: 0,
        })
    }

    /// Reads and decodes the next frame. Returns the decoded frame count, or
    /// None at a clean end of stream.
    fn decode_next_frame(&mut self) -> Result<Option<usize>, AudioError> {
        let channels = self.info.channels.count();

        let read = self.handle.read_full(&mut self.frame[..FRAME_HEADER_SIZE])?;
        if read == 0 {
            return Ok(None);
        }
        if read < FRAME_HEADER_SIZE {
            return Err(AudioError::invalid_qoa("truncated frame header"));
        }

        let header = FrameHeader::parse(read_u64(&self.frame, 0));
        if header.channels as usize != channels || header.sample_rate != self.info.sample_rate {
            return Err(AudioError::invalid_qoa(format!(
                "frame format changed mid-stream ({} channels at {}Hz)",
                header.channels, header.sample_rate
            )));
        }

        let lms_size = LMS_LEN * 4 * channels;
        if header.size < FRAME_HEADER_SIZE + lms_size || header.size > self.frame.len() {
            return Err(AudioError::invalid_qoa(format!(
                "frame size {} out of range",
                header.size
            )));
        }
        let num_slices = (header.size - FRAME_HEADER_SIZE - lms_size) / 8;
        if header.samples * channels > num_slices * SLICE_LEN {
            return Err(AudioError::invalid_qoa(format!(
                "frame claims {} samples but holds {} slices",
                header.samples, num_slices
            )));
        }

        let body = &mut self.frame[FRAME_HEADER_SIZE..header.size];
        let expected = body.len();
        if self.handle.read_full(body)? < expected {
            return Err(AudioError::invalid_qoa("truncated frame"));
        }

        let mut p = FRAME_HEADER_SIZE;
        for lms in self.lms.iter_mut() {
            let mut history = read_u64(&self.frame, p);
            let mut weights = read_u64(&self.frame, p + 8);
            p += 16;
            for i in 0..LMS_LEN {
                lms.history[i] = (history >> 48) as i16 as i32;
                history <<= 16;
                lms.weights[i] = (weights >> 48) as i16 as i32;
                weights <<= 16;
            }
        }

        let samples = self.staging.refill_buffer();
        samples.resize(header.samples * channels, 0);

        let mut sample_index = 0;
        while sample_index < header.samples {
            for c in 0..channels {
                let mut slice = read_u64(&self.frame, p);
                p += 8;

                let scalefactor = ((slice >> 60) & 0xf) as usize;
                let lms = &mut self.lms[c];
                let slice_end = (sample_index + SLICE_LEN).min(header.samples);
                for si in sample_index..slice_end {
                    let predicted = lms.predict();
                    let quantized = ((slice >> 57) & 0x7) as usize;
                    let dequantized = DEQUANT[scalefactor][quantized];
                    let reconstructed = clamp_s16(predicted + dequantized);

                    samples[si * channels + c] = reconstructed as i16;
                    slice <<= 3;

                    lms.update(reconstructed, dequantized);
                }
            }
            sample_index += SLICE_LEN;
        }

        Ok(Some(header.samples))
    }
}

impl BlockDecoder for QoaDecoder {
    fn stream_info(&self) -> StreamInfo {
        self.info
    }

    fn staging(&mut self) -> &mut Staging {
        &mut self.staging
    }

    fn refill(&mut self) -> Result<bool, AudioError> {
        let total = self.info.total_frames;
        if total > 0 && self.frames_decoded >= total {
            return Ok(false);
        }

        let Some(frames) = self.decode_next_frame()? else {
            debug!(decoded = self.frames_decoded, "QOA stream ended");
            return Ok(false);
        };

        // Never play past the length the file header declares.
        let mut frames = frames as u64;
        if total > 0 && self.frames_decoded + frames > total {
            frames = total - self.frames_decoded;
            let keep = frames as usize * self.info.channels.count();
            self.staging.truncate(keep);
        }
        self.frames_decoded += frames;
        Ok(true)
    }

    fn rewind(&mut self) -> Result<(), AudioError> {
        self.handle.seek(FILE_HEADER_SIZE)?;
        self.frames_decoded = 0;
        Ok(())
    }
}
