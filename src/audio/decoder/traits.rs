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
use crate::audio::error::AudioError;
use crate::audio::format::Channels;
use crate::audio::mixer::{self, Gains};

/// Stream properties discovered when a decoder is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub channels: Channels,
    /// Total frames in the stream, or 0 if the container does not say.
    pub total_frames: u64,
}

/// A per-instance decoding context that mixes straight into the wide
/// accumulator. Dropping the decoder releases its buffers and file handle.
pub trait Decoder: Send {
    /// Properties of the stream being decoded.
    fn info(&self) -> StreamInfo;

    /// Decodes up to `max_frames` frames and adds them, with `gains` applied,
    /// to the start of `output` laid out as `target`. Returns the number of
    /// frames written; 0 means the stream is exhausted.
    ///
    /// `output` must hold at least `max_frames * target.count()` samples.
    fn decode_frames(
        &mut self,
        output: &mut [i32],
        max_frames: usize,
        target: Channels,
        gains: Gains,
    ) -> Result<usize, AudioError>;

    /// Rewinds to the first decodable position and drops any staged PCM.
    fn reset(&mut self) -> Result<(), AudioError>;

    /// Appends the next block of raw interleaved PCM to `out`.
    /// Returns false once the stream is exhausted.
    fn read_block(&mut self, out: &mut Vec<i16>) -> Result<bool, AudioError>;
}

/// Decoded PCM waiting to be mixed, plus a read cursor.
#[derive(Debug, Default)]
pub struct Staging {
    samples: Vec<i16>,
    cursor: usize,
}

impl Staging {
    pub(crate) fn with_capacity(samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(samples),
            cursor: 0,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cursor >= self.samples.len()
    }

    pub(crate) fn clear(&mut self) {
        self.samples.clear();
        self.cursor = 0;
    }

    /// Clears the staging area and hands out its buffer for refilling.
    pub(crate) fn refill_buffer(&mut self) -> &mut Vec<i16> {
        self.clear();
        &mut self.samples
    }

    /// Keeps only the first `len` staged samples.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.samples.truncate(len);
    }

    pub(crate) fn remaining(&self) -> &[i16] {
        &self.samples[self.cursor.min(self.samples.len())..]
    }

    /// Mixes as much staged PCM as fits into `output`. Returns frames mixed.
    pub(crate) fn mix_into(
        &mut self,
        output: &mut [i32],
        source: Channels,
        target: Channels,
        gains: Gains,
    ) -> usize {
        let frames = mixer::mix_interleaved(output, self.remaining(), source, target, gains);
        self.cursor += frames * source.count();
        frames
    }
}

/// Backends that decode one native block (a QOA frame, an MP3 packet) at a
/// time into a [`Staging`] buffer. Every block decoder is a [`Decoder`].
pub trait BlockDecoder: Send {
    fn stream_info(&self) -> StreamInfo;

    fn staging(&mut self) -> &mut Staging;

    /// Decodes the next block into the staging buffer. Returns false at end
    /// of stream. A block may legitimately decode to zero frames.
    fn refill(&mut self) -> Result<bool, AudioError>;

    /// Repositions the underlying stream at its first block.
    fn rewind(&mut self) -> Result<(), AudioError>;
}

impl<T: BlockDecoder> Decoder for T {
    fn info(&self) -> StreamInfo {
        self.stream_info()
    }

    fn decode_frames(
        &mut self,
        output: &mut [i32],
        max_frames: usize,
        target: Channels,
        gains: Gains,
    ) -> Result<usize, AudioError> {
        let source = self.stream_info().channels;
        let step = target.count();
        let mut written = 0;

        while written < max_frames {
            if self.staging().is_empty() {
                if !self.refill()? {
                    break;
                }
                continue;
            }
            let window = &mut output[written * step..max_frames * step];
            written += self.staging().mix_into(window, source, target, gains);
        }

        Ok(written)
    }

    fn reset(&mut self) -> Result<(), AudioError> {
        self.staging().clear();
        self.rewind()
    }

    fn read_block(&mut self, out: &mut Vec<i16>) -> Result<bool, AudioError> {
        while self.staging().is_empty() {
            if !self.refill()? {
                return Ok(false);
            }
        }
        let staging = self.staging();
        out.extend_from_slice(staging.remaining());
        staging.clear();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serves fixed blocks, including an empty one, to exercise the refill loop.
    struct Blocks {
        blocks: Vec<Vec<i16>>,
        next: usize,
        staging: Staging,
        rewinds: usize,
    }

    impl Blocks {
        fn new(blocks: Vec<Vec<i16>>) -> Self {
            Self {
                blocks,
                next: 0,
                staging: Staging::default(),
                rewinds: 0,
            }
        }
    }

    impl BlockDecoder for Blocks {
        fn stream_info(&self) -> StreamInfo {
            StreamInfo {
                sample_rate: 44100,
                channels: Channels::Mono,
                total_frames: 0,
            }
        }

        fn staging(&mut self) -> &mut Staging {
            &mut self.staging
        }

        fn refill(&mut self) -> Result<bool, AudioError> {
            let Some(block) = self.blocks.get(self.next) else {
                return Ok(false);
            };
            self.staging.refill_buffer().extend_from_slice(block);
            self.next += 1;
            Ok(true)
        }

        fn rewind(&mut self) -> Result<(), AudioError> {
            self.next = 0;
            self.rewinds += 1;
            Ok(())
        }
    }

    fn unity() -> Gains {
        Gains {
            pan_left: 256,
            pan_right: 256,
            volume: 256,
        }
    }

    #[test]
    fn test_decode_frames_spans_blocks() {
        let mut decoder = Blocks::new(vec![vec![1, 2, 3], vec![], vec![4, 5]]);
        let mut out = vec![0i32; 8];

        let written = decoder
            .decode_frames(&mut out, 4, Channels::Mono, unity())
            .unwrap();
        assert_eq!(written, 4);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);

        let written = decoder
            .decode_frames(&mut out[4..], 4, Channels::Mono, unity())
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(out[4], 5);

        let written = decoder
            .decode_frames(&mut out, 4, Channels::Mono, unity())
            .unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_reset_drops_staged_samples() {
        let mut decoder = Blocks::new(vec![vec![10, 20, 30]]);
        let mut out = vec![0i32; 1];
        decoder
            .decode_frames(&mut out, 1, Channels::Mono, unity())
            .unwrap();
        assert_eq!(out[0], 10);

        decoder.reset().unwrap();
        assert_eq!(decoder.rewinds, 1);

        let mut out = vec![0i32; 3];
        let written = decoder
            .decode_frames(&mut out, 3, Channels::Mono, unity())
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(out, vec![10, 20, 30]);
    }

    #[test]
    fn test_read_block_skips_empty_blocks() {
        let mut decoder = Blocks::new(vec![vec![], vec![7, 8]]);
        let mut pcm = Vec::new();
        assert!(decoder.read_block(&mut pcm).unwrap());
        assert_eq!(pcm, vec![7, 8]);
        assert!(!decoder.read_block(&mut pcm).unwrap());
    }

    #[test]
    fn test_mono_source_into_stereo_output() {
        let mut decoder = Blocks::new(vec![vec![100, 200]]);
        let mut out = vec![0i32; 4];
        let written = decoder
            .decode_frames(&mut out, 2, Channels::Stereo, unity())
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(out, vec![100, 100, 200, 200]);
    }
}
