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
use std::sync::Arc;

use super::traits::{Decoder, StreamInfo};
use crate::audio::error::AudioError;
use crate::audio::format::Channels;
use crate::audio::mixer::{self, Gains};

/// A decoder over PCM decoded once at load time. Instances share the samples
/// and only own a cursor, so playing one never touches the filesystem.
pub struct PreloadedDecoder {
    samples: Arc<[i16]>,
    info: StreamInfo,
    position: usize,
}

impl PreloadedDecoder {
    pub fn new(samples: Arc<[i16]>, sample_rate: u32, channels: Channels) -> Self {
        let total_frames = (samples.len() / channels.count()) as u64;
        Self {
            samples,
            info: StreamInfo {
                sample_rate,
                channels,
                total_frames,
            },
            position: 0,
        }
    }

    fn remaining(&self) -> &[i16] {
        &self.samples[self.position.min(self.samples.len())..]
    }
}

impl Decoder for PreloadedDecoder {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn decode_frames(
        &mut self,
        output: &mut [i32],
        max_frames: usize,
        target: Channels,
        gains: Gains,
    ) -> Result<usize, AudioError> {
        let source = self.info.channels;
        let window = &mut output[..max_frames * target.count()];
        let frames = mixer::mix_interleaved(window, self.remaining(), source, target, gains);
        self.position += frames * source.count();
        Ok(frames)
    }

    fn reset(&mut self) -> Result<(), AudioError> {
        self.position = 0;
        Ok(())
    }

    fn read_block(&mut self, out: &mut Vec<i16>) -> Result<bool, AudioError> {
        if self.remaining().is_empty() {
            return Ok(false);
        }
        out.extend_from_slice(self.remaining());
        self.position = self.samples.len();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unity() -> Gains {
        Gains {
            pan_left: 256,
            pan_right: 256,
            volume: 256,
        }
    }

    #[test]
    fn test_stereo_frames_and_reset() {
        let pcm: Arc<[i16]> = vec![1, -1, 2, -2, 3, -3].into();
        let mut decoder = PreloadedDecoder::new(pcm.clone(), 22050, Channels::Stereo);
        assert_eq!(decoder.info().total_frames, 3);

        let mut out = vec![0i32; 4];
        assert_eq!(
            decoder
                .decode_frames(&mut out, 2, Channels::Stereo, unity())
                .unwrap(),
            2
        );
        assert_eq!(out, vec![1, -1, 2, -2]);

        let mut out = vec![0i32; 4];
        assert_eq!(
            decoder
                .decode_frames(&mut out, 2, Channels::Stereo, unity())
                .unwrap(),
            1
        );
        assert_eq!(&out[..2], &[3, -3]);
        assert_eq!(
            decoder
                .decode_frames(&mut out, 2, Channels::Stereo, unity())
                .unwrap(),
            0
        );

        decoder.reset().unwrap();
        let mut out = vec![0i32; 3];
        assert_eq!(
            decoder
                .decode_frames(&mut out, 3, Channels::Mono, unity())
                .unwrap(),
            3
        );
        assert_eq!(out, vec![0, 0, 0]);
    }

    #[test]
    fn test_instances_share_samples() {
        let pcm: Arc<[i16]> = vec![5, 6, 7].into();
        let mut first = PreloadedDecoder::new(pcm.clone(), 44100, Channels::Mono);
        let mut second = PreloadedDecoder::new(pcm.clone(), 44100, Channels::Mono);
        assert_eq!(Arc::strong_count(&pcm), 3);

        let mut out = vec![0i32; 2];
        first
            .decode_frames(&mut out, 2, Channels::Mono, unity())
            .unwrap();

        let mut block = Vec::new();
        assert!(second.read_block(&mut block).unwrap());
        assert_eq!(block, vec![5, 6, 7]);
        assert!(!second.read_block(&mut block).unwrap());

        let mut block = Vec::new();
        assert!(first.read_block(&mut block).unwrap());
        assert_eq!(block, vec![7]);
    }
}
