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
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_MP3};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::debug;

use super::traits::{BlockDecoder, Staging, StreamInfo};
use crate::audio::error::AudioError;
use crate::audio::format::Channels;
use crate::fs::{FileHandle, HandleReader};

/// Samples per channel in one MPEG-1 Layer III frame.
const FRAME_SAMPLES: usize = 1152;

/// MP3 decoder backed by symphonia. The bitstream reader pulls bytes through
/// the file handle; one MPEG frame is decoded per refill.
pub struct Mp3Decoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
    track_id: u32,
    info: StreamInfo,
    sample_buf: Option<SampleBuffer<i16>>,
    staging: Staging,
}

impl Mp3Decoder {
    /// Syncs to the first frame to discover sample rate and channel layout.
    /// The total length is not scanned for and is reported as 0.
    pub fn open(handle: Box<dyn FileHandle>) -> Result<Self, AudioError> {
        let mss = MediaSourceStream::new(Box::new(HandleReader::new(handle)), Default::default());

        let mut hint = Hint::new();
        hint.with_extension("mp3");

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();
        let probed = get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec == CODEC_TYPE_MP3)
            .ok_or_else(|| AudioError::invalid_mp3("no MPEG Layer III track found"))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| AudioError::invalid_mp3("sample rate not specified"))?;

        let decoder_opts: DecoderOptions = Default::default();
        let mut decoder = get_codecs().make(&params, &decoder_opts)?;

        let mut staging = Staging::with_capacity(FRAME_SAMPLES * 2);
        let mut sample_buf = None;

        // The reader usually knows the layout from the first frame header.
        // If not, decode that frame now and keep its PCM staged.
        let channels = match params.channels {
            Some(channels) => channels.count(),
            None => Self::decode_next_packet(
                format.as_mut(),
                decoder.as_mut(),
                track_id,
                &mut sample_buf,
                staging.refill_buffer(),
            )?
            .ok_or_else(|| AudioError::invalid_mp3("no decodable frames"))?,
        };
        let channels = Channels::try_from(channels as u16)?;

        debug!(sample_rate, channels = channels.count(), "MP3 stream opened");

        Ok(Self {
            format,
            decoder,
            track_id,
            info: StreamInfo {
                sample_rate,
                channels,
                total_frames: 0,
            },
            sample_buf,
            staging,
        })
    }

    /// Reads packets until one for our track decodes, and writes its PCM to
    /// `out` interleaved. Returns the packet's channel count, or None at end
    /// of stream.
    fn decode_next_packet(
        format: &mut dyn FormatReader,
        decoder: &mut dyn symphonia::core::codecs::Decoder,
        track_id: u32,
        sample_buf: &mut Option<SampleBuffer<i16>>,
        out: &mut Vec<i16>,
    ) -> Result<Option<usize>, AudioError> {
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(reason)) => {
                    // Corrupt frames are skipped, as a hardware decoder would.
                    debug!(reason, "Skipping undecodable MP3 frame");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count();
            if decoded.frames() == 0 {
                out.clear();
                return Ok(Some(channels));
            }

            let needed = decoded.capacity() * channels;
            let buf = match sample_buf.take() {
                Some(buf) if buf.capacity() >= needed => sample_buf.insert(buf),
                _ => sample_buf.insert(SampleBuffer::new(decoded.capacity() as u64, spec)),
            };
            buf.copy_interleaved_ref(decoded);
            out.clear();
            out.extend_from_slice(buf.samples());
            return Ok(Some(channels));
        }
    }
}

impl BlockDecoder for Mp3Decoder {
    fn stream_info(&self) -> StreamInfo {
        self.info
    }

    fn staging(&mut self) -> &mut Staging {
        &mut self.staging
    }

    fn refill(&mut self) -> Result<bool, AudioError> {
        let decoded = Self::decode_next_packet(
            self.format.as_mut(),
            self.decoder.as_mut(),
            self.track_id,
            &mut self.sample_buf,
            self.staging.refill_buffer(),
        )?;
        match decoded {
            None => Ok(false),
            Some(channels) if channels == self.info.channels.count() => Ok(true),
            Some(channels) => Err(AudioError::invalid_mp3(format!(
                "channel count changed mid-stream from {} to {}",
                self.info.channels.count(),
                channels
            ))),
        }
    }

    fn rewind(&mut self) -> Result<(), AudioError> {
        self.format.seek(
            SeekMode::Accurate,
            SeekTo::TimeStamp {
                ts: 0,
                track_id: self.track_id,
            },
        )?;
        self.decoder.reset();
        Ok(())
    }
}
