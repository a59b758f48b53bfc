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

use super::mp3::Mp3Decoder;
use super::qoa::QoaDecoder;
use super::traits::Decoder;
use crate::audio::error::AudioError;
use crate::audio::format::Format;
use crate::fs::FileHandle;

/// Creates a streaming decoder for the given format over an open file.
pub fn open_decoder(
    format: Format,
    handle: Box<dyn FileHandle>,
) -> Result<Box<dyn Decoder>, AudioError> {
    match format {
        Format::Qoa => Ok(Box::new(QoaDecoder::open(handle)?)),
        Format::Mp3 => Ok(Box::new(Mp3Decoder::open(handle)?)),
    }
}

/// Decodes the rest of a stream into one interleaved PCM buffer.
pub fn preload(decoder: &mut dyn Decoder) -> Result<Arc<[i16]>, AudioError> {
    let info = decoder.info();
    let mut pcm = Vec::with_capacity(info.total_frames as usize * info.channels.count());
    while decoder.read_block(&mut pcm)? {}
    Ok(pcm.into())
}
