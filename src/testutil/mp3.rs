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

/// Bytes in a 128kbps 44.1kHz MPEG-1 Layer III frame without padding.
pub const FRAME_BYTES: usize = 417;

/// PCM frames per MPEG-1 Layer III frame.
pub const FRAME_SAMPLES: usize = 1152;

/// Build an MP3 stream of digital silence: MPEG-1 Layer III, 128kbps,
/// 44.1kHz, no CRC. Zeroed side info means no main data, which decodes to
/// all-zero PCM.
pub fn silent_frames(frames: usize, stereo: bool) -> Vec<u8> {
    let mode = if stereo { 0x00 } else { 0xC0 };
    let mut data = Vec::with_capacity(frames * FRAME_BYTES);
    for _ in 0..frames {
        let start = data.len();
        data.extend_from_slice(&[0xFF, 0xFB, 0x90, mode]);
        data.resize(start + FRAME_BYTES, 0);
    }
    data
}
