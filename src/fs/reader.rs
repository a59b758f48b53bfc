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
use std::io::{self, Read, Seek, SeekFrom};

use symphonia::core::io::MediaSource;

use super::FileHandle;

/// Adapts a [`FileHandle`] to `std::io::Read + Seek` so it can feed
/// symphonia's media source stream.
pub struct HandleReader {
    handle: Box<dyn FileHandle>,
}

impl HandleReader {
    pub fn new(handle: Box<dyn FileHandle>) -> Self {
        Self { handle }
    }
}

impl Read for HandleReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.handle.read(buf)
    }
}

impl Seek for HandleReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.handle.length().checked_add_signed(delta),
            SeekFrom::Current(delta) => self.handle.position().checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of file")
        })?;
        self.handle.seek(target)?;
        Ok(target)
    }
}

impl MediaSource for HandleReader {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.handle.length())
    }
}
