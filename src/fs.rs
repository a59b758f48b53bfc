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

//! Filesystem access used by sound loading and decoding.
//!
//! The audio engine never touches `std::fs` directly. Assets are read through a
//! [`FileSystem`], which hands out [`FileHandle`]s supporting sequential reads
//! and absolute seeks. Closing a handle is dropping it.

use std::io;

mod dir;
mod memory;
mod reader;

pub use dir::DirFileSystem;
pub use memory::MemoryFileSystem;
pub use reader::HandleReader;

/// An open file. Reads are sequential from the current position.
pub trait FileHandle: Send + Sync {
    /// Reads up to `buf.len()` bytes and returns how many were read (0 = EOF).
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Moves the read position to an absolute byte offset.
    fn seek(&mut self, offset: u64) -> io::Result<()>;

    /// Total length of the file in bytes.
    fn length(&self) -> u64;

    /// Current read position in bytes.
    fn position(&self) -> u64;

    /// Reads until `buf` is full or the file ends. Returns the number of bytes read.
    fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let read = self.read(&mut buf[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        Ok(filled)
    }
}

/// A source of files addressed by path.
pub trait FileSystem: Send + Sync {
    /// Returns true if a file exists at the given path.
    fn exists(&self, path: &str) -> bool;

    /// Opens the file at the given path for reading.
    fn open(&self, path: &str) -> io::Result<Box<dyn FileHandle>>;

    /// Reads the whole file at the given path into memory.
    fn read_fully(&self, path: &str) -> io::Result<Vec<u8>> {
        let mut handle = self.open(path)?;
        let mut data = vec![0u8; handle.length() as usize];
        let read = handle.read_full(&mut data)?;
        data.truncate(read);
        Ok(data)
    }
}
