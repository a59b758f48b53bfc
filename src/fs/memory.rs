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
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use super::{FileHandle, FileSystem};

/// A read-only filesystem backed by in-memory file images.
///
/// Suits assets packed into the binary and tests. File contents are shared
/// between open handles.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: HashMap<String, Arc<[u8]>>,
}

impl MemoryFileSystem {
    /// Creates an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file.
    pub fn insert<D: Into<Arc<[u8]>>>(&mut self, path: &str, data: D) {
        self.files.insert(path.to_string(), data.into());
    }

    /// Builder-style variant of [`MemoryFileSystem::insert`].
    pub fn with_file<D: Into<Arc<[u8]>>>(mut self, path: &str, data: D) -> Self {
        self.insert(path, data);
        self
    }

    /// Returns the paths of all files, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn FileHandle>> {
        match self.files.get(path) {
            Some(data) => Ok(Box::new(MemoryFile {
                data: data.clone(),
                position: 0,
            })),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: no such file", path),
            )),
        }
    }

    fn read_fully(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files.get(path).map(|data| data.to_vec()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{}: no such file", path))
        })
    }
}

struct MemoryFile {
    data: Arc<[u8]>,
    position: u64,
}

impl FileHandle for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = (self.position as usize).min(self.data.len());
        let to_copy = buf.len().min(self.data.len() - start);
        buf[..to_copy].copy_from_slice(&self.data[start..start + to_copy]);
        self.position += to_copy as u64;
        Ok(to_copy)
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        if offset > self.data.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seek to {} past end of {}-byte file", offset, self.data.len()),
            ));
        }
        self.position = offset;
        Ok(())
    }

    fn length(&self) -> u64 {
        self.data.len() as u64
    }

    fn position(&self) -> u64 {
        self.position
    }
}
