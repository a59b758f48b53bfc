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
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::{FileHandle, FileSystem};

/// A filesystem rooted at a directory on disk. Paths are resolved relative to
/// the root unless they are absolute.
#[derive(Debug, Clone)]
pub struct DirFileSystem {
    root: PathBuf,
}

impl DirFileSystem {
    /// Creates a filesystem rooted at the given directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.root.join(path)
        }
    }
}

impl FileSystem for DirFileSystem {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn FileHandle>> {
        let resolved = self.resolve(path);
        // Include the path so the caller sees which file failed.
        let file = File::open(&resolved)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", resolved.display(), e)))?;
        let length = file.metadata()?.len();
        Ok(Box::new(DiskFile {
            file,
            length,
            position: 0,
        }))
    }

    fn read_fully(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path))
    }
}

struct DiskFile {
    file: File,
    length: u64,
    position: u64,
}

impl FileHandle for DiskFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.file.read(buf)?;
        self.position += read as u64;
        Ok(read)
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.position = self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn position(&self) -> u64 {
        self.position
    }
}
