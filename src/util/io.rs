// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! I/O helpers shared between the file-backed and in-memory chunk readers.

use std::io::{self, Read, Seek, SeekFrom};

/// A type that can be cloned into an independent handle to the same
/// underlying resource (e.g. `File::try_clone`), so that each column chunk
/// reader can own a private cursor without duplicating the resource itself.
pub trait TryClone: Sized {
    fn try_clone(&self) -> io::Result<Self>;
}

/// A bounded, seekable view into `[start, start + length)` of a shared
/// resource `R`. Each row group / column chunk reader gets its own
/// `FileSource` so that seeking one does not disturb the others, even
/// though they share the same underlying file descriptor via `try_clone`.
pub struct FileSource<R: TryClone> {
    reader: R,
    start: u64,
    end: u64,
    pos: u64,
}

impl<R: TryClone> FileSource<R> {
    pub fn new(fd: &R, start: u64, length: usize) -> Self {
        let reader = fd.try_clone().expect("Unable to clone underlying file source");
        Self {
            reader,
            start,
            end: start + length as u64,
            pos: start,
        }
    }
}

impl<R: TryClone + Read + Seek> Read for FileSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes_to_read = buf.len().min((self.end - self.pos) as usize);
        if bytes_to_read == 0 {
            return Ok(0);
        }
        self.reader.seek(SeekFrom::Start(self.pos))?;
        let read = self.reader.read(&mut buf[..bytes_to_read])?;
        self.pos += read as u64;
        Ok(read)
    }
}
