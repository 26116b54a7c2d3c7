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

//! A cheaply-clonable, zero-copy view over an owned byte buffer.

use std::ops::Deref;
use std::sync::Arc;

/// An immutable, reference-counted byte buffer with a `(start, len)` window.
/// Slicing (`start_from`, `range`) never copies; it only narrows the window,
/// which is what lets the page pipeline hand level/value sub-regions of one
/// decompressed page buffer to independent decoders without reallocating.
#[derive(Clone, Debug)]
pub struct ByteBufferPtr {
    data: Arc<[u8]>,
    start: usize,
    len: usize,
}

impl ByteBufferPtr {
    pub fn new(data: Vec<u8>) -> Self {
        let len = data.len();
        Self {
            data: Arc::from(data.into_boxed_slice()),
            start: 0,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns a new view starting `start` bytes into this one, running to
    /// the end of the current window.
    pub fn start_from(&self, start: usize) -> Self {
        assert!(start <= self.len);
        Self {
            data: self.data.clone(),
            start: self.start + start,
            len: self.len - start,
        }
    }

    /// Returns a new view of `len` bytes beginning `start` bytes into this
    /// one.
    pub fn range(&self, start: usize, len: usize) -> Self {
        assert!(start + len <= self.len);
        Self {
            data: self.data.clone(),
            start: self.start + start,
            len,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data[self.start..self.start + self.len]
    }
}

impl AsRef<[u8]> for ByteBufferPtr {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}

impl Deref for ByteBufferPtr {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data()
    }
}

impl From<Vec<u8>> for ByteBufferPtr {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}
