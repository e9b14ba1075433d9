//! Lockstep window reader over two raw YUV 4:2:0 streams.
//!
//! Each call to [`PlaneWindowReader::next_window`] reads one plane-sized
//! window from both inputs. Window sizes follow the frame layout (`area`,
//! then `area/4` twice), so both streams are always at the same byte offset.

use std::io::{self, Read};

use crate::geometry::{FrameGeometry, Plane};
use crate::PsnrError;

/// What to do when the two streams stop lining up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShortReadPolicy {
    /// Fail with [`PsnrError::ShortRead`] if either stream delivers fewer
    /// bytes than the window needs, or both end in the middle of a frame.
    #[default]
    Reject,
    /// Zero-pad short windows and keep going. A frame left incomplete when
    /// both streams end is dropped by the pipeline.
    ZeroFill,
}

/// A pair of equal-length plane windows, one from each stream.
///
/// Owned by the task that computes its difference once dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Plane the bytes belong to.
    pub plane: Plane,
    /// Zero-based frame index.
    pub frame: u64,
    /// Bytes from the first stream.
    pub first: Vec<u8>,
    /// Bytes from the second stream.
    pub second: Vec<u8>,
}

impl Window {
    /// Window length in bytes (same for both sides).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.first.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }
}

/// Reads plane windows from two streams in lockstep.
pub struct PlaneWindowReader<R0, R1> {
    first: R0,
    second: R1,
    geometry: FrameGeometry,
    policy: ShortReadPolicy,
    /// Bytes consumed in the current frame.
    count: usize,
    read_unit: usize,
    frame: u64,
    zero_filled: u64,
    finished: bool,
}

impl<R0: Read, R1: Read> PlaneWindowReader<R0, R1> {
    pub fn new(first: R0, second: R1, geometry: FrameGeometry, policy: ShortReadPolicy) -> Self {
        Self {
            first,
            second,
            geometry,
            policy,
            count: 0,
            read_unit: geometry.area(),
            frame: 0,
            zero_filled: 0,
            finished: false,
        }
    }

    /// Reads the next window, or `None` once both streams are exhausted.
    ///
    /// # Errors
    /// I/O errors from either stream, and [`PsnrError::ShortRead`] under
    /// [`ShortReadPolicy::Reject`].
    pub fn next_window(&mut self) -> Result<Option<Window>, PsnrError> {
        if self.finished {
            return Ok(None);
        }

        let len = self.read_unit;
        let mut first = vec![0u8; len];
        let mut second = vec![0u8; len];
        let got_first = read_full(&mut self.first, &mut first)?;
        let got_second = read_full(&mut self.second, &mut second)?;

        if got_first == 0 && got_second == 0 && self.count == 0 {
            self.finished = true;
            return Ok(None);
        }

        let plane = self.geometry.classify(self.count + len);
        if got_first < len || got_second < len {
            match self.policy {
                ShortReadPolicy::Reject => {
                    let (stream, actual) = if got_first <= got_second {
                        (0, got_first)
                    } else {
                        (1, got_second)
                    };
                    self.finished = true;
                    return Err(PsnrError::ShortRead {
                        stream,
                        frame: self.frame,
                        plane,
                        expected: len,
                        actual,
                    });
                }
                ShortReadPolicy::ZeroFill if got_first == 0 && got_second == 0 => {
                    // Both ended mid-frame; the caller sees `is_mid_frame()`.
                    self.finished = true;
                    return Ok(None);
                }
                ShortReadPolicy::ZeroFill => {
                    if self.zero_filled == 0 {
                        tracing::warn!(
                            frame = self.frame,
                            %plane,
                            expected = len,
                            first = got_first,
                            second = got_second,
                            "short read, zero-filling window"
                        );
                    }
                    self.zero_filled += 1;
                }
            }
        }

        self.count += len;
        let frame = self.frame;
        if self.geometry.is_frame_end(self.count) {
            self.count = 0;
            self.read_unit = self.geometry.area();
            self.frame += 1;
        } else {
            self.read_unit = self.geometry.chroma_len();
        }

        Ok(Some(Window {
            plane,
            frame,
            first,
            second,
        }))
    }

    /// Whether the reader stopped (or sits) partway through a frame.
    #[must_use]
    pub fn is_mid_frame(&self) -> bool {
        self.count != 0
    }

    /// Number of windows that were zero-padded.
    #[must_use]
    pub fn zero_filled_windows(&self) -> u64 {
        self.zero_filled
    }

    #[must_use]
    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }
}

/// Reads until `buf` is full or the reader hits EOF. Returns bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
