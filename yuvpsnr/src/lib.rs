//! # yuvpsnr
//!
//! Per-frame and aggregate PSNR between two raw planar YUV 4:2:0 streams.
//!
//! Both inputs are read in lockstep one plane at a time. Each plane window's
//! squared error is computed on its own worker thread while the next windows
//! are read, and results are folded back strictly in stream order, so the
//! numbers match a single-threaded run bit for bit.
//!
//! ## Example
//!
//! ```rust
//! use std::io::Cursor;
//! use yuvpsnr::{compare_streams, CompareParams};
//!
//! // Two 16x16 frames: area 256, one frame = 384 bytes.
//! let reference = vec![128u8; 384 * 2];
//! let distorted = vec![130u8; 384 * 2];
//!
//! let params = CompareParams::new().with_dimensions(16, 16).with_concurrency(2);
//! let report = compare_streams(
//!     Cursor::new(reference),
//!     Cursor::new(distorted),
//!     &params,
//!     |frame| println!("frame {}: Y {:.2} dB", frame.index, frame.psnr.y),
//! )?;
//!
//! assert_eq!(report.totals.frames, 2);
//! assert_eq!(report.totals.mse.y, 4.0);
//! # Ok::<(), yuvpsnr::PsnrError>(())
//! ```
//!
//! ## Input format
//!
//! Frames are `Y(w*h) U(w*h/4) V(w*h/4)`, one byte per sample, concatenated
//! with no header. Width and height must be even.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

pub mod aggregate;
pub mod diff;
pub mod geometry;
pub mod pipeline;
pub mod psnr;
pub mod queue;
pub mod reader;
pub mod report;

use std::fmt;
use std::io;
use std::path::PathBuf;

pub use aggregate::{FrameAggregator, FrameReport, StreamTotals};
pub use diff::{dispatch, sum_squared_error, TaskHandle};
pub use geometry::{FrameGeometry, Plane};
pub use pipeline::{
    compare_files, compare_streams, CompareParams, Comparison, PipelineStats, StreamReport,
};
pub use psnr::{mse_to_psnr, PlanarMetrics};
pub use queue::{Admission, PlaneQueues};
pub use reader::{PlaneWindowReader, ShortReadPolicy, Window};

/// Error type for PSNR computation.
#[derive(Debug)]
#[non_exhaustive]
pub enum PsnrError {
    /// An input file could not be opened.
    Open {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Reading an input failed.
    Io(io::Error),
    /// Frame dimensions are zero, odd or too large.
    InvalidGeometry {
        /// Width provided.
        width: usize,
        /// Height provided.
        height: usize,
    },
    /// Concurrency unit is zero or too large.
    InvalidConcurrency {
        /// Unit provided.
        concurrency: usize,
    },
    /// A stream delivered fewer bytes than the window needed.
    ShortRead {
        /// Which input came up short (0 or 1).
        stream: usize,
        /// Frame being read.
        frame: u64,
        /// Plane being read.
        plane: Plane,
        /// Bytes requested.
        expected: usize,
        /// Bytes delivered.
        actual: usize,
    },
    /// Plane queues went out of step (some empty, some not) during a drain.
    Desynchronized {
        /// Y queue length.
        y: usize,
        /// U queue length.
        u: usize,
        /// V queue length.
        v: usize,
    },
    /// A worker panicked before producing a result.
    TaskFailed {
        /// Frame of the window.
        frame: u64,
        /// Plane of the window.
        plane: Plane,
    },
}

impl fmt::Display for PsnrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open file '{}': {source}", path.display())
            }
            Self::Io(e) => write!(f, "read failed: {e}"),
            Self::InvalidGeometry { width, height } => {
                write!(
                    f,
                    "invalid frame size {width}x{height} (dimensions must be even and non-zero)"
                )
            }
            Self::InvalidConcurrency { concurrency } => {
                write!(f, "invalid concurrency {concurrency} (must be at least 1)")
            }
            Self::ShortRead {
                stream,
                frame,
                plane,
                expected,
                actual,
            } => write!(
                f,
                "input {stream} ended early: frame {frame} plane {plane} needs {expected} bytes, got {actual}"
            ),
            Self::Desynchronized { y, u, v } => write!(
                f,
                "plane queues out of step (Y={y}, U={u}, V={v} outstanding)"
            ),
            Self::TaskFailed { frame, plane } => {
                write!(f, "worker for frame {frame} plane {plane} failed")
            }
        }
    }
}

impl std::error::Error for PsnrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Io(source) => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for PsnrError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
