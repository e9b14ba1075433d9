//! The read -> dispatch -> admit -> drain loop.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::aggregate::{FrameAggregator, FrameReport, StreamTotals};
use crate::diff::{dispatch, TaskHandle};
use crate::geometry::{FrameGeometry, Plane, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::queue::{Admission, PlaneQueues};
use crate::reader::{PlaneWindowReader, ShortReadPolicy};
use crate::PsnrError;

/// Comparison parameters.
///
/// ```rust
/// use yuvpsnr::{CompareParams, ShortReadPolicy};
///
/// let params = CompareParams::new()
///     .with_dimensions(1920, 1080)
///     .with_concurrency(4)      // up to 12 windows in flight
///     .with_short_read(ShortReadPolicy::ZeroFill);
/// assert_eq!(params.width(), 1920);
/// ```
#[derive(Debug, Clone)]
pub struct CompareParams {
    width: usize,
    height: usize,
    concurrency: usize,
    short_read: ShortReadPolicy,
}

impl Default for CompareParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            concurrency: 1,
            short_read: ShortReadPolicy::Reject,
        }
    }
}

impl CompareParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the frame size in luma samples.
    #[must_use]
    pub fn with_dimensions(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the concurrency unit. The admission bound is three times this.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_short_read(mut self, policy: ShortReadPolicy) -> Self {
        self.short_read = policy;
        self
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub fn short_read(&self) -> ShortReadPolicy {
        self.short_read
    }
}

/// Counters describing how a run went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Windows handed to workers.
    pub windows: u64,
    /// Frames drained early to stay under the admission bound.
    pub admission_drains: u64,
    /// Largest number of unresolved windows seen after a submit.
    pub peak_outstanding: usize,
    /// Windows that were zero-padded.
    pub zero_filled: u64,
    /// Windows of a trailing incomplete frame that were dropped.
    pub discarded: u64,
}

/// Outcome of a full comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamReport {
    pub totals: StreamTotals,
    pub stats: PipelineStats,
    /// Admission bound in effect.
    pub bound: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Reading,
    Draining,
    Done,
}

/// One comparison between two YUV streams.
pub struct Comparison<R0, R1> {
    reader: PlaneWindowReader<R0, R1>,
    admission: Admission,
    queues: PlaneQueues,
    aggregator: FrameAggregator,
    stats: PipelineStats,
    state: State,
}

impl<R0: Read, R1: Read> Comparison<R0, R1> {
    /// Sets up a comparison of `first` against `second`.
    ///
    /// # Errors
    /// [`PsnrError::InvalidGeometry`] or [`PsnrError::InvalidConcurrency`].
    pub fn new(first: R0, second: R1, params: &CompareParams) -> Result<Self, PsnrError> {
        let geometry = FrameGeometry::new(params.width, params.height)?;
        let admission = Admission::new(params.concurrency)?;
        Ok(Self {
            reader: PlaneWindowReader::new(first, second, geometry, params.short_read),
            admission,
            queues: PlaneQueues::new(),
            aggregator: FrameAggregator::new(geometry),
            stats: PipelineStats::default(),
            state: State::Reading,
        })
    }

    /// Runs to completion, calling `on_frame` for every frame in order.
    ///
    /// # Errors
    /// Read failures, short reads under [`ShortReadPolicy::Reject`],
    /// queue desynchronization and worker failures. No totals are produced
    /// once an error is hit.
    pub fn run(
        mut self,
        mut on_frame: impl FnMut(&FrameReport),
    ) -> Result<StreamReport, PsnrError> {
        while let Some(window) = self.reader.next_window()? {
            let drained = self
                .admission
                .admit(&mut self.queues, &mut self.aggregator, &mut on_frame)?;
            self.stats.admission_drains += drained as u64;

            let plane = window.plane;
            self.queues.submit(plane, dispatch(window)?);
            self.stats.windows += 1;
            self.stats.peak_outstanding = self
                .stats
                .peak_outstanding
                .max(self.queues.total_outstanding());
        }
        self.stats.zero_filled = self.reader.zero_filled_windows();

        self.transition(State::Draining);
        if self.reader.is_mid_frame() {
            self.discard_trailing_frame(&mut on_frame)?;
        }
        while let Some(report) = self.aggregator.drain_one_frame(&mut self.queues)? {
            on_frame(&report);
        }
        self.transition(State::Done);

        let totals = self.aggregator.finish();
        tracing::info!(
            frames = totals.frames,
            windows = self.stats.windows,
            peak_outstanding = self.stats.peak_outstanding,
            bound = self.admission.bound(),
            "comparison finished"
        );
        Ok(StreamReport {
            totals,
            stats: self.stats,
            bound: self.admission.bound(),
        })
    }

    /// Drops the handles of a frame that both streams ended inside.
    ///
    /// Complete frames queued ahead of it are drained first. The trailing
    /// handles are still waited on, since jobs cannot be cancelled, but
    /// their results are not accumulated.
    fn discard_trailing_frame(
        &mut self,
        on_frame: &mut impl FnMut(&FrameReport),
    ) -> Result<(), PsnrError> {
        // The partial frame has no V window, so V counts the whole frames.
        for _ in 0..self.queues.len(Plane::V) {
            if let Some(report) = self.aggregator.drain_one_frame(&mut self.queues)? {
                on_frame(&report);
            }
        }
        let partial = self.queues.take_all();
        let frame = partial.first().map(TaskHandle::frame);
        tracing::warn!(
            frame,
            windows = partial.len(),
            "input ended inside a frame, discarding it"
        );
        self.stats.discarded += partial.len() as u64;
        for handle in partial {
            handle.wait()?;
        }
        Ok(())
    }

    fn transition(&mut self, next: State) {
        tracing::debug!(from = ?self.state, to = ?next, "pipeline state");
        self.state = next;
    }
}

/// Opens two files and compares them.
///
/// # Errors
/// [`PsnrError::Open`] if either file cannot be opened, otherwise anything
/// [`Comparison::run`] reports.
pub fn compare_files(
    first: impl AsRef<Path>,
    second: impl AsRef<Path>,
    params: &CompareParams,
    on_frame: impl FnMut(&FrameReport),
) -> Result<StreamReport, PsnrError> {
    let open = |path: &Path| {
        File::open(path)
            .map(BufReader::new)
            .map_err(|source| PsnrError::Open {
                path: path.to_path_buf(),
                source,
            })
    };
    let first = open(first.as_ref())?;
    let second = open(second.as_ref())?;
    Comparison::new(first, second, params)?.run(on_frame)
}

/// Compares two in-memory or streaming inputs.
///
/// # Errors
/// See [`Comparison::new`] and [`Comparison::run`].
pub fn compare_streams<R0: Read, R1: Read>(
    first: R0,
    second: R1,
    params: &CompareParams,
    on_frame: impl FnMut(&FrameReport),
) -> Result<StreamReport, PsnrError> {
    Comparison::new(first, second, params)?.run(on_frame)
}
