//! Frame-by-frame resolution of queued work into PSNR figures.

use crate::geometry::{FrameGeometry, Plane};
use crate::psnr::PlanarMetrics;
use crate::queue::PlaneQueues;
use crate::PsnrError;

/// Result for one drained frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Zero-based frame index.
    pub index: u64,
    /// Mean squared error per plane.
    pub mse: PlanarMetrics,
    /// PSNR per plane in dB (`inf` for identical planes).
    pub psnr: PlanarMetrics,
}

/// Aggregate over a whole stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamTotals {
    /// Complete frames accumulated.
    pub frames: u64,
    /// Sum of squared errors per plane over all frames.
    pub sse: PlanarMetrics,
    /// Mean squared error per plane over all frames.
    pub mse: PlanarMetrics,
    /// PSNR per plane in dB.
    pub psnr: PlanarMetrics,
}

/// Resolves queued handles a frame at a time and keeps the grand totals.
///
/// Handles are waited on in submission order, so the totals are the same
/// floating-point sums a single-threaded run would produce.
#[derive(Debug, Clone)]
pub struct FrameAggregator {
    geometry: FrameGeometry,
    totals: [f64; 3],
    frames: u64,
}

impl FrameAggregator {
    #[must_use]
    pub fn new(geometry: FrameGeometry) -> Self {
        Self {
            geometry,
            totals: [0.0; 3],
            frames: 0,
        }
    }

    /// Frames drained so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Pops the oldest Y, U and V handles, waits for them and accumulates.
    ///
    /// Returns `None` when all queues are empty.
    ///
    /// # Errors
    /// [`PsnrError::Desynchronized`] if only some queues hold work, or
    /// [`PsnrError::TaskFailed`] if a worker died.
    pub fn drain_one_frame(
        &mut self,
        queues: &mut PlaneQueues,
    ) -> Result<Option<FrameReport>, PsnrError> {
        let Some(handles) = queues.pop_frame()? else {
            return Ok(None);
        };

        let mut sse = [0.0f64; 3];
        for (slot, handle) in sse.iter_mut().zip(handles) {
            *slot = handle.wait()?;
        }
        for (total, value) in self.totals.iter_mut().zip(sse) {
            *total += value;
        }

        let mse = PlanarMetrics::new(
            sse[0] / self.samples(Plane::Y),
            sse[1] / self.samples(Plane::U),
            sse[2] / self.samples(Plane::V),
        );
        let report = FrameReport {
            index: self.frames,
            mse,
            psnr: mse.to_psnr(),
        };
        self.frames += 1;
        Ok(Some(report))
    }

    /// Final per-plane figures over every drained frame.
    ///
    /// With no frames the MSE is taken as zero, so PSNR reads `inf`.
    #[must_use]
    pub fn finish(self) -> StreamTotals {
        let frames = self.frames as f64;
        let mean = |plane: Plane| {
            if self.frames == 0 {
                0.0
            } else {
                self.totals[plane.index()] / (self.samples(plane) * frames)
            }
        };
        let mse = PlanarMetrics::new(mean(Plane::Y), mean(Plane::U), mean(Plane::V));
        StreamTotals {
            frames: self.frames,
            sse: PlanarMetrics::new(self.totals[0], self.totals[1], self.totals[2]),
            mse,
            psnr: mse.to_psnr(),
        }
    }

    fn samples(&self, plane: Plane) -> f64 {
        self.geometry.plane_len(plane) as f64
    }
}
