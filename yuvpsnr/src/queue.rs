//! Per-plane FIFO queues of outstanding work and the admission policy that
//! bounds them.

use std::collections::VecDeque;

use crate::aggregate::{FrameAggregator, FrameReport};
use crate::diff::TaskHandle;
use crate::geometry::Plane;
use crate::PsnrError;

/// Outstanding [`TaskHandle`]s, one FIFO per plane, in stream order.
///
/// Only the producer thread touches the queues.
#[derive(Debug, Default)]
pub struct PlaneQueues {
    queues: [VecDeque<TaskHandle>; 3],
}

impl PlaneQueues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handle` to the queue for `plane`.
    pub fn submit(&mut self, plane: Plane, handle: TaskHandle) {
        debug_assert_eq!(handle.plane(), plane);
        self.queues[plane.index()].push_back(handle);
    }

    /// Handles across all three queues.
    #[must_use]
    pub fn total_outstanding(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    /// Handles queued for `plane`.
    #[must_use]
    pub fn len(&self, plane: Plane) -> usize {
        self.queues[plane.index()].len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    /// Pops the oldest Y, U and V handles together.
    ///
    /// # Errors
    /// [`PsnrError::Desynchronized`] if some queues are empty and others are
    /// not; nothing is popped in that case.
    pub fn pop_frame(&mut self) -> Result<Option<[TaskHandle; 3]>, PsnrError> {
        if self.is_empty() {
            return Ok(None);
        }
        if self.queues.iter().any(VecDeque::is_empty) {
            return Err(self.desync());
        }
        let [y, u, v] = &mut self.queues;
        match (y.pop_front(), u.pop_front(), v.pop_front()) {
            (Some(y), Some(u), Some(v)) => Ok(Some([y, u, v])),
            _ => unreachable!("all queues checked non-empty"),
        }
    }

    /// Removes every queued handle in stream order, Y before U before V.
    ///
    /// Used to discard an incomplete trailing frame.
    pub fn take_all(&mut self) -> Vec<TaskHandle> {
        self.queues.iter_mut().flat_map(|q| q.drain(..)).collect()
    }

    fn desync(&self) -> PsnrError {
        PsnrError::Desynchronized {
            y: self.len(Plane::Y),
            u: self.len(Plane::U),
            v: self.len(Plane::V),
        }
    }
}

/// Backpressure: caps the number of unresolved window computations.
///
/// There is no semaphore; the producer blocks inside the frame drains that
/// [`Admission::admit`] forces, waiting on the oldest work first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    bound: usize,
}

impl Admission {
    /// Windows per frame; one concurrency unit admits one frame's worth.
    pub const UNIT: usize = 3;

    /// Admission for concurrency unit `concurrency` (bound = `3 * concurrency`).
    ///
    /// # Errors
    /// [`PsnrError::InvalidConcurrency`] for zero or an overflowing unit.
    pub fn new(concurrency: usize) -> Result<Self, PsnrError> {
        let bound = concurrency
            .checked_mul(Self::UNIT)
            .filter(|&b| b >= Self::UNIT)
            .ok_or(PsnrError::InvalidConcurrency { concurrency })?;
        Ok(Self { bound })
    }

    #[inline]
    #[must_use]
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Drains the oldest frames until fewer than `bound` handles remain.
    ///
    /// Returns how many frames were drained. With `bound >= 3` at least one
    /// complete frame is queued whenever the bound is reached, because an
    /// unfinished frame holds at most two handles.
    ///
    /// # Errors
    /// Anything [`FrameAggregator::drain_one_frame`] reports.
    pub fn admit(
        &self,
        queues: &mut PlaneQueues,
        aggregator: &mut FrameAggregator,
        on_frame: &mut impl FnMut(&FrameReport),
    ) -> Result<usize, PsnrError> {
        let mut drained = 0;
        while queues.total_outstanding() >= self.bound {
            match aggregator.drain_one_frame(queues)? {
                Some(report) => {
                    drained += 1;
                    on_frame(&report);
                }
                None => break,
            }
        }
        if drained > 0 {
            tracing::debug!(
                drained,
                outstanding = queues.total_outstanding(),
                bound = self.bound,
                "admission drained frames"
            );
        }
        debug_assert!(queues.total_outstanding() < self.bound);
        Ok(drained)
    }
}
