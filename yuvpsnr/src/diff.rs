//! Per-window squared error and its one-shot dispatch.

use std::thread::{self, JoinHandle};

use crate::geometry::Plane;
use crate::reader::Window;
use crate::PsnrError;

/// Sum of squared per-sample differences, accumulated in index order.
///
/// Samples are widened before subtracting, so the result is exact for any
/// window shorter than 2^53 / 255^2 samples.
///
/// # Panics
/// Panics if the slices differ in length.
#[must_use]
pub fn sum_squared_error(a: &[u8], b: &[u8]) -> f64 {
    assert_eq!(a.len(), b.len(), "window sides must match");
    let mut sum = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let d = f64::from(i32::from(x) - i32::from(y));
        sum += d * d;
    }
    sum
}

/// Handle to a squared-error computation running on its own worker thread.
///
/// Resolves exactly once, through [`TaskHandle::wait`].
#[derive(Debug)]
pub struct TaskHandle {
    plane: Plane,
    frame: u64,
    worker: JoinHandle<f64>,
}

impl TaskHandle {
    #[inline]
    #[must_use]
    pub fn plane(&self) -> Plane {
        self.plane
    }

    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Blocks until the computation finishes.
    ///
    /// # Errors
    /// [`PsnrError::TaskFailed`] if the worker panicked.
    pub fn wait(self) -> Result<f64, PsnrError> {
        self.worker.join().map_err(|_| PsnrError::TaskFailed {
            frame: self.frame,
            plane: self.plane,
        })
    }
}

/// Moves `window` onto a fresh worker thread and returns its handle.
///
/// The worker runs concurrently with the caller and never shares a pool
/// with it, so waiting on the handle cannot starve the computation.
///
/// # Errors
/// [`PsnrError::Io`] if the OS refuses to start the thread.
pub fn dispatch(window: Window) -> Result<TaskHandle, PsnrError> {
    let plane = window.plane;
    let frame = window.frame;
    let worker = thread::Builder::new()
        .name(format!("yuvpsnr-{plane}-{frame}"))
        .spawn(move || sum_squared_error(&window.first, &window.second))?;
    Ok(TaskHandle {
        plane,
        frame,
        worker,
    })
}

/// Handle whose result is already known. Used by tests of the queueing code.
#[cfg(test)]
pub(crate) fn ready(plane: Plane, frame: u64, value: f64) -> TaskHandle {
    TaskHandle {
        plane,
        frame,
        worker: thread::spawn(move || value),
    }
}

/// Handle whose worker panics instead of producing a result.
#[cfg(test)]
pub(crate) fn abandoned(plane: Plane, frame: u64) -> TaskHandle {
    TaskHandle {
        plane,
        frame,
        worker: thread::spawn(|| panic!("worker gave up")),
    }
}
