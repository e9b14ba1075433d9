//! MSE to PSNR conversion.

use crate::geometry::Plane;

/// Peak sample value for 8-bit planes.
pub const MAX_SAMPLE: f64 = 255.0;

/// MSE below this is treated as zero error (PSNR = +inf).
pub const MSE_EPSILON: f64 = 1e-12;

/// Converts a mean squared error to PSNR in dB.
///
/// Returns `f64::INFINITY` when `mse` is below [`MSE_EPSILON`], and for NaN,
/// which only comes from averaging over zero samples.
#[must_use]
pub fn mse_to_psnr(mse: f64) -> f64 {
    if mse >= MSE_EPSILON {
        10.0 * ((MAX_SAMPLE * MAX_SAMPLE) / mse).log10()
    } else {
        f64::INFINITY
    }
}

/// One value per plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlanarMetrics {
    pub y: f64,
    pub u: f64,
    pub v: f64,
}

impl PlanarMetrics {
    #[must_use]
    pub fn new(y: f64, u: f64, v: f64) -> Self {
        Self { y, u, v }
    }

    /// Value for `plane`.
    #[must_use]
    pub fn get(&self, plane: Plane) -> f64 {
        match plane {
            Plane::Y => self.y,
            Plane::U => self.u,
            Plane::V => self.v,
        }
    }

    /// Applies `f` to every plane.
    #[must_use]
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self {
            y: f(self.y),
            u: f(self.u),
            v: f(self.v),
        }
    }

    /// PSNR of each plane, treating `self` as per-plane MSE.
    #[must_use]
    pub fn to_psnr(self) -> Self {
        self.map(mse_to_psnr)
    }
}
