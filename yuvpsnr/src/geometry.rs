//! Frame geometry for planar YUV 4:2:0.
//!
//! A frame is stored as `Y(area) U(area/4) V(area/4)` with no padding, and
//! frames follow each other with no header. The plane a window belongs to is
//! derived from how many bytes of the current frame have been consumed.

use std::fmt;

use crate::PsnrError;

/// Default frame width (CIF).
pub const DEFAULT_WIDTH: usize = 352;

/// Default frame height (CIF).
pub const DEFAULT_HEIGHT: usize = 288;

/// One of the three sample planes of a YUV frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    /// Luma.
    Y,
    /// Blue-difference chroma.
    U,
    /// Red-difference chroma.
    V,
}

impl Plane {
    /// All planes in stream order.
    pub const ALL: [Plane; 3] = [Plane::Y, Plane::U, Plane::V];

    /// Position of the plane within a frame (0, 1, 2).
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Y => 0,
            Self::U => 1,
            Self::V => 2,
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Y => "Y",
            Self::U => "U",
            Self::V => "V",
        })
    }
}

/// Byte layout of one 4:2:0 frame.
///
/// Thresholds are computed once in [`FrameGeometry::new`] and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    width: usize,
    height: usize,
    area: usize,
}

impl FrameGeometry {
    /// Creates the geometry for a `width` x `height` frame.
    ///
    /// # Errors
    /// Returns [`PsnrError::InvalidGeometry`] if either dimension is zero or
    /// odd. Chroma planes are subsampled by two in both directions, so odd
    /// sizes have no whole-byte U/V plane.
    pub fn new(width: usize, height: usize) -> Result<Self, PsnrError> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(PsnrError::InvalidGeometry { width, height });
        }
        let area = width
            .checked_mul(height)
            .filter(|area| area.checked_mul(3).is_some())
            .ok_or(PsnrError::InvalidGeometry { width, height })?;
        Ok(Self {
            width,
            height,
            area,
        })
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Luma sample count, `width * height`.
    #[inline]
    #[must_use]
    pub fn area(&self) -> usize {
        self.area
    }

    /// Samples in one chroma plane.
    #[inline]
    #[must_use]
    pub fn chroma_len(&self) -> usize {
        self.area / 4
    }

    /// Byte length of `plane`.
    #[inline]
    #[must_use]
    pub fn plane_len(&self, plane: Plane) -> usize {
        match plane {
            Plane::Y => self.area,
            Plane::U | Plane::V => self.chroma_len(),
        }
    }

    /// Offset at which the U plane ends (`area * 5/4`).
    #[inline]
    #[must_use]
    pub fn u_end(&self) -> usize {
        self.area + self.chroma_len()
    }

    /// Bytes in one frame (`area * 3/2`); also the offset at which V ends.
    #[inline]
    #[must_use]
    pub fn frame_len(&self) -> usize {
        self.area + 2 * self.chroma_len()
    }

    /// Classifies a window by the frame byte count *after* consuming it.
    #[must_use]
    pub fn classify(&self, count: usize) -> Plane {
        if count <= self.area {
            Plane::Y
        } else if count <= self.u_end() {
            Plane::U
        } else {
            Plane::V
        }
    }

    /// Whether `count` lands exactly on the end of a frame.
    #[inline]
    #[must_use]
    pub fn is_frame_end(&self, count: usize) -> bool {
        count == self.frame_len()
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            area: DEFAULT_WIDTH * DEFAULT_HEIGHT,
        }
    }
}
