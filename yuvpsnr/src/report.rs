//! Fixed-width text lines for the PSNR table.
//!
//! Every column is 12 characters wide and left-justified; PSNR values use
//! four decimals and identical planes print as `inf`.

use std::io::{self, Write};

use crate::aggregate::{FrameReport, StreamTotals};
use crate::psnr::PlanarMetrics;

/// Table header.
pub const HEADER: &str = "Frame       Y-PSNR[dB]  U-PSNR[dB]  V-PSNR[dB]";

/// Label column of the totals line.
pub const TOTAL_LABEL: &str = "Total       ";

fn psnr_columns(psnr: &PlanarMetrics) -> String {
    format!("{:<12.4}{:<12.4}{:<12.4}", psnr.y, psnr.u, psnr.v)
}

/// Line for one frame: index, then Y, U, V PSNR.
#[must_use]
pub fn frame_line(report: &FrameReport) -> String {
    format!("{:<12}{}", report.index, psnr_columns(&report.psnr))
}

/// Line for the whole stream.
#[must_use]
pub fn total_line(totals: &StreamTotals) -> String {
    format!("{TOTAL_LABEL}{}", psnr_columns(&totals.psnr))
}

/// Writes the text table incrementally.
pub struct TextReporter<W> {
    out: W,
    per_frame: bool,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W, per_frame: bool) -> Self {
        Self { out, per_frame }
    }

    pub fn header(&mut self) -> io::Result<()> {
        writeln!(self.out, "{HEADER}")
    }

    /// Writes the frame line when per-frame output is on.
    pub fn frame(&mut self, report: &FrameReport) -> io::Result<()> {
        if self.per_frame {
            writeln!(self.out, "{}", frame_line(report))?;
        }
        Ok(())
    }

    pub fn total(&mut self, totals: &StreamTotals) -> io::Result<()> {
        writeln!(self.out, "{}", total_line(totals))?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
