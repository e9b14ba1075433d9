//! Common test utilities for yuvpsnr tests.

pub mod generators;
