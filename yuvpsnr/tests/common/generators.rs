//! Deterministic YUV 4:2:0 stream generators for yuvpsnr tests.
//!
//! Content comes from an LCG PRNG so inputs are identical on every platform.

#![allow(dead_code)]

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }
}

/// Bytes in one 4:2:0 frame.
pub fn frame_len(width: usize, height: usize) -> usize {
    width * height * 3 / 2
}

/// `frames` frames of noise.
pub fn gen_noise(width: usize, height: usize, frames: usize, seed: u64) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..frame_len(width, height) * frames)
        .map(|_| rng.next_u8())
        .collect()
}

/// Frames where every Y sample is `y`, every U sample `u`, every V sample `v`.
pub fn gen_flat(width: usize, height: usize, frames: usize, y: u8, u: u8, v: u8) -> Vec<u8> {
    let area = width * height;
    let mut data = Vec::with_capacity(frame_len(width, height) * frames);
    for _ in 0..frames {
        data.extend(std::iter::repeat(y).take(area));
        data.extend(std::iter::repeat(u).take(area / 4));
        data.extend(std::iter::repeat(v).take(area / 4));
    }
    data
}

/// Adds `k` to every byte, saturating at 255.
pub fn offset(data: &[u8], k: u8) -> Vec<u8> {
    data.iter().map(|b| b.saturating_add(k)).collect()
}

/// Replaces random bytes with random values (about one in `every`).
pub fn sprinkle(data: &[u8], every: u8, seed: u64) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    data.iter()
        .map(|&b| {
            if rng.next_u8() % every == 0 {
                rng.next_u8()
            } else {
                b
            }
        })
        .collect()
}

/// Per-plane squared-error sums for each frame, computed directly.
pub fn reference_sse(a: &[u8], b: &[u8], width: usize, height: usize) -> Vec<[u64; 3]> {
    let area = width * height;
    let fl = frame_len(width, height);
    let sse = |x: &[u8], y: &[u8]| -> u64 {
        x.iter()
            .zip(y)
            .map(|(&p, &q)| u64::from(p.abs_diff(q)).pow(2))
            .sum()
    };
    a.chunks_exact(fl)
        .zip(b.chunks_exact(fl))
        .map(|(fa, fb)| {
            [
                sse(&fa[..area], &fb[..area]),
                sse(&fa[area..area + area / 4], &fb[area..area + area / 4]),
                sse(&fa[area + area / 4..], &fb[area + area / 4..]),
            ]
        })
        .collect()
}
