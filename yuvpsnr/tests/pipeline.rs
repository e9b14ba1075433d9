//! End-to-end behaviour of the comparison pipeline on synthetic streams.

mod common;

use std::io::Cursor;

use common::generators::{frame_len, gen_flat, gen_noise, offset, reference_sse, sprinkle};
use proptest::prelude::*;
use yuvpsnr::{
    compare_files, compare_streams, CompareParams, FrameReport, Plane, PsnrError,
    ShortReadPolicy, StreamReport,
};

fn run(
    a: &[u8],
    b: &[u8],
    params: &CompareParams,
) -> (Result<StreamReport, PsnrError>, Vec<FrameReport>) {
    let mut frames = Vec::new();
    let result = compare_streams(
        Cursor::new(a.to_vec()),
        Cursor::new(b.to_vec()),
        params,
        |f| frames.push(*f),
    );
    (result, frames)
}

#[test]
fn test_identical_cif_streams_are_infinite() {
    let data = gen_noise(352, 288, 3, 7);
    let (result, frames) = run(&data, &data, &CompareParams::default());
    let report = result.expect("valid input");

    assert_eq!(report.totals.frames, 3);
    assert_eq!(frames.len(), 3);
    for f in &frames {
        for plane in Plane::ALL {
            assert_eq!(f.psnr.get(plane), f64::INFINITY);
        }
    }
    for plane in Plane::ALL {
        assert_eq!(report.totals.psnr.get(plane), f64::INFINITY);
    }
    assert_eq!(report.stats.windows, 9);
    assert_eq!(report.bound, 3);
}

#[test]
fn test_constant_offset_gives_k_squared() {
    let (w, h) = (32, 16);
    // Stay below 255 - k so the offset never saturates.
    let base = gen_flat(w, h, 4, 16, 128, 200);
    for k in [1u8, 5, 17, 54] {
        let shifted = offset(&base, k);
        let params = CompareParams::new().with_dimensions(w, h).with_concurrency(2);
        let (result, frames) = run(&base, &shifted, &params);
        let report = result.unwrap();

        let mse = f64::from(k) * f64::from(k);
        let expected = 10.0 * (65025.0 / mse).log10();
        assert_eq!(frames.len(), 4);
        let rows = frames
            .iter()
            .map(|f| (f.mse, f.psnr))
            .chain([(report.totals.mse, report.totals.psnr)]);
        for (row_mse, row_psnr) in rows {
            for plane in Plane::ALL {
                assert_eq!(row_mse.get(plane), mse, "k={k} plane {plane}");
                assert!((row_psnr.get(plane) - expected).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn test_frames_arrive_in_order() {
    let (w, h) = (16, 8);
    let a = gen_noise(w, h, 25, 1);
    let b = gen_noise(w, h, 25, 2);
    let params = CompareParams::new().with_dimensions(w, h).with_concurrency(3);
    let (result, frames) = run(&a, &b, &params);
    result.unwrap();
    let indices: Vec<u64> = frames.iter().map(|f| f.index).collect();
    assert_eq!(indices, (0..25).collect::<Vec<u64>>());
}

#[test]
fn test_matches_direct_computation() {
    let (w, h) = (24, 12);
    let a = gen_noise(w, h, 6, 11);
    let b = sprinkle(&a, 7, 12);
    let expected = reference_sse(&a, &b, w, h);
    let area = (w * h) as f64;

    let params = CompareParams::new().with_dimensions(w, h).with_concurrency(2);
    let (result, frames) = run(&a, &b, &params);
    let report = result.unwrap();

    for (f, sse) in frames.iter().zip(&expected) {
        assert_eq!(f.mse.y, sse[0] as f64 / area);
        assert_eq!(f.mse.u, sse[1] as f64 / (area / 4.0));
        assert_eq!(f.mse.v, sse[2] as f64 / (area / 4.0));
    }
    let total_y: u64 = expected.iter().map(|s| s[0]).sum();
    assert_eq!(report.totals.sse.y, total_y as f64);
}

#[test]
fn test_peak_outstanding_respects_bound() {
    let (w, h) = (16, 16);
    let a = gen_noise(w, h, 40, 3);
    let b = gen_noise(w, h, 40, 4);
    for unit in [1, 2, 5, 16] {
        let params = CompareParams::new().with_dimensions(w, h).with_concurrency(unit);
        let (result, _) = run(&a, &b, &params);
        let report = result.unwrap();
        assert_eq!(report.bound, 3 * unit);
        assert!(
            report.stats.peak_outstanding <= report.bound,
            "unit {unit}: peak {} > bound {}",
            report.stats.peak_outstanding,
            report.bound
        );
        assert!(report.stats.admission_drains > 0);
    }
}

#[test]
fn test_empty_inputs() {
    let (result, frames) = run(&[], &[], &CompareParams::default());
    let report = result.unwrap();
    assert!(frames.is_empty());
    assert_eq!(report.totals.frames, 0);
    assert_eq!(report.totals.psnr.y, f64::INFINITY);
}

#[test]
fn test_invalid_params() {
    let data = gen_noise(8, 8, 1, 0);
    let (result, _) = run(&data, &data, &CompareParams::new().with_dimensions(7, 8));
    assert!(matches!(result, Err(PsnrError::InvalidGeometry { width: 7, height: 8 })));

    let (result, _) = run(
        &data,
        &data,
        &CompareParams::new().with_dimensions(8, 8).with_concurrency(0),
    );
    assert!(matches!(result, Err(PsnrError::InvalidConcurrency { concurrency: 0 })));
}

#[test]
fn test_runs_inside_single_thread_rayon_pool() {
    let (w, h) = (16, 16);
    let data = gen_noise(w, h, 4, 13);
    let params = CompareParams::new().with_dimensions(w, h).with_concurrency(2);

    // The caller occupies the pool's only worker for the whole run.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .expect("pool");
    let (result, frames) = pool.install(|| run(&data, &data, &params));
    let report = result.unwrap();

    assert_eq!(frames.len(), 4);
    assert_eq!(report.totals.psnr.y, f64::INFINITY);
}

#[test]
fn test_parallel_comparisons_on_global_pool() {
    use rayon::prelude::*;

    let (w, h) = (16, 8);
    let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0..16u64)
        .map(|seed| {
            let a = gen_noise(w, h, 3, seed);
            let b = sprinkle(&a, 4, seed + 100);
            (a, b)
        })
        .collect();
    let params = CompareParams::new().with_dimensions(w, h);

    let totals: Vec<u64> = pairs
        .par_iter()
        .map(|(a, b)| run(a, b, &params).0.unwrap().totals.frames)
        .collect();
    assert_eq!(totals, vec![3; 16]);
}

// ============================================================================
// Mismatched lengths
// ============================================================================

#[test]
fn test_reject_extra_frame_in_second_stream() {
    let (w, h) = (16, 8);
    let a = gen_noise(w, h, 2, 5);
    let b = gen_noise(w, h, 3, 5);
    let params = CompareParams::new().with_dimensions(w, h);
    let (result, _) = run(&a, &b, &params);
    match result {
        Err(PsnrError::ShortRead {
            stream,
            frame,
            plane,
            expected,
            actual,
        }) => {
            assert_eq!((stream, frame, plane), (0, 2, Plane::Y));
            assert_eq!((expected, actual), (w * h, 0));
        }
        other => panic!("expected ShortRead, got {other:?}"),
    }
}

#[test]
fn test_reject_truncated_mid_plane() {
    let (w, h) = (16, 8);
    let a = gen_noise(w, h, 2, 5);
    let b = a[..frame_len(w, h) + 10].to_vec();
    let params = CompareParams::new().with_dimensions(w, h);
    let (result, _) = run(&a, &b, &params);
    assert!(matches!(
        result,
        Err(PsnrError::ShortRead {
            stream: 1,
            frame: 1,
            plane: Plane::Y,
            actual: 10,
            ..
        })
    ));
}

#[test]
fn test_zero_fill_compares_against_zeros() {
    let (w, h) = (16, 8);
    let a = gen_flat(w, h, 2, 10, 10, 10);
    let b = gen_flat(w, h, 1, 10, 10, 10);
    let params = CompareParams::new()
        .with_dimensions(w, h)
        .with_short_read(ShortReadPolicy::ZeroFill);
    let (result, frames) = run(&a, &b, &params);
    let report = result.unwrap();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].psnr.y, f64::INFINITY);
    // Second frame is compared against zero padding.
    assert_eq!(frames[1].mse, yuvpsnr::PlanarMetrics::new(100.0, 100.0, 100.0));
    assert_eq!(report.totals.mse.y, 50.0);
    assert_eq!(report.stats.zero_filled, 3);
    assert_eq!(report.stats.discarded, 0);
}

#[test]
fn test_zero_fill_discards_trailing_partial_frame() {
    let (w, h) = (16, 8);
    let fl = frame_len(w, h);
    let full = gen_noise(w, h, 3, 9);
    // Both streams stop after the Y plane of frame 2.
    let a = full[..2 * fl + w * h].to_vec();
    let b = sprinkle(&a, 5, 1);
    let expected = reference_sse(&a[..2 * fl], &b[..2 * fl], w, h);

    for unit in [1, 4] {
        let params = CompareParams::new()
            .with_dimensions(w, h)
            .with_concurrency(unit)
            .with_short_read(ShortReadPolicy::ZeroFill);
        let (result, frames) = run(&a, &b, &params);
        let report = result.unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(report.totals.frames, 2);
        assert_eq!(report.stats.discarded, 1);
        let total_y: u64 = expected.iter().map(|s| s[0]).sum();
        assert_eq!(report.totals.sse.y, total_y as f64);
    }
}

#[test]
fn test_zero_fill_deterministic() {
    let (w, h) = (16, 8);
    let a = gen_noise(w, h, 3, 21);
    let b = gen_noise(w, h, 2, 22)[..frame_len(w, h) + 77].to_vec();
    let params = CompareParams::new()
        .with_dimensions(w, h)
        .with_concurrency(2)
        .with_short_read(ShortReadPolicy::ZeroFill);
    let (first, _) = run(&a, &b, &params);
    let (second, _) = run(&a, &b, &params);
    assert_eq!(first.unwrap(), second.unwrap());
}

#[test]
fn test_missing_file_is_open_error() {
    let dir = std::env::temp_dir();
    let missing = dir.join(format!("yuvpsnr-missing-{}.yuv", std::process::id()));
    let result = compare_files(&missing, &missing, &CompareParams::default(), |_| {});
    match result {
        Err(PsnrError::Open { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected Open error, got {other:?}"),
    }
}

// ============================================================================
// Order equivalence under concurrency
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Totals are bit-identical whatever the admission bound.
    #[test]
    fn prop_bound_does_not_change_totals(
        seed in any::<u64>(),
        frames in 1usize..12,
        unit in 2usize..10,
    ) {
        let (w, h) = (16, 8);
        let a = gen_noise(w, h, frames, seed);
        let b = sprinkle(&a, 3, seed ^ 0x5a5a);

        let minimal = CompareParams::new().with_dimensions(w, h).with_concurrency(1);
        let wide = minimal.clone().with_concurrency(unit);
        let (r1, f1) = run(&a, &b, &minimal);
        let (r2, f2) = run(&a, &b, &wide);
        let (r1, r2) = (r1.unwrap(), r2.unwrap());

        prop_assert_eq!(r1.totals.sse.y.to_bits(), r2.totals.sse.y.to_bits());
        prop_assert_eq!(r1.totals.sse.u.to_bits(), r2.totals.sse.u.to_bits());
        prop_assert_eq!(r1.totals.sse.v.to_bits(), r2.totals.sse.v.to_bits());
        prop_assert_eq!(r1.totals.mse, r2.totals.mse);
        prop_assert_eq!(f1, f2);
    }
}
