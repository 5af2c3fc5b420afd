use spotpix_algorithms::synthetic::{GaussianSpot, SyntheticFrame};
use spotpix_algorithms::{CentroidEngine, Frame, FrameResult, Spot, SpotMethod};
use spotpix_core::{CentroidConfig, Rect};

fn run(frame: &SyntheticFrame, config: CentroidConfig) -> FrameResult {
    let mut engine = CentroidEngine::new(frame.width(), frame.height(), config).unwrap();
    engine.process(&frame.frame().unwrap()).unwrap()
}

fn nearest(spots: &[Spot], x: f64, y: f64) -> f64 {
    spots
        .iter()
        .map(|s| s.distance_to(x, y))
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn test_gaussian_com_accuracy() {
    let frame = SyntheticFrame::new(48, 40).with_spots(&[GaussianSpot::new(20.37, 15.62, 1.5, 200.0)]);
    let result = run(&frame, CentroidConfig::default().with_threshold(3));

    assert_eq!(result.com_spots.len(), 1);
    let spot = result.com_spots[0];
    assert_eq!(spot.method, SpotMethod::CenterOfMass);
    assert!((spot.x - 20.37).abs() < 0.1, "x = {}", spot.x);
    assert!((spot.y - 15.62).abs() < 0.1, "y = {}", spot.y);
}

#[test]
fn test_separated_spots_are_independent() {
    let truth = [(12.3, 10.8), (40.6, 12.1), (25.5, 30.2)];
    let spots: Vec<GaussianSpot> = truth
        .iter()
        .map(|&(x, y)| GaussianSpot::new(x, y, 1.2, 180.0))
        .collect();
    let frame = SyntheticFrame::new(56, 44).with_spots(&spots);
    let result = run(&frame, CentroidConfig::default().with_threshold(3));

    assert_eq!(result.com_spots.len(), 3);
    assert_eq!(result.hybrid_spots.len(), 3);
    for (x, y) in truth {
        let d = nearest(result.com_spots.as_slice(), x, y);
        assert!(d < 0.1, "spot at ({x}, {y}) off by {d}");
    }
}

#[test]
fn test_pileup_decomposes_into_hybrid_spots() {
    let truth = [(30.3, 30.6), (36.1, 31.4)];
    let spots: Vec<GaussianSpot> = truth
        .iter()
        .map(|&(x, y)| GaussianSpot::new(x, y, 1.8, 200.0))
        .collect();
    let frame = SyntheticFrame::new(64, 64).with_spots(&spots);
    let config = CentroidConfig::default().with_threshold(20).with_max_pixels(60);
    let result = run(&frame, config);

    assert!(result.com_spots.is_empty());
    assert_eq!(result.diagnostics.pileup_regions, 1);
    assert!(result.hybrid_spots.len() >= 2, "got {} spots", result.hybrid_spots.len());
    assert!(result
        .hybrid_spots
        .iter()
        .all(|s| s.method == SpotMethod::HybridGradient));
    for (x, y) in truth {
        let d = nearest(result.hybrid_spots.as_slice(), x, y);
        assert!(d < 1.0, "no hybrid spot near ({x}, {y}), nearest {d}");
    }
}

#[test]
fn test_hybrid_disabled_skips_pileup() {
    let frame = SyntheticFrame::new(64, 64).with_spots(&[
        GaussianSpot::new(30.3, 30.6, 1.8, 200.0),
        GaussianSpot::new(36.1, 31.4, 1.8, 200.0),
        GaussianSpot::new(10.5, 50.5, 1.0, 150.0),
    ]);
    let config = CentroidConfig::default()
        .with_threshold(20)
        .with_max_pixels(60)
        .with_hybrid(false);
    let result = run(&frame, config);

    assert_eq!(result.com_spots.len(), 1);
    assert!(result.hybrid_spots.is_empty());
    assert_eq!(result.electrons().len(), 1);
}

#[test]
fn test_processing_is_deterministic() {
    let frame = SyntheticFrame::new(80, 60)
        .with_background(4)
        .with_spot_grid(12, 14.0, 1.4, 170.0);
    let view = frame.frame().unwrap();
    let config = CentroidConfig::default()
        .with_threshold(10)
        .with_signal_region(Rect::new(0, 10, 0, 10))
        .with_baseline_region(Rect::new(70, 80, 50, 60));

    let mut engine = CentroidEngine::new(80, 60, config.clone()).unwrap();
    let first = engine.process(&view).unwrap();
    let again = engine.process(&view).unwrap();
    let fresh = CentroidEngine::new(80, 60, config).unwrap().process(&view).unwrap();

    for other in [&again, &fresh] {
        assert_eq!(first.com_spots, other.com_spots);
        assert_eq!(first.hybrid_spots, other.hybrid_spots);
        assert_eq!(first.sync, other.sync);
        assert_eq!(first.diagnostics, other.diagnostics);
    }
    assert!(!first.com_spots.is_empty());
}

#[test]
fn test_row_padding_is_ignored() {
    let spots = [GaussianSpot::new(12.4, 9.7, 1.3, 160.0)];
    let packed = SyntheticFrame::new(24, 20).with_spots(&spots);
    let padded = SyntheticFrame::with_pitch(24, 20, 32).with_spots(&spots);

    let mut data = padded.data().to_vec();
    // garbage in the padding bytes
    for y in 0..20 {
        data[y * 32 + 24..y * 32 + 32].fill(255);
    }
    let padded_view = Frame::new(&data, 24, 20, 32).unwrap();

    let mut engine = CentroidEngine::new(24, 20, CentroidConfig::default()).unwrap();
    let a = engine.process(&packed.frame().unwrap()).unwrap();
    let b = engine.process(&padded_view).unwrap();
    assert_eq!(a.com_spots, b.com_spots);
}

#[test]
fn test_sync_signal() {
    // bright patch inside the signal rectangle
    let frame = SyntheticFrame::new(32, 32)
        .with_background(10)
        .with_spots(&[GaussianSpot::new(5.0, 5.0, 3.0, 120.0)]);
    let config = CentroidConfig::default()
        .with_threshold(200)
        .with_signal_region(Rect::new(3, 8, 3, 8))
        .with_baseline_region(Rect::new(20, 30, 20, 30));
    let result = run(&frame, config);

    assert!(result.sync.signal_present);
    assert_eq!(result.sync.avg_baseline, Some(10.0));
    assert!(result.sync.avg_signal.unwrap() > 20.0);
}

#[test]
fn test_empty_sync_region_is_undefined() {
    let frame = SyntheticFrame::new(16, 16).with_background(50);
    let config = CentroidConfig::default().with_signal_region(Rect::new(2, 6, 2, 6));
    let result = run(&frame, config);

    assert_eq!(result.sync.avg_signal, Some(50.0));
    assert_eq!(result.sync.avg_baseline, None);
    assert!(!result.sync.signal_present);
}

#[test]
fn test_aoi_restricts_spots() {
    let frame = SyntheticFrame::new(60, 40).with_spots(&[
        GaussianSpot::new(10.2, 20.3, 1.2, 180.0),
        GaussianSpot::new(45.6, 20.1, 1.2, 180.0),
    ]);
    let config = CentroidConfig::default()
        .with_threshold(5)
        .with_aoi(Rect::from_origin_size(30, 0, 30, 40));
    let result = run(&frame, config);

    assert_eq!(result.com_spots.len(), 1);
    assert!((result.com_spots[0].x - 45.6).abs() < 0.1);
}
