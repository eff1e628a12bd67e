use super::*;

#[test]
fn single_peak_gives_closed_ring() {
    let data = [
        0.0f32, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0,
    ];
    let slice = SliceView::new(3, 3, &data).unwrap();
    let levels = trace(&slice, &[0.5]).unwrap();
    assert_eq!(levels.len(), 1);
    let segs = &levels[0].segments;
    assert_eq!(segs.len(), 4);
    for [a, b] in segs {
        for p in [a, b] {
            let d = (p.x - 1.0).abs() + (p.y - 1.0).abs();
            assert!((d - 0.5).abs() < 1e-12, "point {p:?} not on the half-way diamond");
        }
    }
}

#[test]
fn vertical_gradient_gives_horizontal_line() {
    let data = [
        0.0f32, 0.0, //
        2.0, 2.0,
    ];
    let slice = SliceView::new(2, 2, &data).unwrap();
    let levels = trace(&slice, &[1.0]).unwrap();
    assert_eq!(levels[0].segments.len(), 1);
    let [a, b] = levels[0].segments[0];
    assert_eq!(a.y, 0.5);
    assert_eq!(b.y, 0.5);
    assert_eq!((a.x - b.x).abs(), 1.0);
}

#[test]
fn saddle_cells_emit_two_segments() {
    let data = [
        1.0f32, 0.0, //
        0.0, 1.0,
    ];
    let slice = SliceView::new(2, 2, &data).unwrap();
    let levels = trace(&slice, &[0.5]).unwrap();
    assert_eq!(levels[0].segments.len(), 2);
}

#[test]
fn cells_with_blanks_are_skipped() {
    let data = [
        0.0f32,
        f32::NAN, //
        2.0,
        2.0,
    ];
    let slice = SliceView::new(2, 2, &data).unwrap();
    assert!(trace(&slice, &[1.0]).unwrap()[0].segments.is_empty());
}

#[test]
fn malformed_levels_are_render_errors() {
    let data = [0.0f32; 4];
    let slice = SliceView::new(2, 2, &data).unwrap();
    let err = trace(&slice, &[1.0, 1.0]).unwrap_err();
    assert!(matches!(err, CubeMovieError::Render(_)));
    assert!(trace(&slice, &[f64::NAN]).is_err());
}

#[test]
fn range_check_uses_finite_extremes() {
    let data = [1.0f32, 2.0, f32::NAN, 3.0];
    let slice = SliceView::new(2, 2, &data).unwrap();
    assert!(any_level_in_range(&slice, &[0.0, 2.5]));
    assert!(!any_level_in_range(&slice, &[5.0, 6.0]));
    let blank = [f32::NAN; 4];
    let slice = SliceView::new(2, 2, &blank).unwrap();
    assert!(!any_level_in_range(&slice, &[1.0]));
}
