use super::*;

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(1, 0).is_err());
    let fps = Fps::new(2, 1).unwrap();
    assert_eq!(fps.frame_interval(), std::time::Duration::from_millis(500));
}

#[test]
fn canvas_is_even_and_scaled_by_dpi() {
    let c = FigureSize::default().canvas_at(100.0).unwrap();
    assert_eq!(c, Canvas { width: 800, height: 800 });

    let c = FigureSize {
        width_in: 3.01,
        height_in: 2.0,
    }
    .canvas_at(100.0)
    .unwrap();
    assert_eq!(c.width % 2, 0);
    assert_eq!(c.width, 302);
    assert_eq!(c.height, 200);
}

#[test]
fn canvas_rejects_bad_dims() {
    assert!(
        FigureSize {
            width_in: 0.0,
            height_in: 1.0
        }
        .canvas_at(100.0)
        .is_err()
    );
    assert!(FigureSize::default().canvas_at(f64::NAN).is_err());
    assert!(FigureSize::default().canvas_at(1.0e5).is_err());
}

#[test]
fn colors_parse_names_and_hex() {
    assert_eq!(Rgba8::parse("k").unwrap(), Rgba8::BLACK);
    assert_eq!(Rgba8::parse("#ff8000").unwrap(), Rgba8::opaque(255, 128, 0));
    assert_eq!(Rgba8::parse("#ff800080").unwrap().a, 128);
    assert!(Rgba8::parse("chartreuse-ish").is_err());
    assert!(Rgba8::parse("#12").is_err());
}

#[test]
fn color_serde_roundtrips_through_hex() {
    let c: Rgba8 = serde_json::from_str("\"white\"").unwrap();
    assert_eq!(c, Rgba8::WHITE);
    assert_eq!(serde_json::to_string(&c).unwrap(), "\"#ffffffff\"");
}

#[test]
fn premul_half_alpha() {
    let c = Rgba8 {
        r: 255,
        g: 0,
        b: 0,
        a: 128,
    };
    assert_eq!(c.premul(), [128, 0, 0, 128]);
}
