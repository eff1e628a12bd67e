use super::*;

fn item(content: &str) -> TextItem {
    TextItem {
        content: content.to_string(),
        x: 10.0,
        y: 20.0,
        h_align: HAlign::Right,
        v_align: VAlign::Top,
        font_px: 10.0,
        family: "sans-serif".to_string(),
        color: Rgba8::BLACK,
        vertical: false,
    }
}

#[test]
fn svg_escapes_markup() {
    let svg = svg_document(
        Canvas {
            width: 40,
            height: 30,
        },
        &[item("a < b & \"c\"")],
    );
    assert!(svg.contains("a &lt; b &amp; &quot;c&quot;"));
    assert!(svg.contains(r#"text-anchor="end""#));
    assert!(svg.contains(r#"y="28.00""#));
    assert!(svg.starts_with("<svg"));
}

#[test]
fn vertical_text_is_rotated_about_anchor() {
    let mut it = item("Dec");
    it.vertical = true;
    let svg = svg_document(
        Canvas {
            width: 40,
            height: 30,
        },
        &[it],
    );
    assert!(svg.contains("rotate(-90 10.00 20.00)"));
}

#[test]
fn empty_items_produce_transparent_layer() {
    let canvas = Canvas {
        width: 8,
        height: 4,
    };
    let layer = rasterize(canvas, &[item("")]).unwrap();
    assert_eq!(layer.len(), canvas.byte_len());
    assert!(layer.iter().all(|b| *b == 0));
}

#[test]
fn rasterized_layer_has_canvas_size() {
    let canvas = Canvas {
        width: 64,
        height: 32,
    };
    let layer = rasterize(canvas, &[item("12.3 km/s")]).unwrap();
    assert_eq!(layer.len(), canvas.byte_len());
}
