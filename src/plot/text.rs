use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{CubeMovieError, CubeMovieResult};
use crate::plot::backend::{HAlign, VAlign};

/// Extra font directory searched in addition to the system fonts.
pub const FONT_DIR_ENV: &str = "CUBEMOVIE_FONT_DIR";

/// One run of text positioned in canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    pub content: String,
    pub x: f64,
    pub y: f64,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub font_px: f64,
    pub family: String,
    pub color: Rgba8,
    /// Rotate 90 degrees counter-clockwise around the anchor (vertical axis labels).
    pub vertical: bool,
}

static FONTDB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();

fn fontdb() -> Arc<usvg::fontdb::Database> {
    FONTDB
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            if let Some(dir) = std::env::var_os(FONT_DIR_ENV) {
                load_fonts_from_dir(&mut db, Path::new(&dir));
            }
            tracing::debug!(faces = db.len(), "font database loaded");
            Arc::new(db)
        })
        .clone()
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };
    for path in rd.flatten().map(|e| e.path()) {
        let is_font = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
            .unwrap_or(false);
        if is_font && path.is_file() {
            let _ = db.load_font_file(&path);
        }
    }
}

fn font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<usvg::fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                })
                .collect();
            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Serif);

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style: usvg::fontdb::Style::Normal,
            };
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// SVG document drawing `items` on a transparent canvas.
pub(crate) fn svg_document(canvas: Canvas, items: &[TextItem]) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = canvas.width,
        h = canvas.height
    );
    for item in items.iter().filter(|i| !i.content.is_empty()) {
        let anchor = match item.h_align {
            HAlign::Left => "start",
            HAlign::Center => "middle",
            HAlign::Right => "end",
        };
        // Baseline offset from the requested vertical anchor.
        let dy = match item.v_align {
            VAlign::Top => 0.8 * item.font_px,
            VAlign::Center => 0.35 * item.font_px,
            VAlign::Bottom => -0.2 * item.font_px,
        };
        let rotate = if item.vertical {
            format!(r#" transform="rotate(-90 {:.2} {:.2})""#, item.x, item.y)
        } else {
            String::new()
        };
        svg.push_str(&format!(
            r##"<text x="{:.2}" y="{:.2}" font-size="{:.2}" font-family="{}" fill="#{:02x}{:02x}{:02x}" fill-opacity="{:.3}" text-anchor="{anchor}"{rotate}>{}</text>"##,
            item.x,
            item.y + dy,
            item.font_px,
            escape_xml(&item.family),
            item.color.r,
            item.color.g,
            item.color.b,
            f64::from(item.color.a) / 255.0,
            escape_xml(&item.content),
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// Rasterize text items into a full-canvas premultiplied RGBA8 layer.
pub fn rasterize(canvas: Canvas, items: &[TextItem]) -> CubeMovieResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas.width, canvas.height)
        .ok_or_else(|| CubeMovieError::render("failed to allocate text layer"))?;
    if items.iter().all(|i| i.content.is_empty()) {
        return Ok(pixmap.data().to_vec());
    }

    let opts = usvg::Options {
        fontdb: fontdb(),
        font_resolver: font_resolver(),
        ..Default::default()
    };
    let svg = svg_document(canvas, items);
    let tree = usvg::Tree::from_str(&svg, &opts)
        .context("parse text layer svg")
        .map_err(CubeMovieError::from)?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap.data().to_vec())
}

#[cfg(test)]
#[path = "../../tests/unit/plot/text.rs"]
mod tests;
