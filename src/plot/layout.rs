use crate::config::render_config::ColorbarStyle;
use crate::foundation::core::{Canvas, Point, Rect};

/// Figure margins in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Approximate extent of rendered text; glyph metrics are not known before rasterizing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    /// Font size in pixels.
    pub font_px: f64,
}

impl TextMetrics {
    pub fn from_points(points: f64, dpi: f64) -> Self {
        Self {
            font_px: points * dpi / 72.0,
        }
    }

    pub fn width(&self, text: &str) -> f64 {
        0.6 * self.font_px * text.chars().count() as f64
    }

    pub fn line_height(&self) -> f64 {
        1.2 * self.font_px
    }
}

/// What the margins have to make room for.
#[derive(Clone, Debug, Default)]
pub struct Decorations<'a> {
    pub x_label: Option<&'a str>,
    pub y_label: Option<&'a str>,
    pub y_tick_labels: &'a [String],
    pub colorbar_tick_labels: &'a [String],
    pub colorbar_label: Option<&'a str>,
}

impl Margins {
    /// Fixed figure fractions (left 0.125, right 0.1, bottom 0.11, top 0.12).
    pub fn fixed(canvas: Canvas) -> Self {
        let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
        Self {
            left: 0.125 * w,
            right: 0.1 * w,
            top: 0.12 * h,
            bottom: 0.11 * h,
        }
    }

    /// Margins fitted to the decorations.
    pub fn tight(metrics: &TextMetrics, tick_len: f64, decorations: &Decorations<'_>) -> Self {
        let pad = 0.5 * metrics.font_px;
        let label_band = |label: Option<&str>| label.map_or(0.0, |_| metrics.line_height());
        let widest = |labels: &[String]| {
            labels
                .iter()
                .map(|l| metrics.width(l))
                .fold(0.0_f64, f64::max)
        };

        let left = pad
            + label_band(decorations.y_label)
            + widest(decorations.y_tick_labels)
            + tick_len
            + pad;
        let bottom = pad
            + label_band(decorations.x_label)
            + metrics.line_height()
            + tick_len
            + pad;
        let right = pad
            + widest(decorations.colorbar_tick_labels)
            + label_band(decorations.colorbar_label)
            + if decorations.colorbar_tick_labels.is_empty() {
                0.0
            } else {
                tick_len + pad
            };
        let top = pad + 0.5 * metrics.line_height();
        Self {
            left,
            right,
            top,
            bottom,
        }
    }
}

/// Pixel geometry of the axes and the optional colorbar.
///
/// Pixel `y` grows downwards; data rows grow upwards (image origin at the lower left).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotLayout {
    pub canvas: Canvas,
    pub axes: Rect,
    pub colorbar: Option<Rect>,
    pub rows: usize,
    pub cols: usize,
}

impl PlotLayout {
    /// Lay out an image of `rows x cols` with equal data aspect.
    ///
    /// An attached colorbar takes `fraction` of the available width plus a `pad` gap from the
    /// axes and matches the axes height.
    pub fn compute(
        canvas: Canvas,
        rows: usize,
        cols: usize,
        margins: Margins,
        colorbar: Option<&ColorbarStyle>,
    ) -> Self {
        let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
        let x0 = margins.left.clamp(0.0, w - 1.0);
        let y0 = margins.top.clamp(0.0, h - 1.0);
        let x1 = (w - margins.right).max(x0 + 1.0).min(w);
        let y1 = (h - margins.bottom).max(y0 + 1.0).min(h);
        let avail = Rect::new(x0, y0, x1, y1);

        let (parent, cb_geom) = match colorbar {
            Some(style) => {
                let total = avail.width();
                let cb_w = (style.fraction * total).max(1.0);
                let pad = style.pad * total;
                let parent_x1 = (avail.x1 - cb_w - pad).max(avail.x0 + 1.0);
                (
                    Rect::new(avail.x0, avail.y0, parent_x1, avail.y1),
                    Some((cb_w, pad)),
                )
            }
            None => (avail, None),
        };

        let rows_f = rows.max(1) as f64;
        let cols_f = cols.max(1) as f64;
        let scale = (parent.width() / cols_f).min(parent.height() / rows_f);
        let (aw, ah) = (cols_f * scale, rows_f * scale);
        let ax0 = parent.x0 + 0.5 * (parent.width() - aw);
        let ay0 = parent.y0 + 0.5 * (parent.height() - ah);
        let axes = Rect::new(ax0, ay0, ax0 + aw, ay0 + ah);

        let colorbar = cb_geom.map(|(cb_w, pad)| {
            let cx0 = axes.x1 + pad;
            Rect::new(cx0, axes.y0, cx0 + cb_w, axes.y1)
        });

        Self {
            canvas,
            axes,
            colorbar,
            rows,
            cols,
        }
    }

    /// Pixel position of data coordinates (`x` = column, `y` = row, pixel centers at integers).
    pub fn data_to_px(&self, x: f64, y: f64) -> Point {
        let px = self.axes.x0 + (x + 0.5) / self.cols.max(1) as f64 * self.axes.width();
        let py = self.axes.y1 - (y + 0.5) / self.rows.max(1) as f64 * self.axes.height();
        Point::new(px, py)
    }

    /// Data cell under a pixel center, if inside the axes.
    pub fn px_to_cell(&self, px: f64, py: f64) -> Option<(usize, usize)> {
        if !(self.axes.x0..self.axes.x1).contains(&px) || !(self.axes.y0..self.axes.y1).contains(&py)
        {
            return None;
        }
        let col = ((px - self.axes.x0) / self.axes.width() * self.cols as f64).floor() as usize;
        let row_from_top =
            ((py - self.axes.y0) / self.axes.height() * self.rows as f64).floor() as usize;
        let row = self.rows - 1 - row_from_top.min(self.rows - 1);
        Some((row, col.min(self.cols - 1)))
    }

    /// Vertical pixel position of `t` in `0..=1` along the colorbar (bottom = 0).
    pub fn colorbar_y(&self, t: f64) -> Option<f64> {
        self.colorbar.map(|cb| cb.y1 - t.clamp(0.0, 1.0) * cb.height())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plot/layout.rs"]
mod tests;
