use std::collections::BTreeMap;

use crate::config::render_config::ColorbarStyle;
use crate::cube::volume::{LinearAxis, SliceView};
use crate::environment::state::{Environment, RenderSettings, WarningCategory};
use crate::foundation::core::{Canvas, Point, Rect, Rgba8};
use crate::foundation::error::{CubeMovieError, CubeMovieResult};
use crate::foundation::math::{format_tick, nice_ticks};
use crate::plot::backend::{
    ArtistId, ArtistKind, ArtistRegistry, AxesSpec, AxisLabels, ColorbarSpec, ContourSpec,
    FigureSpec, FrameRGBA, HAlign, ImageSpec, PlotBackend, TextSpec, VAlign,
};
use crate::plot::colormap::Colormap;
use crate::plot::composite::{self, Premul};
use crate::plot::contour::{self, ContourLevel};
use crate::plot::layout::{Decorations, Margins, PlotLayout, TextMetrics};
use crate::plot::text::{self, TextItem};
use crate::range::estimator::ResolvedRange;

const TICK_LABEL_PT: f64 = 10.0;
const AXIS_LABEL_PT: f64 = 12.0;
const TICK_LEN_PT: f64 = 3.5;
const FRAME_WIDTH_PT: f64 = 0.8;
const MAX_TICKS: usize = 5;
const FONT_FAMILY: &str = "sans-serif";

/// CPU drawing backend.
///
/// The colormapped image and colorbar gradient are blitted directly; contours, frame and ticks
/// are stroked with `vello_cpu`; text goes through `usvg`/`resvg`. Text layers are cached and
/// only re-rasterized when their content or the layout changes.
#[derive(Default)]
pub struct RasterBackend {
    figure: Option<Figure>,
    registry: ArtistRegistry,
}

struct Figure {
    spec: FigureSpec,
    axes: AxesSpec,
    env: Environment,
    settings: RenderSettings,
    labels: AxisLabels,
    image: Option<(ArtistId, ImageArtist)>,
    contours: BTreeMap<ArtistId, ContourArtist>,
    texts: BTreeMap<ArtistId, TextArtist>,
    colorbar: Option<(ArtistId, ColorbarArtist)>,
    layout: Option<Layout>,
}

struct ImageArtist {
    colormap: Colormap,
    range: ResolvedRange,
    alpha: f32,
    rows: usize,
    cols: usize,
    pixels: Vec<Premul>,
}

impl ImageArtist {
    fn recolor(&mut self, data: SliceView<'_>) -> CubeMovieResult<()> {
        if data.rows() != self.rows || data.cols() != self.cols {
            return Err(CubeMovieError::render(format!(
                "image is {}x{}, new array is {}x{}",
                self.rows,
                self.cols,
                data.rows(),
                data.cols()
            )));
        }
        self.pixels.clear();
        self.pixels.extend(
            data.data()
                .iter()
                .map(|v| self.colormap.map_value(*v, &self.range).premul()),
        );
        Ok(())
    }
}

struct ContourArtist {
    levels: Vec<ContourLevel>,
    color: Rgba8,
    width_px: f64,
}

struct TextArtist {
    spec: TextSpec,
    layer: Option<Vec<u8>>,
}

struct ColorbarArtist {
    label: Option<String>,
    lines: Vec<f64>,
    line_color: Rgba8,
    line_width_px: f64,
    style: ColorbarStyle,
}

struct Ticks {
    positions: Vec<f64>,
    labels: Vec<String>,
}

/// Geometry plus everything derived from it.
struct Layout {
    plot: PlotLayout,
    x_ticks: Ticks,
    y_ticks: Ticks,
    cb_ticks: Ticks,
    static_text: Vec<u8>,
}

impl RasterBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn figure(&mut self) -> CubeMovieResult<&mut Figure> {
        self.figure
            .as_mut()
            .ok_or_else(|| CubeMovieError::render("no figure; call create_scene first"))
    }
}

fn pt_to_px(pt: f64, dpi: f64) -> f64 {
    pt * dpi / 72.0
}

fn axis_ticks(axis: Option<&LinearAxis>, len: usize) -> Ticks {
    let (lo, hi) = (-0.5, len as f64 - 0.5);
    match axis {
        Some(ax) => {
            let (a, b) = (ax.world(lo), ax.world(hi));
            let world = nice_ticks(a.min(b), a.max(b), MAX_TICKS);
            Ticks {
                positions: world
                    .iter()
                    .map(|w| (w - ax.crval) / ax.cdelt + ax.crpix - 1.0)
                    .collect(),
                labels: world.iter().map(|w| format_tick(*w)).collect(),
            }
        }
        None => {
            let px = nice_ticks(0.0, hi, MAX_TICKS);
            Ticks {
                labels: px.iter().map(|p| format_tick(*p)).collect(),
                positions: px,
            }
        }
    }
}

impl Figure {
    fn canvas(&self) -> Canvas {
        self.spec.canvas
    }

    fn colorbar_range(&self) -> Option<ResolvedRange> {
        self.image.as_ref().map(|(_, img)| img.range)
    }

    fn invalidate_layout(&mut self) {
        self.layout = None;
        for t in self.texts.values_mut() {
            t.layer = None;
        }
    }

    fn ensure_layout(&mut self) -> CubeMovieResult<()> {
        if self.layout.is_some() {
            return Ok(());
        }
        let dpi = self.spec.dpi;
        let x_ticks = axis_ticks(self.axes.x_axis.as_ref(), self.axes.cols);
        let y_ticks = axis_ticks(self.axes.y_axis.as_ref(), self.axes.rows);
        let cb_ticks = match (&self.colorbar, self.colorbar_range()) {
            (Some(_), Some(r)) => {
                let values = nice_ticks(r.min, r.max, MAX_TICKS);
                Ticks {
                    labels: values.iter().map(|v| format_tick(*v)).collect(),
                    positions: values,
                }
            }
            _ => Ticks {
                positions: Vec::new(),
                labels: Vec::new(),
            },
        };

        let tick_metrics = TextMetrics::from_points(TICK_LABEL_PT, dpi);
        let margins = if self.settings.tight_layout {
            let cb_label = self
                .colorbar
                .as_ref()
                .and_then(|(_, cb)| cb.label.as_deref());
            Margins::tight(
                &TextMetrics::from_points(AXIS_LABEL_PT, dpi),
                pt_to_px(TICK_LEN_PT, dpi),
                &Decorations {
                    x_label: self.labels.x.as_deref(),
                    y_label: self.labels.y.as_deref(),
                    y_tick_labels: &y_ticks.labels,
                    colorbar_tick_labels: &cb_ticks.labels,
                    colorbar_label: cb_label,
                },
            )
        } else {
            Margins::fixed(self.canvas())
        };
        let plot = PlotLayout::compute(
            self.canvas(),
            self.axes.rows,
            self.axes.cols,
            margins,
            self.colorbar.as_ref().map(|(_, cb)| &cb.style),
        );

        let static_text = text::rasterize(
            self.canvas(),
            &self.static_text_items(&plot, &tick_metrics, &x_ticks, &y_ticks, &cb_ticks),
        )?;
        tracing::debug!(axes = ?plot.axes, colorbar = ?plot.colorbar, "layout computed");
        self.layout = Some(Layout {
            plot,
            x_ticks,
            y_ticks,
            cb_ticks,
            static_text,
        });
        Ok(())
    }

    fn static_text_items(
        &self,
        plot: &PlotLayout,
        tick_metrics: &TextMetrics,
        x_ticks: &Ticks,
        y_ticks: &Ticks,
        cb_ticks: &Ticks,
    ) -> Vec<TextItem> {
        let dpi = self.spec.dpi;
        let tick_len = pt_to_px(TICK_LEN_PT, dpi);
        let label_px = pt_to_px(AXIS_LABEL_PT, dpi);
        let item = |content: &str, x: f64, y: f64, h: HAlign, v: VAlign, px: f64| TextItem {
            content: content.to_string(),
            x,
            y,
            h_align: h,
            v_align: v,
            font_px: px,
            family: FONT_FAMILY.to_string(),
            color: Rgba8::BLACK,
            vertical: false,
        };
        let ax = plot.axes;
        let mut items = Vec::new();

        for (pos, label) in x_ticks.positions.iter().zip(&x_ticks.labels) {
            let p = plot.data_to_px(*pos, -0.5);
            items.push(item(
                label,
                p.x,
                ax.y1 + tick_len + 2.0,
                HAlign::Center,
                VAlign::Top,
                tick_metrics.font_px,
            ));
        }
        let mut widest_y = 0.0_f64;
        for (pos, label) in y_ticks.positions.iter().zip(&y_ticks.labels) {
            let p = plot.data_to_px(-0.5, *pos);
            widest_y = widest_y.max(tick_metrics.width(label));
            items.push(item(
                label,
                ax.x0 - tick_len - 2.0,
                p.y,
                HAlign::Right,
                VAlign::Center,
                tick_metrics.font_px,
            ));
        }
        if let Some(x) = &self.labels.x {
            items.push(item(
                x,
                0.5 * (ax.x0 + ax.x1),
                ax.y1 + tick_len + tick_metrics.line_height() + 4.0,
                HAlign::Center,
                VAlign::Top,
                label_px,
            ));
        }
        if let Some(y) = &self.labels.y {
            let mut it = item(
                y,
                ax.x0 - tick_len - widest_y - 6.0,
                0.5 * (ax.y0 + ax.y1),
                HAlign::Center,
                VAlign::Bottom,
                label_px,
            );
            it.vertical = true;
            items.push(it);
        }

        if let (Some(cb_rect), Some((_, cb)), Some(range)) =
            (plot.colorbar, &self.colorbar, self.colorbar_range())
        {
            let mut widest = 0.0_f64;
            for (value, label) in cb_ticks.positions.iter().zip(&cb_ticks.labels) {
                let y = cb_rect.y1 - range.normalize(*value).clamp(0.0, 1.0) * cb_rect.height();
                widest = widest.max(tick_metrics.width(label));
                items.push(item(
                    label,
                    cb_rect.x1 + tick_len + 2.0,
                    y,
                    HAlign::Left,
                    VAlign::Center,
                    tick_metrics.font_px,
                ));
            }
            if let Some(label) = &cb.label {
                let mut it = item(
                    label,
                    cb_rect.x1 + tick_len + widest + 6.0,
                    0.5 * (cb_rect.y0 + cb_rect.y1),
                    HAlign::Center,
                    VAlign::Top,
                    label_px,
                );
                it.vertical = true;
                items.push(it);
            }
        }
        items
    }

    fn text_item(&self, plot: &PlotLayout, spec: &TextSpec) -> TextItem {
        let ax = plot.axes;
        TextItem {
            content: spec.content.clone(),
            x: ax.x0 + spec.anchor.x * ax.width(),
            y: ax.y1 - spec.anchor.y * ax.height(),
            h_align: spec.h_align,
            v_align: spec.v_align,
            font_px: pt_to_px(spec.style.font_size, self.spec.dpi),
            family: spec.style.font_family.clone(),
            color: spec.style.color,
            vertical: false,
        }
    }

    fn blit_image(&self, plot: &PlotLayout, dst: &mut [u8]) {
        let Some((_, img)) = &self.image else {
            return;
        };
        let width = self.canvas().width as usize;
        let (x0, x1, y0, y1) = pixel_span(plot.axes, self.canvas());
        for py in y0..y1 {
            for px in x0..x1 {
                let Some((row, col)) = plot.px_to_cell(px as f64 + 0.5, py as f64 + 0.5) else {
                    continue;
                };
                let src = img.pixels[row * img.cols + col];
                let i = (py * width + px) * 4;
                let out = composite::over(
                    [dst[i], dst[i + 1], dst[i + 2], dst[i + 3]],
                    src,
                    img.alpha,
                );
                dst[i..i + 4].copy_from_slice(&out);
            }
        }
    }

    fn blit_colorbar(&self, plot: &PlotLayout, dst: &mut [u8]) {
        let (Some(cb), Some((_, img))) = (plot.colorbar, &self.image) else {
            return;
        };
        let width = self.canvas().width as usize;
        let (x0, x1, y0, y1) = pixel_span(cb, self.canvas());
        for py in y0..y1 {
            let t = (cb.y1 - (py as f64 + 0.5)) / cb.height();
            let color = img.colormap.sample(t).premul();
            for px in x0..x1 {
                let i = (py * width + px) * 4;
                dst[i..i + 4].copy_from_slice(&color);
            }
        }
    }

    fn vector_layer(&self, layout: &Layout) -> CubeMovieResult<Vec<u8>> {
        let canvas = self.canvas();
        let w: u16 = canvas
            .width
            .try_into()
            .map_err(|_| CubeMovieError::render("canvas width exceeds u16"))?;
        let h: u16 = canvas
            .height
            .try_into()
            .map_err(|_| CubeMovieError::render("canvas height exceeds u16"))?;
        let plot = &layout.plot;
        let dpi = self.spec.dpi;

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        for c in self.contours.values() {
            let mut path = vello_cpu::kurbo::BezPath::new();
            for level in &c.levels {
                for [a, b] in &level.segments {
                    path.move_to(to_cpu(plot.data_to_px(a.x, a.y)));
                    path.line_to(to_cpu(plot.data_to_px(b.x, b.y)));
                }
            }
            if path.elements().is_empty() {
                continue;
            }
            set_color(&mut ctx, c.color);
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(c.width_px));
            ctx.stroke_path(&path);
        }

        set_color(&mut ctx, Rgba8::BLACK);
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(pt_to_px(FRAME_WIDTH_PT, dpi)));
        let tick_len = pt_to_px(TICK_LEN_PT, dpi);
        let ax = plot.axes;
        if self.settings.frame_on {
            ctx.stroke_path(&rect_path(ax));
        }
        let mut ticks = vello_cpu::kurbo::BezPath::new();
        for pos in &layout.x_ticks.positions {
            let x = plot.data_to_px(*pos, -0.5).x;
            ticks.move_to((x, ax.y1));
            ticks.line_to((x, ax.y1 + tick_len));
        }
        for pos in &layout.y_ticks.positions {
            let y = plot.data_to_px(-0.5, *pos).y;
            ticks.move_to((ax.x0, y));
            ticks.line_to((ax.x0 - tick_len, y));
        }

        if let (Some(cb_rect), Some((_, cb)), Some(range)) =
            (plot.colorbar, &self.colorbar, self.colorbar_range())
        {
            ctx.stroke_path(&rect_path(cb_rect));
            for value in &layout.cb_ticks.positions {
                let y = cb_rect.y1 - range.normalize(*value).clamp(0.0, 1.0) * cb_rect.height();
                ticks.move_to((cb_rect.x1, y));
                ticks.line_to((cb_rect.x1 + tick_len, y));
            }
            if !ticks.elements().is_empty() {
                ctx.stroke_path(&ticks);
            }

            let mut lines = vello_cpu::kurbo::BezPath::new();
            for level in &cb.lines {
                let t = range.normalize(*level);
                if !(0.0..=1.0).contains(&t) {
                    continue;
                }
                let y = cb_rect.y1 - t * cb_rect.height();
                lines.move_to((cb_rect.x0, y));
                lines.line_to((cb_rect.x1, y));
            }
            if !lines.elements().is_empty() {
                set_color(&mut ctx, cb.line_color);
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(cb.line_width_px));
                ctx.stroke_path(&lines);
            }
        } else if !ticks.elements().is_empty() {
            ctx.stroke_path(&ticks);
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(pixmap.data_as_u8_slice().to_vec())
    }

    fn render(&mut self) -> CubeMovieResult<FrameRGBA> {
        self.ensure_layout()?;
        let Some(layout) = self.layout.take() else {
            return Err(CubeMovieError::render("layout unavailable"));
        };
        let result = self.compose(&layout);
        self.layout = Some(layout);
        result
    }

    fn compose(&mut self, layout: &Layout) -> CubeMovieResult<FrameRGBA> {
        let canvas = self.canvas();
        let mut data = vec![0u8; canvas.byte_len()];
        if !self.settings.transparent {
            composite::fill(&mut data, self.spec.background.premul());
        }

        self.blit_image(&layout.plot, &mut data);
        self.blit_colorbar(&layout.plot, &mut data);
        composite::over_in_place(&mut data, &self.vector_layer(layout)?, 1.0)?;
        composite::over_in_place(&mut data, &layout.static_text, 1.0)?;

        let ids: Vec<ArtistId> = self.texts.keys().copied().collect();
        for id in ids {
            let item = match self.texts.get(&id) {
                Some(t) if t.layer.is_none() => Some(self.text_item(&layout.plot, &t.spec)),
                _ => None,
            };
            if let (Some(item), Some(t)) = (item, self.texts.get_mut(&id)) {
                t.layer = Some(text::rasterize(canvas, &[item])?);
            }
            if let Some(layer) = self.texts.get(&id).and_then(|t| t.layer.as_ref()) {
                composite::over_in_place(&mut data, layer, 1.0)?;
            }
        }

        Ok(FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data,
            premultiplied: true,
        })
    }
}

fn pixel_span(r: Rect, canvas: Canvas) -> (usize, usize, usize, usize) {
    let clamp_x = |v: f64| v.round().clamp(0.0, f64::from(canvas.width)) as usize;
    let clamp_y = |v: f64| v.round().clamp(0.0, f64::from(canvas.height)) as usize;
    (clamp_x(r.x0), clamp_x(r.x1), clamp_y(r.y0), clamp_y(r.y1))
}

fn to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn rect_path(r: Rect) -> vello_cpu::kurbo::BezPath {
    let mut path = vello_cpu::kurbo::BezPath::new();
    path.move_to((r.x0, r.y0));
    path.line_to((r.x1, r.y0));
    path.line_to((r.x1, r.y1));
    path.line_to((r.x0, r.y1));
    path.close_path();
    path
}

fn set_color(ctx: &mut vello_cpu::RenderContext, c: Rgba8) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
}

impl PlotBackend for RasterBackend {
    #[tracing::instrument(skip(self, env))]
    fn create_scene(
        &mut self,
        figure: &FigureSpec,
        axes: &AxesSpec,
        env: &Environment,
    ) -> CubeMovieResult<()> {
        let canvas = figure.canvas;
        if canvas.width == 0
            || canvas.height == 0
            || canvas.width > u32::from(u16::MAX)
            || canvas.height > u32::from(u16::MAX)
        {
            return Err(CubeMovieError::render(format!(
                "unsupported canvas {}x{}",
                canvas.width, canvas.height
            )));
        }
        if axes.rows == 0 || axes.cols == 0 {
            return Err(CubeMovieError::render("axes need a non-empty image shape"));
        }
        self.registry.clear();
        self.figure = Some(Figure {
            spec: *figure,
            axes: axes.clone(),
            env: env.clone(),
            settings: env.render_settings(),
            labels: AxisLabels::default(),
            image: None,
            contours: BTreeMap::new(),
            texts: BTreeMap::new(),
            colorbar: None,
            layout: None,
        });
        Ok(())
    }

    fn draw_image(&mut self, spec: &ImageSpec<'_>) -> CubeMovieResult<ArtistId> {
        let fig = self.figure()?;
        if spec.data.rows() != fig.axes.rows || spec.data.cols() != fig.axes.cols {
            return Err(CubeMovieError::render(format!(
                "image {}x{} does not match axes {}x{}",
                spec.data.rows(),
                spec.data.cols(),
                fig.axes.rows,
                fig.axes.cols
            )));
        }
        let mut artist = ImageArtist {
            colormap: spec.colormap.clone(),
            range: spec.range,
            alpha: spec.style.alpha,
            rows: spec.data.rows(),
            cols: spec.data.cols(),
            pixels: Vec::with_capacity(spec.data.data().len()),
        };
        artist.recolor(spec.data)?;
        let replaced = fig.image.is_some();
        let id = self.registry.mint(ArtistKind::Image);
        let fig = self.figure()?;
        if let Some((old, _)) = fig.image.replace((id, artist)) {
            self.registry.remove(old)?;
        }
        if replaced {
            self.figure()?.invalidate_layout();
        }
        Ok(id)
    }

    fn draw_contour(&mut self, spec: &ContourSpec<'_>) -> CubeMovieResult<ArtistId> {
        let fig = self.figure()?;
        contour::check_levels(spec.levels)?;
        let levels = if contour::any_level_in_range(&spec.data, spec.levels) {
            contour::trace(&spec.data, spec.levels)?
        } else {
            fig.env
                .warn(WarningCategory::EmptyContour, contour::EMPTY_CONTOUR_MESSAGE);
            Vec::new()
        };
        let artist = ContourArtist {
            levels,
            color: spec.style.color,
            width_px: pt_to_px(spec.style.line_width, fig.spec.dpi),
        };
        let id = self.registry.mint(ArtistKind::Contour);
        self.figure()?.contours.insert(id, artist);
        Ok(id)
    }

    fn draw_text(&mut self, spec: &TextSpec) -> CubeMovieResult<ArtistId> {
        self.figure()?;
        let id = self.registry.mint(ArtistKind::Text);
        self.figure()?.texts.insert(
            id,
            TextArtist {
                spec: spec.clone(),
                layer: None,
            },
        );
        Ok(id)
    }

    fn draw_colorbar(&mut self, spec: &ColorbarSpec) -> CubeMovieResult<ArtistId> {
        self.figure()?;
        self.registry.expect(spec.image, ArtistKind::Image)?;
        let dpi = self.figure()?.spec.dpi;
        let artist = ColorbarArtist {
            label: spec.label.clone(),
            lines: spec.lines.clone(),
            line_color: spec.line_style.color,
            line_width_px: pt_to_px(spec.line_style.line_width, dpi),
            style: spec.style.clone(),
        };
        let id = self.registry.mint(ArtistKind::Colorbar);
        let fig = self.figure()?;
        let old = fig.colorbar.replace((id, artist));
        fig.invalidate_layout();
        if let Some((old, _)) = old {
            self.registry.remove(old)?;
        }
        Ok(id)
    }

    fn set_axis_labels(&mut self, labels: &AxisLabels) -> CubeMovieResult<()> {
        let fig = self.figure()?;
        fig.labels = labels.clone();
        fig.invalidate_layout();
        Ok(())
    }

    fn update_array(&mut self, image: ArtistId, data: SliceView<'_>) -> CubeMovieResult<()> {
        self.registry.expect(image, ArtistKind::Image)?;
        let fig = self.figure()?;
        match fig.image.as_mut() {
            Some((id, artist)) if *id == image => artist.recolor(data),
            _ => Err(CubeMovieError::render(format!(
                "image artist {image:?} is not attached to the figure"
            ))),
        }
    }

    fn set_text(&mut self, text: ArtistId, content: &str) -> CubeMovieResult<()> {
        self.registry.expect(text, ArtistKind::Text)?;
        let fig = self.figure()?;
        let artist = fig
            .texts
            .get_mut(&text)
            .ok_or_else(|| CubeMovieError::render(format!("text artist {text:?} missing")))?;
        if artist.spec.content != content {
            artist.spec.content = content.to_string();
            artist.layer = None;
        }
        Ok(())
    }

    fn remove_artist(&mut self, id: ArtistId) -> CubeMovieResult<()> {
        let kind = self.registry.remove(id)?;
        let fig = self.figure()?;
        match kind {
            ArtistKind::Contour => {
                fig.contours.remove(&id);
            }
            ArtistKind::Text => {
                fig.texts.remove(&id);
            }
            ArtistKind::Image => {
                fig.image = None;
                fig.invalidate_layout();
            }
            ArtistKind::Colorbar => {
                fig.colorbar = None;
                fig.invalidate_layout();
            }
        }
        Ok(())
    }

    fn render(&mut self) -> CubeMovieResult<FrameRGBA> {
        self.figure()?.render()
    }

    fn canvas(&self) -> Option<Canvas> {
        self.figure.as_ref().map(Figure::canvas)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plot/raster.rs"]
mod tests;
