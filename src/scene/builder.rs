use crate::config::render_config::{RenderConfig, UnitSetting};
use crate::cube::volume::{BUNIT, Cube, SpatialAxis};
use crate::environment::state::{Environment, WarningCategory};
use crate::foundation::core::{ChannelIndex, Point};
use crate::foundation::error::CubeMovieResult;
use crate::plot::backend::{
    AxesSpec, AxisLabels, ColorbarSpec, ContourSpec, FigureSpec, HAlign, ImageSpec, PlotBackend,
    TextSpec, VAlign,
};
use crate::plot::colormap::Colormap;
use crate::range::estimator::ResolvedRange;
use crate::scene::model::Scene;

/// Anchor of the channel label in axes fractions (upper right, inset).
pub const CHANNEL_LABEL_ANCHOR: Point = Point::new(0.9, 0.9);

/// Builds the one [`Scene`] of a session from the first channel.
pub struct SceneBuilder<'a> {
    config: &'a RenderConfig,
    range: ResolvedRange,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(config: &'a RenderConfig, range: ResolvedRange) -> Self {
        Self { config, range }
    }

    /// Create the figure and every persistent artist for channel 0.
    ///
    /// Channel 0 is used whatever the frame sequence starts with. The channel label starts
    /// empty; the first frame update fills it.
    #[tracing::instrument(skip_all, fields(range = ?self.range))]
    pub fn build(
        &self,
        backend: &mut dyn PlotBackend,
        cube: &dyn Cube,
        env: &Environment,
    ) -> CubeMovieResult<Scene> {
        let config = self.config;
        let first = ChannelIndex(0);
        let colormap = Colormap::by_name(&config.cmap)?;
        let label_unit = match config.channel_unit {
            UnitSetting::Auto => cube.spectral_value(first)?.unit,
            UnitSetting::Unit(unit) => unit,
        };

        let slice = cube.slice(first)?;
        if let Some(issue) = cube.coordinate_issue() {
            env.warn(WarningCategory::CoordinateSystem, &issue);
        }

        backend.create_scene(
            &FigureSpec {
                canvas: config.canvas()?,
                dpi: config.dpi,
                background: config.background,
            },
            &AxesSpec {
                rows: slice.rows(),
                cols: slice.cols(),
                x_axis: cube.spatial_axis(SpatialAxis::X),
                y_axis: cube.spatial_axis(SpatialAxis::Y),
            },
            env,
        )?;

        let image = backend.draw_image(&ImageSpec {
            data: slice,
            colormap: &colormap,
            range: self.range,
            style: &config.image_style,
        })?;

        let contour = if config.contour_levels.is_empty() {
            None
        } else {
            Some(backend.draw_contour(&ContourSpec {
                data: slice,
                levels: &config.contour_levels,
                style: &config.contour_style,
            })?)
        };

        let text = backend.draw_text(&TextSpec {
            content: String::new(),
            anchor: CHANNEL_LABEL_ANCHOR,
            h_align: HAlign::Right,
            v_align: VAlign::Top,
            style: config.label_style.clone(),
        })?;

        let labels = AxisLabels {
            x: config.xlabel.resolve(|| cube.header("CTYPE1")),
            y: config.ylabel.resolve(|| cube.header("CTYPE2")),
        };
        backend.set_axis_labels(&labels)?;

        let colorbar_label = config.colorbar_label.resolve(|| cube.header(BUNIT));
        let colorbar = if config.show_colorbar {
            Some(backend.draw_colorbar(&ColorbarSpec {
                image,
                label: colorbar_label.clone(),
                lines: config.contour_levels.clone(),
                line_style: config.contour_style.clone(),
                style: config.colorbar_style.clone(),
            })?)
        } else {
            None
        };

        tracing::debug!(?image, ?contour, ?text, ?colorbar, "scene built");
        Ok(Scene {
            image,
            contour,
            text,
            colorbar,
            range: self.range,
            colormap,
            labels,
            colorbar_label,
            label_unit,
            current: first,
            label: String::new(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/builder.rs"]
mod tests;
