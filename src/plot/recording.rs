use crate::cube::volume::SliceView;
use crate::environment::state::{Environment, WarningCategory};
use crate::foundation::core::Canvas;
use crate::foundation::error::{CubeMovieError, CubeMovieResult};
use crate::plot::backend::{
    ArtistId, ArtistKind, ArtistRegistry, AxesSpec, AxisLabels, ColorbarSpec, ContourSpec,
    FigureSpec, FrameRGBA, ImageSpec, PlotBackend, TextSpec,
};
use crate::plot::contour;

/// One call received by a [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    CreateScene { canvas: Canvas, rows: usize, cols: usize },
    DrawImage { id: ArtistId, first_value: Option<f32> },
    DrawContour { id: ArtistId, levels: Vec<f64>, empty: bool },
    DrawText { id: ArtistId, content: String },
    DrawColorbar { id: ArtistId, image: ArtistId, label: Option<String> },
    SetAxisLabels(AxisLabels),
    UpdateArray { id: ArtistId, first_value: Option<f32> },
    SetText { id: ArtistId, content: String },
    RemoveArtist(ArtistId),
    Render,
}

/// Backend that draws nothing and records every call.
///
/// Artist bookkeeping and contour level checks match [`RasterBackend`](super::raster::RasterBackend),
/// so scene logic can be tested without rasterizing. `fail_update_after(n)` makes the
/// `n+1`-th `update_array` call fail; `fail_next_contours(n)` makes the next `n` `draw_contour`
/// calls fail.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    registry: ArtistRegistry,
    figure: Option<FigureSpec>,
    env: Option<Environment>,
    texts: Vec<(ArtistId, String)>,
    updates: usize,
    fail_update_after: Option<usize>,
    contour_failures: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_update_after(mut self, n: usize) -> Self {
        self.fail_update_after = Some(n);
        self
    }

    pub fn fail_next_contours(&mut self, n: usize) {
        self.contour_failures = n;
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Ids and kinds of the artists currently alive.
    pub fn live_artists(&self) -> Vec<(ArtistId, ArtistKind)> {
        self.registry.live().collect()
    }

    /// Current content of a text artist.
    pub fn text(&self, id: ArtistId) -> Option<&str> {
        self.texts
            .iter()
            .find(|(t, _)| *t == id)
            .map(|(_, s)| s.as_str())
    }

    /// Every text content set on any artist, in call order.
    pub fn text_history(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::DrawText { content, .. } | BackendCall::SetText { content, .. } => {
                    Some(content.as_str())
                }
                _ => None,
            })
            .collect()
    }

    fn require_figure(&self) -> CubeMovieResult<FigureSpec> {
        self.figure
            .ok_or_else(|| CubeMovieError::render("no figure; call create_scene first"))
    }
}

impl PlotBackend for RecordingBackend {
    fn create_scene(
        &mut self,
        figure: &FigureSpec,
        axes: &AxesSpec,
        env: &Environment,
    ) -> CubeMovieResult<()> {
        self.registry.clear();
        self.texts.clear();
        self.figure = Some(*figure);
        self.env = Some(env.clone());
        self.calls.push(BackendCall::CreateScene {
            canvas: figure.canvas,
            rows: axes.rows,
            cols: axes.cols,
        });
        Ok(())
    }

    fn draw_image(&mut self, spec: &ImageSpec<'_>) -> CubeMovieResult<ArtistId> {
        self.require_figure()?;
        let id = self.registry.mint(ArtistKind::Image);
        self.calls.push(BackendCall::DrawImage {
            id,
            first_value: spec.data.data().first().copied(),
        });
        Ok(id)
    }

    fn draw_contour(&mut self, spec: &ContourSpec<'_>) -> CubeMovieResult<ArtistId> {
        self.require_figure()?;
        contour::check_levels(spec.levels)?;
        if self.contour_failures > 0 {
            self.contour_failures -= 1;
            return Err(CubeMovieError::render("injected draw_contour failure"));
        }
        let empty = !contour::any_level_in_range(&spec.data, spec.levels);
        if empty {
            if let Some(env) = &self.env {
                env.warn(WarningCategory::EmptyContour, contour::EMPTY_CONTOUR_MESSAGE);
            }
        }
        let id = self.registry.mint(ArtistKind::Contour);
        self.calls.push(BackendCall::DrawContour {
            id,
            levels: spec.levels.to_vec(),
            empty,
        });
        Ok(id)
    }

    fn draw_text(&mut self, spec: &TextSpec) -> CubeMovieResult<ArtistId> {
        self.require_figure()?;
        let id = self.registry.mint(ArtistKind::Text);
        self.texts.push((id, spec.content.clone()));
        self.calls.push(BackendCall::DrawText {
            id,
            content: spec.content.clone(),
        });
        Ok(id)
    }

    fn draw_colorbar(&mut self, spec: &ColorbarSpec) -> CubeMovieResult<ArtistId> {
        self.require_figure()?;
        self.registry.expect(spec.image, ArtistKind::Image)?;
        let id = self.registry.mint(ArtistKind::Colorbar);
        self.calls.push(BackendCall::DrawColorbar {
            id,
            image: spec.image,
            label: spec.label.clone(),
        });
        Ok(id)
    }

    fn set_axis_labels(&mut self, labels: &AxisLabels) -> CubeMovieResult<()> {
        self.require_figure()?;
        self.calls.push(BackendCall::SetAxisLabels(labels.clone()));
        Ok(())
    }

    fn update_array(&mut self, image: ArtistId, data: SliceView<'_>) -> CubeMovieResult<()> {
        self.registry.expect(image, ArtistKind::Image)?;
        if self.fail_update_after.is_some_and(|n| self.updates >= n) {
            return Err(CubeMovieError::render("injected update_array failure"));
        }
        self.updates += 1;
        self.calls.push(BackendCall::UpdateArray {
            id: image,
            first_value: data.data().first().copied(),
        });
        Ok(())
    }

    fn set_text(&mut self, text: ArtistId, content: &str) -> CubeMovieResult<()> {
        self.registry.expect(text, ArtistKind::Text)?;
        if let Some((_, s)) = self.texts.iter_mut().find(|(t, _)| *t == text) {
            *s = content.to_string();
        }
        self.calls.push(BackendCall::SetText {
            id: text,
            content: content.to_string(),
        });
        Ok(())
    }

    fn remove_artist(&mut self, id: ArtistId) -> CubeMovieResult<()> {
        if self.registry.remove(id)? == ArtistKind::Text {
            self.texts.retain(|(t, _)| *t != id);
        }
        self.calls.push(BackendCall::RemoveArtist(id));
        Ok(())
    }

    fn render(&mut self) -> CubeMovieResult<FrameRGBA> {
        let figure = self.require_figure()?;
        self.calls.push(BackendCall::Render);
        Ok(FrameRGBA::blank(figure.canvas))
    }

    fn canvas(&self) -> Option<Canvas> {
        self.figure.map(|f| f.canvas)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plot/recording.rs"]
mod tests;
