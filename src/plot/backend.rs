use std::collections::BTreeMap;

use crate::config::render_config::{
    ChannelLabelStyle, ColorbarStyle, ContourStyle, ImageStyle,
};
use crate::cube::volume::{LinearAxis, SliceView};
use crate::environment::state::Environment;
use crate::foundation::core::{Canvas, Point, Rgba8};
use crate::foundation::error::{CubeMovieError, CubeMovieResult};
use crate::plot::colormap::Colormap;
use crate::range::estimator::ResolvedRange;

/// A rendered RGBA8 frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent frame.
    pub fn blank(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.byte_len()],
            premultiplied: true,
        }
    }

    /// Straight-alpha copy of the pixels.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// Handle to a live artist, minted by the backend that drew it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtistId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtistKind {
    Image,
    Contour,
    Text,
    Colorbar,
}

/// Figure size and background.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FigureSpec {
    pub canvas: Canvas,
    pub dpi: f64,
    pub background: Rgba8,
}

/// The single axes of a figure, sized for a `rows x cols` image.
#[derive(Clone, Debug, PartialEq)]
pub struct AxesSpec {
    pub rows: usize,
    pub cols: usize,
    pub x_axis: Option<LinearAxis>,
    pub y_axis: Option<LinearAxis>,
}

pub struct ImageSpec<'a> {
    pub data: SliceView<'a>,
    pub colormap: &'a Colormap,
    pub range: ResolvedRange,
    pub style: &'a ImageStyle,
}

pub struct ContourSpec<'a> {
    pub data: SliceView<'a>,
    pub levels: &'a [f64],
    pub style: &'a ContourStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// Text placed in axes-fraction coordinates (`0,0` lower left, `1,1` upper right).
#[derive(Clone, Debug, PartialEq)]
pub struct TextSpec {
    pub content: String,
    pub anchor: Point,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub style: ChannelLabelStyle,
}

/// Colorbar bound to an image artist, with optional level lines.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorbarSpec {
    pub image: ArtistId,
    pub label: Option<String>,
    pub lines: Vec<f64>,
    pub line_style: ContourStyle,
    pub style: ColorbarStyle,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AxisLabels {
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Drawing primitives a scene is built from.
///
/// A backend holds one figure with one axes. Artists are created by the `draw_*` calls and
/// addressed by the returned [`ArtistId`]; they stay alive until removed or until the next
/// `create_scene`.
pub trait PlotBackend {
    /// Start a new figure, discarding any previous artists.
    fn create_scene(
        &mut self,
        figure: &FigureSpec,
        axes: &AxesSpec,
        env: &Environment,
    ) -> CubeMovieResult<()>;

    fn draw_image(&mut self, spec: &ImageSpec<'_>) -> CubeMovieResult<ArtistId>;

    /// Draw iso-lines; an empty artist is returned when no level lies in the data range.
    fn draw_contour(&mut self, spec: &ContourSpec<'_>) -> CubeMovieResult<ArtistId>;

    fn draw_text(&mut self, spec: &TextSpec) -> CubeMovieResult<ArtistId>;

    fn draw_colorbar(&mut self, spec: &ColorbarSpec) -> CubeMovieResult<ArtistId>;

    fn set_axis_labels(&mut self, labels: &AxisLabels) -> CubeMovieResult<()>;

    /// Replace the backing array of an image artist, keeping the artist.
    fn update_array(&mut self, image: ArtistId, data: SliceView<'_>) -> CubeMovieResult<()>;

    /// Replace the content of a text artist, keeping the artist.
    fn set_text(&mut self, text: ArtistId, content: &str) -> CubeMovieResult<()>;

    /// Destroy an artist and everything it drew.
    fn remove_artist(&mut self, id: ArtistId) -> CubeMovieResult<()>;

    /// Rasterize the current figure as premultiplied RGBA8.
    fn render(&mut self) -> CubeMovieResult<FrameRGBA>;

    /// Canvas of the current figure, if one was created.
    fn canvas(&self) -> Option<Canvas>;
}

/// Id allocation and kind tracking shared by backends.
#[derive(Debug, Default)]
pub(crate) struct ArtistRegistry {
    next: u64,
    live: BTreeMap<ArtistId, ArtistKind>,
}

impl ArtistRegistry {
    pub(crate) fn clear(&mut self) {
        self.live.clear();
    }

    pub(crate) fn mint(&mut self, kind: ArtistKind) -> ArtistId {
        self.next += 1;
        let id = ArtistId(self.next);
        self.live.insert(id, kind);
        id
    }

    pub(crate) fn expect(&self, id: ArtistId, kind: ArtistKind) -> CubeMovieResult<()> {
        match self.live.get(&id) {
            Some(k) if *k == kind => Ok(()),
            Some(k) => Err(CubeMovieError::render(format!(
                "artist {id:?} is a {k:?}, not a {kind:?}"
            ))),
            None => Err(CubeMovieError::render(format!("artist {id:?} does not exist"))),
        }
    }

    pub(crate) fn remove(&mut self, id: ArtistId) -> CubeMovieResult<ArtistKind> {
        self.live
            .remove(&id)
            .ok_or_else(|| CubeMovieError::render(format!("artist {id:?} does not exist")))
    }

    pub(crate) fn live(&self) -> impl Iterator<Item = (ArtistId, ArtistKind)> + '_ {
        self.live.iter().map(|(id, kind)| (*id, *kind))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plot/backend.rs"]
mod tests;
