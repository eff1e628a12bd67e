use crate::cube::units::SpectralUnit;
use crate::foundation::core::ChannelIndex;
use crate::plot::backend::{ArtistId, AxisLabels};
use crate::plot::colormap::Colormap;
use crate::range::estimator::ResolvedRange;

/// Live artists of one render session and the choices they were built with.
///
/// The image, text and colorbar handles never change after [`SceneBuilder::build`]; only the
/// contour handle is replaced, once per frame.
///
/// [`SceneBuilder::build`]: crate::scene::builder::SceneBuilder::build
#[derive(Clone, Debug)]
pub struct Scene {
    pub(crate) image: ArtistId,
    pub(crate) contour: Option<ArtistId>,
    pub(crate) text: ArtistId,
    pub(crate) colorbar: Option<ArtistId>,
    pub(crate) range: ResolvedRange,
    pub(crate) colormap: Colormap,
    pub(crate) labels: AxisLabels,
    pub(crate) colorbar_label: Option<String>,
    pub(crate) label_unit: SpectralUnit,
    pub(crate) current: ChannelIndex,
    pub(crate) label: String,
}

impl Scene {
    pub fn image(&self) -> ArtistId {
        self.image
    }

    /// Contour artist of the current frame; `None` when contours are disabled or the last redraw
    /// failed (the next update draws a fresh one).
    pub fn contour(&self) -> Option<ArtistId> {
        self.contour
    }

    pub fn text(&self) -> ArtistId {
        self.text
    }

    pub fn colorbar(&self) -> Option<ArtistId> {
        self.colorbar
    }

    /// Color-mapping range shared by every frame.
    pub fn range(&self) -> ResolvedRange {
        self.range
    }

    pub fn colormap(&self) -> &Colormap {
        &self.colormap
    }

    pub fn axis_labels(&self) -> &AxisLabels {
        &self.labels
    }

    pub fn colorbar_label(&self) -> Option<&str> {
        self.colorbar_label.as_deref()
    }

    /// Unit the channel label is shown in.
    pub fn label_unit(&self) -> SpectralUnit {
        self.label_unit
    }

    /// Channel currently shown.
    pub fn current(&self) -> ChannelIndex {
        self.current
    }

    /// Content of the channel label; empty until the first update.
    pub fn label(&self) -> &str {
        &self.label
    }
}
