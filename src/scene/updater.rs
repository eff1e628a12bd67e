use crate::config::render_config::RenderConfig;
use crate::cube::volume::Cube;
use crate::environment::state::{Environment, WarningCategory};
use crate::foundation::core::ChannelIndex;
use crate::foundation::error::CubeMovieResult;
use crate::plot::backend::{ArtistId, ContourSpec, PlotBackend};
use crate::scene::model::Scene;

/// Show `channel` in an existing scene.
///
/// In order: swap the image array in place, replace the contour artist (the old one is removed
/// before the new one is drawn), then set the channel label. Returns the artists touched, with
/// the new contour id in place of the removed one.
///
/// If the contour draw fails the scene is left without one and the next call draws it afresh.
pub fn update_frame(
    backend: &mut dyn PlotBackend,
    scene: &mut Scene,
    cube: &dyn Cube,
    config: &RenderConfig,
    env: &Environment,
    channel: ChannelIndex,
) -> CubeMovieResult<Vec<ArtistId>> {
    let slice = cube.slice(channel)?;
    if let Some(issue) = cube.coordinate_issue() {
        env.warn(WarningCategory::CoordinateSystem, &issue);
    }
    let mut touched = Vec::with_capacity(3);

    backend.update_array(scene.image, slice)?;
    touched.push(scene.image);

    if !config.contour_levels.is_empty() {
        if let Some(old) = scene.contour {
            backend.remove_artist(old)?;
            scene.contour = None;
        }
        let id = backend.draw_contour(&ContourSpec {
            data: slice,
            levels: &config.contour_levels,
            style: &config.contour_style,
        })?;
        scene.contour = Some(id);
        touched.push(id);
    }

    let label = cube
        .spectral_value(channel)?
        .to(scene.label_unit)?
        .format(config.decimals);
    backend.set_text(scene.text, &label)?;
    touched.push(scene.text);

    scene.label = label;
    scene.current = channel;
    tracing::trace!(channel = channel.0, label = %scene.label, "frame updated");
    Ok(touched)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/updater.rs"]
mod tests;
