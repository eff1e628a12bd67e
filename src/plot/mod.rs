//! Drawing: the backend interface, its CPU implementation and the pieces they share.

pub mod backend;
pub mod colormap;
pub mod composite;
pub mod contour;
pub mod layout;
pub mod raster;
pub mod recording;
pub mod text;
