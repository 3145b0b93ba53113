use std::time::Duration;

use crate::geo::{LatLng, LatLngBounds};

/// Handle to a transient decoration (rectangle or marker) drawn on a surface.
pub type OverlayId = u64;

/// Notifications the surface reports back to its owner, drained once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// A zoom transition settled, whether from a command or a gesture.
    ZoomEnd { zoom: u8 },
}

/// Visual treatment for a rectangle overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RectStyle {
    pub dashed: bool,
    pub filled: bool,
}

impl RectStyle {
    /// Dashed, filled square drawn around a selected point.
    pub const HIGHLIGHT: Self = Self {
        dashed: true,
        filled: true,
    };

    /// Solid outline for a selection's explicit bounds.
    pub const OUTLINE: Self = Self {
        dashed: false,
        filled: false,
    };
}

/// The map rendering provider, injected into the view controller.
///
/// Mirrors the primitives of the underlying mapping library: camera moves,
/// zoom, overlay management, and size invalidation. The controller is the
/// sole owner of a surface; destruction is dropping it.
pub trait MapSurface {
    /// Jump the camera to `center` at `zoom` with no animation.
    fn set_view(&mut self, center: LatLng, zoom: u8);

    /// Start an animated camera transition toward `center`/`zoom`.
    fn fly_to(&mut self, center: LatLng, zoom: u8, duration: Duration);

    fn set_zoom(&mut self, zoom: u8);

    fn zoom(&self) -> u8;

    /// Frame the viewport around `bounds` with `padding` pixels per side.
    fn fit_bounds(&mut self, bounds: LatLngBounds, padding: u16);

    fn add_rectangle(&mut self, bounds: LatLngBounds, style: RectStyle) -> OverlayId;

    fn add_marker(&mut self, point: LatLng) -> OverlayId;

    /// Remove a single overlay. Unknown ids are ignored.
    fn remove_overlay(&mut self, id: OverlayId);

    /// The host container changed size; recompute the rendering area.
    fn invalidate_size(&mut self, width_px: usize, height_px: usize);

    /// Take all events produced since the previous drain.
    fn drain_events(&mut self) -> Vec<SurfaceEvent>;
}
