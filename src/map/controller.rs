use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::geo::{self, LatLng, LatLngBounds, RawLocation};
use crate::map::overlay::OverlaySet;
use crate::map::surface::{MapSurface, RectStyle, SurfaceEvent};

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 18;

/// Whole-of-Canada framing shown before any selection is made.
pub const DEFAULT_CENTER: LatLng = LatLng::new(56.1304, -106.3468);
pub const DEFAULT_ZOOM: u8 = 4;

/// Camera zoom used when a selection does not suggest one.
const SELECTION_FALLBACK_ZOOM: u8 = 13;

/// Fixed fly animation length. The highlight box is placed this long after
/// the transition starts, since the surface exposes no completion callback.
pub const FLY_DURATION: Duration = Duration::from_secs(2);

/// Half-extent of the square highlight drawn around a point, in km
/// (5 km x 5 km total).
const HIGHLIGHT_HALF_KM: f64 = 2.5;

const FIT_BOUNDS_PADDING: u16 = 50;

/// A resolved location: produced by geocoding or restored by the host.
/// Immutable once built; a new selection replaces the old wholesale.
#[derive(Clone, Debug)]
pub struct LocationSelection {
    pub name: String,
    pub coordinates: RawLocation,
    pub bounds: Option<LatLngBounds>,
    pub zoom: Option<u8>,
}

/// Zoom and center as the controller believes them to be. Zoom is only ever
/// written clamped to `[MIN_ZOOM, MAX_ZOOM]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub zoom_level: u8,
    pub center: LatLng,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Ready,
    Animating,
    TornDown,
}

/// Highlight placement scheduled for when the current fly settles. The
/// generation stamp lets a newer selection (or reset, or teardown)
/// invalidate a completion that is still pending.
struct PendingHighlight {
    generation: u64,
    due: Instant,
    center: LatLng,
    /// Set when the selection carried explicit bounds: the outlined bounds
    /// rectangle supersedes the generic highlight box (the marker remains).
    suppress_box: bool,
}

/// Owns the map surface and sequences camera moves, overlay lifecycle, and
/// zoom state across commands, gestures, and geocoded selections.
///
/// Constructed with `mount`; `None` for the surface degrades every command
/// to a safe no-op so a missing map provider never takes the host down.
pub struct ViewController<S: MapSurface> {
    surface: Option<S>,
    phase: Phase,
    initial_zoom: u8,
    viewport: ViewportState,
    selection: Option<LocationSelection>,
    overlays: OverlaySet,
    generation: u64,
    pending: Option<PendingHighlight>,
}

impl<S: MapSurface> ViewController<S> {
    pub fn mount(mut surface: Option<S>, initial_zoom: u8) -> Self {
        let initial_zoom = initial_zoom.clamp(MIN_ZOOM, MAX_ZOOM);

        match surface.as_mut() {
            Some(s) => s.set_view(DEFAULT_CENTER, initial_zoom),
            None => warn!("map provider unavailable, running as placeholder"),
        }

        Self {
            surface,
            phase: Phase::Ready,
            initial_zoom,
            viewport: ViewportState {
                zoom_level: initial_zoom,
                center: DEFAULT_CENTER,
            },
            selection: None,
            overlays: OverlaySet::new(),
            generation: 0,
            pending: None,
        }
    }

    /// Replace the current selection. `None` is the reset path: overlays are
    /// cleared and the camera returns to the default region.
    pub fn select_location(&mut self, selection: Option<LocationSelection>) {
        if self.phase == Phase::TornDown {
            return;
        }
        // Whatever happens next, any still-pending completion is stale and
        // any fly in progress is superseded.
        self.generation += 1;
        self.pending = None;
        self.phase = Phase::Ready;

        let Some(selection) = selection else {
            self.selection = None;
            if let Some(surface) = self.surface.as_mut() {
                self.overlays.clear(surface);
                surface.set_view(DEFAULT_CENTER, self.initial_zoom);
            }
            self.viewport = ViewportState {
                zoom_level: self.initial_zoom,
                center: DEFAULT_CENTER,
            };
            return;
        };

        let point = geo::normalize(Some(&selection.coordinates));
        // Recorded even when unusable so read-only consumers (info panel,
        // sibling charts) still see what was asked for.
        self.selection = Some(selection.clone());

        let Some(point) = point else {
            warn!(name = %selection.name, "selection has no usable coordinates, camera unmoved");
            return;
        };

        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        // Previous selection's decorations come off before any of this
        // selection's go on; its own are tracked as they are created.
        self.overlays.replace(surface, Vec::new());

        let zoom = selection
            .zoom
            .unwrap_or(SELECTION_FALLBACK_ZOOM)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        surface.fly_to(point, zoom, FLY_DURATION);
        self.viewport.center = point;
        self.phase = Phase::Animating;

        let mut suppress_box = false;
        if let Some(bounds) = selection.bounds {
            let id = surface.add_rectangle(bounds, RectStyle::OUTLINE);
            self.overlays.track(id);
            surface.fit_bounds(bounds, FIT_BOUNDS_PADDING);
            suppress_box = true;
        }

        self.pending = Some(PendingHighlight {
            generation: self.generation,
            due: Instant::now() + FLY_DURATION,
            center: point,
            suppress_box,
        });
        debug!(name = %selection.name, lat = point.lat, lng = point.lng, zoom, "flying to selection");
    }

    pub fn zoom_in(&mut self) {
        self.nudge_zoom(1);
    }

    pub fn zoom_out(&mut self) {
        self.nudge_zoom(-1);
    }

    fn nudge_zoom(&mut self, delta: i16) {
        if self.phase == Phase::TornDown {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let level = (i16::from(self.viewport.zoom_level) + delta)
            .clamp(i16::from(MIN_ZOOM), i16::from(MAX_ZOOM)) as u8;
        self.viewport.zoom_level = level;
        surface.set_zoom(level);
    }

    /// Clear the selection and return to the mount-time framing.
    pub fn reset_view(&mut self) {
        self.select_location(None);
    }

    /// The host container was resized (split-panel drag end, terminal
    /// resize); let the surface recompute its rendering area.
    pub fn on_viewport_resized(&mut self, width_px: usize, height_px: usize) {
        if self.phase == Phase::TornDown {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.invalidate_size(width_px, height_px);
        }
    }

    /// Frame pump: mirrors surface zoom notifications into `ViewportState`
    /// and fires the highlight placement once its deadline passes. Safe to
    /// call in any phase.
    pub fn tick(&mut self, now: Instant) {
        if self.phase == Phase::TornDown {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        for event in surface.drain_events() {
            match event {
                SurfaceEvent::ZoomEnd { zoom } => {
                    self.viewport.zoom_level = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
                }
            }
        }

        if !matches!(&self.pending, Some(p) if now >= p.due) {
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.generation != self.generation {
            return;
        }

        if !pending.suppress_box {
            let bounds = geo::highlight_bounds(pending.center, HIGHLIGHT_HALF_KM);
            let id = surface.add_rectangle(bounds, RectStyle::HIGHLIGHT);
            self.overlays.track(id);
        }
        let marker = surface.add_marker(pending.center);
        self.overlays.track(marker);
        self.phase = Phase::Ready;
    }

    /// Release the surface and every overlay. Later commands and pending
    /// completions become no-ops.
    pub fn unmount(&mut self) {
        if self.phase == Phase::TornDown {
            return;
        }
        self.generation += 1;
        self.pending = None;
        if let Some(mut surface) = self.surface.take() {
            self.overlays.clear(&mut surface);
        }
        self.phase = Phase::TornDown;
    }

    pub fn selection(&self) -> Option<&LocationSelection> {
        self.selection.as_ref()
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    pub fn is_degraded(&self) -> bool {
        self.surface.is_none() && self.phase != Phase::TornDown
    }

    pub fn is_animating(&self) -> bool {
        self.phase == Phase::Animating
    }

    /// Read access for rendering. The controller stays the only writer.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::testing::RecordingSurface;

    fn selection(lat: f64, lng: f64, zoom: Option<u8>) -> LocationSelection {
        LocationSelection {
            name: "Somewhere".into(),
            coordinates: RawLocation::Coordinates {
                coordinates: [lat, lng],
            },
            bounds: None,
            zoom,
        }
    }

    fn after_fly() -> Instant {
        Instant::now() + FLY_DURATION + Duration::from_millis(100)
    }

    #[test]
    fn zoom_saturates_at_both_ends() {
        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);

        for _ in 0..30 {
            ctl.zoom_in();
            assert!((MIN_ZOOM..=MAX_ZOOM).contains(&ctl.zoom_level()));
        }
        assert_eq!(ctl.zoom_level(), MAX_ZOOM);

        for _ in 0..40 {
            ctl.zoom_out();
            assert!((MIN_ZOOM..=MAX_ZOOM).contains(&ctl.zoom_level()));
        }
        assert_eq!(ctl.zoom_level(), MIN_ZOOM);
    }

    #[test]
    fn select_places_highlight_after_fly_delay() {
        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);
        ctl.select_location(Some(selection(43.65, -79.38, Some(12))));
        assert!(ctl.is_animating());

        // Before the deadline nothing is drawn.
        ctl.tick(Instant::now());
        assert_eq!(ctl.surface().unwrap().live_rectangles().len(), 0);

        ctl.tick(after_fly());
        let surface = ctl.surface().unwrap();
        let rects = surface.live_rectangles();
        assert_eq!(rects.len(), 1);
        let (_, bounds, style) = rects[0];
        assert_eq!(style, RectStyle::HIGHLIGHT);

        let center = bounds.center();
        assert!((center.lat - 43.65).abs() < 1e-9);
        assert!((center.lng - (-79.38)).abs() < 1e-9);

        let lat_half = (bounds.northeast.lat - bounds.southwest.lat) / 2.0;
        let lng_half = (bounds.northeast.lng - bounds.southwest.lng) / 2.0;
        assert!((lat_half - 2.5 / geo::KM_PER_DEG).abs() < 1e-12);
        let expected_lng = 2.5 / (geo::KM_PER_DEG * 43.65f64.to_radians().cos());
        assert!((lng_half - expected_lng).abs() < 1e-12);

        assert_eq!(surface.live_markers().len(), 1);
        assert!(!ctl.is_animating());
        assert_eq!(surface.flights.last().unwrap().1, 12);
    }

    #[test]
    fn select_without_zoom_uses_fallback() {
        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);
        ctl.select_location(Some(selection(49.28, -123.12, None)));
        assert_eq!(ctl.surface().unwrap().flights.last().unwrap().1, 13);
    }

    #[test]
    fn select_none_clears_overlays_and_resets_view() {
        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);
        ctl.select_location(Some(selection(43.65, -79.38, Some(12))));
        ctl.tick(after_fly());
        assert!(ctl.live_overlay_count() > 0);

        ctl.select_location(None);
        assert_eq!(ctl.live_overlay_count(), 0);
        assert_eq!(ctl.surface().unwrap().live_rectangles().len(), 0);
        assert_eq!(
            ctl.viewport(),
            ViewportState {
                zoom_level: DEFAULT_ZOOM,
                center: DEFAULT_CENTER
            }
        );
        assert!(ctl.selection().is_none());

        let (center, zoom) = *ctl.surface().unwrap().view_sets.last().unwrap();
        assert_eq!(center, DEFAULT_CENTER);
        assert_eq!(zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn rapid_reselect_keeps_only_second_overlay_set() {
        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);
        ctl.select_location(Some(selection(43.65, -79.38, Some(12))));
        // Second selection before the first fly completes.
        ctl.select_location(Some(selection(45.50, -73.57, Some(12))));

        // Both deadlines elapse.
        ctl.tick(after_fly());
        ctl.tick(after_fly() + FLY_DURATION);

        let rects = ctl.surface().unwrap().live_rectangles();
        assert_eq!(rects.len(), 1);
        let center = rects[0].1.center();
        assert!((center.lat - 45.50).abs() < 1e-9);
        assert!((center.lng - (-73.57)).abs() < 1e-9);
        assert_eq!(ctl.surface().unwrap().live_markers().len(), 1);
    }

    #[test]
    fn explicit_bounds_fit_and_suppress_highlight_box() {
        let bounds = LatLngBounds::new(LatLng::new(43.5, -79.6), LatLng::new(43.9, -79.1));
        let sel = LocationSelection {
            bounds: Some(bounds),
            ..selection(43.65, -79.38, Some(11))
        };

        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);
        ctl.select_location(Some(sel));
        ctl.tick(after_fly());

        let surface = ctl.surface().unwrap();
        assert_eq!(surface.fitted.last(), Some(&(bounds, 50)));

        let rects = surface.live_rectangles();
        assert_eq!(rects.len(), 1, "bounds outline only, no dashed box");
        assert_eq!(rects[0].2, RectStyle::OUTLINE);
        assert_eq!(surface.live_markers().len(), 1);
    }

    #[test]
    fn unusable_coordinates_record_selection_but_do_not_move_camera() {
        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);
        let sel = LocationSelection {
            name: "Broken".into(),
            coordinates: RawLocation::LatLng {
                lat: f64::NAN,
                lng: 0.0,
            },
            bounds: None,
            zoom: None,
        };
        ctl.select_location(Some(sel));

        assert!(ctl.selection().is_some());
        assert!(ctl.surface().unwrap().flights.is_empty());
        assert!(!ctl.is_animating());

        ctl.tick(after_fly());
        assert_eq!(ctl.surface().unwrap().live_rectangles().len(), 0);
    }

    #[test]
    fn unusable_selection_supersedes_inflight_fly_and_settles() {
        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);
        ctl.select_location(Some(selection(43.65, -79.38, Some(12))));
        assert!(ctl.is_animating());

        // Superseded mid-flight by a selection that cannot move the camera.
        let broken = LocationSelection {
            name: "Broken".into(),
            coordinates: RawLocation::LatLng {
                lat: f64::NAN,
                lng: 0.0,
            },
            bounds: None,
            zoom: None,
        };
        ctl.select_location(Some(broken));
        assert!(!ctl.is_animating());

        // Both deadlines elapse; neither selection draws anything.
        ctl.tick(after_fly());
        ctl.tick(after_fly() + FLY_DURATION);
        assert!(!ctl.is_animating());
        assert_eq!(ctl.surface().unwrap().live_rectangles().len(), 0);
        assert_eq!(ctl.surface().unwrap().live_markers().len(), 0);
    }

    #[test]
    fn unmount_with_pending_completion_is_safe() {
        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);
        ctl.select_location(Some(selection(43.65, -79.38, None)));
        ctl.unmount();

        // The stale deadline elapses after teardown.
        ctl.tick(after_fly());
        assert!(ctl.surface().is_none());
        assert_eq!(ctl.live_overlay_count(), 0);

        // Subsequent commands are no-ops.
        ctl.zoom_in();
        ctl.select_location(Some(selection(45.5, -73.57, None)));
        ctl.reset_view();
        assert!(ctl.surface().is_none());
    }

    #[test]
    fn missing_surface_degrades_every_command() {
        let mut ctl: ViewController<RecordingSurface> = ViewController::mount(None, DEFAULT_ZOOM);
        assert!(ctl.is_degraded());

        ctl.zoom_in();
        assert_eq!(ctl.zoom_level(), DEFAULT_ZOOM);

        ctl.select_location(Some(selection(43.65, -79.38, Some(12))));
        // Selection is still visible to read-only consumers.
        assert!(ctl.selection().is_some());
        assert!(!ctl.is_animating());

        ctl.tick(after_fly());
        ctl.on_viewport_resized(80, 40);
        ctl.reset_view();
        ctl.unmount();
    }

    #[test]
    fn resize_notifications_reach_the_surface() {
        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);
        ctl.on_viewport_resized(160, 80);
        ctl.on_viewport_resized(200, 96);
        assert_eq!(
            ctl.surface().unwrap().invalidations,
            vec![(160, 80), (200, 96)]
        );
    }

    #[test]
    fn surface_zoom_events_mirror_into_state() {
        let mut ctl = ViewController::mount(Some(RecordingSurface::new(DEFAULT_ZOOM)), DEFAULT_ZOOM);

        // A gesture zoom settles on the surface after mount.
        if let Some(s) = ctl.surface_mut_for_tests() {
            s.push_zoom_end(9);
        }
        ctl.tick(Instant::now());
        assert_eq!(ctl.zoom_level(), 9);

        // Out-of-range notifications are clamped on the way in.
        if let Some(s) = ctl.surface_mut_for_tests() {
            s.push_zoom_end(200);
        }
        ctl.tick(Instant::now());
        assert_eq!(ctl.zoom_level(), MAX_ZOOM);
    }
}

#[cfg(test)]
impl<S: MapSurface> ViewController<S> {
    fn surface_mut_for_tests(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    fn zoom_level(&self) -> u8 {
        self.viewport.zoom_level
    }

    fn live_overlay_count(&self) -> usize {
        self.overlays.len()
    }
}
