use std::time::{Duration, Instant};

use crate::data::Basemap;
use crate::geo::{LatLng, LatLngBounds};
use crate::map::canvas::{self, DotCanvas};
use crate::map::controller::{MAX_ZOOM, MIN_ZOOM};
use crate::map::surface::{MapSurface, OverlayId, RectStyle, SurfaceEvent};
use crate::map::viewport::Viewport;

const DASH_PERIOD: u32 = 3;

enum Overlay {
    Rectangle { bounds: LatLngBounds, style: RectStyle },
    Marker { point: LatLng },
}

/// An in-progress animated camera transition.
struct Flight {
    from_center: LatLng,
    from_scale: f64,
    to_center: LatLng,
    to_scale: f64,
    started: Instant,
    duration: Duration,
    target_zoom: u8,
}

impl Flight {
    /// Eased interpolation progress in [0, 1].
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = now.duration_since(self.started).as_secs_f64() / self.duration.as_secs_f64();
        let t = t.clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }

    fn done(&self, now: Instant) -> bool {
        now.duration_since(self.started) >= self.duration
    }
}

/// Rendered layers for one frame; the host colors each layer separately.
pub struct RenderedFrame {
    pub basemap: DotCanvas,
    pub overlays: DotCanvas,
    /// Marker glyph positions in character cells.
    pub markers: Vec<(u16, u16)>,
}

/// Braille-canvas map surface: vector basemap, selection overlays, and
/// smooth fly transitions, drawn into terminal character cells.
pub struct TerminalSurface {
    basemap: Basemap,
    viewport: Viewport,
    zoom_level: u8,
    overlays: Vec<(OverlayId, Overlay)>,
    next_id: OverlayId,
    flight: Option<Flight>,
    events: Vec<SurfaceEvent>,
}

impl TerminalSurface {
    pub fn new(basemap: Basemap, center: LatLng, zoom: u8, width_px: usize, height_px: usize) -> Self {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        Self {
            basemap,
            viewport: Viewport::new(center, Viewport::scale_for_level(zoom), width_px, height_px),
            zoom_level: zoom,
            overlays: Vec::new(),
            next_id: 1,
            flight: None,
            events: Vec::new(),
        }
    }

    /// Camera as of `now`, mid-flight positions included.
    fn camera(&self, now: Instant) -> Viewport {
        let mut viewport = self.viewport.clone();
        if let Some(flight) = &self.flight {
            let t = flight.progress(now);
            viewport.center = LatLng::new(
                flight.from_center.lat + (flight.to_center.lat - flight.from_center.lat) * t,
                flight.from_center.lng + (flight.to_center.lng - flight.from_center.lng) * t,
            );
            // Interpolate scale in log space so the zoom speed feels even.
            viewport.scale = (flight.from_scale.ln()
                + (flight.to_scale.ln() - flight.from_scale.ln()) * t)
                .exp();
        }
        viewport
    }

    /// Land a finished flight: commit the target camera and report zoom-end.
    fn settle(&mut self, now: Instant) {
        if let Some(flight) = self.flight.take_if(|f| f.done(now)) {
            self.viewport.center = flight.to_center;
            self.viewport.scale = flight.to_scale;
            self.events.push(SurfaceEvent::ZoomEnd {
                zoom: flight.target_zoom,
            });
        }
    }

    /// Draw all layers for a `cols` x `rows` character area.
    pub fn render(&self, cols: u16, rows: u16, now: Instant) -> RenderedFrame {
        let mut viewport = self.camera(now);
        viewport.width = cols as usize * 2;
        viewport.height = rows as usize * 4;

        let mut base = DotCanvas::new(cols as usize, rows as usize);
        for line in self.basemap.coastlines.iter().chain(&self.basemap.borders) {
            draw_linestring(&mut base, line, &viewport);
        }

        let mut deco = DotCanvas::new(cols as usize, rows as usize);
        let mut markers = Vec::new();
        for (_, overlay) in &self.overlays {
            match overlay {
                Overlay::Rectangle { bounds, style } => {
                    let a = viewport.project(bounds.southwest);
                    let b = viewport.project(bounds.northeast);
                    let dash = style.dashed.then_some(DASH_PERIOD);
                    canvas::draw_rect(&mut deco, a, b, dash, style.filled);
                }
                Overlay::Marker { point } => {
                    let (px, py) = viewport.project(*point);
                    if viewport.is_visible(px, py) {
                        canvas::draw_marker(&mut deco, (px, py), 2);
                        if px >= 0 && py >= 0 {
                            markers.push(((px / 2) as u16, (py / 4) as u16));
                        }
                    }
                }
            }
        }

        RenderedFrame {
            basemap: base,
            overlays: deco,
            markers,
        }
    }

}

#[cfg(test)]
impl TerminalSurface {
    fn center(&self) -> LatLng {
        self.viewport.center
    }
}

/// Project and draw one geographic polyline with coarse segment culling.
fn draw_linestring(canvas: &mut DotCanvas, line: &[LatLng], viewport: &Viewport) {
    let mut prev: Option<(i32, i32)> = None;
    for &point in line {
        let (px, py) = viewport.project(point);
        if let Some(p) = prev {
            let span = ((px - p.0).abs() + (py - p.1).abs()) as usize;
            // Skip segments that wrap around the projection seam.
            if span < viewport.width && viewport.segment_might_be_visible(p, (px, py)) {
                canvas::draw_line(canvas, p, (px, py), None);
            }
        }
        prev = Some((px, py));
    }
}

impl MapSurface for TerminalSurface {
    fn set_view(&mut self, center: LatLng, zoom: u8) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.flight = None;
        self.viewport.center = center;
        self.viewport.scale = Viewport::scale_for_level(zoom);
        self.zoom_level = zoom;
        self.events.push(SurfaceEvent::ZoomEnd { zoom });
    }

    fn fly_to(&mut self, center: LatLng, zoom: u8, duration: Duration) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let now = Instant::now();
        let from = self.camera(now);
        self.flight = Some(Flight {
            from_center: from.center,
            from_scale: from.scale,
            to_center: center,
            to_scale: Viewport::scale_for_level(zoom),
            started: now,
            duration,
            target_zoom: zoom,
        });
        self.zoom_level = zoom;
    }

    fn set_zoom(&mut self, zoom: u8) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.flight = None;
        self.viewport.scale = Viewport::scale_for_level(zoom);
        self.zoom_level = zoom;
        self.events.push(SurfaceEvent::ZoomEnd { zoom });
    }

    fn zoom(&self) -> u8 {
        self.zoom_level
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds, padding: u16) {
        self.flight = None;
        let scale = self.viewport.scale_to_fit(bounds, padding);
        let zoom = Viewport::level_for_scale(scale, MIN_ZOOM, MAX_ZOOM);
        self.viewport.center = bounds.center();
        self.viewport.scale = scale;
        self.zoom_level = zoom;
        self.events.push(SurfaceEvent::ZoomEnd { zoom });
    }

    fn add_rectangle(&mut self, bounds: LatLngBounds, style: RectStyle) -> OverlayId {
        let id = self.next_id;
        self.next_id += 1;
        self.overlays.push((id, Overlay::Rectangle { bounds, style }));
        id
    }

    fn add_marker(&mut self, point: LatLng) -> OverlayId {
        let id = self.next_id;
        self.next_id += 1;
        self.overlays.push((id, Overlay::Marker { point }));
        id
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.overlays.retain(|(existing, _)| *existing != id);
    }

    fn invalidate_size(&mut self, width_px: usize, height_px: usize) {
        self.viewport.width = width_px.max(2);
        self.viewport.height = height_px.max(4);
    }

    fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        self.settle(Instant::now());
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;

    fn surface() -> TerminalSurface {
        TerminalSurface::new(
            data::builtin_world(),
            LatLng::new(56.1304, -106.3468),
            4,
            160,
            80,
        )
    }

    #[test]
    fn set_zoom_reports_zoom_end() {
        let mut s = surface();
        s.drain_events();
        s.set_zoom(7);
        assert_eq!(s.drain_events(), vec![SurfaceEvent::ZoomEnd { zoom: 7 }]);
        assert_eq!(s.zoom(), 7);
    }

    #[test]
    fn zero_duration_flight_settles_on_next_drain() {
        let mut s = surface();
        s.drain_events();
        let target = LatLng::new(43.65, -79.38);
        s.fly_to(target, 12, Duration::ZERO);
        assert_eq!(s.drain_events(), vec![SurfaceEvent::ZoomEnd { zoom: 12 }]);
        assert_eq!(s.center(), target);
    }

    #[test]
    fn flight_in_progress_has_not_settled() {
        let mut s = surface();
        s.drain_events();
        s.fly_to(LatLng::new(43.65, -79.38), 12, Duration::from_secs(60));
        assert!(s.drain_events().is_empty());
        // Camera is somewhere between origin and target.
        let cam = s.camera(Instant::now());
        assert!(cam.center.lat <= 56.1304 + 1e-9);
        assert!(cam.center.lat >= 43.65 - 1e-9);
    }

    #[test]
    fn fit_bounds_keeps_zoom_in_range_and_centers() {
        let mut s = surface();
        s.drain_events();
        let bounds = LatLngBounds::new(LatLng::new(43.5, -79.6), LatLng::new(43.9, -79.1));
        s.fit_bounds(bounds, 50);
        assert!((MIN_ZOOM..=MAX_ZOOM).contains(&s.zoom()));
        assert_eq!(s.center(), bounds.center());
        assert!(!s.drain_events().is_empty());
    }

    #[test]
    fn removed_overlays_disappear_from_render() {
        let mut s = surface();
        let bounds = LatLngBounds::new(LatLng::new(55.0, -107.5), LatLng::new(57.0, -105.0));
        let id = s.add_rectangle(bounds, RectStyle::OUTLINE);

        let with = s.render(40, 20, Instant::now());
        let drawn = with
            .overlays
            .rows()
            .any(|r| r.chars().any(|c| c != '\u{2800}'));
        assert!(drawn, "rectangle should draw dots");

        s.remove_overlay(id);
        let without = s.render(40, 20, Instant::now());
        let still_drawn = without
            .overlays
            .rows()
            .any(|r| r.chars().any(|c| c != '\u{2800}'));
        assert!(!still_drawn);
    }

    #[test]
    fn marker_reports_character_cell() {
        let mut s = surface();
        s.add_marker(LatLng::new(56.1304, -106.3468));
        let frame = s.render(40, 20, Instant::now());
        assert_eq!(frame.markers.len(), 1);
        let (cx, cy) = frame.markers[0];
        assert!(cx < 40 && cy < 20);
    }
}
