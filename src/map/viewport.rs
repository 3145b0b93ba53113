use std::f64::consts::PI;

use crate::geo::{LatLng, LatLngBounds};

/// The visible map area: center, continuous render scale, and pixel size.
///
/// Scale 1.0 fits the whole world across the viewport width; each discrete
/// zoom level doubles it (`scale_for_level`). Projection is Web Mercator.
#[derive(Clone, Debug)]
pub struct Viewport {
    pub center: LatLng,
    pub scale: f64,
    /// Canvas pixel width (braille dots, 2 per terminal column)
    pub width: usize,
    /// Canvas pixel height (braille dots, 4 per terminal row)
    pub height: usize,
}

impl Viewport {
    pub fn new(center: LatLng, scale: f64, width: usize, height: usize) -> Self {
        Self {
            center,
            scale,
            width,
            height,
        }
    }

    /// Continuous render scale for a discrete zoom level (level 1 = world).
    pub fn scale_for_level(level: u8) -> f64 {
        2f64.powi(i32::from(level) - 1)
    }

    /// Normalized Web Mercator position of a coordinate, x and y in [0, 1].
    fn mercator(point: LatLng) -> (f64, f64) {
        let x = (point.lng + 180.0) / 360.0;
        let lat_rad = point.lat.clamp(-85.0511, 85.0511) * PI / 180.0;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
        (x, y)
    }

    /// Project a coordinate to canvas pixel coordinates.
    pub fn project(&self, point: LatLng) -> (i32, i32) {
        let (x, y) = Self::mercator(point);
        let (cx, cy) = Self::mercator(self.center);
        let px_per_world = self.scale * self.width as f64;

        let px = ((x - cx) * px_per_world + self.width as f64 / 2.0) as i32;
        let py = ((y - cy) * px_per_world + self.height as f64 / 2.0) as i32;
        (px, py)
    }

    /// Scale at which `bounds` fits inside the viewport with `padding` pixels
    /// kept clear on every side.
    pub fn scale_to_fit(&self, bounds: LatLngBounds, padding: u16) -> f64 {
        let (sw_x, sw_y) = Self::mercator(bounds.southwest);
        let (ne_x, ne_y) = Self::mercator(bounds.northeast);
        // Mercator y grows southward.
        let span_x = (ne_x - sw_x).abs().max(1e-9);
        let span_y = (sw_y - ne_y).abs().max(1e-9);

        let avail_w = self.width.saturating_sub(2 * padding as usize).max(1) as f64;
        let avail_h = self.height.saturating_sub(2 * padding as usize).max(1) as f64;

        let per_world = (avail_w / span_x).min(avail_h / span_y);
        (per_world / self.width as f64).max(1.0)
    }

    /// Nearest discrete zoom level at or below a continuous scale.
    pub fn level_for_scale(scale: f64, min: u8, max: u8) -> u8 {
        let level = scale.max(1.0).log2().floor() as i32 + 1;
        level.clamp(i32::from(min), i32::from(max)) as u8
    }

    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Rough bounding-box visibility check for a projected segment.
    pub fn segment_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
