//! Vector basemap: GeoJSON loading with a built-in coarse fallback.

use std::fs;
use std::path::Path;

use anyhow::Result;
use geojson::{GeoJson, Geometry, Value};
use tracing::warn;

use crate::geo::LatLng;

pub type GeoLine = Vec<LatLng>;

/// Static geography drawn under the interactive layers.
#[derive(Default)]
pub struct Basemap {
    pub coastlines: Vec<GeoLine>,
    pub borders: Vec<GeoLine>,
}

impl Basemap {
    pub fn is_empty(&self) -> bool {
        self.coastlines.is_empty() && self.borders.is_empty()
    }
}

/// Load whatever GeoJSON is available under `data_dir`; missing files are
/// fine, unreadable ones are logged and skipped.
pub fn load_basemap(data_dir: &Path) -> Basemap {
    let mut basemap = Basemap::default();

    for filename in ["coastline.json", "ne_110m_coastline.json", "ne_50m_coastline.json"] {
        let path = data_dir.join(filename);
        if path.exists() {
            if let Err(e) = load_lines(&path, &mut basemap.coastlines) {
                warn!(file = filename, error = %e, "failed to load coastline data");
            }
        }
    }

    for filename in ["borders.json", "ne_50m_borders.json"] {
        let path = data_dir.join(filename);
        if path.exists() {
            if let Err(e) = load_lines(&path, &mut basemap.borders) {
                warn!(file = filename, error = %e, "failed to load border data");
            }
        }
    }

    basemap
}

fn load_lines(path: &Path, into: &mut Vec<GeoLine>) -> Result<()> {
    let content = fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;
    collect_lines(&geojson, into);
    Ok(())
}

fn collect_lines(geojson: &GeoJson, into: &mut Vec<GeoLine>) {
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(geometry) = &feature.geometry {
                    collect_geometry(geometry, into);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                collect_geometry(geometry, into);
            }
        }
        GeoJson::Geometry(geometry) => collect_geometry(geometry, into),
    }
}

fn collect_geometry(geometry: &Geometry, into: &mut Vec<GeoLine>) {
    // GeoJSON positions are [lon, lat].
    let to_line = |coords: &[Vec<f64>]| -> GeoLine {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| LatLng::new(c[1], c[0]))
            .collect()
    };

    match &geometry.value {
        Value::LineString(coords) => into.push(to_line(coords)),
        Value::MultiLineString(lines) => into.extend(lines.iter().map(|c| to_line(c))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                into.push(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    into.push(to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_geometry(g, into);
            }
        }
        _ => {}
    }
}

/// Coarse continent outlines used when no data files are present, so the
/// dashboard is usable out of the box.
pub fn builtin_world() -> Basemap {
    let line = |pairs: &[(f64, f64)]| -> GeoLine {
        pairs.iter().map(|&(lat, lng)| LatLng::new(lat, lng)).collect()
    };

    let mut basemap = Basemap::default();

    // North America
    basemap.coastlines.push(line(&[
        (65.0, -168.0), (60.0, -166.0), (60.0, -141.0), (55.0, -130.0),
        (48.0, -125.0), (40.0, -124.0), (32.0, -117.0), (25.0, -110.0),
        (25.0, -97.0), (28.0, -97.0), (24.0, -82.0), (25.0, -80.0),
        (31.0, -81.0), (35.0, -75.0), (41.0, -70.0), (45.0, -67.0),
        (47.0, -65.0), (47.0, -55.0), (47.0, -52.0), (52.0, -55.0),
        (55.0, -58.0), (60.0, -64.0), (62.0, -73.0), (63.0, -80.0),
        (62.0, -95.0), (68.0, -110.0), (70.0, -130.0), (70.0, -145.0),
        (65.0, -168.0),
    ]));

    // South America
    basemap.coastlines.push(line(&[
        (10.0, -80.0), (5.0, -75.0), (5.0, -60.0), (0.0, -50.0),
        (-5.0, -35.0), (-15.0, -38.0), (-22.0, -40.0), (-25.0, -48.0),
        (-34.0, -55.0), (-42.0, -65.0), (-50.0, -68.0), (-52.0, -75.0),
        (-45.0, -75.0), (-30.0, -72.0), (-15.0, -70.0), (-5.0, -80.0),
        (10.0, -80.0),
    ]));

    // Europe
    basemap.coastlines.push(line(&[
        (36.0, -10.0), (36.0, -5.0), (38.0, 0.0), (43.0, 5.0),
        (44.0, 10.0), (45.0, 15.0), (40.0, 20.0), (37.0, 25.0),
        (40.0, 30.0), (42.0, 35.0), (43.0, 40.0), (55.0, 40.0),
        (60.0, 30.0), (65.0, 25.0), (70.0, 20.0), (71.0, 10.0),
        (62.0, 5.0), (58.0, 5.0), (58.0, -5.0), (52.0, -10.0),
        (48.0, -5.0), (43.0, -5.0), (36.0, -10.0),
    ]));

    // Africa
    basemap.coastlines.push(line(&[
        (15.0, -17.0), (28.0, -15.0), (35.0, -5.0), (37.0, 10.0),
        (32.0, 25.0), (30.0, 35.0), (12.0, 42.0), (5.0, 45.0),
        (-5.0, 35.0), (-20.0, 35.0), (-30.0, 30.0), (-35.0, 20.0),
        (-30.0, 15.0), (-15.0, 10.0), (0.0, 10.0), (5.0, 5.0),
        (5.0, -10.0), (10.0, -15.0), (15.0, -17.0),
    ]));

    // Asia
    basemap.coastlines.push(line(&[
        (42.0, 35.0), (43.0, 40.0), (40.0, 50.0), (25.0, 60.0),
        (20.0, 70.0), (8.0, 77.0), (15.0, 80.0), (22.0, 88.0),
        (14.0, 100.0), (10.0, 105.0), (22.0, 115.0), (30.0, 122.0),
        (35.0, 130.0), (40.0, 140.0), (50.0, 145.0), (55.0, 140.0),
        (52.0, 130.0), (40.0, 120.0), (50.0, 90.0), (55.0, 70.0),
        (50.0, 50.0), (43.0, 40.0),
    ]));

    // Australia
    basemap.coastlines.push(line(&[
        (-20.0, 115.0), (-12.0, 130.0), (-12.0, 140.0), (-15.0, 145.0),
        (-25.0, 150.0), (-30.0, 153.0), (-38.0, 145.0), (-35.0, 135.0),
        (-32.0, 125.0), (-35.0, 115.0), (-20.0, 115.0),
    ]));

    // Canada/US border segment, so the home region reads as a country.
    basemap.borders.push(line(&[
        (49.0, -124.0), (49.0, -95.0), (48.0, -88.0), (45.0, -83.0),
        (43.0, -79.0), (45.0, -74.0), (45.0, -67.0),
    ]));

    basemap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_world_is_populated() {
        let basemap = builtin_world();
        assert!(!basemap.is_empty());
        assert!(basemap.coastlines.iter().all(|l| l.len() >= 2));
    }

    #[test]
    fn missing_data_dir_yields_empty_basemap() {
        let basemap = load_basemap(Path::new("/nonexistent/geoscope-data"));
        assert!(basemap.is_empty());
    }

    #[test]
    fn geojson_linestring_parses_lat_lng_order() {
        let geojson: GeoJson = r#"{
            "type": "LineString",
            "coordinates": [[-79.38, 43.65], [-79.0, 44.0]]
        }"#
        .parse()
        .unwrap();
        let mut lines = Vec::new();
        collect_lines(&geojson, &mut lines);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0][0], LatLng::new(43.65, -79.38));
    }
}
