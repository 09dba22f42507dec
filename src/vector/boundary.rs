//! Geographic boundary records: ordered vertex runs with a precomputed
//! bounding box, a dateline classification, and per-vertex detail ranks
//! used to thin the geometry at low zoom.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use glam::DMat3;
use rayon::prelude::*;
use tracing::info;

use std::f64::consts::{FRAC_PI_2, PI};

use crate::geo;

/// Highest detail rank; assigned to run endpoints so they survive any
/// amount of thinning.
pub const MAX_DETAIL: u8 = 5;

#[derive(Debug, Clone, Copy)]
pub struct BoundaryPoint {
    pub lon: f64,
    pub lat: f64,
    /// Thinning rank: a vertex is kept while `detail >= threshold`.
    pub detail: u8,
}

/// How a vertex run relates to the ±180° meridian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatelineKind {
    /// Never crosses it.
    None,
    /// Crosses an even number of times; a ring of this kind does not
    /// enclose a pole.
    Even,
    /// Crosses an odd number of times; a ring of this kind encircles
    /// one of the poles.
    Odd,
}

/// Geographic bounding box in radians. For dateline-crossing features
/// `west > east`, with the box spanning the seam.
#[derive(Debug, Clone, Copy)]
pub struct LatLonBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

#[derive(Debug, Clone)]
pub struct GeoBoundary {
    pub points: Vec<BoundaryPoint>,
    pub bbox: LatLonBox,
    pub dateline: DatelineKind,
    pub closed: bool,
}

impl GeoBoundary {
    /// Builds a record from raw (lon, lat) radians. Returns `None` for
    /// degenerate runs of fewer than two points.
    pub fn from_points(raw: &[(f64, f64)], closed: bool) -> Option<Self> {
        if raw.len() < 2 {
            return None;
        }

        let last = raw.len() - 1;
        let points: Vec<BoundaryPoint> = raw
            .iter()
            .enumerate()
            .map(|(i, &(lon, lat))| BoundaryPoint {
                lon: geo::normalize_lon(lon),
                lat: geo::clamp_lat(lat),
                detail: if i == 0 || i == last {
                    MAX_DETAIL
                } else {
                    (i.trailing_zeros() as u8).min(MAX_DETAIL)
                },
            })
            .collect();

        let dateline = classify_dateline(&points, closed);
        let bbox = bounding_box(&points, dateline, closed);
        Some(Self {
            points,
            bbox,
            dateline,
            closed,
        })
    }

    /// Coarse visibility pre-cull for the spherical view: rotates the
    /// box's corner and center probes and keeps the feature when any
    /// lands in front of `z_limit`. `z_limit` carries negative slack so
    /// features reaching around the limb are not dropped.
    pub fn is_visible(&self, inverse_rotation: &DMat3, z_limit: f64) -> bool {
        self.probes()
            .iter()
            .any(|&(lon, lat)| (*inverse_rotation * geo::to_vec3(lon, lat)).z > z_limit)
    }

    fn probes(&self) -> [(f64, f64); 5] {
        let b = &self.bbox;
        // Center longitude must be taken across the seam for wrapping
        // boxes.
        let mid_lon = if b.west <= b.east {
            (b.west + b.east) / 2.0
        } else {
            geo::normalize_lon((b.west + b.east) / 2.0 + PI)
        };
        let mid_lat = (b.south + b.north) / 2.0;
        [
            (mid_lon, mid_lat),
            (b.west, b.south),
            (b.west, b.north),
            (b.east, b.south),
            (b.east, b.north),
        ]
    }
}

/// Minimum detail rank worth drawing at this zoom. Grows as the view
/// pulls back, thinning boundaries to a sparse skeleton.
pub fn detail_threshold(radius: u32) -> u8 {
    match radius {
        r if r > 5000 => 0,
        r if r > 2500 => 1,
        r if r > 1000 => 2,
        r if r > 600 => 3,
        r if r > 50 => 4,
        _ => 5,
    }
}

fn crosses_dateline(a: f64, b: f64) -> bool {
    a.signum() != b.signum() && a.abs() + b.abs() > PI
}

fn classify_dateline(points: &[BoundaryPoint], closed: bool) -> DatelineKind {
    let mut crossings = 0usize;
    for pair in points.windows(2) {
        if crosses_dateline(pair[0].lon, pair[1].lon) {
            crossings += 1;
        }
    }
    if closed {
        let first = points[0].lon;
        let last = points[points.len() - 1].lon;
        if crosses_dateline(last, first) {
            crossings += 1;
        }
    }
    match crossings {
        0 => DatelineKind::None,
        c if c % 2 == 1 => DatelineKind::Odd,
        _ => DatelineKind::Even,
    }
}

fn bounding_box(points: &[BoundaryPoint], dateline: DatelineKind, closed: bool) -> LatLonBox {
    let mut south = FRAC_PI_2;
    let mut north = -FRAC_PI_2;
    for p in points {
        south = south.min(p.lat);
        north = north.max(p.lat);
    }

    // Only a ring with an odd crossing count encircles a pole. An open
    // run with an odd count merely ends on the far side of the seam, so
    // its box is the shifted-frame one.
    let dateline = if dateline == DatelineKind::Odd && !closed {
        DatelineKind::Even
    } else {
        dateline
    };

    match dateline {
        DatelineKind::None => {
            let mut west = PI;
            let mut east = -PI;
            for p in points {
                west = west.min(p.lon);
                east = east.max(p.lon);
            }
            LatLonBox {
                west,
                east,
                south,
                north,
            }
        }
        DatelineKind::Even => {
            // Longitudes measured in a frame shifted by half a turn, so
            // the feature no longer straddles the seam.
            let mut west = PI;
            let mut east = -PI;
            for p in points {
                let shifted = geo::normalize_lon(p.lon + PI);
                west = west.min(shifted);
                east = east.max(shifted);
            }
            LatLonBox {
                west: geo::normalize_lon(west - PI),
                east: geo::normalize_lon(east - PI),
                south,
                north,
            }
        }
        DatelineKind::Odd => {
            // The ring encircles a pole: no longitude bound exists, and
            // the enclosed pole belongs to the covered area.
            if north + south >= 0.0 {
                north = FRAC_PI_2;
            } else {
                south = -FRAC_PI_2;
            }
            LatLonBox {
                west: -PI,
                east: PI,
                south,
                north,
            }
        }
    }
}

/// Loads boundary records from a GeoJSON file: line strings become open
/// runs, polygon exteriors closed rings. Coordinates arrive in degrees.
pub fn load_boundaries(path: &Path) -> Result<Vec<GeoBoundary>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let parsed: GeoJson = content
        .parse()
        .with_context(|| format!("parsing {}", path.display()))?;

    let mut runs: Vec<(Vec<(f64, f64)>, bool)> = Vec::new();
    collect_geojson_runs(&parsed, &mut runs);

    let boundaries: Vec<GeoBoundary> = runs
        .into_par_iter()
        .filter_map(|(line, closed)| {
            let radians: Vec<(f64, f64)> = line
                .iter()
                .map(|&(lon, lat)| (lon.to_radians(), lat.to_radians()))
                .collect();
            GeoBoundary::from_points(&radians, closed)
        })
        .collect();

    info!(
        count = boundaries.len(),
        file = %path.display(),
        "loaded boundary set"
    );
    Ok(boundaries)
}

fn collect_geojson_runs(geojson: &GeoJson, runs: &mut Vec<(Vec<(f64, f64)>, bool)>) {
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    collect_geometry_runs(geometry, runs);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                collect_geometry_runs(geometry, runs);
            }
        }
        GeoJson::Geometry(geometry) => collect_geometry_runs(geometry, runs),
    }
}

fn collect_geometry_runs(geometry: &Geometry, runs: &mut Vec<(Vec<(f64, f64)>, bool)>) {
    match &geometry.value {
        Value::LineString(coords) => {
            runs.push((coords.iter().map(|c| (c[0], c[1])).collect(), false));
        }
        Value::MultiLineString(lines) => {
            for coords in lines {
                runs.push((coords.iter().map(|c| (c[0], c[1])).collect(), false));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                runs.push((exterior.iter().map(|c| (c[0], c[1])).collect(), true));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    runs.push((exterior.iter().map(|c| (c[0], c[1])).collect(), true));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_geometry_runs(g, runs);
            }
        }
        _ => {}
    }
}
