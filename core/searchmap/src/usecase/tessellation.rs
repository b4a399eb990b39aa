//! 境界ポリゴンのボロノイ分割（ゾーンの別ソース）
//!
//! 境界内にランダムな種点を置き、各種点のセルを「外接矩形を他の全種点との垂直二等分線で切る」ことで作り、
//! 最後に境界と交差させる。種点数は 150 程度なので O(n^2) で足りる。

use crate::domain::{LatLng, Zone};
use common::error::Error;
use geo::{BooleanOps, BoundingRect, Contains, Coord, LineString, MultiPolygon, Point, Polygon, Rect};
use geojson::GeoJson;
use rand::Rng;
use std::path::Path;

/// GeoJSON の全ポリゴンを 1 つの境界にまとめて読む
pub fn load_boundary(path: &Path) -> Result<MultiPolygon<f64>, Error> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("GeoJSON file '{}' could not be read: {}", path.display(), e))
    })?;
    boundary_from_geojson(&text)
}

pub fn boundary_from_geojson(text: &str) -> Result<MultiPolygon<f64>, Error> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| Error::config(format!("invalid GeoJSON: {}", e)))?;
    let collection = geo::GeometryCollection::<f64>::try_from(&geojson)
        .map_err(|e| Error::config(format!("unsupported GeoJSON: {}", e)))?;

    let mut boundary = MultiPolygon::new(Vec::new());
    for geometry in collection {
        let part = match geometry {
            geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
            geo::Geometry::MultiPolygon(mp) => mp,
            _ => continue,
        };
        boundary = if boundary.0.is_empty() {
            part
        } else {
            boundary.union(&part)
        };
    }
    if boundary.0.is_empty() {
        return Err(Error::config("GeoJSON contains no polygons"));
    }
    Ok(boundary)
}

/// 境界線（外周リング）を地図描画用の座標列にする
pub fn boundary_outline(boundary: &MultiPolygon<f64>) -> Vec<Vec<LatLng>> {
    boundary
        .0
        .iter()
        .map(|p| p.exterior().coords().map(|c| LatLng::new(c.y, c.x)).collect())
        .collect()
}

/// 境界を `cells` 個のボロノイセルに分け、`Zone N` という名前のゾーンにする
///
/// 境界で分断されたセルは同じ名前の複数ゾーンになる。種点のサンプリングが `cells * 1000` 回失敗したら諦める。
pub fn tessellate<R: Rng>(
    boundary: &MultiPolygon<f64>,
    cells: usize,
    rng: &mut R,
) -> Result<Vec<Zone>, Error> {
    let bbox = boundary
        .bounding_rect()
        .ok_or_else(|| Error::invalid_data("boundary is empty"))?;
    let seeds = sample_seeds(boundary, bbox, cells, rng)?;

    let mut zones = Vec::new();
    for (i, seed) in seeds.iter().enumerate() {
        let cell = voronoi_cell(*seed, &seeds, bbox);
        if cell.len() < 3 {
            continue;
        }
        let cell = MultiPolygon::new(vec![Polygon::new(LineString::from(cell), vec![])]);
        let name = format!("Zone {}", i + 1);
        for part in cell.intersection(boundary) {
            if part.exterior().0.len() >= 4 {
                zones.push(Zone::from_polygon(name.clone(), &part));
            }
        }
    }
    Ok(zones)
}

fn sample_seeds<R: Rng>(
    boundary: &MultiPolygon<f64>,
    bbox: Rect<f64>,
    cells: usize,
    rng: &mut R,
) -> Result<Vec<Coord<f64>>, Error> {
    let (min, max) = (bbox.min(), bbox.max());
    if !(max.x > min.x && max.y > min.y) {
        return Err(Error::invalid_data("boundary has no area"));
    }
    let mut seeds = Vec::with_capacity(cells);
    let mut misses = 0usize;
    let limit = cells.saturating_mul(1000);
    while seeds.len() < cells {
        let c = Coord {
            x: rng.gen_range(min.x..max.x),
            y: rng.gen_range(min.y..max.y),
        };
        if boundary.contains(&Point::from(c)) {
            seeds.push(c);
        } else {
            misses += 1;
            if misses > limit {
                return Err(Error::invalid_data(format!(
                    "could only place {} of {} seed points inside the boundary",
                    seeds.len(),
                    cells
                )));
            }
        }
    }
    Ok(seeds)
}

/// 外接矩形を、seed に近い側の半平面で順に切り取る
fn voronoi_cell(seed: Coord<f64>, seeds: &[Coord<f64>], bbox: Rect<f64>) -> Vec<Coord<f64>> {
    let (min, max) = (bbox.min(), bbox.max());
    let mut ring = vec![
        Coord { x: min.x, y: min.y },
        Coord { x: max.x, y: min.y },
        Coord { x: max.x, y: max.y },
        Coord { x: min.x, y: max.y },
    ];
    for other in seeds {
        if *other == seed {
            continue;
        }
        ring = clip_half_plane(&ring, seed, *other);
        if ring.is_empty() {
            break;
        }
    }
    ring
}

/// Sutherland–Hodgman: a と b の垂直二等分線で a 側（境界含む）を残す。ring は閉じていない頂点列
fn clip_half_plane(ring: &[Coord<f64>], a: Coord<f64>, b: Coord<f64>) -> Vec<Coord<f64>> {
    // f(p) <= 0 が a 側
    let d = Coord { x: b.x - a.x, y: b.y - a.y };
    let k = (b.x * b.x + b.y * b.y - a.x * a.x - a.y * a.y) / 2.0;
    let f = |p: Coord<f64>| p.x * d.x + p.y * d.y - k;

    let mut out = Vec::with_capacity(ring.len() + 1);
    for (i, &current) in ring.iter().enumerate() {
        let prev = ring[(i + ring.len() - 1) % ring.len()];
        let (fc, fp) = (f(current), f(prev));
        if fc <= 0.0 {
            if fp > 0.0 {
                out.push(crossing(prev, current, fp, fc));
            }
            out.push(current);
        } else if fp <= 0.0 {
            out.push(crossing(prev, current, fp, fc));
        }
    }
    out
}

fn crossing(s: Coord<f64>, e: Coord<f64>, fs: f64, fe: f64) -> Coord<f64> {
    let t = fs / (fs - fe);
    Coord {
        x: s.x + t * (e.x - s.x),
        y: s.y + t * (e.y - s.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SQUARE: &str = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[0,0],[10,0],[10,10],[0,10],[0,0]]]}}]}"#;

    #[test]
    fn test_clip_half_plane_keeps_near_side() {
        let ring = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 2.0, y: 0.0 },
            Coord { x: 2.0, y: 2.0 },
            Coord { x: 0.0, y: 2.0 },
        ];
        let clipped = clip_half_plane(&ring, Coord { x: 0.5, y: 1.0 }, Coord { x: 1.5, y: 1.0 });
        assert!(clipped.iter().all(|c| c.x <= 1.0 + 1e-9));
        let poly = Polygon::new(LineString::from(clipped), vec![]);
        assert!((poly.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_tessellation_covers_boundary() {
        let boundary = boundary_from_geojson(SQUARE).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let zones = tessellate(&boundary, 12, &mut rng).unwrap();
        let names: std::collections::BTreeSet<&str> = zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names.len(), 12);
        let total: f64 = zones.iter().map(|z| z.to_polygon().unsigned_area()).sum();
        assert!((total - 100.0).abs() < 1e-6);
        assert!(zones.iter().all(|z| z.name.starts_with("Zone ")));
        for z in &zones {
            for p in &z.coordinates {
                assert!(p.lat >= -1e-9 && p.lat <= 10.0 + 1e-9);
                assert!(p.lng >= -1e-9 && p.lng <= 10.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_same_seed_same_zones() {
        let boundary = boundary_from_geojson(SQUARE).unwrap();
        let a = tessellate(&boundary, 5, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = tessellate(&boundary, 5, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_geojson_without_polygons_is_config_error() {
        let points = r#"{"type":"Point","coordinates":[1,2]}"#;
        assert!(matches!(boundary_from_geojson(points), Err(Error::Config(_))));
        assert!(matches!(boundary_from_geojson("nope"), Err(Error::Config(_))));
    }

    #[test]
    fn test_outline_is_lat_lng() {
        let boundary = boundary_from_geojson(SQUARE).unwrap();
        let outline = boundary_outline(&boundary);
        assert_eq!(outline.len(), 1);
        assert!(outline[0].contains(&LatLng::new(0.0, 10.0)));
    }
}
