//! ゾーン CSV（the_geom = WKT, name）の読み込み
//!
//! POLYGON は 1 ゾーン、MULTIPOLYGON は構成ポリゴンごとに 1 ゾーン（名前は共有）。
//! ファイルが無い・列が無い・WKT が壊れているときは設定エラーで起動を止める。

use crate::domain::Zone;
use common::error::Error;
use geo::Geometry;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use wkt::TryFromWkt;

pub const GEOMETRY_COLUMN: &str = "the_geom";
pub const NAME_COLUMN: &str = "name";

pub fn load_zones_from_csv(path: &Path) -> Result<Vec<Zone>, Error> {
    let file = File::open(path).map_err(|e| {
        Error::config(format!("CSV file '{}' could not be opened: {}", path.display(), e))
    })?;
    parse_zone_csv(file).map_err(|e| match e {
        Error::Config(msg) => Error::config(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

pub fn parse_zone_csv<R: Read>(reader: R) -> Result<Vec<Zone>, Error> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let headers = csv
        .headers()
        .map_err(|e| Error::config(format!("unreadable CSV header: {}", e)))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| Error::config(format!("missing column '{}'", name)))
    };
    let geom_idx = column(GEOMETRY_COLUMN)?;
    let name_idx = column(NAME_COLUMN)?;

    let mut zones = Vec::new();
    for (line, record) in csv.records().enumerate() {
        let record = record.map_err(|e| Error::config(format!("row {}: {}", line + 2, e)))?;
        let wkt_text = record.get(geom_idx).unwrap_or("").trim();
        if wkt_text.is_empty() {
            continue;
        }
        let name = record.get(name_idx).unwrap_or("").to_string();
        let geometry = Geometry::<f64>::try_from_wkt_str(wkt_text)
            .map_err(|e| Error::config(format!("row {}: malformed WKT: {}", line + 2, e)))?;
        zones.extend(zones_from_geometry(&name, &geometry));
    }
    Ok(zones)
}

/// ポリゴン系以外のジオメトリはゾーンにしない
fn zones_from_geometry(name: &str, geometry: &Geometry<f64>) -> Vec<Zone> {
    match geometry {
        Geometry::Polygon(p) => vec![Zone::from_polygon(name, p)],
        Geometry::MultiPolygon(mp) => mp.0.iter().map(|p| Zone::from_polygon(name, p)).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ZoneStatus;

    #[test]
    fn test_multipolygon_yields_zone_per_part() {
        let csv = "the_geom,name\n\"MULTIPOLYGON (((0 0, 0 1, 1 1, 1 0, 0 0)), ((2 2, 2 3, 3 3, 3 2, 2 2)))\",X\n";
        let zones = parse_zone_csv(csv.as_bytes()).unwrap();
        assert_eq!(zones.len(), 2);
        assert!(zones.iter().all(|z| z.name == "X"));
        assert!(zones.iter().all(|z| z.status == ZoneStatus::Available));
        assert!(zones.iter().all(|z| z.assigned_to.is_none()));
        assert_eq!(zones[1].coordinates[0].lat, 2.0);
    }

    #[test]
    fn test_polygon_x_is_longitude() {
        let csv = "name,the_geom\nMission,\"POLYGON ((-122.42 37.75, -122.40 37.75, -122.40 37.77, -122.42 37.75))\"\n";
        let zones = parse_zone_csv(csv.as_bytes()).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].coordinates[0].lat, 37.75);
        assert_eq!(zones[0].coordinates[0].lng, -122.42);
    }

    #[test]
    fn test_empty_geometry_rows_are_skipped() {
        let csv = "the_geom,name\n,Nowhere\n\"POLYGON ((0 0, 0 1, 1 1, 0 0))\",A\n";
        let zones = parse_zone_csv(csv.as_bytes()).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].name, "A");
    }

    #[test]
    fn test_malformed_wkt_is_config_error() {
        let csv = "the_geom,name\n\"POLYGON ((0 0, 0 1\",A\n";
        assert!(matches!(parse_zone_csv(csv.as_bytes()), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_column_is_config_error() {
        let csv = "geometry,name\n\"POLYGON ((0 0, 0 1, 1 1, 0 0))\",A\n";
        assert!(matches!(parse_zone_csv(csv.as_bytes()), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let r = load_zones_from_csv(Path::new("/nonexistent/SF_Find_Neighborhoods.csv"));
        assert!(matches!(r, Err(Error::Config(_))));
    }
}
