//! 地図ドキュメント（Google Maps JS API）の生成
//!
//! 純粋関数。リクエストのたびに全体を作り直す。

use crate::domain::{LatLng, Pin, Zone};
use crate::usecase::markup::{escape_html, script_json};
use serde::Serialize;

pub const MAP_CENTER: LatLng = LatLng {
    lat: 37.7749,
    lng: -122.4194,
};
pub const MAP_ZOOM: u8 = 12;
const MAPS_JS_URL: &str = "https://maps.googleapis.com/maps/api/js";

pub struct MapView<'a> {
    pub zones: &'a [Zone],
    pub pins: &'a [Pin],
    /// テッセレーション時の境界線（空なら描かない）
    pub boundary: &'a [Vec<LatLng>],
    pub api_key: &'a str,
}

#[derive(Serialize)]
struct Marker<'a> {
    latitude: f64,
    longitude: f64,
    label: &'a str,
    icon: String,
}

fn maps_script_src(api_key: &str) -> String {
    reqwest::Url::parse_with_params(
        MAPS_JS_URL,
        &[
            ("key", api_key),
            ("libraries", "geometry"),
            ("callback", "initMap"),
        ],
    )
    .map(|u| u.to_string())
    .unwrap_or_else(|_| MAPS_JS_URL.to_string())
}

pub fn render_map(view: &MapView<'_>) -> String {
    let markers: Vec<Marker<'_>> = view
        .pins
        .iter()
        .map(|p| Marker {
            latitude: p.latitude,
            longitude: p.longitude,
            label: &p.label,
            icon: p.icon_url(),
        })
        .collect();

    let mut html = String::new();
    html.push_str(
        r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  #map { height: 100%; width: 100%; }
  html, body { height: 100%; margin: 0; padding: 0; }
</style>
</head>
<body>
<div id="map"></div>
<script>
"##,
    );
    html.push_str(&format!("const ZONES = {};\n", script_json(&view.zones)));
    html.push_str(&format!("const PINS = {};\n", script_json(&markers)));
    html.push_str(&format!("const BOUNDARY = {};\n", script_json(&view.boundary)));
    html.push_str(&format!(
        "const CENTER = {{ lat: {}, lng: {} }};\nconst ZOOM = {};\n",
        MAP_CENTER.lat, MAP_CENTER.lng, MAP_ZOOM
    ));
    html.push_str(
        r##"function getFillColor(status) {
  switch (status) {
    case "Available": return "#00FF00";
    case "In Progress": return "#FFFF00";
    case "Searched": return "#FF0000";
    default: return "#FFFFFF";
  }
}

function escapeHtml(s) {
  return String(s).replace(/[&<>"']/g, (c) => ({"&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;", "'": "&#x27;"}[c]));
}

function initMap() {
  const map = new google.maps.Map(document.getElementById("map"), { center: CENTER, zoom: ZOOM });
  const infoWindow = new google.maps.InfoWindow();
  const polygons = [];

  BOUNDARY.forEach((ring) => {
    new google.maps.Polygon({
      paths: ring,
      strokeColor: "#FF0000",
      strokeOpacity: 0.8,
      strokeWeight: 2,
      fillOpacity: 0.05,
      clickable: false,
      map: map,
    });
  });

  ZONES.forEach((zone) => {
    const polygon = new google.maps.Polygon({
      paths: zone.coordinates,
      strokeColor: "#000",
      strokeOpacity: 0.8,
      strokeWeight: 2,
      fillColor: getFillColor(zone.status),
      fillOpacity: 0.35,
      map: map,
    });
    polygons.push({ polygon: polygon, zone: zone });
    polygon.addListener("click", (event) => {
      infoWindow.setContent(
        `<strong>${escapeHtml(zone.name)}</strong><br>Status: ${escapeHtml(zone.status)}<br>Assigned to: ${escapeHtml(zone.assigned_to || "None")}`
      );
      infoWindow.setPosition(event.latLng);
      infoWindow.open(map);
    });
  });

  map.addListener("click", (e) => {
    const found = polygons.find((p) => google.maps.geometry.poly.containsLocation(e.latLng, p.polygon));
    if (!found) return;
    const preview = new google.maps.InfoWindow({
      content: `<div><strong>${escapeHtml(found.zone.name)}</strong></div>`,
      position: e.latLng,
      pixelOffset: new google.maps.Size(0, -30),
    });
    preview.open(map);
    setTimeout(() => preview.close(), 3000);
  });

  PINS.forEach((pin) => {
    new google.maps.Marker({
      position: { lat: pin.latitude, lng: pin.longitude },
      map: map,
      title: pin.label,
      icon: { url: pin.icon, scaledSize: new google.maps.Size(32, 32) },
    });
  });
}
</script>
"##,
    );
    html.push_str(&format!(
        "<script src=\"{}\" async defer></script>\n</body>\n</html>\n",
        escape_html(&maps_script_src(view.api_key))
    ));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IncidentType;

    fn zone() -> Zone {
        Zone::new(
            "Mission </script>",
            vec![LatLng::new(37.75, -122.42), LatLng::new(37.76, -122.41), LatLng::new(37.75, -122.42)],
        )
    }

    #[test]
    fn test_render_contains_zones_pins_and_key() {
        let zones = vec![zone()];
        let pins = vec![Pin {
            latitude: 37.8,
            longitude: -122.4,
            label: "Crash".to_string(),
            incident: IncidentType::Collision,
        }];
        let html = render_map(&MapView {
            zones: &zones,
            pins: &pins,
            boundary: &[],
            api_key: "k&y",
        });
        assert!(html.contains("libraries=geometry"));
        assert!(html.contains("callback=initMap"));
        assert!(html.contains("key=k%26y"));
        assert!(html.contains("crash.png"));
        assert!(html.contains("\"status\":\"Available\""));
        assert!(html.contains("lat: 37.7749, lng: -122.4194"));
        assert!(html.contains("case \"Searched\": return \"#FF0000\";"));
        assert!(html.contains("default: return \"#FFFFFF\";"));
        // ゾーン名の </script> で閉じられない
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_render_is_pure() {
        let zones = vec![zone()];
        let view = MapView {
            zones: &zones,
            pins: &[],
            boundary: &[],
            api_key: "k",
        };
        assert_eq!(render_map(&view), render_map(&view));
    }
}
