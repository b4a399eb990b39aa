//! 捜索ゾーン

use geo::{Centroid, Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

/// ゾーンの捜索状況
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneStatus {
    #[serde(rename = "Available")]
    Available,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Searched")]
    Searched,
}

impl ZoneStatus {
    pub const ALL: [ZoneStatus; 3] = [Self::Available, Self::InProgress, Self::Searched];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::InProgress => "In Progress",
            Self::Searched => "Searched",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s.trim())
    }
}

/// 緯度経度（Google Maps の LatLngLiteral と同じ形）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// 地図上の 1 ポリゴン = 1 ゾーン
///
/// `coordinates` は外周リングのみ。同じ名前のゾーンが複数あってもよい（MULTIPOLYGON の各部分）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub coordinates: Vec<LatLng>,
    pub status: ZoneStatus,
    pub assigned_to: Option<String>,
}

impl Zone {
    /// 新規ゾーン（Available・担当者なし）
    pub fn new(name: impl Into<String>, coordinates: Vec<LatLng>) -> Self {
        Self {
            name: name.into(),
            coordinates,
            status: ZoneStatus::Available,
            assigned_to: None,
        }
    }

    /// geo のポリゴンから作る。WKT / GeoJSON の x は経度、y は緯度
    pub fn from_polygon(name: impl Into<String>, polygon: &Polygon<f64>) -> Self {
        let coordinates = polygon
            .exterior()
            .coords()
            .map(|c| LatLng::new(c.y, c.x))
            .collect();
        Self::new(name, coordinates)
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        let ring: Vec<Coord<f64>> = self
            .coordinates
            .iter()
            .map(|p| Coord { x: p.lng, y: p.lat })
            .collect();
        Polygon::new(LineString::from(ring), vec![])
    }

    /// 重心（座標が空なら None）
    pub fn centroid(&self) -> Option<LatLng> {
        self.to_polygon().centroid().map(|p| LatLng::new(p.y(), p.x()))
    }
}

/// 名前が一致する全ゾーンの状況と担当者を更新し、更新件数を返す
///
/// 一致するゾーンが無ければ何もしない（0 を返す）。`assigned_to` が None のときは担当者を変えない。
pub fn update_zone(
    zones: &mut [Zone],
    zone_name: &str,
    status: ZoneStatus,
    assigned_to: Option<&str>,
) -> usize {
    let mut updated = 0;
    for zone in zones.iter_mut().filter(|z| z.name == zone_name) {
        zone.status = status;
        if let Some(who) = assigned_to {
            zone.assigned_to = Some(who.to_string());
        }
        updated += 1;
    }
    updated
}
