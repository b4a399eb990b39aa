//! 地図上のピン（事故・強盗などの出来事）

use serde::{Deserialize, Serialize};

const ICON_BASE: &str = "https://raw.githubusercontent.com/NataliaPolyakovska/icons/main/";

/// 出来事の種類。種類ごとにアイコンが決まっている
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentType {
    #[serde(rename = "collision")]
    Collision,
    #[serde(rename = "robbery")]
    Robbery,
    #[serde(rename = "other danger")]
    OtherDanger,
    #[serde(rename = "belongings")]
    Belongings,
}

impl IncidentType {
    pub const ALL: [IncidentType; 4] = [
        Self::Collision,
        Self::Robbery,
        Self::OtherDanger,
        Self::Belongings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collision => "collision",
            Self::Robbery => "robbery",
            Self::OtherDanger => "other danger",
            Self::Belongings => "belongings",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn icon_url(&self) -> String {
        let file = match self {
            Self::Collision => "crash.png",
            Self::Robbery => "thief.png",
            Self::OtherDanger => "warning.png",
            Self::Belongings => "sack.png",
        };
        format!("{}{}", ICON_BASE, file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    pub incident: IncidentType,
}

impl Pin {
    pub fn icon_url(&self) -> String {
        self.incident.icon_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icons() {
        assert_eq!(
            IncidentType::Collision.icon_url(),
            "https://raw.githubusercontent.com/NataliaPolyakovska/icons/main/crash.png"
        );
        assert!(IncidentType::Belongings.icon_url().ends_with("sack.png"));
    }

    #[test]
    fn test_parse() {
        assert_eq!(IncidentType::parse("Other Danger"), Some(IncidentType::OtherDanger));
        assert_eq!(IncidentType::parse("fire"), None);
    }
}
