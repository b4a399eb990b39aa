//! アシスタントに公開する 3 つの関数（add_pin / update_zone / update_volunteer_insights）
//!
//! 宣言（JSON Schema）と、モデルの関数呼び出しを AssistantCommand に変換する検証を持つ。
//! 実行は usecase::chat_bridge が行う。

use crate::domain::{AssistantCommand, IncidentType, Pin, ZoneStatus};
use common::tool::{optional_str, required_f64, required_str, ToolDef, ToolError, ToolSet};
use serde_json::{json, Value};

pub const ADD_PIN: &str = "add_pin";
pub const UPDATE_ZONE: &str = "update_zone";
pub const UPDATE_VOLUNTEER_INSIGHTS: &str = "update_volunteer_insights";

#[derive(Debug, Clone, Default)]
pub struct AssistantTools {
    default_volunteer: String,
}

impl AssistantTools {
    pub fn new(default_volunteer: impl Into<String>) -> Self {
        Self {
            default_volunteer: default_volunteer.into(),
        }
    }

    fn add_pin(args: &Value) -> Result<AssistantCommand, ToolError> {
        let latitude = required_f64(args, "lat")?;
        let longitude = required_f64(args, "lon")?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ToolError::InvalidArgs(format!(
                "coordinates out of range: {}, {}",
                latitude, longitude
            )));
        }
        let label = required_str(args, "label")?;
        let incident_name = required_str(args, "incident_type")?;
        let incident = IncidentType::parse(incident_name).ok_or_else(|| {
            ToolError::InvalidArgs(format!("unknown incident_type '{}'", incident_name))
        })?;
        Ok(AssistantCommand::AddPin(Pin {
            latitude,
            longitude,
            label: label.trim().to_string(),
            incident,
        }))
    }

    fn update_zone(args: &Value) -> Result<AssistantCommand, ToolError> {
        let zone_name = required_str(args, "zone_name")?;
        let status_name = required_str(args, "status")?;
        let status = ZoneStatus::parse(status_name)
            .ok_or_else(|| ToolError::InvalidArgs(format!("unknown status '{}'", status_name)))?;
        Ok(AssistantCommand::UpdateZone {
            zone_name: zone_name.trim().to_string(),
            status,
            assigned_to: optional_str(args, "assigned_to")?.map(|s| s.trim().to_string()),
        })
    }

    fn update_volunteer_insights(args: &Value) -> Result<AssistantCommand, ToolError> {
        Ok(AssistantCommand::UpdateVolunteerInsight {
            location: required_str(args, "location")?.trim().to_string(),
            details: required_str(args, "details")?.trim().to_string(),
        })
    }
}

impl ToolSet for AssistantTools {
    type Command = AssistantCommand;

    fn definitions(&self) -> Vec<ToolDef> {
        vec![
            ToolDef::new(
                ADD_PIN,
                "Add a pin to the map with a specified location, label, and incident type.",
                json!({
                    "type": "object",
                    "properties": {
                        "lat": {"type": "number", "description": "The latitude of the pin's location."},
                        "lon": {"type": "number", "description": "The longitude of the pin's location."},
                        "label": {"type": "string", "description": "A descriptive label for the pin."},
                        "incident_type": {
                            "type": "string",
                            "description": "The type of incident for the pin, either 'collision' or 'robbery'.",
                            "enum": ["collision", "robbery"]
                        }
                    },
                    "required": ["lat", "lon", "label", "incident_type"]
                }),
            ),
            ToolDef::new(
                UPDATE_ZONE,
                "Update the status of a specified zone and optionally assign it to a user. \
                 Updates are reflected on the map. Available statuses are: 'Available', 'In Progress', 'Searched'.",
                json!({
                    "type": "object",
                    "properties": {
                        "zone_name": {"type": "string", "description": "The name of the zone to update."},
                        "status": {
                            "type": "string",
                            "description": "The new status to set for the zone.",
                            "enum": ZoneStatus::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>()
                        },
                        "assigned_to": {"type": "string", "description": "The user assigned to the zone (optional)."}
                    },
                    "required": ["zone_name", "status"]
                }),
            ),
            ToolDef::new(
                UPDATE_VOLUNTEER_INSIGHTS,
                &format!(
                    "Add a new volunteer update to the insights file in cloud storage. \
                     Each update includes details about the location and a description. \
                     Automatically generates an Update_ID, timestamps the entry, and assigns '{}' as the volunteer.",
                    self.default_volunteer
                ),
                json!({
                    "type": "object",
                    "properties": {
                        "location": {"type": "string", "description": "The location reported in the update."},
                        "details": {"type": "string", "description": "A description or details of the update."}
                    },
                    "required": ["location", "details"]
                }),
            ),
        ]
    }

    fn parse(&self, name: &str, args: &Value) -> Result<AssistantCommand, ToolError> {
        match name {
            ADD_PIN => Self::add_pin(args),
            UPDATE_ZONE => Self::update_zone(args),
            UPDATE_VOLUNTEER_INSIGHTS => Self::update_volunteer_insights(args),
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}
