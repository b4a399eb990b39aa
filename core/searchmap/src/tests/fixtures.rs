use crate::adapter::AssistantTools;
use crate::domain::{AssistantCommand, LatLng, Zone};
use chrono::{Local, TimeZone};
use common::adapter::{FixedClock, MemoryObjectStore};
use common::llm::{FinishReason, FunctionCall, ModelReply, Part};
use common::tool::ToolSet;
use serde_json::Value;
use std::sync::Arc;

pub const BUCKET: &str = "search-bucket";
pub const UPDATES_CSV: &str = "person1234/volunteer_updates.csv";
pub const UPDATES: &str = "Update_ID,Volunteer_Name,Update_Date,Location_Reported,Details,Follow_Up_Action\n\
3,Bob,11/20/2024  10:00:00 AM,Presidio,Scarf found,search\n\
9,Carol,11/21/2024  09:30:00 AM,Mission,Seen at cafe,search\n";

/// 1x1 の正方形ゾーン（左下が (lat, lng)）
pub fn square(name: &str, lat: f64, lng: f64) -> Zone {
    Zone::new(
        name,
        vec![
            LatLng::new(lat, lng),
            LatLng::new(lat, lng + 1.0),
            LatLng::new(lat + 1.0, lng + 1.0),
            LatLng::new(lat + 1.0, lng),
            LatLng::new(lat, lng),
        ],
    )
}

pub fn zones() -> Vec<Zone> {
    vec![
        square("Mission", 37.0, -122.0),
        square("Presidio", 38.0, -122.0),
    ]
}

pub fn store() -> MemoryObjectStore {
    MemoryObjectStore::new(BUCKET).with_object(UPDATES_CSV, UPDATES)
}

pub fn clock() -> FixedClock {
    FixedClock(Local.with_ymd_and_hms(2024, 11, 22, 15, 4, 5).unwrap())
}

pub fn tools() -> Arc<dyn ToolSet<Command = AssistantCommand> + Send + Sync> {
    Arc::new(AssistantTools::new("Volunteer"))
}

/// 関数呼び出しだけの応答
pub fn call(name: &str, args: Value) -> ModelReply {
    ModelReply {
        parts: vec![Part::FunctionCall(FunctionCall {
            name: name.to_string(),
            args,
        })],
        finish: FinishReason::Stop,
    }
}
