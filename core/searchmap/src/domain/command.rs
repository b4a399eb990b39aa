//! アシスタントが実行できるコマンド（閉じた集合）

use crate::domain::pin::Pin;
use crate::domain::zone::ZoneStatus;

/// モデルの関数呼び出しを検証した結果
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantCommand {
    AddPin(Pin),
    UpdateZone {
        zone_name: String,
        status: ZoneStatus,
        assigned_to: Option<String>,
    },
    UpdateVolunteerInsight {
        location: String,
        details: String,
    },
}

impl AssistantCommand {
    /// 対応する関数名
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddPin(_) => "add_pin",
            Self::UpdateZone { .. } => "update_zone",
            Self::UpdateVolunteerInsight { .. } => "update_volunteer_insights",
        }
    }
}
