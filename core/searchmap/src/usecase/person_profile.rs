//! 人物フォルダ（説明・更新表・写真）の読み込み

use crate::domain::{PersonProfile, UpdateTable};
use crate::usecase::rtf::rtf_to_text;
use common::domain::MimeType;
use common::error::Error;
use common::ports::outbound::ObjectStore;

/// `{person_id}/` 以下を読む。複数ある種別は名前順で最後のものが勝つ
pub fn read_profile(store: &dyn ObjectStore, person_id: &str) -> Result<PersonProfile, Error> {
    let prefix = format!("{}/", person_id.trim_end_matches('/'));
    let mut profile = PersonProfile::default();
    for meta in store.list(&prefix)? {
        let lower = meta.name.to_lowercase();
        if lower.ends_with(".rtf") {
            profile.description = rtf_to_text(&store.get(&meta.name)?.text())?;
        } else if lower.ends_with(".csv") {
            profile.updates = UpdateTable::parse_csv(&store.get(&meta.name)?.text())?;
        } else if let Some(mime) = MimeType::image_from_file_name(&meta.name) {
            profile.photo = Some((mime, store.get(&meta.name)?.bytes));
        }
    }
    Ok(profile)
}
