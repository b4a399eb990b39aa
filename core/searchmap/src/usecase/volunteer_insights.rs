//! ボランティア更新 CSV への追記
//!
//! 読み込み時の世代番号を前提条件にして全体を書き戻す。他の書き込みが先に入っていれば
//! `Error::Conflict` を返し、再送はユーザーに任せる。

use crate::domain::volunteer::{UpdateTable, VolunteerUpdate, UPDATE_DATE_FORMAT};
use common::error::Error;
use common::ports::outbound::{Clock, Log, LogRecord, ObjectStore, Precondition};
use std::sync::Arc;

pub const FOLLOW_UP_ACTION: &str = "search";

pub struct VolunteerInsights {
    store: Arc<dyn ObjectStore>,
    object_name: String,
    default_volunteer: String,
    clock: Arc<dyn Clock>,
    log: Arc<dyn Log>,
}

impl VolunteerInsights {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        object_name: impl Into<String>,
        default_volunteer: impl Into<String>,
        clock: Arc<dyn Clock>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            store,
            object_name: object_name.into(),
            default_volunteer: default_volunteer.into(),
            clock,
            log,
        }
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// 現在の表
    pub fn load(&self) -> Result<UpdateTable, Error> {
        let object = self.store.get(&self.object_name)?;
        UpdateTable::parse_csv(&object.text())
    }

    /// 1 件追記して書き戻し、書き込んだ表を返す
    pub fn append(&self, location: &str, details: &str) -> Result<UpdateTable, Error> {
        let object = self.store.get(&self.object_name)?;
        let mut table = UpdateTable::parse_csv(&object.text())?;
        let update = VolunteerUpdate {
            update_id: table.max_update_id()?.map_or(1, |max| max + 1),
            volunteer_name: self.default_volunteer.clone(),
            update_date: self.clock.now().format(UPDATE_DATE_FORMAT).to_string(),
            location_reported: location.to_string(),
            details: details.to_string(),
            follow_up_action: FOLLOW_UP_ACTION.to_string(),
        };
        table.append(&update);
        let csv = table.to_csv()?;
        self.store.put(
            &self.object_name,
            csv.as_bytes(),
            "text/csv",
            Precondition::GenerationMatch(object.generation),
        )?;
        self.log.emit(
            LogRecord::info("volunteer update appended")
                .layer("usecase")
                .kind("storage")
                .field("object", self.object_name.as_str())
                .field("update_id", update.update_id),
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use common::adapter::{FixedClock, MemoryObjectStore, NoopLog};

    const OBJECT: &str = "person1234/volunteer_updates.csv";

    fn insights(store: Arc<MemoryObjectStore>) -> VolunteerInsights {
        let now = Local.with_ymd_and_hms(2024, 11, 22, 15, 4, 5).unwrap();
        VolunteerInsights::new(
            store,
            OBJECT,
            "Volunteer",
            Arc::new(FixedClock(now)),
            Arc::new(NoopLog),
        )
    }

    #[test]
    fn test_append_uses_max_plus_one_and_date_format() {
        let store = Arc::new(MemoryObjectStore::new("b").with_object(
            OBJECT,
            "Update_ID,Volunteer_Name,Update_Date,Location_Reported,Details,Follow_Up_Action\n3,A,d,L,x,search\n9,B,d,L,y,search\n",
        ));
        let table = insights(store.clone()).append("Ocean Beach", "Found a blue jacket").unwrap();
        let last = table.updates().pop().unwrap();
        assert_eq!(last.update_id, 10);
        assert_eq!(last.volunteer_name, "Volunteer");
        assert_eq!(last.update_date, "11/22/2024  03:04:05 PM");
        assert_eq!(last.follow_up_action, "search");
        let written = store.get(OBJECT).unwrap().text();
        assert!(written.ends_with("10,Volunteer,11/22/2024  03:04:05 PM,Ocean Beach,Found a blue jacket,search\n"));
    }

    #[test]
    fn test_header_only_table_starts_at_one() {
        let store = Arc::new(MemoryObjectStore::new("b").with_object(
            OBJECT,
            "Update_ID,Volunteer_Name,Update_Date,Location_Reported,Details,Follow_Up_Action\n",
        ));
        let table = insights(store).append("Presidio", "Scarf").unwrap();
        assert_eq!(table.updates()[0].update_id, 1);
    }
}
