//! セッションの初期化
//!
//! ゾーンと更新表は最初の描画より前に揃える。ピンとメッセージは空、ニュース告知は保留から始める。

use crate::domain::{LatLng, MessageLevel, SessionState, UpdateTable, Zone};
use crate::usecase::volunteer_insights::VolunteerInsights;
use common::ports::outbound::{IdGenerator, Log, LogRecord};
use std::sync::Arc;

pub struct SessionFactory {
    zones: Arc<Vec<Zone>>,
    boundary: Arc<Vec<Vec<LatLng>>>,
    insights: Arc<VolunteerInsights>,
    ids: Arc<dyn IdGenerator>,
    log: Arc<dyn Log>,
}

impl SessionFactory {
    pub fn new(
        zones: Vec<Zone>,
        boundary: Vec<Vec<LatLng>>,
        insights: Arc<VolunteerInsights>,
        ids: Arc<dyn IdGenerator>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            zones: Arc::new(zones),
            boundary: Arc::new(boundary),
            insights,
            ids,
            log,
        }
    }

    /// 起動時に読んだゾーンの複製から新しいセッションを作る
    ///
    /// 更新表が読めなければ空の表で始め、画面に error を出す。
    pub fn create(&self) -> SessionState {
        let id = self.ids.next_id();
        let (updates, failure) = match self.insights.load() {
            Ok(table) => (table, None),
            Err(e) => (UpdateTable::default(), Some(e)),
        };
        let mut session =
            SessionState::new(id, (*self.zones).clone(), (*self.boundary).clone(), updates);
        if let Some(e) = failure {
            self.log.emit(
                LogRecord::error("volunteer updates could not be read")
                    .layer("usecase")
                    .kind("storage")
                    .field("object", self.insights.object_name())
                    .field("error", e.to_string()),
            );
            session.notify(
                MessageLevel::Error,
                format!("Volunteer updates could not be loaded: {}", e),
            );
        }
        self.log.emit(
            LogRecord::info("session created")
                .layer("usecase")
                .kind("session")
                .field("session", session.id.as_str())
                .field("zones", session.zones.len()),
        );
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Announcement;
    use chrono::Local;
    use common::adapter::{FixedClock, MemoryObjectStore, NoopLog, SequenceIdGenerator};

    fn factory(store: MemoryObjectStore) -> SessionFactory {
        let insights = VolunteerInsights::new(
            Arc::new(store),
            "person1234/volunteer_updates.csv",
            "Volunteer",
            Arc::new(FixedClock(Local::now())),
            Arc::new(NoopLog),
        );
        SessionFactory::new(
            vec![Zone::new("Mission", vec![LatLng::new(37.76, -122.41)])],
            Vec::new(),
            Arc::new(insights),
            Arc::new(SequenceIdGenerator::new("s")),
            Arc::new(NoopLog),
        )
    }

    #[test]
    fn test_new_session_starts_clean() {
        let store = MemoryObjectStore::new("b").with_object(
            "person1234/volunteer_updates.csv",
            "Update_ID,Volunteer_Name,Update_Date,Location_Reported,Details,Follow_Up_Action\n1,A,d,L,x,search\n",
        );
        let session = factory(store).create();
        assert_eq!(session.id, "s-1");
        assert_eq!(session.zones.len(), 1);
        assert_eq!(session.updates.updates().len(), 1);
        assert!(session.pins.is_empty());
        assert!(session.messages.is_empty());
        assert_eq!(session.announcement, Announcement::Pending);
        assert!(session.notice.is_none());
    }

    #[test]
    fn test_unreadable_updates_start_empty_with_notice() {
        let factory = factory(MemoryObjectStore::new("b"));
        let session = factory.create();
        assert!(session.updates.is_empty());
        assert_eq!(session.notice.unwrap().level, MessageLevel::Error);
        // 各セッションは独立した複製を持つ
        assert_eq!(factory.create().id, "s-2");
    }
}
