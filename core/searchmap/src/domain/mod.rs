//! ドメイン型

pub mod chat;
pub mod command;
pub mod news;
pub mod person;
pub mod pin;
pub mod session;
pub mod volunteer;
pub mod zone;

pub use chat::{ChatImage, ChatMessage, MessageLevel};
pub use command::AssistantCommand;
pub use news::{Announcement, NewsItem};
pub use person::PersonProfile;
pub use pin::{IncidentType, Pin};
pub use session::SessionState;
pub use volunteer::UpdateTable;
pub use zone::{update_zone, LatLng, Zone, ZoneStatus};
