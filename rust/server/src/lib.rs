pub mod errors;
pub mod events;
pub mod logging;
pub mod registry;
pub mod session;
pub mod settings;
pub mod store;
pub mod views;

pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use events::{EventBus, EventSubscription, GameEvent, Topic};
pub use logging::{capture_logs, init_logging, LogCapture, LogEntry, LogFormat};
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{Applied, SessionError, SessionManager};
pub use settings::{ServerSettings, SettingsError};
pub use store::{MemoryStore, SessionStore, StoreError};
pub use twentyone_engine::session::SessionId;
pub use views::{DeckView, HandView, SessionSummary, SessionView};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_provides_shared_components() {
        let manager = SessionManager::from_settings(ServerSettings::default());

        assert_eq!(manager.event_bus().subscriber_count(), 0);
        assert!(manager.session_ids().is_empty());
        assert!(manager.list_sessions().expect("list").is_empty());
    }
}
