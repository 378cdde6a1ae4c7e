use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};
use thiserror::Error;
use twentyone_engine::engine::{BlackjackOutcome, HitOutcome, LeaveOutcome, TurnOutcome};
use twentyone_engine::errors::{ErrorKind, GameError};
use twentyone_engine::hand::PlayerId;
use twentyone_engine::rules::TableRules;
use twentyone_engine::session::{LifecycleState, Session, SessionId};
use uuid::Uuid;

use crate::errors::{status_for_kind, ErrorSeverity, IntoErrorResponse};
use crate::events::{EventBus, GameEvent, Topic};
use crate::registry::{SessionHandle, SessionRegistry};
use crate::settings::ServerSettings;
use crate::store::{MemoryStore, SessionStore, StoreError};
use crate::views::{DeckView, HandView, SessionSummary, SessionView};

/// Result of a committed operation and the events it produced.
///
/// The events have already been published on the manager's bus when this is
/// returned; they are included for callers that forward them elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied<T> {
    pub value: T,
    pub events: Vec<GameEvent>,
}

/// Runs game operations against registered sessions.
///
/// Every operation locks its session, works on a copy, checks the copy's
/// invariants, saves it and only then replaces the live session. Events are
/// published once the lock is released.
#[derive(Debug)]
pub struct SessionManager {
    registry: SessionRegistry,
    store: Arc<dyn SessionStore>,
    event_bus: Arc<EventBus>,
    settings: ServerSettings,
    /// Sessions created by this manager; reloads from the store don't count.
    created: AtomicU64,
}

impl SessionManager {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self::with_store(
            event_bus,
            Arc::new(MemoryStore::new()),
            ServerSettings::default(),
        )
    }

    pub fn with_store(
        event_bus: Arc<EventBus>,
        store: Arc<dyn SessionStore>,
        settings: ServerSettings,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            store,
            event_bus,
            settings,
            created: AtomicU64::new(0),
        }
    }

    /// Manager with its own bus, sized from the settings.
    pub fn from_settings(settings: ServerSettings) -> Self {
        let event_bus = Arc::new(EventBus::with_buffer(settings.event_buffer));
        Self::with_store(event_bus, Arc::new(MemoryStore::new()), settings)
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn create_session(
        &self,
        owner: PlayerId,
        name: &str,
    ) -> Result<Applied<SessionId>, SessionError> {
        let uuid = Uuid::new_v4();
        let id = uuid.to_string();
        let ordinal = self.registry.next_ordinal()?;
        let seed = self
            .settings
            .session_seed(self.created.fetch_add(1, Ordering::SeqCst))
            .unwrap_or_else(|| uuid.as_u64_pair().0);
        let rules = TableRules::with_max_players(self.settings.max_players);

        let session = Session::new(id.clone(), owner, name, rules, seed)?;
        session.check_invariants()?;
        self.store.save(&session.to_record())?;
        self.registry.insert(id.clone(), session, ordinal)?;

        tracing::info!(
            session_id = %id,
            owner_id = owner,
            seed = seed,
            "created game session"
        );

        let events = vec![
            GameEvent::SessionChanged {
                session_id: id.clone(),
            },
            GameEvent::SessionListChanged,
        ];
        self.publish(&events);
        Ok(Applied { value: id, events })
    }

    pub fn join_session(
        &self,
        session_id: &SessionId,
        player: PlayerId,
    ) -> Result<Applied<HandView>, SessionError> {
        let applied = self.apply(session_id, "join", |session| {
            session.join(player).map(HandView::from)
        })?;
        tracing::info!(session_id = %session_id, player_id = player, "player joined session");
        Ok(applied)
    }

    pub fn ready(
        &self,
        session_id: &SessionId,
        player: PlayerId,
    ) -> Result<Applied<HandView>, SessionError> {
        let applied = self.apply(session_id, "ready", |session| {
            session.ready(player).map(HandView::from)
        })?;
        tracing::debug!(session_id = %session_id, player_id = player, "player ready");
        Ok(applied)
    }

    pub fn start_session(
        &self,
        session_id: &SessionId,
        actor: PlayerId,
    ) -> Result<Applied<()>, SessionError> {
        let applied = self.apply(session_id, "start", |session| session.start(actor))?;
        tracing::info!(session_id = %session_id, "session started and dealt");
        Ok(applied)
    }

    pub fn restart_session(
        &self,
        session_id: &SessionId,
        actor: PlayerId,
    ) -> Result<Applied<()>, SessionError> {
        let applied = self.apply(session_id, "restart", |session| session.restart(actor))?;
        tracing::info!(session_id = %session_id, "session restarted and dealt");
        Ok(applied)
    }

    pub fn hit(
        &self,
        session_id: &SessionId,
        player: PlayerId,
    ) -> Result<Applied<HitOutcome>, SessionError> {
        let applied = self.apply(session_id, "hit", |session| session.hit(player))?;
        tracing::debug!(
            session_id = %session_id,
            player_id = player,
            card = %applied.value.card,
            total = applied.value.hand.total_value(),
            busted = applied.value.busted,
            "player hit"
        );
        log_round_end(session_id, &applied.value.turn);
        Ok(applied)
    }

    pub fn end_turn(
        &self,
        session_id: &SessionId,
        player: PlayerId,
    ) -> Result<Applied<TurnOutcome>, SessionError> {
        let applied = self.apply(session_id, "end_turn", |session| session.end_turn(player))?;
        tracing::debug!(session_id = %session_id, player_id = player, outcome = ?applied.value, "turn ended");
        log_round_end(session_id, &applied.value);
        Ok(applied)
    }

    pub fn blackjack_check(
        &self,
        session_id: &SessionId,
        player: PlayerId,
    ) -> Result<Applied<BlackjackOutcome>, SessionError> {
        let applied = self.apply(session_id, "blackjack_check", |session| {
            session.blackjack_check(player)
        })?;
        if let BlackjackOutcome::Win { winner } = applied.value {
            tracing::info!(session_id = %session_id, winner_id = winner, "blackjack on the deal");
        }
        Ok(applied)
    }

    pub fn leave_session(
        &self,
        session_id: &SessionId,
        player: PlayerId,
    ) -> Result<Applied<LeaveOutcome>, SessionError> {
        let applied = self.apply(session_id, "leave", |session| session.leave(player))?;
        tracing::info!(
            session_id = %session_id,
            player_id = player,
            outcome = ?applied.value,
            "player left session"
        );
        Ok(applied)
    }

    /// Sessions that have not ended, oldest first.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let mut summaries = Vec::new();
        for registered in self.registry.sessions()? {
            let session = lock(&registered.handle)?;
            if session.state() != LifecycleState::Ended {
                summaries.push(SessionSummary::new(&session, registered.created_at));
            }
        }
        Ok(summaries)
    }

    pub fn session_view(
        &self,
        session_id: &SessionId,
        viewer: PlayerId,
    ) -> Result<SessionView, SessionError> {
        self.read(session_id, |session| SessionView::build(session, viewer))
    }

    pub fn player_hand(
        &self,
        session_id: &SessionId,
        player: PlayerId,
    ) -> Result<HandView, SessionError> {
        self.read(session_id, |session| {
            session
                .hand(player)
                .map(HandView::from)
                .ok_or(GameError::NotInSession(player))
        })
    }

    pub fn deck_view(
        &self,
        session_id: &SessionId,
        viewer: PlayerId,
    ) -> Result<DeckView, SessionError> {
        self.read(session_id, |session| DeckView::build(session, viewer))
    }

    /// Drop a session entirely: registry, store and subscribers.
    pub fn remove_session(&self, session_id: &SessionId) -> Result<Applied<()>, SessionError> {
        if self.registry.is_removed(session_id)? {
            return Err(SessionError::NotFound(session_id.clone()));
        }
        let handle = self.registry.remove(session_id)?;
        {
            // a commit already holding the lock finishes its save first
            let _in_flight = handle
                .as_ref()
                .map(|h| h.lock().unwrap_or_else(PoisonError::into_inner));
            let in_store = self.store.load(session_id)?.is_some();
            if handle.is_none() && !in_store {
                return Err(SessionError::NotFound(session_id.clone()));
            }
            self.store.remove(session_id)?;
        }

        tracing::info!(session_id = %session_id, "session removed");

        let events = vec![
            GameEvent::SessionChanged {
                session_id: session_id.clone(),
            },
            GameEvent::SessionListChanged,
        ];
        self.publish(&events);
        self.event_bus.drop_topic(&Topic::Session(session_id.clone()));
        Ok(Applied { value: (), events })
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        match self.registry.sessions() {
            Ok(sessions) => sessions.into_iter().map(|s| s.id).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Look a session up, rehydrating it from the store on a registry miss.
    fn resolve(&self, session_id: &SessionId) -> Result<SessionHandle, SessionError> {
        if let Some(handle) = self.registry.get(session_id)? {
            return Ok(handle);
        }
        if self.registry.is_removed(session_id)? {
            return Err(SessionError::NotFound(session_id.clone()));
        }
        let record = self
            .store
            .load(session_id)?
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        let session = Session::from_record(record)?;
        // list position only; seeds are counted per created session
        let ordinal = self.registry.next_ordinal()?;
        tracing::debug!(session_id = %session_id, "session loaded from store");
        self.registry.insert(session_id.clone(), session, ordinal)
    }

    fn read<T, F>(&self, session_id: &SessionId, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&Session) -> Result<T, GameError>,
    {
        let handle = self.resolve(session_id)?;
        let session = self.lock_current(session_id, &handle)?;
        Ok(f(&session)?)
    }

    fn apply<T, F>(
        &self,
        session_id: &SessionId,
        operation: &'static str,
        f: F,
    ) -> Result<Applied<T>, SessionError>
    where
        F: FnOnce(&mut Session) -> Result<T, GameError>,
    {
        let handle = self.resolve(session_id)?;
        let (value, events) = {
            let mut live = self.lock_current(session_id, &handle)?;
            let mut draft = live.clone();

            let value = f(&mut draft).map_err(|err| {
                tracing::debug!(
                    session_id = %session_id,
                    operation,
                    error = %err,
                    "operation rejected"
                );
                err
            })?;
            if let Err(err) = draft.check_invariants() {
                tracing::error!(
                    session_id = %session_id,
                    operation,
                    error = %err,
                    "refusing to commit inconsistent session"
                );
                return Err(err.into());
            }
            self.store.save(&draft.to_record())?;

            let events = changes(&live, &draft);
            *live = draft;
            (value, events)
        };

        self.publish(&events);
        Ok(Applied { value, events })
    }

    /// Lock a resolved session, failing if it was removed while this caller
    /// waited for the lock.
    fn lock_current<'a>(
        &self,
        session_id: &SessionId,
        handle: &'a SessionHandle,
    ) -> Result<MutexGuard<'a, Session>, SessionError> {
        let guard = lock(handle)?;
        if !self.registry.is_current(session_id, handle)? {
            return Err(SessionError::NotFound(session_id.clone()));
        }
        Ok(guard)
    }

    fn publish(&self, events: &[GameEvent]) {
        for event in events {
            self.event_bus.publish(event.clone());
        }
    }
}

fn lock(handle: &SessionHandle) -> Result<MutexGuard<'_, Session>, SessionError> {
    handle.lock().map_err(|_| SessionError::StoragePoisoned)
}

/// Events for a committed change. The lobby only hears about changes that
/// show up in the session list.
fn changes(before: &Session, after: &Session) -> Vec<GameEvent> {
    let mut events = vec![GameEvent::SessionChanged {
        session_id: after.id().clone(),
    }];
    if before.state() != after.state() || before.player_count() != after.player_count() {
        events.push(GameEvent::SessionListChanged);
    }
    events
}

fn log_round_end(session_id: &SessionId, outcome: &TurnOutcome) {
    if let TurnOutcome::RoundComplete { winner } = outcome {
        tracing::info!(session_id = %session_id, winner_id = ?winner, "round complete");
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),
    #[error("Session storage poisoned")]
    StoragePoisoned,
}

impl SessionError {
    /// Engine error kind, with a missing session reported as not found.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SessionError::NotFound(_) => Some(ErrorKind::NotFound),
            SessionError::Game(err) => Some(err.kind()),
            SessionError::Store(_) | SessionError::StoragePoisoned => None,
        }
    }
}

impl IntoErrorResponse for SessionError {
    fn status_code(&self) -> hyper::StatusCode {
        match self {
            SessionError::Game(err) => err.status_code(),
            SessionError::NotFound(_) => status_for_kind(ErrorKind::NotFound),
            SessionError::Store(StoreError::Unavailable(_)) => {
                hyper::StatusCode::SERVICE_UNAVAILABLE
            }
            SessionError::Store(_) | SessionError::StoragePoisoned => {
                hyper::StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "session_not_found",
            SessionError::Game(err) => err.error_code(),
            SessionError::Store(_) => "session_store_error",
            SessionError::StoragePoisoned => "session_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            SessionError::NotFound(id) => Some(serde_json::json!({ "session_id": id })),
            SessionError::Game(err) => err.error_details(),
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::StoragePoisoned => ErrorSeverity::Critical,
            SessionError::Store(StoreError::Corrupt(_)) => ErrorSeverity::Critical,
            SessionError::Store(_) => ErrorSeverity::Server,
            SessionError::Game(err) => err.severity(),
            SessionError::NotFound(_) => ErrorSeverity::Client,
        }
    }
}
