use super::*;
use commons_core::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::RwLock;
use tokio::sync::oneshot;

/// Manages active sessions and their rooms' lifecycles.
///
/// Owns no game state itself: each session lives inside its room task and
/// the registry only maps codes to the handles of those tasks. Rooms remove
/// themselves once they exit.
pub struct Registry {
    rooms: RwLock<HashMap<Code, RoomHandle>>,
    gateway: Arc<dyn Gateway>,
    settings: Settings,
    rng: Mutex<SmallRng>,
}

impl Registry {
    pub fn new(gateway: Arc<dyn Gateway>, settings: Settings) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            gateway,
            settings,
            rng: Mutex::new(SmallRng::from_os_rng()),
        }
    }
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

impl Registry {
    /// Opens a new session under a fresh code.
    /// Spawns the room task plus a watcher that unregisters it on exit.
    pub async fn create(
        self: &Arc<Self>,
        instructor_name: &str,
        overrides: Overrides,
    ) -> Result<(Code, Config), GameError> {
        let instructor_name = instructor_name.trim();
        if instructor_name.is_empty() {
            return Err(GameError::invalid("instructor name is required"));
        }
        let config = Config::default().merge(overrides)?;
        let mut rooms = self.rooms.write().await;
        let code = {
            let mut rng = self.rng.lock().map_err(|_| GameError::Closed)?;
            Code::unique(&mut *rng, |c| rooms.contains_key(c))
        };
        let session = Session::new(code.clone(), config.clone(), instructor_name);
        let (room, handle) = Room::new(session, self.gateway.clone(), self.settings);
        let (done_tx, done_rx) = oneshot::channel();
        let id = handle.id;
        rooms.insert(code.clone(), handle);
        drop(rooms);
        tokio::spawn(room.run(done_tx));
        let registry = self.clone();
        let watched = code.clone();
        tokio::spawn(async move {
            let _ = done_rx.await;
            registry.remove_if(&watched, id).await;
            log::info!("[registry] session {} cleaned up", watched);
        });
        log::info!("[registry] created session {} for {}", code, instructor_name);
        Ok((code, config))
    }
    /// Finds a live session. Typed codes are normalized first.
    pub async fn lookup(&self, code: &str) -> Result<RoomHandle, GameError> {
        self.rooms
            .read()
            .await
            .get(&Code::from(code))
            .cloned()
            .ok_or(GameError::NotFound)
    }
    /// Shuts a session down and forgets it.
    pub async fn remove(&self, code: &str) -> Result<(), GameError> {
        self.rooms
            .write()
            .await
            .remove(&Code::from(code))
            .map(|handle| handle.shutdown())
            .ok_or(GameError::NotFound)
    }
    /// Unregisters `code` only if it still points at room `id`.
    async fn remove_if(&self, code: &Code, id: ID<Room>) {
        let mut rooms = self.rooms.write().await;
        if rooms.get(code).is_some_and(|h| h.id == id) {
            rooms.remove(code);
        }
    }
}

/// Routing of inbound actions to the owning room.
impl Registry {
    pub async fn join(&self, code: &str, handle: Handle, name: &str, role: Role) -> Result<(), GameError> {
        self.lookup(code).await?.join(handle, name, role).await.map_err(gone)
    }
    pub async fn start(&self, code: &str, handle: Handle) -> Result<(), GameError> {
        self.lookup(code).await?.start(handle).await.map_err(gone)
    }
    pub async fn submit(&self, code: &str, handle: Handle, amount: f64) -> Result<(), GameError> {
        let amount = Protocol::request(amount)?;
        self.lookup(code).await?.submit(handle, amount).await.map_err(gone)
    }
    pub async fn disconnect(&self, code: &str, handle: Handle) {
        if let Ok(room) = self.lookup(code).await {
            room.disconnect(handle);
        }
    }
    pub async fn snapshot(&self, code: &str) -> Result<Snapshot, GameError> {
        self.lookup(code).await?.snapshot().await.map_err(gone)
    }
    /// Routes a decoded client message. A refusal goes back to the caller
    /// as an error notice and is also returned.
    pub async fn dispatch(&self, handle: Handle, message: ClientMessage) -> Result<(), GameError> {
        let code = message.code();
        let result = match message {
            ClientMessage::JoinSession {
                player_name, role, ..
            } => self.join(code.as_str(), handle, &player_name, role).await,
            ClientMessage::StartSession { .. } => self.start(code.as_str(), handle).await,
            ClientMessage::SubmitDecision { amount, .. } => {
                self.submit(code.as_str(), handle, amount).await
            }
        };
        if let Err(ref e) = result {
            log::debug!("[registry] {} refused in {}: {}", handle, code, e);
            self.gateway
                .deliver(&Recipients::One(handle), &Event::Error(e.clone()));
        }
        result
    }
}

/// A room that shut down between lookup and reply is as good as missing.
fn gone(e: GameError) -> GameError {
    match e {
        GameError::Closed => GameError::NotFound,
        e => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn registry() -> (Arc<Registry>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let settings = Settings {
            throttle: Duration::from_millis(250),
            linger: Duration::from_secs(5),
        };
        (Arc::new(Registry::new(recorder.clone(), settings)), recorder)
    }

    #[tokio::test(start_paused = true)]
    async fn create_then_lookup_normalized_code() {
        let (registry, _) = registry();
        let (code, config) = registry.create("Ms. K", Overrides::default()).await.unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(code.as_str().len(), CODE_LENGTH);
        let typed = format!("  {} ", code.as_str().to_lowercase());
        assert_eq!(registry.lookup(&typed).await.unwrap().code, code);
        assert_eq!(registry.len().await, 1);
    }
    #[tokio::test(start_paused = true)]
    async fn create_validates_input() {
        let (registry, _) = registry();
        let blank = registry.create("  ", Overrides::default()).await.unwrap_err();
        assert_eq!(blank.reason(), "invalid_input");
        let overrides = Overrides {
            rounds: Some(0),
            ..Overrides::default()
        };
        let zero = registry.create("Ms. K", overrides).await.unwrap_err();
        assert_eq!(zero.reason(), "invalid_input");
        assert!(registry.is_empty().await);
    }
    #[tokio::test(start_paused = true)]
    async fn endless_round_is_refused_at_creation() {
        let (registry, _) = registry();
        let overrides = Overrides {
            round_time: Some(u64::MAX),
            ..Overrides::default()
        };
        let err = registry.create("Ms. K", overrides).await.unwrap_err();
        assert_eq!(err.reason(), "invalid_input");
        assert!(registry.is_empty().await);
        let overrides = Overrides {
            round_time: Some(MAX_PHASE_TIME),
            ..Overrides::default()
        };
        let (code, _) = registry.create("Ms. K", overrides).await.unwrap();
        let instructor = Handle::default();
        registry
            .join(code.as_str(), instructor, "Ms. K", Role::Instructor)
            .await
            .unwrap();
        registry
            .join(code.as_str(), Handle::default(), "ada", Role::Student)
            .await
            .unwrap();
        registry.start(code.as_str(), instructor).await.unwrap();
        let snapshot = registry.snapshot(code.as_str()).await.unwrap();
        assert_eq!(snapshot.status, Status::Running);
    }
    #[tokio::test(start_paused = true)]
    async fn unknown_code_is_not_found() {
        let (registry, _) = registry();
        let err = registry.join("ZZZZ", Handle::default(), "ada", Role::Student).await;
        assert_eq!(err, Err(GameError::NotFound));
        assert_eq!(registry.remove("ZZZZ").await, Err(GameError::NotFound));
    }
    #[tokio::test(start_paused = true)]
    async fn codes_are_unique_across_sessions() {
        let (registry, _) = registry();
        let mut codes = std::collections::HashSet::new();
        for i in 0..50 {
            let (code, _) = registry
                .create(&format!("instructor {}", i), Overrides::default())
                .await
                .unwrap();
            assert!(codes.insert(code));
        }
        assert_eq!(registry.len().await, 50);
    }
    #[tokio::test(start_paused = true)]
    async fn dispatch_reports_errors_to_caller() {
        let (registry, recorder) = registry();
        let (code, _) = registry.create("Ms. K", Overrides::default()).await.unwrap();
        let student = Handle::default();
        let join = ClientMessage::JoinSession {
            session_code: code.to_string(),
            player_name: "ada".into(),
            role: Role::Student,
        };
        assert!(registry.dispatch(student, join).await.is_ok());
        let start = ClientMessage::StartSession {
            session_code: code.to_string(),
        };
        let err = registry.dispatch(student, start).await.unwrap_err();
        assert_eq!(err.reason(), "unauthorized");
        let fractional = ClientMessage::SubmitDecision {
            session_code: code.to_string(),
            amount: 1.5,
        };
        let err = registry.dispatch(student, fractional).await.unwrap_err();
        assert_eq!(err.reason(), "invalid_input");
        let errors = recorder
            .inbox(student)
            .into_iter()
            .filter(|e| matches!(e, Event::Error(_)))
            .count();
        assert_eq!(errors, 2);
    }
    #[tokio::test(start_paused = true)]
    async fn late_student_gets_distinct_error() {
        let (registry, _) = registry();
        let (code, _) = registry.create("Ms. K", Overrides::default()).await.unwrap();
        let instructor = Handle::default();
        let student = Handle::default();
        registry
            .join(code.as_str(), instructor, "Ms. K", Role::Instructor)
            .await
            .unwrap();
        registry
            .join(code.as_str(), student, "ada", Role::Student)
            .await
            .unwrap();
        registry.start(code.as_str(), instructor).await.unwrap();
        let err = registry
            .join(code.as_str(), Handle::default(), "bob", Role::Student)
            .await
            .unwrap_err();
        assert_eq!(err, GameError::AlreadyStarted);
        registry.disconnect(code.as_str(), student).await;
        let back = Handle::default();
        registry
            .join(code.as_str(), back, "ada", Role::Student)
            .await
            .unwrap();
        let snapshot = registry.snapshot(code.as_str()).await.unwrap();
        let ada = snapshot
            .participants
            .iter()
            .find(|p| p.name() == "ada")
            .unwrap();
        assert_eq!(ada.handle(), back);
        assert!(ada.pool_id().is_some());
    }
    #[tokio::test(start_paused = true)]
    async fn removed_session_is_gone() {
        let (registry, _) = registry();
        let (code, _) = registry.create("Ms. K", Overrides::default()).await.unwrap();
        let room = registry.lookup(code.as_str()).await.unwrap();
        registry.remove(code.as_str()).await.unwrap();
        assert_eq!(registry.lookup(code.as_str()).await.unwrap_err(), GameError::NotFound);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(room.is_closed());
    }
    #[tokio::test(start_paused = true)]
    async fn completed_session_unregisters_after_linger() {
        let (registry, _) = registry();
        let overrides = Overrides {
            rounds: Some(1),
            ..Overrides::default()
        };
        let (code, _) = registry.create("Ms. K", overrides).await.unwrap();
        let instructor = Handle::default();
        registry
            .join(code.as_str(), instructor, "Ms. K", Role::Instructor)
            .await
            .unwrap();
        registry
            .join(code.as_str(), Handle::default(), "ada", Role::Student)
            .await
            .unwrap();
        registry.start(code.as_str(), instructor).await.unwrap();
        tokio::time::sleep(Duration::from_secs(21)).await;
        let snapshot = registry.snapshot(code.as_str()).await.unwrap();
        assert_eq!(snapshot.status, Status::Complete);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(registry.lookup(code.as_str()).await.is_err());
    }
}
