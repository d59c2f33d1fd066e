use commons_core::*;
use serde::Deserialize;
use serde::Serialize;

/// Marker type for connection handles.
/// A handle names one live transport connection and changes on reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection;

/// Volatile per-connection identity of a participant.
pub type Handle = ID<Connection>;

/// Pool identifier, 1-based.
pub type PoolId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Instructor,
    Student,
    Observer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instructor => write!(f, "instructor"),
            Self::Student => write!(f, "student"),
            Self::Observer => write!(f, "observer"),
        }
    }
}

/// One participant's outcome for one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub round: Round,
    pub pool_id: PoolId,
    pub requested: Request,
    pub granted: Stock,
    pub forced: bool,
    /// Cumulative total after this round.
    pub total: Stock,
    /// Everything the pool gave up this round.
    pub pool_harvested: Stock,
    pub stock_before: Stock,
    pub stock_after: Stock,
    pub depleted: bool,
}

/// A person (or synthetic filler) in a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(rename = "id")]
    handle: Handle,
    name: String,
    role: Role,
    connected: bool,
    total: Stock,
    history: Vec<Entry>,
    pool_id: Option<PoolId>,
    autonomous: bool,
    synthetic: bool,
    #[serde(skip)]
    deposed: bool,
}

impl Participant {
    pub fn new(handle: Handle, name: &str, role: Role) -> Self {
        Self {
            handle,
            name: name.to_string(),
            role,
            connected: true,
            total: 0.,
            history: Vec::new(),
            pool_id: None,
            autonomous: false,
            synthetic: false,
            deposed: false,
        }
    }
    /// Synthetic student that tops up an incomplete pool.
    pub fn filler(n: usize) -> Self {
        Self {
            autonomous: true,
            synthetic: true,
            ..Self::new(Handle::default(), &format!("AI Player {}", n), Role::Student)
        }
    }
    pub fn handle(&self) -> Handle {
        self.handle
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn role(&self) -> Role {
        self.role
    }
    pub fn total(&self) -> Stock {
        self.total
    }
    pub fn history(&self) -> &[Entry] {
        &self.history
    }
    pub fn pool_id(&self) -> Option<PoolId> {
        self.pool_id
    }
    pub fn is_connected(&self) -> bool {
        self.connected
    }
    pub fn is_autonomous(&self) -> bool {
        self.autonomous
    }
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
    /// A live person with an open connection; the only kind of
    /// participant the gateway can reach.
    pub fn is_reachable(&self) -> bool {
        self.connected && !self.synthetic
    }
    /// Matches an identity presented by a new connection.
    /// Fillers never match, so nobody can take one over by name. A replaced
    /// instructor still answers to the instructor role.
    pub fn is(&self, name: &str, role: Role) -> bool {
        let role = self.role == role || (self.deposed && role == Role::Instructor);
        !self.synthetic && role && self.name == name
    }
}

impl Participant {
    pub fn assign(&mut self, pool: PoolId) {
        self.pool_id = Some(pool);
    }
    /// Adds to the cumulative total. Totals never decrease.
    pub fn credit(&mut self, amount: Stock) {
        debug_assert!(amount >= 0.);
        self.total += amount.max(0.);
    }
    pub fn record(&mut self, entry: Entry) {
        self.history.push(entry);
    }
    /// Moves this record onto a new connection and hands control back to the person.
    pub fn rebind(&mut self, handle: Handle) {
        self.handle = handle;
        self.connected = true;
        self.autonomous = self.synthetic;
    }
    /// Marks the connection lost. Students already placed in a pool keep
    /// playing on autopilot so rounds never wait on them.
    pub fn disconnect(&mut self) {
        self.connected = false;
        if self.is_student() && self.pool_id.is_some() {
            self.autonomous = true;
        }
    }
    pub fn demote(&mut self) {
        self.role = Role::Observer;
        self.deposed = true;
    }
    /// Gives a replaced instructor their role back.
    pub fn reinstate(&mut self) {
        if self.deposed {
            self.role = Role::Instructor;
            self.deposed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn fillers_are_autonomous_students() {
        let filler = Participant::filler(2);
        assert_eq!(filler.name(), "AI Player 2");
        assert!(filler.is_student());
        assert!(filler.is_autonomous());
        assert!(!filler.is_reachable());
        assert!(!filler.is("AI Player 2", Role::Student));
    }
    #[test]
    fn disconnect_in_pool_turns_on_autopilot() {
        let mut student = Participant::new(Handle::default(), "ada", Role::Student);
        student.disconnect();
        assert!(!student.is_autonomous());
        student.assign(1);
        student.disconnect();
        assert!(student.is_autonomous());
        let handle = Handle::default();
        student.rebind(handle);
        assert_eq!(student.handle(), handle);
        assert!(student.is_connected());
        assert!(!student.is_autonomous());
    }
    #[test]
    fn replaced_instructor_answers_to_instructor_role() {
        let mut host = Participant::new(Handle::default(), "Ms. K", Role::Instructor);
        host.demote();
        assert_eq!(host.role(), Role::Observer);
        assert!(host.is("Ms. K", Role::Instructor));
        host.reinstate();
        assert_eq!(host.role(), Role::Instructor);
        let mut parent = Participant::new(Handle::default(), "Ms. K", Role::Observer);
        parent.reinstate();
        assert_eq!(parent.role(), Role::Observer);
        assert!(!parent.is("Ms. K", Role::Instructor));
    }
    #[test]
    fn credit_accumulates() {
        let mut student = Participant::new(Handle::default(), "ada", Role::Student);
        student.credit(2.5);
        student.credit(1.25);
        assert_eq!(student.total(), 3.75);
    }
    #[test]
    fn serializes_handle_as_id() {
        let student = Participant::new(Handle::default(), "ada", Role::Student);
        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["id"], student.handle().to_string());
        assert_eq!(json["role"], "student");
        assert!(json["poolId"].is_null());
    }
}
