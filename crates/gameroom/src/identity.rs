use super::*;

/// Outcome of looking up a presented (name, role) identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A record already exists under this identity; carries its current handle.
    Existing(Handle),
    /// Nobody by that name and role has been here.
    New,
}

impl Roster {
    pub fn resolve(&self, name: &str, role: Role) -> Resolution {
        self.iter()
            .find(|p| p.is(name, role))
            .map(|p| Resolution::Existing(p.handle()))
            .unwrap_or(Resolution::New)
    }
}

/// Reconnection handling: admitting connections, moving returning
/// participants onto new handles, and putting dropped ones on autopilot.
impl Session {
    /// Binds `handle` to the participant named by (name, role), creating
    /// the record when the identity is new.
    pub(crate) fn admit(&mut self, handle: Handle, name: &str, role: Role) -> Result<(), GameError> {
        match self.roster.get(handle) {
            Some(p) if p.is(name, role) => {}
            Some(_) => {
                return Err(GameError::InvalidState(
                    "connection already joined under another name",
                ));
            }
            None => match self.roster.resolve(name, role) {
                Resolution::Existing(old) => self.transplant(old, handle),
                Resolution::New if role == Role::Student && self.status != Status::Lobby => {
                    return Err(GameError::AlreadyStarted);
                }
                Resolution::New => self.roster.push(Participant::new(handle, name, role)),
            },
        }
        if role == Role::Instructor {
            self.crown(handle);
        }
        Ok(())
    }
    /// Moves an existing record, its pool slot and any pending decision
    /// from `old` onto `new`.
    fn transplant(&mut self, old: Handle, new: Handle) {
        if let Some(participant) = self.roster.get_mut(old) {
            participant.rebind(new);
            log::info!(
                "[session {}] {} reconnected ({} rounds of history)",
                self.code,
                participant.name(),
                participant.history().len()
            );
        }
        for pool in self.pools.iter_mut() {
            pool.rebind(old, new);
        }
        self.scheduler.rebind(old, new);
        if self.instructor == Some(old) {
            self.instructor = Some(new);
        }
    }
    /// Makes `handle` the session's only instructor.
    fn crown(&mut self, handle: Handle) {
        if let Some(previous) = self.instructor.filter(|h| *h != handle) {
            if let Some(participant) = self.roster.get_mut(previous) {
                participant.demote();
                log::info!(
                    "[session {}] {} replaced as instructor",
                    self.code,
                    participant.name()
                );
            }
        }
        if let Some(participant) = self.roster.get_mut(handle) {
            participant.reinstate();
        }
        self.instructor = Some(handle);
    }
    /// Marks a connection lost. Returns false for handles this session
    /// does not know.
    pub fn disconnect(&mut self, handle: Handle) -> bool {
        let Some(participant) = self.roster.get_mut(handle) else {
            return false;
        };
        participant.disconnect();
        log::info!(
            "[session {}] {} disconnected{}",
            self.code,
            participant.name(),
            if participant.is_autonomous() { ", now on autopilot" } else { "" }
        );
        if self.instructor == Some(handle) {
            log::warn!("[session {}] instructor disconnected", self.code);
        }
        self.touch(Urgency::Lazy);
        true
    }
}
