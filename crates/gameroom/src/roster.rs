use super::*;

/// Every participant of one session, in join order.
/// Records are never removed; a lost connection only flips flags.
#[derive(Debug, Default)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn get(&self, handle: Handle) -> Option<&Participant> {
        self.participants.iter().find(|p| p.handle() == handle)
    }
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.handle() == handle)
    }
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }
    pub fn push(&mut self, participant: Participant) {
        self.participants.push(participant);
    }
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }
    pub fn len(&self) -> usize {
        self.participants.len()
    }
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
    /// Human students, connected or not.
    pub fn students(&self) -> impl Iterator<Item = &Participant> {
        self.iter().filter(|p| p.is_student() && !p.is_synthetic())
    }
    /// Handles the gateway can currently reach.
    pub fn reachable(&self) -> Vec<Handle> {
        self.iter()
            .filter(|p| p.is_reachable())
            .map(Participant::handle)
            .collect()
    }
}
