use super::*;
use commons_core::*;
use serde::Serialize;

/// A group of participants sharing one regenerating stock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    id: PoolId,
    stock: Stock,
    members: Vec<Handle>,
    depleted: bool,
}

impl Pool {
    pub fn new(id: PoolId, stock: Stock, members: Vec<Handle>) -> Self {
        Self {
            id,
            stock,
            members,
            depleted: false,
        }
    }
    pub fn id(&self) -> PoolId {
        self.id
    }
    pub fn stock(&self) -> Stock {
        self.stock
    }
    pub fn members(&self) -> &[Handle] {
        &self.members
    }
    pub fn is_depleted(&self) -> bool {
        self.depleted
    }
    pub fn contains(&self, handle: Handle) -> bool {
        self.members.contains(&handle)
    }
    /// Points a membership slot at a participant's new connection.
    pub fn rebind(&mut self, old: Handle, new: Handle) -> bool {
        match self.members.iter_mut().find(|m| **m == old) {
            Some(slot) => {
                *slot = new;
                true
            }
            None => false,
        }
    }
    /// Runs the round's harvest against this pool and stores the regenerated stock.
    /// Once depleted, a pool stays at zero and grants nothing.
    pub fn harvest(&mut self, requests: &[Request], cap: Stock) -> Harvest {
        let harvest = match self.depleted {
            true => Harvest::depleted(requests.len()),
            false => allocate(self.stock, requests, cap),
        };
        self.stock = harvest.after;
        self.depleted |= harvest.depleted;
        harvest
    }
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pool {}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn depletion_is_sticky() {
        let mut pool = Pool::new(1, 8., vec![Handle::default(); 4]);
        let first = pool.harvest(&[2, 4, 3, 4], 40.);
        assert!(first.depleted);
        assert!(pool.is_depleted());
        for _ in 0..3 {
            let next = pool.harvest(&[1, 1, 1, 1], 40.);
            assert_eq!(next.grants, vec![0.; 4]);
            assert_eq!(next.after, 0.);
            assert_eq!(pool.stock(), 0.);
        }
    }
    #[test]
    fn harvest_updates_stock() {
        let mut pool = Pool::new(1, 20., vec![Handle::default(); 4]);
        pool.harvest(&[3, 3, 3, 3], 40.);
        assert_eq!(pool.stock(), 16.);
        assert!(!pool.is_depleted());
    }
    #[test]
    fn rebind_replaces_member() {
        let old = Handle::default();
        let new = Handle::default();
        let mut pool = Pool::new(1, 20., vec![Handle::default(), old]);
        assert!(pool.rebind(old, new));
        assert!(pool.contains(new));
        assert!(!pool.contains(old));
        assert!(!pool.rebind(old, new));
    }
}
