use commons_core::*;
use rand::Rng;

/// One participant's request for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    requested: Request,
    forced: bool,
}

impl Decision {
    /// Submitted by the participant before the deadline.
    pub fn submitted(requested: Request) -> Self {
        Self {
            requested,
            forced: false,
        }
    }
    /// Filled in at the deadline for someone who never answered.
    /// Uniform over the whole legal range, so silence is not a safe zero.
    pub fn random<R>(rng: &mut R, max: Request) -> Self
    where
        R: Rng,
    {
        Self {
            requested: rng.random_range(0..=max),
            forced: true,
        }
    }
    pub fn requested(&self) -> Request {
        self.requested
    }
    pub fn is_forced(&self) -> bool {
        self.forced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    #[test]
    fn random_stays_in_range_and_covers_it() {
        let ref mut rng = SmallRng::seed_from_u64(11);
        let draws = (0..1000)
            .map(|_| Decision::random(rng, 5))
            .collect::<Vec<_>>();
        assert!(draws.iter().all(|d| d.is_forced()));
        assert!(draws.iter().all(|d| d.requested() <= 5));
        assert!(draws.iter().any(|d| d.requested() == 0));
        assert!(draws.iter().any(|d| d.requested() == 5));
    }
}
