use super::*;
use commons_core::*;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Where a session's round cycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No round has started yet.
    Idle,
    /// Deadline armed, decisions accepted.
    Collecting { round: Round },
    /// Deadline passed; results are being computed.
    Finalizing { round: Round },
    /// Results published; pause before moving on.
    Revealing { round: Round },
    /// Ticking down to the next round.
    Countdown { next: Round, remaining: Seconds },
    /// No more rounds. Terminal.
    Done,
}

/// What a countdown tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Remaining(Seconds),
    Elapsed(Round),
}

/// Timing and decision collection for one session's rounds.
///
/// The scheduler is the only holder of the session's deadline and its
/// per-round decision set. Its phase tag doubles as the finalization guard:
/// a round closes only from `Collecting` and only after its deadline, so
/// overlapping triggers apply the transition exactly once.
#[derive(Debug)]
pub struct Scheduler {
    phase: Phase,
    timer: Timer,
    decisions: HashMap<Handle, Decision>,
    round_time: Duration,
    reveal_time: Duration,
    countdown_time: Seconds,
}

impl Scheduler {
    pub fn new(config: &Config) -> Self {
        Self {
            phase: Phase::Idle,
            timer: Timer::default(),
            decisions: HashMap::new(),
            round_time: config.round_duration(),
            reveal_time: config.reveal_duration(),
            countdown_time: config.countdown_time,
        }
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }
    pub fn decision(&self, handle: Handle) -> Option<Decision> {
        self.decisions.get(&handle).copied()
    }
    pub fn submitted(&self) -> usize {
        self.decisions.len()
    }
    /// The armed phase if its deadline has passed.
    pub fn due(&self, now: Instant) -> Option<Phase> {
        self.timer.expired(now).then_some(self.phase)
    }
}

impl Scheduler {
    /// Opens a round: forgets last round's decisions and arms the deadline.
    pub fn begin(&mut self, round: Round, now: Instant) {
        self.decisions.clear();
        self.timer.arm(now, self.round_time);
        self.phase = Phase::Collecting { round };
    }
    /// Records a participant's decision for the open round.
    /// Leaves the scheduler untouched when the decision is refused.
    pub fn accept(
        &mut self,
        handle: Handle,
        requested: Request,
        now: Instant,
    ) -> Result<(), GameError> {
        if !matches!(self.phase, Phase::Collecting { .. }) || self.timer.expired(now) {
            return Err(GameError::InvalidState("round is not accepting decisions"));
        }
        if self.decisions.contains_key(&handle) {
            return Err(GameError::InvalidState("decision already submitted this round"));
        }
        self.decisions.insert(handle, Decision::submitted(requested));
        Ok(())
    }
    /// Closes collection for `round`. Returns false, changing nothing, unless
    /// that round is still collecting and its deadline has passed.
    pub fn close(&mut self, round: Round, now: Instant) -> bool {
        match self.phase {
            Phase::Collecting { round: r } if r == round && self.timer.expired(now) => {
                self.timer.clear();
                self.phase = Phase::Finalizing { round };
                true
            }
            _ => false,
        }
    }
    /// Assigns a random decision to every listed participant who has none.
    /// Returns who was filled in.
    pub fn fill<I, R>(&mut self, handles: I, rng: &mut R, max: Request) -> Vec<Handle>
    where
        I: IntoIterator<Item = Handle>,
        R: Rng,
    {
        let missing = handles
            .into_iter()
            .filter(|h| !self.decisions.contains_key(h))
            .collect::<Vec<_>>();
        for handle in missing.iter() {
            self.decisions.insert(*handle, Decision::random(rng, max));
        }
        missing
    }
    /// Starts the results pause after a round has been finalized.
    pub fn reveal(&mut self, now: Instant) {
        if let Phase::Finalizing { round } = self.phase {
            self.timer.arm(now, self.reveal_time);
            self.phase = Phase::Revealing { round };
        }
    }
    /// Starts the countdown to round `next`. Returns the first tick,
    /// or None when the countdown is configured away.
    pub fn countdown(&mut self, next: Round, now: Instant) -> Option<Seconds> {
        match self.countdown_time {
            0 => None,
            remaining => {
                self.timer.arm(now, Duration::from_secs(1));
                self.phase = Phase::Countdown { next, remaining };
                Some(remaining)
            }
        }
    }
    /// Advances a countdown by one second.
    pub fn tick(&mut self, now: Instant) -> Option<Tick> {
        match self.phase {
            Phase::Countdown { next, remaining } if remaining > 1 => {
                self.timer.arm(now, Duration::from_secs(1));
                self.phase = Phase::Countdown {
                    next,
                    remaining: remaining - 1,
                };
                Some(Tick::Remaining(remaining - 1))
            }
            Phase::Countdown { next, .. } => {
                self.timer.clear();
                Some(Tick::Elapsed(next))
            }
            _ => None,
        }
    }
    /// Moves a pending decision to a participant's new connection.
    pub fn rebind(&mut self, old: Handle, new: Handle) {
        if let Some(decision) = self.decisions.remove(&old) {
            self.decisions.insert(new, decision);
        }
    }
    /// Ends the cycle for good and disarms the timer.
    pub fn finish(&mut self) {
        self.timer.clear();
        self.decisions.clear();
        self.phase = Phase::Done;
    }
    /// Disarms the timer without touching the phase. Used on teardown.
    pub fn cancel(&mut self) {
        self.timer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    fn scheduler() -> (Scheduler, Instant) {
        (Scheduler::new(&Config::default()), Instant::now())
    }
    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }
    #[test]
    fn round_does_not_close_before_deadline() {
        let (mut scheduler, now) = scheduler();
        scheduler.begin(1, now);
        assert!(!scheduler.close(1, now + secs(14)));
        assert_eq!(scheduler.phase(), Phase::Collecting { round: 1 });
        assert!(scheduler.close(1, now + secs(15)));
        assert_eq!(scheduler.phase(), Phase::Finalizing { round: 1 });
    }
    #[test]
    fn close_is_idempotent() {
        let (mut scheduler, now) = scheduler();
        scheduler.begin(1, now);
        assert!(scheduler.close(1, now + secs(15)));
        assert!(!scheduler.close(1, now + secs(15)));
        assert!(!scheduler.close(2, now + secs(15)));
    }
    #[test]
    fn duplicate_and_late_decisions_are_refused() {
        let (mut scheduler, now) = scheduler();
        let handle = Handle::default();
        assert!(scheduler.accept(handle, 3, now).is_err());
        scheduler.begin(1, now);
        assert!(scheduler.accept(handle, 3, now).is_ok());
        assert!(scheduler.accept(handle, 4, now).is_err());
        assert_eq!(scheduler.decision(handle), Some(Decision::submitted(3)));
        let late = Handle::default();
        assert!(scheduler.accept(late, 1, now + secs(15)).is_err());
        assert_eq!(scheduler.submitted(), 1);
    }
    #[test]
    fn fill_only_touches_missing() {
        let (mut scheduler, now) = scheduler();
        let ref mut rng = SmallRng::seed_from_u64(3);
        let answered = Handle::default();
        let silent = Handle::default();
        scheduler.begin(1, now);
        scheduler.accept(answered, 2, now).unwrap();
        let filled = scheduler.fill([answered, silent], rng, 5);
        assert_eq!(filled, vec![silent]);
        assert!(!scheduler.decision(answered).unwrap().is_forced());
        assert!(scheduler.decision(silent).unwrap().is_forced());
        assert!(scheduler.decision(silent).unwrap().requested() <= 5);
    }
    #[test]
    fn begin_clears_previous_decisions() {
        let (mut scheduler, now) = scheduler();
        let handle = Handle::default();
        scheduler.begin(1, now);
        scheduler.accept(handle, 2, now).unwrap();
        scheduler.begin(2, now + secs(30));
        assert!(scheduler.decision(handle).is_none());
    }
    #[test]
    fn countdown_ticks_down_then_elapses() {
        let (mut scheduler, now) = scheduler();
        scheduler.begin(1, now);
        scheduler.close(1, now + secs(15));
        scheduler.reveal(now + secs(15));
        assert_eq!(scheduler.due(now + secs(20)), Some(Phase::Revealing { round: 1 }));
        assert_eq!(scheduler.countdown(2, now + secs(20)), Some(10));
        let mut ticks = Vec::new();
        let mut t = now + secs(20);
        loop {
            t += secs(1);
            assert!(scheduler.due(t).is_some());
            match scheduler.tick(t) {
                Some(tick @ Tick::Elapsed(_)) => break ticks.push(tick),
                Some(tick) => ticks.push(tick),
                None => break,
            }
        }
        assert_eq!(ticks.len(), 10);
        assert_eq!(ticks[0], Tick::Remaining(9));
        assert_eq!(ticks[8], Tick::Remaining(1));
        assert_eq!(ticks[9], Tick::Elapsed(2));
        assert_eq!(t, now + secs(30));
    }
    #[test]
    fn zero_countdown_is_skipped() {
        let config = Config {
            countdown_time: 0,
            ..Config::default()
        };
        let mut scheduler = Scheduler::new(&config);
        assert_eq!(scheduler.countdown(2, Instant::now()), None);
    }
    #[test]
    fn rebind_moves_decision() {
        let (mut scheduler, now) = scheduler();
        let old = Handle::default();
        let new = Handle::default();
        scheduler.begin(1, now);
        scheduler.accept(old, 4, now).unwrap();
        scheduler.rebind(old, new);
        assert!(scheduler.decision(old).is_none());
        assert_eq!(scheduler.decision(new).map(|d| d.requested()), Some(4));
    }
    #[test]
    fn finish_disarms() {
        let (mut scheduler, now) = scheduler();
        scheduler.begin(1, now);
        scheduler.finish();
        assert_eq!(scheduler.phase(), Phase::Done);
        assert!(scheduler.deadline().is_none());
        assert!(scheduler.due(now + secs(60)).is_none());
    }
}
