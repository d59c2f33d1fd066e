use super::*;
use commons_core::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Lobby,
    Running,
    Complete,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Running => write!(f, "running"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// How soon the session wants its next snapshot out.
/// Ordered so that merging two requests keeps the more urgent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    /// Fine to coalesce with whatever comes next.
    Lazy,
    /// State-defining transition; send now regardless of throttling.
    Forced,
}

/// State machine for one classroom session.
///
/// Functional core of a room: every mutation happens through the methods
/// below, which validate before they touch anything. Outbound events are
/// queued in an outbox and drained by the owning [`Room`], which also
/// feeds wall-clock time in through [`Session::elapse`].
#[derive(Debug)]
pub struct Session {
    pub(crate) code: Code,
    config: Config,
    instructor_name: String,
    pub(crate) status: Status,
    round: Round,
    pub(crate) instructor: Option<Handle>,
    pub(crate) roster: Roster,
    pub(crate) pools: Vec<Pool>,
    rounds: Vec<RoundSummary>,
    pub(crate) scheduler: Scheduler,
    rng: SmallRng,
    outbox: Vec<Envelope>,
    urgency: Option<Urgency>,
}

impl Session {
    pub fn new(code: Code, config: Config, instructor_name: &str) -> Self {
        Self::with_rng(code, config, instructor_name, SmallRng::from_os_rng())
    }
    /// Reproducible session: same seed, same pools, same auto-fills.
    pub fn seeded(code: Code, config: Config, instructor_name: &str, seed: u64) -> Self {
        Self::with_rng(code, config, instructor_name, SmallRng::seed_from_u64(seed))
    }
    fn with_rng(code: Code, config: Config, instructor_name: &str, rng: SmallRng) -> Self {
        Self {
            scheduler: Scheduler::new(&config),
            code,
            config,
            instructor_name: instructor_name.to_string(),
            status: Status::Lobby,
            round: 0,
            instructor: None,
            roster: Roster::default(),
            pools: Vec::new(),
            rounds: Vec::new(),
            rng,
            outbox: Vec::new(),
            urgency: None,
        }
    }
    pub fn code(&self) -> &Code {
        &self.code
    }
    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn instructor_name(&self) -> &str {
        &self.instructor_name
    }
    pub fn status(&self) -> Status {
        self.status
    }
    pub fn round(&self) -> Round {
        self.round
    }
    pub fn instructor(&self) -> Option<Handle> {
        self.instructor
    }
    pub fn roster(&self) -> &Roster {
        &self.roster
    }
    pub fn participant(&self, handle: Handle) -> Option<&Participant> {
        self.roster.get(handle)
    }
    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }
    pub fn pool(&self, id: PoolId) -> Option<&Pool> {
        self.pools.iter().find(|p| p.id() == id)
    }
    pub fn rounds(&self) -> &[RoundSummary] {
        &self.rounds
    }
    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }
    /// Next instant at which [`Session::elapse`] has work to do.
    pub fn deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            code: self.code.clone(),
            status: self.status,
            round: self.round,
            config: self.config.clone(),
            participants: self.roster.iter().cloned().collect(),
            pools: self.pools.clone(),
            rounds: self.rounds.clone(),
        }
    }
    /// Takes every event queued since the last drain.
    pub fn drain(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.outbox)
    }
    /// Takes the pending snapshot request, if any.
    pub fn urgency(&mut self) -> Option<Urgency> {
        self.urgency.take()
    }
    /// Every participant the gateway can reach.
    pub fn everyone(&self) -> Vec<Handle> {
        self.roster.reachable()
    }
    /// Reachable participants, minus those stranded in a depleted pool.
    pub fn live(&self) -> Vec<Handle> {
        self.roster
            .iter()
            .filter(|p| p.is_reachable())
            .filter(|p| {
                p.pool_id()
                    .and_then(|id| self.pool(id))
                    .is_none_or(|pool| !pool.is_depleted())
            })
            .map(Participant::handle)
            .collect()
    }
}

/// Inbound actions. Each validates fully before mutating anything.
impl Session {
    pub fn join(&mut self, handle: Handle, name: &str, role: Role) -> Result<(), GameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::invalid("name is required"));
        }
        self.admit(handle, name, role)?;
        let joined = Event::Joined {
            code: self.code.clone(),
            role,
            status: self.status,
            config: self.config.clone(),
            round: self.round,
        };
        self.unicast(handle, joined);
        self.touch(Urgency::Lazy);
        log::info!("[session {}] {} joined as {}", self.code, name, role);
        Ok(())
    }
    pub fn start(&mut self, handle: Handle, now: Instant) -> Result<(), GameError> {
        if self.instructor != Some(handle) {
            return Err(GameError::Unauthorized("only the instructor can start the session"));
        }
        if self.status != Status::Lobby {
            return Err(GameError::InvalidState("session already started"));
        }
        if !self.roster.students().any(Participant::is_connected) {
            return Err(GameError::InvalidState("need at least one student to start"));
        }
        self.form_pools();
        self.status = Status::Running;
        self.touch(Urgency::Forced);
        log::info!("[session {}] started with {} pools", self.code, self.pools.len());
        self.begin_round(now);
        Ok(())
    }
    pub fn submit(&mut self, handle: Handle, requested: Request, now: Instant) -> Result<(), GameError> {
        if self.status != Status::Running {
            return Err(GameError::InvalidState("session not running"));
        }
        let pool = self
            .roster
            .get(handle)
            .filter(|p| p.is_student() && !p.is_synthetic())
            .and_then(Participant::pool_id)
            .and_then(|id| self.pool(id))
            .ok_or(GameError::Unauthorized("only active students can submit"))?;
        if pool.is_depleted() {
            return Err(GameError::InvalidState("pool is depleted"));
        }
        if requested > self.config.max_request {
            return Err(GameError::invalid(format!(
                "cannot request more than {}",
                self.config.max_request
            )));
        }
        self.scheduler.accept(handle, requested, now)?;
        log::debug!(
            "[session {}] round {}: {} of {} decisions in",
            self.code,
            self.round,
            self.scheduler.submitted(),
            self.pools.iter().filter(|p| !p.is_depleted()).map(|p| p.members().len()).sum::<usize>()
        );
        Ok(())
    }
}

/// Lifecycle transitions driven by the scheduler's clock.
impl Session {
    /// Runs whatever the clock has made due. Zero-length pauses chain
    /// within a single call.
    pub fn elapse(&mut self, now: Instant) {
        while let Some(phase) = self.scheduler.due(now) {
            match phase {
                Phase::Collecting { round } => {
                    if !self.finalize_round(round, now) {
                        break;
                    }
                }
                Phase::Revealing { round } if round >= self.config.rounds => {
                    if !self.complete() {
                        self.scheduler.cancel();
                        break;
                    }
                }
                Phase::Revealing { round } => self.countdown(round + 1, now),
                Phase::Countdown { .. } => match self.scheduler.tick(now) {
                    Some(Tick::Remaining(remaining)) => self.announce(remaining),
                    Some(Tick::Elapsed(_)) => self.begin_round(now),
                    None => break,
                },
                Phase::Idle | Phase::Finalizing { .. } | Phase::Done => break,
            }
        }
    }
    /// Computes and publishes the results of `round`.
    /// Returns false without touching state unless that round is collecting
    /// and its deadline has passed, so a second trigger is harmless.
    pub fn finalize_round(&mut self, round: Round, now: Instant) -> bool {
        if !self.scheduler.close(round, now) {
            log::debug!("[session {}] round {} not due for finalizing", self.code, round);
            return false;
        }
        let live = self
            .pools
            .iter()
            .filter(|p| !p.is_depleted())
            .flat_map(|p| p.members().iter().copied())
            .collect::<Vec<_>>();
        let filled = self
            .scheduler
            .fill(live, &mut self.rng, self.config.max_request);
        if !filled.is_empty() {
            log::debug!(
                "[session {}] round {}: auto-filled {} decisions",
                self.code,
                round,
                filled.len()
            );
        }
        let mut results = Vec::new();
        for pool in self.pools.iter_mut() {
            let decisions = pool
                .members()
                .iter()
                .map(|h| self.scheduler.decision(*h))
                .collect::<Vec<_>>();
            let requests = decisions
                .iter()
                .map(|d| d.map(|d| d.requested()).unwrap_or(0))
                .collect::<Vec<_>>();
            let harvest = pool.harvest(&requests, self.config.stock_cap);
            for ((handle, decision), granted) in pool
                .members()
                .iter()
                .zip(decisions.iter())
                .zip(harvest.grants.iter())
            {
                let Some(participant) = self.roster.get_mut(*handle) else {
                    continue;
                };
                participant.credit(*granted);
                let entry = Entry {
                    round,
                    pool_id: pool.id(),
                    requested: decision.map(|d| d.requested()).unwrap_or(0),
                    granted: *granted,
                    forced: decision.is_some_and(|d| d.is_forced()),
                    total: participant.total(),
                    pool_harvested: harvest.harvested,
                    stock_before: harvest.before,
                    stock_after: harvest.after,
                    depleted: harvest.depleted,
                };
                participant.record(entry.clone());
                results.push(Row {
                    handle: *handle,
                    name: participant.name().to_string(),
                    pool_id: pool.id(),
                    requested: entry.requested,
                    granted: entry.granted,
                    total: entry.total,
                    forced: entry.forced,
                });
                if participant.is_reachable() {
                    let history = participant.history().to_vec();
                    self.outbox.push(Envelope::new(
                        Recipients::One(*handle),
                        Event::RoundResult { entry, history },
                    ));
                }
            }
            log::info!(
                "[session {}] {} round {}: harvested {}, left {}, regenerated to {}{}",
                self.code,
                pool,
                round,
                harvest.harvested,
                harvest.before,
                harvest.after,
                if harvest.depleted { " (depleted)" } else { "" }
            );
        }
        let summary = RoundSummary { round, results };
        self.rounds.push(summary.clone());
        self.broadcast(Event::RoundSummary(summary));
        self.touch(Urgency::Forced);
        self.scheduler.reveal(now);
        true
    }
    /// Ends the session and splits what is left in each pool among its members.
    /// Pools keep their displayed stock. Returns false if the session was not
    /// running, so a repeated trigger is a no-op.
    pub fn complete(&mut self) -> bool {
        if self.status != Status::Running {
            return false;
        }
        self.scheduler.finish();
        self.status = Status::Complete;
        for pool in self.pools.iter().filter(|p| p.stock() > 0.) {
            let present = pool
                .members()
                .iter()
                .copied()
                .filter(|h| self.roster.contains(*h))
                .collect::<Vec<_>>();
            if present.is_empty() {
                continue;
            }
            let share = pool.stock() / present.len() as Stock;
            for handle in present.iter() {
                if let Some(participant) = self.roster.get_mut(*handle) {
                    participant.credit(share);
                }
            }
            log::info!(
                "[session {}] {} split {} left over, {:.2} each",
                self.code,
                pool,
                pool.stock(),
                share
            );
        }
        self.broadcast(Event::Complete {
            rounds: self.rounds.clone(),
        });
        self.touch(Urgency::Forced);
        log::info!("[session {}] complete", self.code);
        true
    }
    /// Disarms the clock. Only called when the owning room is torn down.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel();
    }
}

impl Session {
    /// Partitions human students into pools, topping the last one up with fillers.
    /// Order is shuffled so pools do not mirror join order.
    fn form_pools(&mut self) {
        let size = self.config.pool_size;
        let stock = self.config.initial_stock;
        let mut members = self
            .roster
            .students()
            .map(Participant::handle)
            .collect::<Vec<_>>();
        let shortfall = (size - members.len() % size) % size;
        for n in 1..=shortfall {
            let filler = Participant::filler(n);
            members.push(filler.handle());
            self.roster.push(filler);
        }
        members.shuffle(&mut self.rng);
        self.pools = members
            .chunks(size)
            .zip(1..)
            .map(|(chunk, id)| Pool::new(id, stock, chunk.to_vec()))
            .collect();
        for pool in self.pools.iter() {
            for handle in pool.members() {
                if let Some(participant) = self.roster.get_mut(*handle) {
                    participant.assign(pool.id());
                    if !participant.is_connected() {
                        participant.disconnect();
                    }
                }
            }
        }
        if shortfall > 0 {
            log::info!("[session {}] added {} filler(s)", self.code, shortfall);
        }
    }
    fn begin_round(&mut self, now: Instant) {
        self.round += 1;
        self.scheduler.begin(self.round, now);
        for pool in self.pools.iter().filter(|p| !p.is_depleted()) {
            for handle in pool.members() {
                if self.roster.get(*handle).is_some_and(Participant::is_reachable) {
                    self.outbox.push(Envelope::new(
                        Recipients::One(*handle),
                        Event::RoundStarted {
                            round: self.round,
                            duration: self.config.round_time,
                            stock: pool.stock(),
                            pool: pool.id(),
                        },
                    ));
                }
            }
        }
        self.touch(Urgency::Lazy);
        log::info!(
            "[session {}] round {} of {} started",
            self.code,
            self.round,
            self.config.rounds
        );
    }
    fn countdown(&mut self, next: Round, now: Instant) {
        match self.scheduler.countdown(next, now) {
            Some(remaining) => self.announce(remaining),
            None => self.begin_round(now),
        }
    }
    fn announce(&mut self, remaining: Seconds) {
        let event = Event::Countdown {
            remaining,
            next: self.round + 1,
        };
        let live = self.live();
        self.outbox.push(Envelope::new(Recipients::Many(live), event));
    }
    fn unicast(&mut self, handle: Handle, event: Event) {
        self.outbox.push(Envelope::new(Recipients::One(handle), event));
    }
    fn broadcast(&mut self, event: Event) {
        let everyone = self.everyone();
        self.outbox.push(Envelope::new(Recipients::Many(everyone), event));
    }
    pub(crate) fn touch(&mut self, urgency: Urgency) {
        self.urgency = self.urgency.max(Some(urgency));
    }
}
