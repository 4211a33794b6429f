//! Headless trial runner
//!
//! Wires one `TrialSession` to the phase scheduler, the random source and the
//! playthrough context. The terminal driver only forwards raw selections and
//! the current time; everything else happens here.

use super::phase::{Schedule, TimerToken};
use super::selection::Selection;
use super::state::{InputOutcome, TimerOutcome, TrialSession};
use crate::config::AppConfig;
use crate::error::Result;
use crate::registry::{PlaythroughContext, TrialId, TrialResult};
use crate::rng::RandomSource;
use crate::scheduler::PhaseScheduler;
use std::time::{Duration, Instant};

pub struct TrialRunner<R: RandomSource> {
    config: AppConfig,
    rng: R,
    scheduler: PhaseScheduler<TimerToken>,
    session: Option<TrialSession>,
    next_session_id: u64,
    /// Result of the current session already written to the registry
    recorded: bool,
}

impl<R: RandomSource> TrialRunner<R> {
    pub fn new(config: AppConfig, rng: R) -> Self {
        TrialRunner {
            config,
            rng,
            scheduler: PhaseScheduler::new(),
            session: None,
            next_session_id: 1,
            recorded: false,
        }
    }

    pub fn session(&self) -> Option<&TrialSession> {
        self.session.as_ref()
    }

    /// Enter a trial, abandoning any unfinished one first
    pub fn start(&mut self, trial: TrialId, now: Instant) -> &TrialSession {
        self.abandon();

        let id = self.next_session_id;
        self.next_session_id += 1;
        let (session, schedule) = TrialSession::start(id, self.config.trial(trial), &mut self.rng);
        self.recorded = false;
        self.arm(now, schedule);
        self.session.insert(session)
    }

    /// Forward one raw selection from the presentation layer
    pub fn select(
        &mut self,
        raw: i64,
        now: Instant,
        ctx: &mut PlaythroughContext,
    ) -> Result<InputOutcome> {
        let Some(session) = self.session.as_mut() else {
            return Ok(InputOutcome::Ignored);
        };
        let selection = Selection::validate(session.trial(), raw).map_err(|e| {
            tracing::warn!(error = %e, "rejected selection");
            e
        })?;

        let outcome = session.handle_input(selection, &mut self.rng);
        if let InputOutcome::Accepted { schedule, .. } = outcome {
            self.arm(now, schedule);
        }
        self.record_if_finished(ctx);
        Ok(outcome)
    }

    /// Fire every due timer. Returns how many advanced the session.
    pub fn advance(&mut self, now: Instant, ctx: &mut PlaythroughContext) -> usize {
        let mut advanced = 0;
        for fired in self.scheduler.drain_due(now) {
            let Some(session) = self.session.as_mut() else {
                tracing::debug!(owner = fired.owner, "timer fired with no active trial");
                continue;
            };
            if session.id() != fired.owner {
                tracing::debug!(
                    timer = ?fired.id,
                    owner = fired.owner,
                    superseded = fired.superseded,
                    "timer for abandoned session"
                );
                continue;
            }
            match session.on_timer(fired.event, &mut self.rng) {
                TimerOutcome::Advanced { schedule } => {
                    advanced += 1;
                    self.arm(now, schedule);
                }
                TimerOutcome::Stale => {}
            }
        }
        self.record_if_finished(ctx);
        advanced
    }

    /// Drop the current session. An unfinished trial leaves the registry as is.
    pub fn abandon(&mut self) {
        if let Some(session) = self.session.take() {
            if !session.phase().is_finished() {
                tracing::info!(
                    session = session.id(),
                    trial = %session.trial(),
                    round = session.round_index(),
                    "trial abandoned"
                );
            }
            self.scheduler.forget(session.id());
        }
    }

    /// Acknowledge a finished trial and leave it
    pub fn exit(&mut self) -> Option<TrialResult> {
        let result = self.session.as_ref().and_then(TrialSession::result);
        if result.is_some() {
            self.session = None;
        }
        result
    }

    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.scheduler.time_until_next(now)
    }

    fn arm(&mut self, now: Instant, schedule: Option<Schedule>) {
        if let Some(s) = schedule {
            self.scheduler.after(now, s.delay, s.token.session_id, s.token);
        }
    }

    fn record_if_finished(&mut self, ctx: &mut PlaythroughContext) {
        if self.recorded {
            return;
        }
        if let Some(session) = &self.session {
            if let Some(result) = session.result() {
                ctx.registry.set(session.trial(), result);
                self.recorded = true;
            }
        }
    }
}
