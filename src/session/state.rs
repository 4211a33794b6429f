//! Trial session state machine
//!
//! Maintains:
//! - Current round (1-based) and correct count
//! - Phase of the current round
//! - Trial-specific round payload
//! - Generation counter used to reject stale timers

use super::payload::{CardDeal, MotorRun, PredictionRound, RoundPayload};
use super::phase::{Phase, Schedule, TimerToken};
use super::selection::Selection;
use crate::config::TrialConfig;
use crate::registry::{TrialId, TrialResult};
use crate::rng::RandomSource;
use std::time::Duration;

/// What happened to an input event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// Arrived outside `WaitingForInput`; nothing changed
    Ignored,
    /// Scored; `schedule` is the next timer to arm, if any
    Accepted {
        correct: bool,
        schedule: Option<Schedule>,
    },
}

/// What happened to a timer callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Token belongs to another session or an earlier phase
    Stale,
    Advanced { schedule: Option<Schedule> },
}

/// One trial from entry to `Finished`
#[derive(Clone, Debug)]
pub struct TrialSession {
    id: u64,
    config: TrialConfig,
    round_index: u32,
    correct_count: u32,
    phase: Phase,
    payload: RoundPayload,
    generation: u64,
    last_correct: Option<bool>,
}

impl TrialSession {
    /// Enter round 1. Returns the timer to arm when the trial has a
    /// presentation delay; otherwise the session already waits for input.
    pub fn start<R: RandomSource + ?Sized>(
        id: u64,
        config: TrialConfig,
        rng: &mut R,
    ) -> (Self, Option<Schedule>) {
        let payload = match config.trial {
            TrialId::Clairvoyance => RoundPayload::Cards(CardDeal::deal(rng)),
            TrialId::Precognition => RoundPayload::Prediction(PredictionRound::new()),
            TrialId::Telekinesis => {
                RoundPayload::Motor(MotorRun::new(&config.arena, config.total_rounds))
            }
        };

        let mut session = TrialSession {
            id,
            config,
            round_index: 1,
            correct_count: 0,
            phase: Phase::Presenting,
            payload,
            generation: 0,
            last_correct: None,
        };
        tracing::debug!(session = id, trial = %config.trial, "trial started");
        let schedule = session.enter_presenting();
        (session, schedule)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn trial(&self) -> TrialId {
        self.config.trial
    }

    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn total_rounds(&self) -> u32 {
        self.config.total_rounds
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn payload(&self) -> &RoundPayload {
        &self.payload
    }

    /// Correctness of the most recently revealed round
    pub fn last_correct(&self) -> Option<bool> {
        self.last_correct
    }

    /// Token a timer armed now would need to carry
    pub fn current_token(&self) -> TimerToken {
        TimerToken {
            session_id: self.id,
            generation: self.generation,
        }
    }

    /// Forward one validated selection
    pub fn handle_input<R: RandomSource + ?Sized>(
        &mut self,
        selection: Selection,
        rng: &mut R,
    ) -> InputOutcome {
        if !self.phase.accepts_input() {
            tracing::trace!(session = self.id, phase = %self.phase, "input ignored");
            return InputOutcome::Ignored;
        }

        let value = selection.value();
        let correct = match &mut self.payload {
            RoundPayload::Cards(deal) => deal.is_correct(value),
            RoundPayload::Prediction(round) => round.commit(value, rng),
            RoundPayload::Motor(run) => run.push(rng),
        };
        if correct {
            self.correct_count += 1;
        }
        self.last_correct = Some(correct);
        self.transition(Phase::Revealing);

        let delay = if self.is_last_round() {
            self.config.final_delay
        } else {
            self.config.feedback_delay
        };
        let schedule = if delay.is_zero() {
            self.finish_reveal(rng)
        } else {
            Some(self.schedule(delay))
        };
        InputOutcome::Accepted { correct, schedule }
    }

    /// Fire a timer previously returned by this session
    pub fn on_timer<R: RandomSource + ?Sized>(
        &mut self,
        token: TimerToken,
        rng: &mut R,
    ) -> TimerOutcome {
        if token != self.current_token() {
            tracing::debug!(session = self.id, ?token, "stale timer ignored");
            return TimerOutcome::Stale;
        }
        let schedule = match self.phase {
            Phase::Presenting => {
                self.transition(Phase::WaitingForInput);
                None
            }
            Phase::Revealing => self.finish_reveal(rng),
            Phase::WaitingForInput | Phase::Finished => return TimerOutcome::Stale,
        };
        TimerOutcome::Advanced { schedule }
    }

    /// Final result, only once the session is `Finished`
    pub fn result(&self) -> Option<TrialResult> {
        if !self.phase.is_finished() {
            return None;
        }
        Some(match &self.payload {
            RoundPayload::Motor(run) => TrialResult::Score {
                points: run.score(),
            },
            RoundPayload::Cards(_) | RoundPayload::Prediction(_) => TrialResult::Tally {
                correct: self.correct_count,
                trials: self.config.total_rounds,
            },
        })
    }

    fn is_last_round(&self) -> bool {
        self.round_index >= self.config.total_rounds
    }

    fn schedule(&self, delay: Duration) -> Schedule {
        Schedule {
            delay,
            token: self.current_token(),
        }
    }

    fn transition(&mut self, next: Phase) {
        tracing::debug!(
            session = self.id,
            trial = %self.config.trial,
            round = self.round_index,
            from = %self.phase,
            to = %next,
            "phase transition"
        );
        self.phase = next;
        self.generation += 1;
    }

    fn enter_presenting(&mut self) -> Option<Schedule> {
        let delay = self.config.presentation_delay;
        if delay.is_zero() {
            self.transition(Phase::WaitingForInput);
            None
        } else {
            Some(self.schedule(delay))
        }
    }

    /// Revealing -> next round's Presenting, or Finished after the last round
    fn finish_reveal<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Option<Schedule> {
        if self.is_last_round() {
            self.transition(Phase::Finished);
            return None;
        }

        self.round_index += 1;
        match &mut self.payload {
            RoundPayload::Cards(deal) => *deal = CardDeal::deal(rng),
            RoundPayload::Prediction(round) => *round = PredictionRound::new(),
            RoundPayload::Motor(_) => {}
        }
        self.transition(Phase::Presenting);
        self.enter_presenting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::rng::{ScriptedRandom, StdRandom};
    use crate::session::selection::max_selection;
    use proptest::prelude::*;

    fn config(trial: TrialId) -> TrialConfig {
        AppConfig::default().trial(trial)
    }

    fn pick(trial: TrialId, raw: i64) -> Selection {
        Selection::validate(trial, raw).unwrap()
    }

    /// Fire the returned timer until the session waits for input or finishes
    fn settle<R: RandomSource>(
        session: &mut TrialSession,
        mut schedule: Option<Schedule>,
        rng: &mut R,
    ) {
        while let Some(s) = schedule {
            schedule = match session.on_timer(s.token, rng) {
                TimerOutcome::Advanced { schedule } => schedule,
                TimerOutcome::Stale => panic!("own timer was stale"),
            };
        }
    }

    fn assert_invariants(session: &TrialSession) {
        assert!(session.correct_count() <= session.round_index());
        assert!(session.round_index() <= session.total_rounds());
        assert!(session.round_index() >= 1);
    }

    #[test]
    fn test_clairvoyance_starts_waiting() {
        let mut rng = ScriptedRandom::new(&[0, 1, 0, 0]);
        let (session, schedule) = TrialSession::start(1, config(TrialId::Clairvoyance), &mut rng);
        assert_eq!(schedule, None);
        assert_eq!(session.phase(), Phase::WaitingForInput);
        assert_eq!(session.round_index(), 1);
    }

    #[test]
    fn test_precognition_presents_for_five_seconds() {
        let mut rng = ScriptedRandom::new(&[]);
        let (mut session, schedule) =
            TrialSession::start(1, config(TrialId::Precognition), &mut rng);
        assert_eq!(session.phase(), Phase::Presenting);
        let schedule = schedule.unwrap();
        assert_eq!(schedule.delay, Duration::from_millis(5000));

        // input during the concentrate phase is dropped and draws nothing
        let outcome = session.handle_input(pick(TrialId::Precognition, 3), &mut rng);
        assert_eq!(outcome, InputOutcome::Ignored);

        settle(&mut session, Some(schedule), &mut rng);
        assert_eq!(session.phase(), Phase::WaitingForInput);
    }

    #[test]
    fn test_second_input_is_ignored() {
        let mut rng = ScriptedRandom::new(&[0, 0, 0, 0]);
        let (mut session, _) = TrialSession::start(1, config(TrialId::Clairvoyance), &mut rng);
        let first = session.handle_input(pick(TrialId::Clairvoyance, 0), &mut rng);
        assert!(matches!(first, InputOutcome::Accepted { correct: true, .. }));
        assert_eq!(session.phase(), Phase::Revealing);

        let second = session.handle_input(pick(TrialId::Clairvoyance, 0), &mut rng);
        assert_eq!(second, InputOutcome::Ignored);
        assert_eq!(session.correct_count(), 1);
    }

    #[test]
    fn test_stale_token_is_noop() {
        let mut rng = ScriptedRandom::new(&[0, 0, 0, 0, 1, 1, 0, 0]);
        let (mut session, _) = TrialSession::start(4, config(TrialId::Clairvoyance), &mut rng);
        let old = session.current_token();
        let InputOutcome::Accepted { schedule, .. } =
            session.handle_input(pick(TrialId::Clairvoyance, 2), &mut rng)
        else {
            panic!("input should be accepted");
        };

        assert_eq!(session.on_timer(old, &mut rng), TimerOutcome::Stale);
        let foreign = TimerToken {
            session_id: 99,
            ..session.current_token()
        };
        assert_eq!(session.on_timer(foreign, &mut rng), TimerOutcome::Stale);
        assert_eq!(session.phase(), Phase::Revealing);

        settle(&mut session, schedule, &mut rng);
        assert_eq!(session.round_index(), 2);
        assert_eq!(session.phase(), Phase::WaitingForInput);
    }

    #[test]
    fn test_precognition_scripted_scenario() {
        let mut rng = ScriptedRandom::new(&[3, 1, 3, 5, 0]);
        let (mut session, mut schedule) =
            TrialSession::start(1, config(TrialId::Precognition), &mut rng);

        while !session.phase().is_finished() {
            settle(&mut session, schedule.take(), &mut rng);
            if let InputOutcome::Accepted { schedule: next, .. } =
                session.handle_input(pick(TrialId::Precognition, 3), &mut rng)
            {
                schedule = next;
            }
            assert_invariants(&session);
        }

        assert_eq!(session.correct_count(), 2);
        assert_eq!(
            session.result(),
            Some(TrialResult::Tally {
                correct: 2,
                trials: 5
            })
        );
        assert_eq!(crate::diagnosis::normalize(session.result().unwrap()), 40);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_telekinesis_pushes_then_settles() {
        let mut rng = ScriptedRandom::new(&[100, 100, 100, 100, 100]);
        let (mut session, schedule) = TrialSession::start(1, config(TrialId::Telekinesis), &mut rng);
        assert_eq!(schedule, None);

        let mut last = None;
        for push in 1..=5 {
            assert_eq!(session.round_index(), push);
            match session.handle_input(pick(TrialId::Telekinesis, 0), &mut rng) {
                InputOutcome::Accepted { schedule, .. } => last = schedule,
                InputOutcome::Ignored => panic!("push {push} ignored"),
            }
        }

        // final push waits for the settle delay before finishing
        assert_eq!(session.phase(), Phase::Revealing);
        assert_eq!(session.result(), None);
        let last = last.unwrap();
        assert_eq!(last.delay, Duration::from_millis(500));
        settle(&mut session, Some(last), &mut rng);

        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.correct_count(), 5);
        assert_eq!(session.result(), Some(TrialResult::Score { points: 100 }));
    }

    #[test]
    fn test_finished_accepts_nothing() {
        let mut rng = ScriptedRandom::new(&[30, 30, 30, 30, 30]);
        let mut tele = config(TrialId::Telekinesis);
        tele.final_delay = Duration::ZERO;
        let (mut session, _) = TrialSession::start(1, tele, &mut rng);
        for _ in 0..5 {
            session.handle_input(pick(TrialId::Telekinesis, 0), &mut rng);
        }
        assert_eq!(session.phase(), Phase::Finished);
        let token = session.current_token();
        assert_eq!(
            session.handle_input(pick(TrialId::Telekinesis, 0), &mut rng),
            InputOutcome::Ignored
        );
        assert_eq!(session.on_timer(token, &mut rng), TimerOutcome::Stale);
        // 150 of 500 covered
        assert_eq!(session.result(), Some(TrialResult::Score { points: 30 }));
    }

    proptest! {
        #[test]
        fn invariants_hold_for_any_play(
            seed in any::<u64>(),
            trial_idx in 0usize..3,
            picks in prop::collection::vec(0i64..=5, 5),
        ) {
            let trial = TrialId::ALL[trial_idx];
            let mut rng = StdRandom::seeded(seed);
            let (mut session, mut schedule) = TrialSession::start(1, config(trial), &mut rng);
            let max = max_selection(trial) as i64;

            for raw in picks {
                while let Some(s) = schedule.take() {
                    if let TimerOutcome::Advanced { schedule: next } = session.on_timer(s.token, &mut rng) {
                        schedule = next;
                    }
                    assert_invariants(&session);
                }
                if let InputOutcome::Accepted { schedule: next, .. } =
                    session.handle_input(pick(trial, raw.min(max)), &mut rng)
                {
                    schedule = next;
                }
                assert_invariants(&session);
            }
            while let Some(s) = schedule.take() {
                if let TimerOutcome::Advanced { schedule: next } = session.on_timer(s.token, &mut rng) {
                    schedule = next;
                }
            }

            prop_assert_eq!(session.phase(), Phase::Finished);
            prop_assert_eq!(session.round_index(), 5);
            if let Some(TrialResult::Score { points }) = session.result() {
                prop_assert!(points <= 100);
            }
            if let RoundPayload::Motor(run) = session.payload() {
                prop_assert!(run.position <= run.limit);
            }
        }
    }
}
