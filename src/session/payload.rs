//! Round payloads and their generators
//!
//! - `CardDeal`: clairvoyance target symbol and its 3-card layout
//! - `PredictionRound`: precognition guess and the digit drawn after it
//! - `MotorRun`: telekinesis ball displacement accumulated over pushes

use crate::config::ArenaConfig;
use crate::rng::{choice, choice_excluding, RandomSource};

/// Clairvoyance symbol alphabet
pub const SYMBOLS: [char; 4] = ['☆', '◇', '△', '○'];

pub const CARD_SLOTS: usize = 3;

/// Precognition digits are drawn from 0..=DIGIT_MAX
pub const DIGIT_MAX: u8 = 5;

/// Push increment bounds as fractions of the even per-push step
const PUSH_MIN_FACTOR: f64 = 0.3;
const PUSH_MAX_FACTOR: f64 = 1.7;

/// Target symbol plus the symbol shown on each card
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardDeal {
    pub target: char,
    pub target_slot: usize,
    pub cards: [char; CARD_SLOTS],
}

impl CardDeal {
    /// Draw order: target, target slot, then one distractor per remaining
    /// slot from left to right. Distractors never equal the target but may
    /// repeat each other.
    pub fn deal<R: RandomSource + ?Sized>(rng: &mut R) -> Self {
        let target = choice(rng, &SYMBOLS).copied().unwrap_or(SYMBOLS[0]);
        let target_slot = rng.uniform_int(0, CARD_SLOTS as i64 - 1) as usize;

        let mut cards = [target; CARD_SLOTS];
        for (slot, card) in cards.iter_mut().enumerate() {
            if slot != target_slot {
                *card = choice_excluding(rng, &SYMBOLS, &target)
                    .copied()
                    .unwrap_or(target);
            }
        }

        CardDeal {
            target,
            target_slot,
            cards,
        }
    }

    pub fn is_correct(&self, slot: u8) -> bool {
        slot as usize == self.target_slot
    }
}

/// One precognition round. `actual` only exists once a guess is locked in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PredictionRound {
    prediction: Option<u8>,
    actual: Option<u8>,
}

impl PredictionRound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock in the guess, then draw the actual digit. Returns whether they
    /// match. A second commit for the same round is ignored.
    pub fn commit<R: RandomSource + ?Sized>(&mut self, prediction: u8, rng: &mut R) -> bool {
        if self.prediction.is_some() {
            return self.is_hit();
        }
        self.prediction = Some(prediction);
        self.actual = Some(rng.uniform_int(0, DIGIT_MAX as i64) as u8);
        self.is_hit()
    }

    pub fn prediction(&self) -> Option<u8> {
        self.prediction
    }

    pub fn actual(&self) -> Option<u8> {
        self.actual
    }

    pub fn is_hit(&self) -> bool {
        matches!((self.prediction, self.actual), (Some(p), Some(a)) if p == a)
    }
}

/// Telekinesis ball displacement, measured from the start marker
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotorRun {
    pub position: i64,
    pub target: i64,
    pub limit: i64,
    pub max_distance: i64,
    /// Even share of the target distance per push
    step: f64,
    pub last_push: Option<i64>,
}

impl MotorRun {
    pub fn new(arena: &ArenaConfig, pushes: u32) -> Self {
        let target = arena.target_distance();
        MotorRun {
            position: 0,
            target,
            limit: arena.position_limit(),
            max_distance: arena.max_possible_distance(),
            step: target as f64 / pushes.max(1) as f64,
            last_push: None,
        }
    }

    pub fn push_range(&self) -> (i64, i64) {
        (
            (self.step * PUSH_MIN_FACTOR).floor() as i64,
            (self.step * PUSH_MAX_FACTOR).floor() as i64,
        )
    }

    pub fn distance(&self) -> i64 {
        (self.target - self.position).abs()
    }

    /// Advance by a random increment, clamped at the overshoot limit.
    /// Returns whether the push brought the ball strictly closer.
    pub fn push<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> bool {
        let before = self.distance();
        let (lo, hi) = self.push_range();
        let increment = rng.uniform_int(lo, hi);
        self.position = (self.position + increment).min(self.limit);
        self.last_push = Some(increment);
        self.distance() < before
    }

    /// `floor(100 - distance / max_distance * 100)`, floored at 0.
    /// Computed as `100 - ceil(100 * distance / max_distance)` in integers.
    pub fn score(&self) -> u32 {
        if self.max_distance <= 0 {
            return 0;
        }
        let scaled = 100 * self.distance();
        let penalty = (scaled + self.max_distance - 1) / self.max_distance;
        (100 - penalty).max(0) as u32
    }
}

/// Trial-specific state of the current round
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RoundPayload {
    Cards(CardDeal),
    Prediction(PredictionRound),
    Motor(MotorRun),
}
