//! Terminal display and UI rendering
//!
//! Features:
//! - Menu with completed-trial markers
//! - Per-phase rendering of each trial
//! - Composite diagnosis screen

use crate::diagnosis::{normalize, CompositeView, Tier, TrialLine};
use crate::registry::{TrialId, TrialResult};
use crate::session::payload::{CardDeal, MotorRun, PredictionRound, CARD_SLOTS};
use crate::session::{Phase, RoundPayload, TrialSession};
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{stdout, Stdout, Write};

type DisplayResult = Result<(), Box<dyn std::error::Error>>;

/// Character width of the telekinesis track
const TRACK_WIDTH: i64 = 48;

/// Terminal display manager
pub struct Display {
    out: Stdout,
}

impl Display {
    pub fn new() -> Self {
        Display { out: stdout() }
    }

    /// Clear screen
    pub fn clear(&mut self) -> DisplayResult {
        execute!(self.out, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;
        Ok(())
    }

    fn line(&mut self, row: u16, color: Color, text: &str) -> DisplayResult {
        execute!(
            self.out,
            cursor::MoveTo(0, row),
            SetForegroundColor(color),
            Print(text),
            ResetColor
        )?;
        Ok(())
    }

    fn title(&mut self, text: &str) -> DisplayResult {
        self.line(0, Color::White, text)?;
        self.line(1, Color::Blue, &"─".repeat(50))
    }

    /// Main menu; finished trials get a check mark
    pub fn show_menu(&mut self, completed: &[TrialId], notice: Option<&str>) -> DisplayResult {
        self.clear()?;
        self.title("ESP Diagnosis - Menu")?;
        for (i, trial) in TrialId::ALL.iter().enumerate() {
            let mark = if completed.contains(trial) { "✓" } else { " " };
            let color = if completed.contains(trial) {
                Color::Green
            } else {
                Color::White
            };
            self.line(3 + i as u16 * 2, color, &format!("{} {}  {}", i + 1, mark, trial.title()))?;
        }
        self.line(9, Color::Magenta, "4    ESP Diagnosis")?;
        self.line(12, Color::DarkGrey, "Press 1-4 to choose  |  q to quit")?;
        self.show_notice(notice)?;
        self.out.flush()?;
        Ok(())
    }

    /// Current phase of a running or finished trial
    pub fn show_session(&mut self, session: &TrialSession, notice: Option<&str>) -> DisplayResult {
        self.clear()?;
        self.title(session.trial().title())?;

        if session.phase() == Phase::Finished {
            self.show_trial_result(session)?;
        } else {
            self.line(
                2,
                Color::Yellow,
                &format!(
                    "Round {} / {}    Correct: {}",
                    session.round_index(),
                    session.total_rounds(),
                    session.correct_count()
                ),
            )?;
            match session.payload() {
                RoundPayload::Cards(deal) => self.show_cards(session, deal)?,
                RoundPayload::Prediction(round) => self.show_prediction(session, round)?,
                RoundPayload::Motor(run) => self.show_motor(session, run)?,
            }
            self.line(14, Color::DarkGrey, "Esc to abandon this test")?;
        }

        self.show_notice(notice)?;
        self.out.flush()?;
        Ok(())
    }

    fn show_feedback(&mut self, row: u16, correct: Option<bool>, hit: &str) -> DisplayResult {
        match correct {
            Some(true) => self.line(row, Color::Green, hit),
            Some(false) => self.line(row, Color::Red, "Miss"),
            None => Ok(()),
        }
    }

    fn show_cards(&mut self, session: &TrialSession, deal: &CardDeal) -> DisplayResult {
        self.line(4, Color::Grey, "Which card shows this symbol?")?;
        self.line(5, Color::Cyan, &format!("    {}", deal.target))?;

        let revealed = session.phase() == Phase::Revealing;
        execute!(self.out, cursor::MoveTo(0, 7))?;
        for slot in 0..CARD_SLOTS {
            let (face, color) = if !revealed {
                ('?', Color::White)
            } else if slot == deal.target_slot {
                (deal.cards[slot], Color::Green)
            } else {
                (deal.cards[slot], Color::DarkGrey)
            };
            execute!(
                self.out,
                SetForegroundColor(color),
                Print(format!(" [ {} ] ", face)),
                ResetColor
            )?;
        }
        self.line(8, Color::White, "   1      2      3")?;

        if revealed {
            self.show_feedback(10, session.last_correct(), "Correct!")?;
        } else {
            self.line(10, Color::Grey, "Sense the cards and pick one (1-3)")?;
        }
        Ok(())
    }

    fn show_prediction(&mut self, session: &TrialSession, round: &PredictionRound) -> DisplayResult {
        match session.phase() {
            Phase::Presenting => {
                self.line(4, Color::Yellow, "Foresee the number about to appear...")?;
                self.line(5, Color::Yellow, "Concentrate.")?;
                self.line(7, Color::DarkGrey, "0  1  2  3  4  5")?;
            }
            Phase::WaitingForInput => {
                self.line(4, Color::Yellow, "Choose the number you foresaw")?;
                self.line(7, Color::White, "0  1  2  3  4  5")?;
            }
            Phase::Revealing | Phase::Finished => {
                if let (Some(predicted), Some(actual)) = (round.prediction(), round.actual()) {
                    self.line(4, Color::White, &format!("Your prediction: {}", predicted))?;
                    self.line(6, Color::Cyan, &format!("Number drawn: {}", actual))?;
                }
                self.show_feedback(8, session.last_correct(), "Hit!")?;
            }
        }
        Ok(())
    }

    fn show_motor(&mut self, session: &TrialSession, run: &MotorRun) -> DisplayResult {
        let scale = |x: i64| (x.clamp(0, run.limit) * TRACK_WIDTH / run.limit.max(1)) as usize;
        let ball = scale(run.position);
        let target = scale(run.target);

        let mut track: Vec<char> = vec!['·'; TRACK_WIDTH as usize + 1];
        track[target] = '◎';
        track[ball] = '●';
        self.line(5, Color::Cyan, &track.into_iter().collect::<String>())?;

        let pushes_left = session.total_rounds().saturating_sub(session.round_index()) + 1;
        if session.phase() == Phase::Revealing {
            self.line(7, Color::Yellow, "Sending psychic power...")?;
        } else if session.round_index() == 1 && run.last_push.is_none() {
            self.line(
                7,
                Color::Yellow,
                &format!("Press SPACE {} times to move the ball onto the target!", pushes_left),
            )?;
        } else {
            self.line(7, Color::Yellow, &format!("{} pushes left", pushes_left))?;
        }
        Ok(())
    }

    fn show_trial_result(&mut self, session: &TrialSession) -> DisplayResult {
        let Some(result) = session.result() else {
            return Ok(());
        };
        self.line(3, Color::Green, &format!("{} complete!", session.trial().title()))?;
        match (result, session.payload()) {
            (TrialResult::Score { points }, RoundPayload::Motor(run)) => {
                self.line(5, Color::White, &format!("Result: {} points", points))?;
                self.line(6, Color::White, &format!("Distance: {}", run.distance()))?;
            }
            (TrialResult::Tally { correct, trials }, _) => {
                self.line(5, Color::White, &format!("Correct: {} / {}", correct, trials))?;
                self.line(6, Color::White, &format!("Accuracy: {}%", normalize(result)))?;
            }
            (TrialResult::Score { points }, _) => {
                self.line(5, Color::White, &format!("Result: {} points", points))?;
            }
        }
        self.line(9, Color::DarkGrey, "Press any key to return to the menu")
    }

    fn trial_line(&mut self, row: u16, trial: TrialId, line: &TrialLine) -> DisplayResult {
        let text = match line.raw {
            TrialResult::Score { points } => format!("{}: {} points", trial.title(), points),
            TrialResult::Tally { correct, trials } => format!(
                "{}: {} / {} ({}%)",
                trial.title(),
                correct,
                trials,
                line.percent
            ),
        };
        self.line(row, Color::White, &text)
    }

    /// Composite diagnosis screen
    pub fn show_diagnosis(&mut self, view: &CompositeView) -> DisplayResult {
        self.clear()?;
        self.title("ESP Diagnosis - Result")?;
        self.line(3, Color::Yellow, "[ Per-test results ]")?;
        self.trial_line(4, TrialId::Telekinesis, &view.telekinesis)?;
        self.trial_line(5, TrialId::Clairvoyance, &view.clairvoyance)?;
        self.trial_line(6, TrialId::Precognition, &view.precognition)?;

        self.line(8, Color::Yellow, "[ Overall ]")?;
        self.line(9, Color::White, &format!("Composite score: {} points", view.composite_score))?;
        let color = match view.tier {
            Tier::SuperEsper => Color::Magenta,
            Tier::AdvancedEsper => Color::Cyan,
            Tier::IntermediateEsper => Color::Green,
            Tier::NoviceEsper => Color::Yellow,
            Tier::OrdinaryHuman => Color::Grey,
        };
        self.line(11, color, &format!("Tier {}/5: {}", view.tier.rank(), view.tier_label))?;
        self.line(12, color, &format!("({})", view.tier.remark()))?;
        self.line(14, Color::DarkGrey, "Press any key to return to the menu")?;
        self.out.flush()?;
        Ok(())
    }

    fn show_notice(&mut self, notice: Option<&str>) -> DisplayResult {
        if let Some(text) = notice {
            self.line(16, Color::Red, text)?;
        }
        Ok(())
    }

    /// Reset terminal state and cleanup
    pub fn shutdown(&mut self) -> DisplayResult {
        execute!(self.out, cursor::Show, ResetColor)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.shutdown();
    }
}
