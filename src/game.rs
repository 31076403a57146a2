use crate::classifier::TermClassifier;
use crate::letters::draw_letter;
use crate::session::{GameConfig, Participant};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Reviewer decision state of a submitted term.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum_macros::Display)]
pub enum Verification {
    #[strum(serialize = "accepted")]
    Accepted,
    #[strum(serialize = "rejected")]
    Rejected,
    #[default]
    #[strum(serialize = "pending")]
    Unset,
}

/// Maps the tri-state onto the stored `true`/`false`/`null` flag.
pub(crate) mod verified_flag {
    use super::Verification;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Verification, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Verification::Accepted => s.serialize_bool(true),
            Verification::Rejected => s.serialize_bool(false),
            Verification::Unset => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Verification, D::Error> {
        Ok(match Option::<bool>::deserialize(d)? {
            Some(true) => Verification::Accepted,
            Some(false) => Verification::Rejected,
            None => Verification::Unset,
        })
    }
}

/// One completed round, as it is persisted inside a result's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based position within the session.
    pub round: u32,
    pub letter: char,
    /// Raw text at round end; empty on a silent timeout.
    pub term: String,
    /// Seconds left when the round was consumed; 0 on timeout.
    pub time_left: f64,
    /// Equals `time_left` at submission; 0 on timeout.
    pub points: f64,
    #[serde(default, rename = "verified", with = "verified_flag")]
    pub verification: Verification,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Idle,
    Playing,
    GameOver,
}

/// One play-through: the turn state machine, its countdown and the growing
/// round history. Created at registration, reset in place on restart.
pub struct Game {
    pub participant: Participant,
    pub config: GameConfig,
    pub state: GameState,
    /// Current round index, 1-based. Only meaningful while `Playing`.
    pub round: u32,
    pub letter: char,
    /// Input typed so far for the current round.
    pub input: String,
    pub input_error: bool,
    /// Running sum of points over all consumed rounds.
    pub auto_score: f64,
    pub rounds: Vec<RoundRecord>,
    /// Wall-clock deadline of the live countdown. Remaining time is always
    /// recomputed from this, never counted down, so missed ticks cannot
    /// drift the score. `None` whenever no countdown is armed.
    pub deadline: Option<Instant>,
    classifier: Box<dyn TermClassifier>,
}

impl Game {
    pub fn new(
        participant: Participant,
        config: GameConfig,
        classifier: Box<dyn TermClassifier>,
    ) -> Self {
        Self {
            participant,
            config,
            state: GameState::Idle,
            round: 0,
            letter: ' ',
            input: String::new(),
            input_error: false,
            auto_score: 0.0,
            rounds: Vec::new(),
            deadline: None,
            classifier,
        }
    }

    /// Starts a fresh session from `Idle` or `GameOver`. A live session is
    /// left alone.
    pub fn start(&mut self) {
        if self.state == GameState::Playing {
            return;
        }
        self.round = 1;
        self.auto_score = 0.0;
        self.rounds.clear();
        self.start_turn();
    }

    fn start_turn(&mut self) {
        self.letter = draw_letter();
        self.input.clear();
        self.input_error = false;
        self.deadline = Some(Instant::now() + Duration::from_secs_f64(self.config.round_secs));
        self.state = GameState::Playing;
    }

    /// Seconds left on the live countdown, recomputed from the deadline.
    pub fn seconds_remaining(&self) -> f64 {
        match self.deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .as_secs_f64(),
            None => 0.0,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if self.state != GameState::Playing {
            return;
        }
        self.input.push(c);
        self.input_error = false;
    }

    pub fn backspace(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        self.input.pop();
        self.input_error = false;
    }

    /// Validates and consumes the current round. An empty term or a wrong
    /// first letter only raises the error flag; the countdown keeps running
    /// and the round is not consumed.
    pub fn submit(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        let trimmed = self.input.trim();
        let starts_with_letter = trimmed
            .chars()
            .next()
            .is_some_and(|c| c.to_ascii_uppercase() == self.letter);
        if trimmed.is_empty() || !starts_with_letter {
            self.input_error = true;
            return;
        }
        let points = self.seconds_remaining();
        self.end_round(points);
    }

    /// Advances the countdown. When the deadline has passed the round is
    /// consumed for zero points with whatever partial input existed.
    pub fn on_tick(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        if self.seconds_remaining() <= 0.0 {
            self.end_round(0.0);
        }
    }

    // Consumes exactly one round. The `Playing` check makes a second firing
    // (racing tick and submit) a no-op.
    fn end_round(&mut self, points: f64) {
        if self.state != GameState::Playing {
            return;
        }
        let verification = self.classifier.classify(self.input.trim());
        self.rounds.push(RoundRecord {
            round: self.round,
            letter: self.letter,
            term: self.input.clone(),
            time_left: points,
            points,
            verification,
        });
        self.auto_score += points;

        if self.round >= self.config.max_rounds {
            self.state = GameState::GameOver;
            self.deadline = None;
        } else {
            self.round += 1;
            self.start_turn();
        }
    }

    /// Re-derives the score from history. Must always agree with the
    /// incrementally kept `auto_score`.
    pub fn score_from_history(&self) -> f64 {
        self.rounds.iter().map(|r| r.points).sum()
    }
}
