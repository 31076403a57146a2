use serde::{Deserialize, Serialize};

/// Identity captured once at registration. Immutable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    /// Optional secondary identifier; empty when not given.
    pub student_id: String,
}

impl Participant {
    /// Registers a participant. The name must be non-empty after trimming;
    /// the student id is optional.
    pub fn register(name: &str, student_id: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            student_id: student_id.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    /// Rounds per session.
    pub max_rounds: u32,
    /// Countdown armed for each round, in seconds.
    pub round_secs: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_rounds: 15,
            round_secs: 45.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_trims_both_fields() {
        let p = Participant::register("  Ada Lovelace ", " s-101 ").unwrap();
        assert_eq!(p.name, "Ada Lovelace");
        assert_eq!(p.student_id, "s-101");
    }

    #[test]
    fn register_requires_a_name() {
        assert!(Participant::register("", "s-101").is_none());
        assert!(Participant::register("   ", "").is_none());
    }

    #[test]
    fn student_id_is_optional() {
        let p = Participant::register("Team Rocket", "").unwrap();
        assert_eq!(p.student_id, "");
    }

    #[test]
    fn default_config_matches_game_rules() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.max_rounds, 15);
        assert_eq!(cfg.round_secs, 45.0);
    }
}
