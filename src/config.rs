//! Game and registry configuration, including the preset table.

use crate::agent::AgentSpec;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default starting chip amount
pub const DEFAULT_BUYIN: i64 = 1000;
pub const DEFAULT_BIG_BLIND: i64 = 20;
pub const DEFAULT_SMALL_BLIND: i64 = 10;
pub const DEFAULT_MAX_PLAYERS: usize = 6;
pub const DEFAULT_MAX_HANDS: u32 = 15;

/// Seats allowed at a table
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 9;

/// Per-decision deadlines (seconds)
pub const DEFAULT_HUMAN_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Registry limits
pub const DEFAULT_MAX_CONCURRENT_GAMES: usize = 100;
pub const DEFAULT_END_GRACE_SECS: u64 = 60;

fn default_buyin() -> i64 {
    DEFAULT_BUYIN
}
fn default_big_blind() -> i64 {
    DEFAULT_BIG_BLIND
}
fn default_small_blind() -> i64 {
    DEFAULT_SMALL_BLIND
}
fn default_max_players() -> usize {
    DEFAULT_MAX_PLAYERS
}
fn default_max_hands() -> u32 {
    DEFAULT_MAX_HANDS
}
fn default_human_timeout() -> u64 {
    DEFAULT_HUMAN_TIMEOUT_SECS
}
fn default_llm_timeout() -> u64 {
    DEFAULT_LLM_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Expand a named preset first; seat/blind fields are taken from it.
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    #[serde(default = "default_buyin")]
    pub buyin: i64,
    #[serde(default = "default_big_blind")]
    pub big_blind: i64,
    #[serde(default = "default_small_blind")]
    pub small_blind: i64,
    #[serde(default = "default_max_hands")]
    pub max_hands: u32,
    /// Seat id -> agent assignment. Unassigned seats default to the call agent.
    #[serde(default)]
    pub agents: HashMap<usize, AgentSpec>,
    /// Show every seat's hole cards and strength on the wire.
    #[serde(default)]
    pub debug_mode: bool,
    /// Start the first hand at creation even with human seats present.
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default = "default_human_timeout")]
    pub human_timeout_secs: u64,
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,
    /// Fixed RNG seed for replayable sessions; entropy-seeded when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            preset: None,
            max_players: DEFAULT_MAX_PLAYERS,
            buyin: DEFAULT_BUYIN,
            big_blind: DEFAULT_BIG_BLIND,
            small_blind: DEFAULT_SMALL_BLIND,
            max_hands: DEFAULT_MAX_HANDS,
            agents: HashMap::new(),
            debug_mode: false,
            auto_start: false,
            human_timeout_secs: DEFAULT_HUMAN_TIMEOUT_SECS,
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            rng_seed: None,
        }
    }
}

impl GameConfig {
    pub fn human_timeout(&self) -> Duration {
        Duration::from_secs(self.human_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Named preset configurations.
    pub fn preset(name: &str) -> Option<Self> {
        let assign = |pairs: &[(usize, &str)]| -> HashMap<usize, AgentSpec> {
            pairs
                .iter()
                .map(|(seat, agent)| (*seat, AgentSpec::Named(agent.to_string())))
                .collect()
        };

        let mut config = GameConfig::default();
        match name {
            "test" => {
                config.max_players = 2;
                config.agents = assign(&[(0, "call"), (1, "random")]);
            }
            "balanced" => {
                config.agents = assign(&[
                    (0, "random"),
                    (1, "call"),
                    (2, "aggressive_random"),
                    (3, "passive"),
                    (4, "tight"),
                    (5, "loose"),
                ]);
            }
            "custom_showcase" => {
                config.agents = assign(&[
                    (0, "passive"),
                    (1, "tight"),
                    (2, "loose"),
                    (3, "bluff"),
                    (4, "position_aware"),
                    (5, "aggressive_random"),
                ]);
            }
            "llm_showcase" => {
                config.agents = assign(&[
                    (0, "gpt_4_1_balanced"),
                    (1, "llama_aggressive"),
                    (2, "gemma_mathematical"),
                    (3, "gpt_4_1_bluffer"),
                    (4, "llama_conservative"),
                    (5, "gpt_4_1_mathematical"),
                ]);
            }
            "human_vs_ai" => {
                config.agents = assign(&[
                    (0, "human"),
                    (1, "aggressive_random"),
                    (2, "tight"),
                    (3, "loose"),
                    (4, "bluff"),
                    (5, "position_aware"),
                ]);
            }
            "human_vs_llm" => {
                config.agents = assign(&[
                    (0, "human"),
                    (1, "gpt_4_1_balanced"),
                    (2, "llama_aggressive"),
                    (3, "gemma_mathematical"),
                    (4, "gpt_4_1_conservative"),
                    (5, "llama_balanced"),
                ]);
            }
            _ => return None,
        }
        Some(config)
    }

    /// Expand the preset field, keeping caller overrides for debug mode,
    /// timeouts and seeding.
    pub fn expanded(self) -> CoreResult<Self> {
        match &self.preset {
            None => Ok(self),
            Some(name) => {
                let mut expanded = GameConfig::preset(name).ok_or_else(|| {
                    CoreError::InvalidConfig(format!("unknown preset '{}'", name))
                })?;
                expanded.debug_mode = self.debug_mode;
                expanded.auto_start = self.auto_start;
                expanded.human_timeout_secs = self.human_timeout_secs;
                expanded.llm_timeout_secs = self.llm_timeout_secs;
                expanded.rng_seed = self.rng_seed;
                Ok(expanded)
            }
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(CoreError::InvalidConfig(format!(
                "max_players must be between {} and {}",
                MIN_PLAYERS, MAX_PLAYERS
            )));
        }
        if self.small_blind < 1 {
            return Err(CoreError::InvalidConfig(
                "small blind must be at least 1".to_string(),
            ));
        }
        if self.small_blind >= self.big_blind {
            return Err(CoreError::InvalidConfig(
                "small blind must be less than big blind".to_string(),
            ));
        }
        if self.buyin < self.big_blind * 2 {
            return Err(CoreError::InvalidConfig(
                "buyin must cover at least two big blinds".to_string(),
            ));
        }
        if self.max_hands < 1 {
            return Err(CoreError::InvalidConfig(
                "max_hands must be at least 1".to_string(),
            ));
        }
        if self.agents.len() < MIN_PLAYERS {
            return Err(CoreError::InvalidConfig(
                "at least two seats must be assigned".to_string(),
            ));
        }
        for (seat, spec) in &self.agents {
            if *seat >= self.max_players {
                return Err(CoreError::InvalidConfig(format!(
                    "seat {} exceeds max_players {}",
                    seat, self.max_players
                )));
            }
            spec.resolve().map_err(CoreError::InvalidConfig)?;
        }
        Ok(())
    }
}

/// Process-wide registry limits.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub max_concurrent_games: usize,
    pub end_grace: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_games: DEFAULT_MAX_CONCURRENT_GAMES,
            end_grace: Duration::from_secs(DEFAULT_END_GRACE_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_seat_config() -> GameConfig {
        let mut config = GameConfig {
            max_players: 2,
            ..Default::default()
        };
        config.agents.insert(0, AgentSpec::Named("call".to_string()));
        config.agents.insert(1, AgentSpec::Named("call".to_string()));
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(two_seat_config().validate().is_ok());
    }

    #[test]
    fn test_blind_ordering_enforced() {
        let mut config = two_seat_config();
        config.small_blind = 20;
        config.big_blind = 20;
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_seat_bounds_enforced() {
        let mut config = two_seat_config();
        config.agents.insert(5, AgentSpec::Named("tight".to_string()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_agent_rejected() {
        let mut config = two_seat_config();
        config
            .agents
            .insert(1, AgentSpec::Named("clairvoyant".to_string()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets_are_valid() {
        for name in [
            "test",
            "balanced",
            "custom_showcase",
            "llm_showcase",
            "human_vs_ai",
            "human_vs_llm",
        ] {
            let config = GameConfig::preset(name).expect(name);
            config
                .validate()
                .unwrap_or_else(|e| panic!("{}: {}", name, e));
        }
        assert!(GameConfig::preset("nope").is_none());
    }

    #[test]
    fn test_preset_expansion_keeps_overrides() {
        let request = GameConfig {
            preset: Some("test".to_string()),
            debug_mode: true,
            rng_seed: Some(99),
            ..Default::default()
        };
        let expanded = request.expanded().unwrap();
        assert_eq!(expanded.max_players, 2);
        assert!(expanded.debug_mode);
        assert_eq!(expanded.rng_seed, Some(99));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"agents": {"0": "call", "1": "tight"}}"#).unwrap();
        assert_eq!(config.max_players, DEFAULT_MAX_PLAYERS);
        assert_eq!(config.buyin, DEFAULT_BUYIN);
        assert!(config.validate().is_ok());
    }
}
