use serde::{Deserialize, Serialize};

use super::conditions::Conditions;
use super::state::StrategyState;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrategyId(pub String);

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StrategyId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for StrategyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl StrategyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Maker-only (`type=2`) strategies are recognized by the supervisor but not
/// executed; see `Non-goals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyType {
    SmartOrder,
    MakerOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    pub account_id: String,
    pub strategy_type: StrategyType,
    pub enabled: bool,
    pub conditions: Conditions,
    pub state: StrategyState,
}

impl Strategy {
    pub fn lease_key(&self) -> String {
        format!(
            "strategy:{}:{}:{}",
            self.conditions.market_type, self.conditions.pair, self.id
        )
    }
}
