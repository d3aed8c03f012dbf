use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DelveError;

/// Encounter kinds. The snake_case names are persisted with maps and runs
/// and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    PuzzleChamber,
    TradeOpportunity,
    DiscoverySite,
    Hazard,
    RiskEvent,
    RestSite,
    SafePassage,
    Scoundrel,
}

impl EncounterKind {
    pub const ALL: [Self; 8] = [
        Self::PuzzleChamber,
        Self::TradeOpportunity,
        Self::DiscoverySite,
        Self::Hazard,
        Self::RiskEvent,
        Self::RestSite,
        Self::SafePassage,
        Self::Scoundrel,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PuzzleChamber => "puzzle_chamber",
            Self::TradeOpportunity => "trade_opportunity",
            Self::DiscoverySite => "discovery_site",
            Self::Hazard => "hazard",
            Self::RiskEvent => "risk_event",
            Self::RestSite => "rest_site",
            Self::SafePassage => "safe_passage",
            Self::Scoundrel => "scoundrel",
        }
    }

    /// Multiplier applied to the base traversal cost of a node.
    #[must_use]
    pub const fn traversal_weight(self) -> f64 {
        match self {
            Self::PuzzleChamber | Self::DiscoverySite => 1.0,
            Self::TradeOpportunity => 0.9,
            Self::Hazard => 1.3,
            Self::RiskEvent => 1.2,
            Self::RestSite => 0.8,
            Self::SafePassage => 0.0,
            Self::Scoundrel => 1.1,
        }
    }
}

impl fmt::Display for EncounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncounterKind {
    type Err = DelveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DelveError::UnsupportedEncounter(s.to_string()))
    }
}

impl From<EncounterKind> for String {
    fn from(value: EncounterKind) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_parse_and_serialize_identically() {
        for kind in EncounterKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<EncounterKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let err = "dragon_lair".parse::<EncounterKind>().unwrap_err();
        assert!(err.is_unsupported());
        assert!("Hazard".parse::<EncounterKind>().is_err());
    }
}
