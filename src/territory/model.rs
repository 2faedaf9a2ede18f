//! Island and team records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::host::MemberId;
use crate::zone::{BlockPos, Zone};

/// The five elemental island kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Fire island
    Fire,
    /// Water island
    Water,
    /// Earth island
    Earth,
    /// Air island
    Air,
    /// Ice island
    Ice,
}

impl ElementKind {
    /// Every kind, in bootstrap order.
    pub const ALL: [Self; 5] = [Self::Fire, Self::Water, Self::Earth, Self::Air, Self::Ice];

    /// Returns the lowercase kind name, which is also the team name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Water => "water",
            Self::Earth => "earth",
            Self::Air => "air",
            Self::Ice => "ice",
        }
    }

    /// Returns the id of this kind's island, e.g. `fire-island`.
    #[must_use]
    pub fn island_id(self) -> String {
        format!("{}-island", self.as_str())
    }

    /// Parses a kind name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A themed base location owning one territory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Island {
    /// Unique id (`<kind>-island`)
    pub id: String,
    /// Elemental kind
    pub kind: ElementKind,
    /// Claimed territory, if any
    pub territory: Option<Zone>,
    /// Linked team name
    pub team: Option<String>,
    /// Spawn block, if any
    pub spawn: Option<BlockPos>,
}

impl Island {
    /// Creates an unclaimed island for `kind`.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: kind.island_id(),
            kind,
            territory: None,
            team: None,
            spawn: None,
        }
    }
}

/// A named group of players linked to one island.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Unique name
    pub name: String,
    /// Member identities
    pub members: BTreeSet<MemberId>,
    /// Point total
    pub points: u64,
    /// Linked island id
    pub island: Option<String>,
}

impl Team {
    /// Creates an empty team named after `kind`.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            name: kind.as_str().to_string(),
            members: BTreeSet::new(),
            points: 0,
            island: None,
        }
    }
}

/// Initial territory and spawn for one island, applied at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandSeed {
    /// Target island kind
    pub kind: ElementKind,
    /// Territory to claim if the island has none
    pub territory: Option<Zone>,
    /// Spawn to set if the island has none
    pub spawn: Option<BlockPos>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_island_ids() {
        let ids: Vec<_> = ElementKind::ALL.iter().map(|k| k.island_id()).collect();
        assert_eq!(
            ids,
            vec!["fire-island", "water-island", "earth-island", "air-island", "ice-island"]
        );
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ElementKind::from_name("Water"), Some(ElementKind::Water));
        assert_eq!(ElementKind::from_name(" ice "), Some(ElementKind::Ice));
        assert_eq!(ElementKind::from_name("lava"), None);
    }

    #[test]
    fn test_team_named_after_kind() {
        let team = Team::new(ElementKind::Earth);
        assert_eq!(team.name, "earth");
        assert_eq!(team.points, 0);
        assert!(team.island.is_none());
    }
}
