//! Hazard kinds and island eligibility.

use serde::{Deserialize, Serialize};

use crate::error::HazardError;
use crate::territory::ElementKind;

/// Environmental hazard kinds, two per elemental island kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    /// Falling rocks on fire islands
    MeteorShower,
    /// Spreading flames on fire islands
    Wildfire,
    /// Flood wave on water islands
    Tsunami,
    /// Spinning current on water islands
    Whirlpool,
    /// Ground shaking on earth islands
    Earthquake,
    /// Collapsing slopes on earth islands
    Landslide,
    /// Strikes from the sky on air islands
    LightningStorm,
    /// Lifting winds on air islands
    Tornado,
    /// Freezing storm on ice islands
    Blizzard,
    /// Snow slide on ice islands
    Avalanche,
}

impl HazardKind {
    /// Every hazard kind.
    pub const ALL: [Self; 10] = [
        Self::MeteorShower,
        Self::Wildfire,
        Self::Tsunami,
        Self::Whirlpool,
        Self::Earthquake,
        Self::Landslide,
        Self::LightningStorm,
        Self::Tornado,
        Self::Blizzard,
        Self::Avalanche,
    ];

    /// Returns the snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MeteorShower => "meteor_shower",
            Self::Wildfire => "wildfire",
            Self::Tsunami => "tsunami",
            Self::Whirlpool => "whirlpool",
            Self::Earthquake => "earthquake",
            Self::Landslide => "landslide",
            Self::LightningStorm => "lightning_storm",
            Self::Tornado => "tornado",
            Self::Blizzard => "blizzard",
            Self::Avalanche => "avalanche",
        }
    }

    /// Returns the name shown to players.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::MeteorShower => "Meteor Shower",
            Self::Wildfire => "Wildfire",
            Self::Tsunami => "Tsunami",
            Self::Whirlpool => "Whirlpool",
            Self::Earthquake => "Earthquake",
            Self::Landslide => "Landslide",
            Self::LightningStorm => "Lightning Storm",
            Self::Tornado => "Tornado",
            Self::Blizzard => "Blizzard",
            Self::Avalanche => "Avalanche",
        }
    }

    /// Parses a hazard name. Case, spaces, and dashes are normalized.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::UnknownKind`] if the name matches no kind.
    pub fn from_name(name: &str) -> Result<Self, HazardError> {
        let normalized = name.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| HazardError::UnknownKind(name.to_string()))
    }

    /// Returns the island kind this hazard belongs to.
    #[must_use]
    pub const fn element(self) -> ElementKind {
        match self {
            Self::MeteorShower | Self::Wildfire => ElementKind::Fire,
            Self::Tsunami | Self::Whirlpool => ElementKind::Water,
            Self::Earthquake | Self::Landslide => ElementKind::Earth,
            Self::LightningStorm | Self::Tornado => ElementKind::Air,
            Self::Blizzard | Self::Avalanche => ElementKind::Ice,
        }
    }
}

impl std::fmt::Display for HazardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HazardKind {
    type Err = HazardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Returns the hazards that may strike an island of `kind`.
#[must_use]
pub const fn eligible_hazards(kind: ElementKind) -> &'static [HazardKind] {
    match kind {
        ElementKind::Fire => &[HazardKind::MeteorShower, HazardKind::Wildfire],
        ElementKind::Water => &[HazardKind::Tsunami, HazardKind::Whirlpool],
        ElementKind::Earth => &[HazardKind::Earthquake, HazardKind::Landslide],
        ElementKind::Air => &[HazardKind::LightningStorm, HazardKind::Tornado],
        ElementKind::Ice => &[HazardKind::Blizzard, HazardKind::Avalanche],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_normalizes() {
        assert_eq!(HazardKind::from_name("meteor_shower"), Ok(HazardKind::MeteorShower));
        assert_eq!(HazardKind::from_name("Lightning Storm"), Ok(HazardKind::LightningStorm));
        assert_eq!(HazardKind::from_name("BLIZZARD"), Ok(HazardKind::Blizzard));
        assert_eq!(
            HazardKind::from_name("volcano"),
            Err(HazardError::UnknownKind("volcano".to_string()))
        );
    }

    #[test]
    fn test_eligibility_matches_element() {
        for element in ElementKind::ALL {
            let eligible = eligible_hazards(element);
            assert_eq!(eligible.len(), 2);
            assert!(eligible.iter().all(|h| h.element() == element));
        }
    }

    #[test]
    fn test_every_kind_is_eligible_somewhere() {
        for kind in HazardKind::ALL {
            assert!(eligible_hazards(kind.element()).contains(&kind));
        }
    }

    #[test]
    fn test_display_is_snake_case() {
        assert_eq!(HazardKind::LightningStorm.to_string(), "lightning_storm");
        assert_eq!(
            serde_json::to_value(HazardKind::MeteorShower).unwrap(),
            "meteor_shower"
        );
    }
}
