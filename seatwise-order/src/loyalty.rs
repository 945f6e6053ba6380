use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    pub fn for_points(points: u64) -> Self {
        match points {
            0..=100 => LoyaltyTier::Bronze,
            101..=500 => LoyaltyTier::Silver,
            501..=1000 => LoyaltyTier::Gold,
            _ => LoyaltyTier::Platinum,
        }
    }

    /// Points at which this tier starts.
    pub fn threshold(&self) -> u64 {
        match self {
            LoyaltyTier::Bronze => 0,
            LoyaltyTier::Silver => 101,
            LoyaltyTier::Gold => 501,
            LoyaltyTier::Platinum => 1001,
        }
    }

    pub fn next(&self) -> Option<LoyaltyTier> {
        match self {
            LoyaltyTier::Bronze => Some(LoyaltyTier::Silver),
            LoyaltyTier::Silver => Some(LoyaltyTier::Gold),
            LoyaltyTier::Gold => Some(LoyaltyTier::Platinum),
            LoyaltyTier::Platinum => None,
        }
    }

    pub fn benefits(&self) -> &'static str {
        match self {
            LoyaltyTier::Bronze => "No additional benefits",
            LoyaltyTier::Silver => "Free seat selection, 5% discount on future bookings",
            LoyaltyTier::Gold => "Free seat selection, 10% discount, priority check-in",
            LoyaltyTier::Platinum => {
                "Free seat selection, 15% discount, priority check-in, lounge access"
            }
        }
    }

    /// Points still needed to reach the next tier, `None` at the top.
    pub fn points_to_next_tier(points: u64) -> Option<(LoyaltyTier, u64)> {
        let next = LoyaltyTier::for_points(points).next()?;
        Some((next, next.threshold().saturating_sub(points)))
    }
}

impl fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoyaltyTier::Bronze => "Bronze",
            LoyaltyTier::Silver => "Silver",
            LoyaltyTier::Gold => "Gold",
            LoyaltyTier::Platinum => "Platinum",
        };
        f.write_str(name)
    }
}
