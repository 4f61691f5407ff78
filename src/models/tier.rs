use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MAX_PERCENTAGE: i32 = 100;

/// A price band over the half-open capacity range
/// `[percentage_start, percentage_end)`. Active tiers of an event must not
/// overlap each other.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceTier {
    pub id: Uuid,
    pub event_id: Uuid,
    pub tier_name: String,
    pub percentage_start: i32,
    pub percentage_end: i32,
    pub price: Decimal,
    pub created_by: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl PriceTier {
    /// Whether this tier is the active band for the given booking percentage.
    /// Ranges are half-open, except that a tier ending at 100 also matches
    /// exactly 100%: a sold-out event keeps the top band's price.
    pub fn contains(&self, percentage: Decimal) -> bool {
        let start = Decimal::from(self.percentage_start);
        let end = Decimal::from(self.percentage_end);

        if percentage < start {
            return false;
        }
        percentage < end || (self.percentage_end == MAX_PERCENTAGE && percentage == end)
    }

    pub fn overlaps(&self, other: &PriceTier) -> bool {
        ranges_overlap(
            self.percentage_start,
            self.percentage_end,
            other.percentage_start,
            other.percentage_end,
        )
    }
}

pub fn valid_range(start: i32, end: i32) -> bool {
    start >= 0 && start < end && end <= MAX_PERCENTAGE
}

/// Half-open interval overlap test. Adjacent ranges (one ending where the
/// other starts) do not overlap.
pub fn ranges_overlap(a_start: i32, a_end: i32, b_start: i32, b_end: i32) -> bool {
    !(a_end <= b_start || a_start >= b_end)
}

/// The unique active tier matching the booking percentage, if any. Gaps in
/// the tier coverage yield `None`, which is a valid "no active pricing"
/// state rather than an error.
pub fn select_tier(tiers: &[PriceTier], percentage: Decimal) -> Option<&PriceTier> {
    tiers.iter().find(|tier| tier.contains(percentage))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(name: &str, start: i32, end: i32, price: i64) -> PriceTier {
        PriceTier {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            tier_name: name.to_string(),
            percentage_start: start,
            percentage_end: end,
            price: Decimal::new(price, 2),
            created_by: Uuid::new_v4(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn default_tiers() -> Vec<PriceTier> {
        vec![
            tier("Early Bird", 0, 30, 4000),
            tier("Regular", 30, 70, 5000),
            tier("Premium", 70, 100, 7500),
        ]
    }

    #[test]
    fn test_valid_range_bounds() {
        assert!(valid_range(0, 30));
        assert!(valid_range(0, 100));
        assert!(valid_range(99, 100));
        assert!(!valid_range(-1, 30));
        assert!(!valid_range(30, 30));
        assert!(!valid_range(40, 30));
        assert!(!valid_range(90, 101));
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        assert!(!ranges_overlap(0, 30, 30, 70));
        assert!(!ranges_overlap(30, 70, 0, 30));
    }

    #[test]
    fn test_overlap_detection() {
        // Partial overlap
        assert!(ranges_overlap(0, 40, 30, 70));
        // Containment
        assert!(ranges_overlap(0, 100, 30, 70));
        assert!(ranges_overlap(30, 70, 0, 100));
        // Identical
        assert!(ranges_overlap(30, 70, 30, 70));
        // Disjoint with a gap
        assert!(!ranges_overlap(0, 20, 40, 70));
    }

    #[test]
    fn test_start_is_inclusive_end_is_exclusive() {
        let tiers = default_tiers();

        // At exactly 30% the Regular band applies, not Early Bird
        let selected = select_tier(&tiers, Decimal::from(30)).unwrap();
        assert_eq!(selected.tier_name, "Regular");

        let selected = select_tier(&tiers, Decimal::new(2999, 2)).unwrap();
        assert_eq!(selected.tier_name, "Early Bird");

        let selected = select_tier(&tiers, Decimal::from(70)).unwrap();
        assert_eq!(selected.tier_name, "Premium");
    }

    #[test]
    fn test_sold_out_matches_top_band() {
        let tiers = default_tiers();
        let selected = select_tier(&tiers, Decimal::from(100)).unwrap();
        assert_eq!(selected.tier_name, "Premium");
    }

    #[test]
    fn test_full_coverage_has_exactly_one_match() {
        let tiers = default_tiers();
        for pct in [
            Decimal::ZERO,
            Decimal::new(1, 2),
            Decimal::new(2999, 2),
            Decimal::from(30),
            Decimal::new(6999, 2),
            Decimal::from(70),
            Decimal::new(9999, 2),
            Decimal::from(100),
        ] {
            let matches = tiers.iter().filter(|t| t.contains(pct)).count();
            assert_eq!(matches, 1, "expected one tier at {}%", pct);
        }
    }

    #[test]
    fn test_gap_in_coverage_selects_nothing() {
        let tiers = vec![tier("Early Bird", 0, 30, 4000), tier("Premium", 70, 100, 7500)];
        assert!(select_tier(&tiers, Decimal::from(50)).is_none());
    }

    #[test]
    fn test_no_tiers_selects_nothing() {
        assert!(select_tier(&[], Decimal::from(10)).is_none());
    }

    #[test]
    fn test_mid_band_tier_does_not_match_its_own_end() {
        let t = tier("Regular", 30, 70, 5000);
        assert!(!t.contains(Decimal::from(70)));
        assert!(t.contains(Decimal::from(30)));
    }
}
