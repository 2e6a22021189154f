use crate::{level_kind, Aggregate, HandKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Score {
    pub chips: i64,
    pub mult: f64,
}

impl Score {
    pub fn total_raw(&self) -> f64 {
        self.chips as f64 * self.mult
    }

    pub fn total(&self) -> i64 {
        self.total_raw().floor() as i64
    }
}

/// Base hand values plus per-level growth. The standard table is
/// compiled in; lookups on a hand the table does not carry fall back to
/// it.
#[derive(Debug, Clone)]
pub struct HandValueTable {
    base: HashMap<HandKind, (i64, f64)>,
    per_level: HashMap<HandKind, (i64, f64)>,
}

impl Default for HandValueTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl HandValueTable {
    pub fn standard() -> Self {
        let mut base = HashMap::new();
        let mut per_level = HashMap::new();
        for kind in HandKind::ALL {
            base.insert(kind, standard_hand_base(kind));
            per_level.insert(kind, standard_level_delta(kind));
        }
        Self { base, per_level }
    }

    pub fn base_value(&self, kind: HandKind) -> (i64, f64) {
        self.base
            .get(&kind)
            .copied()
            .unwrap_or_else(|| standard_hand_base(kind))
    }

    pub fn level_delta(&self, kind: HandKind) -> (i64, f64) {
        self.per_level
            .get(&kind)
            .copied()
            .unwrap_or_else(|| standard_level_delta(kind))
    }

    pub fn value_at_level(&self, kind: HandKind, level: u32) -> (i64, f64) {
        let (base_chips, base_mult) = self.base_value(kind);
        if level <= 1 {
            return (base_chips, base_mult);
        }
        let (level_chips, level_mult) = self.level_delta(kind);
        let extra = (level - 1) as i64;
        let chips = base_chips.saturating_add(level_chips.saturating_mul(extra));
        let mult = base_mult + level_mult * extra as f64;
        (chips, mult)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandLevel {
    pub level: u32,
    pub chip_bonus: i64,
    pub mult_bonus: f64,
}

/// Permanent per-hand-type upgrade ledger. Dispatch never mutates it;
/// upgrades arrive from outside (planet consumables upstream).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandLevelState {
    levels: HashMap<HandKind, u32>,
}

impl HandLevelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, kind: HandKind) -> u32 {
        self.levels
            .get(&level_kind(kind))
            .copied()
            .unwrap_or(1)
            .max(1)
    }

    pub fn upgrade(&mut self, kind: HandKind, amount: u32) {
        let entry = self.levels.entry(level_kind(kind)).or_insert(1);
        *entry = entry.saturating_add(amount);
    }

    pub fn upgrade_all(&mut self, amount: u32) {
        for kind in HandKind::ALL {
            if kind == HandKind::RoyalFlush {
                continue;
            }
            self.upgrade(kind, amount);
        }
    }

    pub fn hand_level(&self, kind: HandKind, table: &HandValueTable) -> HandLevel {
        let level = self.level(kind);
        let (delta_chips, delta_mult) = table.level_delta(kind);
        let extra = (level - 1) as i64;
        HandLevel {
            level,
            chip_bonus: delta_chips.saturating_mul(extra),
            mult_bonus: delta_mult * extra as f64,
        }
    }

    pub fn upgraded_value(&self, kind: HandKind, table: &HandValueTable) -> (i64, f64) {
        table.value_at_level(kind, self.level(kind))
    }
}

/// Folds a dispatch aggregate into a base valuation. Strictly two-phase:
/// every additive mult lands before the multiplier product applies.
pub fn resolve_score(base: Score, aggregate: &Aggregate) -> Score {
    Score {
        chips: base.chips + aggregate.chips,
        mult: (base.mult + aggregate.mult) * aggregate.mul_mult,
    }
}

pub fn final_score(base: Score, aggregate: &Aggregate) -> i64 {
    resolve_score(base, aggregate).total()
}

fn standard_hand_base(kind: HandKind) -> (i64, f64) {
    match kind {
        HandKind::HighCard => (5, 1.0),
        HandKind::Pair => (10, 2.0),
        HandKind::TwoPair => (20, 2.0),
        HandKind::Trips => (30, 3.0),
        HandKind::Straight => (30, 4.0),
        HandKind::Flush => (35, 4.0),
        HandKind::FullHouse => (40, 4.0),
        HandKind::Quads => (60, 7.0),
        HandKind::StraightFlush | HandKind::RoyalFlush => (100, 8.0),
        HandKind::FiveOfAKind => (120, 12.0),
        HandKind::FlushHouse => (140, 14.0),
        HandKind::FlushFive => (160, 16.0),
    }
}

fn standard_level_delta(kind: HandKind) -> (i64, f64) {
    match kind {
        HandKind::HighCard => (10, 1.0),
        HandKind::Pair => (15, 1.0),
        HandKind::TwoPair => (20, 1.0),
        HandKind::Trips => (20, 2.0),
        HandKind::Straight => (30, 3.0),
        HandKind::Flush => (15, 2.0),
        HandKind::FullHouse => (25, 2.0),
        HandKind::Quads => (30, 3.0),
        HandKind::StraightFlush | HandKind::RoyalFlush => (40, 4.0),
        HandKind::FiveOfAKind => (35, 3.0),
        HandKind::FlushHouse => (40, 4.0),
        HandKind::FlushFive => (50, 3.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EffectResult;

    #[test]
    fn level_one_is_the_base_value() {
        let table = HandValueTable::standard();
        assert_eq!(table.value_at_level(HandKind::Pair, 1), (10, 2.0));
        assert_eq!(table.value_at_level(HandKind::Pair, 0), (10, 2.0));
    }

    #[test]
    fn levels_scale_linearly() {
        let table = HandValueTable::standard();
        // Pair grows by (15, 1.0) per level past the first.
        assert_eq!(table.value_at_level(HandKind::Pair, 3), (40, 4.0));
        assert_eq!(table.value_at_level(HandKind::Flush, 2), (50, 6.0));
    }

    #[test]
    fn royal_shares_the_straight_flush_ledger() {
        let mut levels = HandLevelState::new();
        levels.upgrade(HandKind::RoyalFlush, 2);
        assert_eq!(levels.level(HandKind::StraightFlush), 3);
        assert_eq!(levels.level(HandKind::RoyalFlush), 3);
    }

    #[test]
    fn upgrade_all_raises_every_kind() {
        let mut levels = HandLevelState::new();
        levels.upgrade_all(1);
        for kind in HandKind::ALL {
            assert_eq!(levels.level(kind), 2, "kind {:?}", kind);
        }
    }

    #[test]
    fn hand_level_reports_total_bonuses() {
        let table = HandValueTable::standard();
        let mut levels = HandLevelState::new();
        levels.upgrade(HandKind::Trips, 2);
        let report = levels.hand_level(HandKind::Trips, &table);
        assert_eq!(report.level, 3);
        assert_eq!(report.chip_bonus, 40);
        assert_eq!(report.mult_bonus, 4.0);
        assert_eq!(levels.upgraded_value(HandKind::Trips, &table), (70, 7.0));
    }

    #[test]
    fn two_phase_formula() {
        let base = Score {
            chips: 30,
            mult: 3.0,
        };
        let mut aggregate = Aggregate::default();
        aggregate.merge("a", &EffectResult::chips(20));
        aggregate.merge("b", &EffectResult::mult(5.0));
        aggregate.merge("c", &EffectResult::mul_mult(1.5));
        // (30 + 20) * ((3 + 5) * 1.5) = 50 * 12 = 600
        assert_eq!(final_score(base, &aggregate), 600);
    }

    #[test]
    fn final_score_floors_fractional_totals() {
        let base = Score {
            chips: 11,
            mult: 1.0,
        };
        let mut aggregate = Aggregate::default();
        aggregate.merge("a", &EffectResult::mul_mult(1.5));
        // 11 * 1.5 = 16.5 -> 16
        assert_eq!(final_score(base, &aggregate), 16);
    }
}
