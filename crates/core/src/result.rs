use crate::StateBag;
use serde::{Deserialize, Serialize};

/// Consumable generation plus round-resource deltas requested by an
/// effect. Counts are requests; the dispatcher clamps consumables to the
/// free slots reported by the payload before merging.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceGrants {
    #[serde(default)]
    pub tarots: u8,
    #[serde(default)]
    pub planets: u8,
    #[serde(default)]
    pub spectrals: u8,
    #[serde(default)]
    pub hands: i64,
    #[serde(default)]
    pub discards: i64,
    #[serde(default)]
    pub hand_size: i64,
    /// Sell-price increase for the caller's economy to apply.
    #[serde(default)]
    pub sell_value: i64,
}

impl ResourceGrants {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn consumable_total(&self) -> u32 {
        self.tarots as u32 + self.planets as u32 + self.spectrals as u32
    }

    fn accumulate(&mut self, other: &Self) {
        self.tarots = self.tarots.saturating_add(other.tarots);
        self.planets = self.planets.saturating_add(other.planets);
        self.spectrals = self.spectrals.saturating_add(other.spectrals);
        self.hands += other.hands;
        self.discards += other.discards;
        self.hand_size += other.hand_size;
        self.sell_value += other.sell_value;
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectFlags {
    #[serde(default)]
    pub free_reroll: bool,
    #[serde(default)]
    pub reset_discards: bool,
    #[serde(default)]
    pub retrigger_held: bool,
    #[serde(default)]
    pub retrigger_scored_twice: bool,
    #[serde(default)]
    pub destroy_self: bool,
    #[serde(default)]
    pub destroy_right: bool,
    #[serde(default)]
    pub destroy_random_other: bool,
    #[serde(default)]
    pub all_cards_score: bool,
}

impl EffectFlags {
    pub fn any(&self) -> bool {
        *self != Self::default()
    }

    fn or_with(&mut self, other: &Self) {
        self.free_reroll |= other.free_reroll;
        self.reset_discards |= other.reset_discards;
        self.retrigger_held |= other.retrigger_held;
        self.retrigger_scored_twice |= other.retrigger_scored_twice;
        self.destroy_self |= other.destroy_self;
        self.destroy_right |= other.destroy_right;
        self.destroy_random_other |= other.destroy_random_other;
        self.all_cards_score |= other.all_cards_score;
    }
}

/// What one capability invocation hands back. `mul_mult` defaults to the
/// multiplicative identity, everything else to zero/empty.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectResult {
    pub chips: i64,
    pub mult: f64,
    pub mul_mult: f64,
    pub money: i64,
    pub grants: ResourceGrants,
    pub flags: EffectFlags,
    pub state_update: Option<StateBag>,
    pub message: Option<String>,
}

impl Default for EffectResult {
    fn default() -> Self {
        Self {
            chips: 0,
            mult: 0.0,
            mul_mult: 1.0,
            money: 0,
            grants: ResourceGrants::default(),
            flags: EffectFlags::default(),
            state_update: None,
            message: None,
        }
    }
}

impl EffectResult {
    pub fn chips(value: i64) -> Self {
        Self {
            chips: value,
            ..Self::default()
        }
    }

    pub fn mult(value: f64) -> Self {
        Self {
            mult: value,
            ..Self::default()
        }
    }

    pub fn mul_mult(factor: f64) -> Self {
        Self {
            mul_mult: factor,
            ..Self::default()
        }
    }

    pub fn money(value: i64) -> Self {
        Self {
            money: value,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn with_state_update(mut self, update: StateBag) -> Self {
        self.state_update = Some(update);
        self
    }

    /// True when something lands in the aggregate log: any numeric or
    /// boolean payload, or a message. A bare state update is applied but
    /// not logged.
    pub fn loggable(&self) -> bool {
        self.chips != 0
            || self.mult != 0.0
            || self.mul_mult != 1.0
            || self.money != 0
            || !self.grants.is_empty()
            || self.flags.any()
            || self.message.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub entity: String,
    pub message: Option<String>,
    pub chips: i64,
    pub mult: f64,
    pub mul_mult: f64,
    pub money: i64,
}

/// Accumulated outcome of one dispatch pass. Additive fields sum, the
/// multiplier compounds as a product, flags OR.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Aggregate {
    pub chips: i64,
    pub mult: f64,
    pub mul_mult: f64,
    pub money: i64,
    pub grants: ResourceGrants,
    pub flags: EffectFlags,
    pub log: Vec<LogEntry>,
}

impl Default for Aggregate {
    fn default() -> Self {
        Self {
            chips: 0,
            mult: 0.0,
            mul_mult: 1.0,
            money: 0,
            grants: ResourceGrants::default(),
            flags: EffectFlags::default(),
            log: Vec::new(),
        }
    }
}

impl Aggregate {
    pub fn merge(&mut self, entity_name: &str, result: &EffectResult) {
        self.chips += result.chips;
        self.mult += result.mult;
        if result.mul_mult != 1.0 {
            self.mul_mult *= result.mul_mult;
        }
        self.money += result.money;
        self.grants.accumulate(&result.grants);
        self.flags.or_with(&result.flags);
        if result.loggable() {
            self.log.push(LogEntry {
                entity: entity_name.to_string(),
                message: result.message.clone(),
                chips: result.chips,
                mult: result.mult,
                mul_mult: result.mul_mult,
                money: result.money,
            });
        }
    }
}
