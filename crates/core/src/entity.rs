use crate::{Edition, EffectContext, EffectResult, RngState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Event kinds an entity capability can react to. Closed set; the
/// dispatcher walks the container once per fired trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    OnScored,
    OnHeld,
    OnDiscard,
    OnPlay,
    OnHandPlayed,
    OnReroll,
    OnBlindSelect,
    OnCardAdded,
    EndOfRound,
    Independent,
    OnSell,
    OnShopExit,
}

impl Trigger {
    pub const ALL: [Trigger; 12] = [
        Trigger::OnScored,
        Trigger::OnHeld,
        Trigger::OnDiscard,
        Trigger::OnPlay,
        Trigger::OnHandPlayed,
        Trigger::OnReroll,
        Trigger::OnBlindSelect,
        Trigger::OnCardAdded,
        Trigger::EndOfRound,
        Trigger::Independent,
        Trigger::OnSell,
        Trigger::OnShopExit,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Trigger::OnScored => "on_scored",
            Trigger::OnHeld => "on_held",
            Trigger::OnDiscard => "on_discard",
            Trigger::OnPlay => "on_play",
            Trigger::OnHandPlayed => "on_hand_played",
            Trigger::OnReroll => "on_reroll",
            Trigger::OnBlindSelect => "on_blind_select",
            Trigger::OnCardAdded => "on_card_added",
            Trigger::EndOfRound => "end_of_round",
            Trigger::Independent => "independent",
            Trigger::OnSell => "on_sell",
            Trigger::OnShopExit => "on_shop_exit",
        }
    }

    /// Entities reacting on these triggers are never valid copy targets,
    /// whatever their other metadata says.
    pub fn never_copyable(self) -> bool {
        matches!(self, Trigger::Independent | Trigger::EndOfRound)
    }
}

/// Per-instance mutable state. Only `merge_state` writes it, and only the
/// dispatcher's commit step calls that.
pub type StateBag = HashMap<String, f64>;

/// Pure merge of a partial update into an existing bag.
pub fn merge_state(old: &StateBag, update: &StateBag) -> StateBag {
    let mut merged = old.clone();
    for (key, value) in update {
        merged.insert(key.clone(), *value);
    }
    merged
}

/// An effect body. Receives the acting entity's context plus the shared
/// rng; returns what it wants folded into the aggregate.
pub type Capability = Arc<dyn Fn(&EffectContext<'_>, &mut RngState) -> EffectResult + Send + Sync>;

/// One optional slot per trigger. Absence means "does nothing for that
/// event"; invocation is a presence check, never a name lookup.
#[derive(Clone, Default)]
pub struct CapabilitySet {
    pub on_scored: Option<Capability>,
    pub on_held: Option<Capability>,
    pub on_discard: Option<Capability>,
    pub on_play: Option<Capability>,
    pub on_hand_played: Option<Capability>,
    pub on_reroll: Option<Capability>,
    pub on_blind_select: Option<Capability>,
    pub on_card_added: Option<Capability>,
    pub end_of_round: Option<Capability>,
    pub independent: Option<Capability>,
    pub on_sell: Option<Capability>,
    pub on_shop_exit: Option<Capability>,
}

impl CapabilitySet {
    pub fn get(&self, trigger: Trigger) -> Option<&Capability> {
        match trigger {
            Trigger::OnScored => self.on_scored.as_ref(),
            Trigger::OnHeld => self.on_held.as_ref(),
            Trigger::OnDiscard => self.on_discard.as_ref(),
            Trigger::OnPlay => self.on_play.as_ref(),
            Trigger::OnHandPlayed => self.on_hand_played.as_ref(),
            Trigger::OnReroll => self.on_reroll.as_ref(),
            Trigger::OnBlindSelect => self.on_blind_select.as_ref(),
            Trigger::OnCardAdded => self.on_card_added.as_ref(),
            Trigger::EndOfRound => self.end_of_round.as_ref(),
            Trigger::Independent => self.independent.as_ref(),
            Trigger::OnSell => self.on_sell.as_ref(),
            Trigger::OnShopExit => self.on_shop_exit.as_ref(),
        }
    }

    pub fn set(&mut self, trigger: Trigger, capability: Capability) {
        let slot = match trigger {
            Trigger::OnScored => &mut self.on_scored,
            Trigger::OnHeld => &mut self.on_held,
            Trigger::OnDiscard => &mut self.on_discard,
            Trigger::OnPlay => &mut self.on_play,
            Trigger::OnHandPlayed => &mut self.on_hand_played,
            Trigger::OnReroll => &mut self.on_reroll,
            Trigger::OnBlindSelect => &mut self.on_blind_select,
            Trigger::OnCardAdded => &mut self.on_card_added,
            Trigger::EndOfRound => &mut self.end_of_round,
            Trigger::Independent => &mut self.independent,
            Trigger::OnSell => &mut self.on_sell,
            Trigger::OnShopExit => &mut self.on_shop_exit,
        };
        *slot = Some(capability);
    }

    pub fn is_empty(&self) -> bool {
        Trigger::ALL.iter().all(|t| self.get(*t).is_none())
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound: Vec<&str> = Trigger::ALL
            .iter()
            .copied()
            .filter(|t| self.get(*t).is_some())
            .map(Trigger::id)
            .collect();
        f.debug_struct("CapabilitySet").field("bound", &bound).finish()
    }
}

pub const RIGHT_COPY_ID: &str = "blueprint";
pub const LEFT_COPY_ID: &str = "brainstorm";
pub const ALL_FACES_ID: &str = "pareidolia";
pub const TWO_COLORS_ID: &str = "smeared_joker";

/// Purely passive board-wide entities; copying them is meaningless.
pub const COPY_DENYLIST: [&str; 2] = [ALL_FACES_ID, TWO_COLORS_ID];

/// A stateful effect unit occupying one container slot.
#[derive(Debug, Clone)]
pub struct EffectEntity {
    pub identity: String,
    pub name: String,
    pub trigger: Trigger,
    pub capabilities: CapabilitySet,
    pub state: StateBag,
    pub edition: Option<Edition>,
    pub copyable: bool,
    pub probability: bool,
}

impl EffectEntity {
    pub fn new(identity: &str, name: &str, trigger: Trigger) -> Self {
        Self {
            identity: identity.to_string(),
            name: name.to_string(),
            trigger,
            capabilities: CapabilitySet::default(),
            state: StateBag::new(),
            edition: None,
            copyable: true,
            probability: false,
        }
    }

    pub fn with_capability(mut self, trigger: Trigger, capability: Capability) -> Self {
        self.capabilities.set(trigger, capability);
        self
    }

    pub fn with_edition(mut self, edition: Edition) -> Self {
        self.edition = Some(edition);
        self
    }

    pub fn non_copyable(mut self) -> Self {
        self.copyable = false;
        self
    }

    pub fn probabilistic(mut self) -> Self {
        self.probability = true;
        self
    }

    pub fn is_right_copy(&self) -> bool {
        self.identity == RIGHT_COPY_ID
    }

    pub fn is_left_copy(&self) -> bool {
        self.identity == LEFT_COPY_ID
    }

    pub fn is_copy_kind(&self) -> bool {
        self.is_right_copy() || self.is_left_copy()
    }

    pub fn copy_eligible(&self) -> bool {
        self.copyable
            && !self.trigger.never_copyable()
            && !COPY_DENYLIST.contains(&self.identity.as_str())
    }

    pub fn state_value(&self, key: &str) -> f64 {
        self.state.get(key).copied().unwrap_or(0.0)
    }
}
