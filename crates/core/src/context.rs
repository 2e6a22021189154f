use crate::{Card, EffectEntity, HandKind, StateBag, ALL_FACES_ID, TWO_COLORS_ID};

/// Board-wide rules derived from the presence of specific passive
/// entities. Recomputed from a container scan at the start of every
/// dispatch pass; never cached across passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardFlags {
    pub all_face_cards: bool,
    pub two_suit_colors: bool,
}

impl BoardFlags {
    pub fn scan(entities: &[EffectEntity]) -> Self {
        let mut flags = Self::default();
        for entity in entities {
            match entity.identity.as_str() {
                ALL_FACES_ID => flags.all_face_cards = true,
                TWO_COLORS_ID => flags.two_suit_colors = true,
                _ => {}
            }
        }
        flags
    }

    /// Face check under the current board rules.
    pub fn counts_as_face(&self, card: &Card) -> bool {
        self.all_face_cards || card.is_face()
    }
}

/// Event-scoped inputs, built once per dispatch. A superset record; only
/// the fields relevant to the fired trigger are populated.
#[derive(Debug, Clone, Default)]
pub struct EventPayload<'a> {
    pub hand_kind: Option<HandKind>,
    pub card: Option<Card>,
    pub played_cards: &'a [Card],
    pub scoring_cards: &'a [Card],
    pub held_cards: &'a [Card],
    pub discarded_cards: &'a [Card],
    pub money: i64,
    pub hands_left: u8,
    pub discards_left: u8,
    pub deck_size: usize,
    pub consumable_free_slots: usize,
    pub sold_value: Option<i64>,
}

impl<'a> EventPayload<'a> {
    /// The scoring-phase event: the whole played selection resolves.
    pub fn hand_played(
        hand_kind: HandKind,
        played_cards: &'a [Card],
        scoring_cards: &'a [Card],
        held_cards: &'a [Card],
    ) -> Self {
        Self {
            hand_kind: Some(hand_kind),
            played_cards,
            scoring_cards,
            held_cards,
            ..Self::default()
        }
    }

    /// Cards committed to the table, before any scoring.
    pub fn played(hand_kind: HandKind, played_cards: &'a [Card]) -> Self {
        Self {
            hand_kind: Some(hand_kind),
            played_cards,
            ..Self::default()
        }
    }

    /// One scoring card being evaluated.
    pub fn scored(
        hand_kind: HandKind,
        card: Card,
        played_cards: &'a [Card],
        scoring_cards: &'a [Card],
        held_cards: &'a [Card],
    ) -> Self {
        Self {
            hand_kind: Some(hand_kind),
            card: Some(card),
            played_cards,
            scoring_cards,
            held_cards,
            ..Self::default()
        }
    }

    /// One card held in hand during scoring.
    pub fn held(hand_kind: HandKind, card: Card, held_cards: &'a [Card]) -> Self {
        Self {
            hand_kind: Some(hand_kind),
            card: Some(card),
            held_cards,
            ..Self::default()
        }
    }

    pub fn discarded(card: Card, held_cards: &'a [Card], discarded_cards: &'a [Card]) -> Self {
        Self {
            card: Some(card),
            held_cards,
            discarded_cards,
            ..Self::default()
        }
    }

    pub fn card_added(card: Card) -> Self {
        Self {
            card: Some(card),
            ..Self::default()
        }
    }

    pub fn sold(sold_value: i64) -> Self {
        Self {
            sold_value: Some(sold_value),
            ..Self::default()
        }
    }

    /// Reroll, blind select, round end, shop exit, independent: no
    /// event-specific inputs beyond the snapshot numbers.
    pub fn ambient() -> Self {
        Self::default()
    }

    pub fn with_money(mut self, money: i64) -> Self {
        self.money = money;
        self
    }

    pub fn with_rounds(mut self, hands_left: u8, discards_left: u8) -> Self {
        self.hands_left = hands_left;
        self.discards_left = discards_left;
        self
    }

    pub fn with_deck_size(mut self, deck_size: usize) -> Self {
        self.deck_size = deck_size;
        self
    }

    pub fn with_consumable_slots(mut self, free: usize) -> Self {
        self.consumable_free_slots = free;
        self
    }
}

/// What one capability invocation gets to see: the event, the acting
/// entity's position and state, the whole pass snapshot, and the board
/// flags. Copy re-invocations receive the copying entity's context
/// unchanged.
#[derive(Debug, Clone)]
pub struct EffectContext<'a> {
    pub payload: &'a EventPayload<'a>,
    pub position: usize,
    pub entities: &'a [EffectEntity],
    pub state: &'a StateBag,
    pub flags: BoardFlags,
    pub container_free_slots: usize,
}

impl<'a> EffectContext<'a> {
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn left_slice(&self) -> &'a [EffectEntity] {
        &self.entities[..self.position.min(self.entities.len())]
    }

    pub fn right_slice(&self) -> &'a [EffectEntity] {
        if self.position + 1 >= self.entities.len() {
            &[]
        } else {
            &self.entities[self.position + 1..]
        }
    }

    pub fn left_neighbor(&self) -> Option<&'a EffectEntity> {
        self.left_slice().last()
    }

    pub fn right_neighbor(&self) -> Option<&'a EffectEntity> {
        self.right_slice().first()
    }

    pub fn leftmost(&self) -> Option<&'a EffectEntity> {
        self.entities.first()
    }

    pub fn rightmost(&self) -> Option<&'a EffectEntity> {
        self.entities.last()
    }

    pub fn state_value(&self, key: &str) -> f64 {
        self.state.get(key).copied().unwrap_or(0.0)
    }

    pub fn hand_kind(&self) -> Option<HandKind> {
        self.payload.hand_kind
    }
}
