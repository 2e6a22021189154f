use crate::{BoardFlags, Card, Rank, Suit};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandKind {
    HighCard,
    Pair,
    TwoPair,
    Trips,
    Straight,
    Flush,
    FullHouse,
    Quads,
    StraightFlush,
    RoyalFlush,
    FiveOfAKind,
    FlushHouse,
    FlushFive,
}

impl HandKind {
    pub const ALL: [HandKind; 13] = [
        HandKind::HighCard,
        HandKind::Pair,
        HandKind::TwoPair,
        HandKind::Trips,
        HandKind::Straight,
        HandKind::Flush,
        HandKind::FullHouse,
        HandKind::Quads,
        HandKind::StraightFlush,
        HandKind::RoyalFlush,
        HandKind::FiveOfAKind,
        HandKind::FlushHouse,
        HandKind::FlushFive,
    ];

    pub fn id(self) -> &'static str {
        match self {
            HandKind::HighCard => "high_card",
            HandKind::Pair => "pair",
            HandKind::TwoPair => "two_pair",
            HandKind::Trips => "trips",
            HandKind::Straight => "straight",
            HandKind::Flush => "flush",
            HandKind::FullHouse => "full_house",
            HandKind::Quads => "quads",
            HandKind::StraightFlush => "straight_flush",
            HandKind::RoyalFlush => "royal_flush",
            HandKind::FiveOfAKind => "five_kind",
            HandKind::FlushHouse => "flush_house",
            HandKind::FlushFive => "flush_five",
        }
    }
}

/// Royal flushes share the straight-flush upgrade ledger entry.
pub fn level_kind(kind: HandKind) -> HandKind {
    match kind {
        HandKind::RoyalFlush => HandKind::StraightFlush,
        other => other,
    }
}

pub fn evaluate_hand(cards: &[Card]) -> HandKind {
    evaluate_hand_with_flags(cards, BoardFlags::default())
}

/// Classifies a played selection. Stone cards never participate in the
/// rank/suit shape; `two_suit_colors` merges suits into their color
/// buckets for flush detection.
pub fn evaluate_hand_with_flags(cards: &[Card], flags: BoardFlags) -> HandKind {
    let shaped: Vec<Card> = cards.iter().copied().filter(|c| !c.is_stone()).collect();
    if shaped.is_empty() {
        return HandKind::HighCard;
    }

    let mut rank_counts: HashMap<Rank, usize> = HashMap::new();
    let mut suit_counts: HashMap<u8, usize> = HashMap::new();
    for card in &shaped {
        *rank_counts.entry(card.rank).or_insert(0) += 1;
        *suit_counts
            .entry(suit_bucket(card.suit, flags.two_suit_colors))
            .or_insert(0) += 1;
    }

    let mut profile: Vec<usize> = rank_counts.values().copied().collect();
    profile.sort_by(|a, b| b.cmp(a));

    // TODO: count wild-suited cards toward the dominant suit bucket for
    // flush detection.
    let flush = shaped.len() == 5 && suit_counts.len() == 1;
    let straight = shaped.len() == 5 && is_straight(&shaped);

    if shaped.len() == 5 {
        return match (profile.as_slice(), flush) {
            ([5], true) => HandKind::FlushFive,
            ([5], false) => HandKind::FiveOfAKind,
            ([4, 1], _) => HandKind::Quads,
            ([3, 2], true) => HandKind::FlushHouse,
            ([3, 2], false) => HandKind::FullHouse,
            (_, true) if straight && is_royal(&shaped) => HandKind::RoyalFlush,
            (_, true) if straight => HandKind::StraightFlush,
            (_, true) => HandKind::Flush,
            _ if straight => HandKind::Straight,
            ([3, 1, 1], _) => HandKind::Trips,
            ([2, 2, 1], _) => HandKind::TwoPair,
            ([2, 1, 1, 1], _) => HandKind::Pair,
            _ => HandKind::HighCard,
        };
    }

    // Partial selections still rank their repeated-card shape.
    match profile.as_slice() {
        [4] => HandKind::Quads,
        [3] | [3, 1] => HandKind::Trips,
        [2, 2] => HandKind::TwoPair,
        [2] | [2, 1] | [2, 1, 1] => HandKind::Pair,
        _ => HandKind::HighCard,
    }
}

fn suit_bucket(suit: Suit, two_colors: bool) -> u8 {
    if two_colors {
        match suit {
            Suit::Spades | Suit::Clubs => 0,
            Suit::Hearts | Suit::Diamonds => 1,
            Suit::Wild => 2,
        }
    } else {
        match suit {
            Suit::Spades => 0,
            Suit::Hearts => 1,
            Suit::Clubs => 2,
            Suit::Diamonds => 3,
            Suit::Wild => 4,
        }
    }
}

/// Indices of the cards that actually score for `kind`, in play order.
/// Stone cards always score regardless of the hand shape.
pub fn scoring_cards(cards: &[Card], kind: HandKind) -> Vec<usize> {
    if cards.is_empty() {
        return Vec::new();
    }

    let mut rank_counts: HashMap<Rank, usize> = HashMap::new();
    for card in cards.iter().filter(|c| !c.is_stone()) {
        *rank_counts.entry(card.rank).or_insert(0) += 1;
    }

    let mut scoring: Vec<usize> = match kind {
        HandKind::HighCard => top_card_index(cards).into_iter().collect(),
        HandKind::Pair => group_indices(cards, &rank_counts, 2, 1),
        HandKind::TwoPair => group_indices(cards, &rank_counts, 2, 2),
        HandKind::Trips => group_indices(cards, &rank_counts, 3, 1),
        HandKind::Quads => group_indices(cards, &rank_counts, 4, 1),
        _ => (0..cards.len()).filter(|i| !cards[*i].is_stone()).collect(),
    };

    scoring.extend(
        cards
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_stone())
            .map(|(i, _)| i),
    );
    scoring.sort_unstable();
    scoring.dedup();
    scoring
}

fn is_straight(cards: &[Card]) -> bool {
    let mut values: Vec<u8> = cards.iter().map(|card| rank_value(card.rank)).collect();
    values.sort_unstable();
    values.dedup();
    if values.len() != 5 {
        return false;
    }
    if values == [2, 3, 4, 5, 14] {
        return true;
    }
    values.windows(2).all(|w| w[1] - w[0] == 1)
}

fn is_royal(cards: &[Card]) -> bool {
    let mut values: Vec<u8> = cards.iter().map(|card| rank_value(card.rank)).collect();
    values.sort_unstable();
    values == [10, 11, 12, 13, 14]
}

fn rank_value(rank: Rank) -> u8 {
    match rank {
        Rank::Ace => 14,
        Rank::Two => 2,
        Rank::Three => 3,
        Rank::Four => 4,
        Rank::Five => 5,
        Rank::Six => 6,
        Rank::Seven => 7,
        Rank::Eight => 8,
        Rank::Nine => 9,
        Rank::Ten => 10,
        Rank::Jack => 11,
        Rank::Queen => 12,
        Rank::King => 13,
    }
}

fn top_card_index(cards: &[Card]) -> Option<usize> {
    cards
        .iter()
        .enumerate()
        .filter(|(_, card)| !card.is_stone())
        .max_by_key(|(_, card)| rank_value(card.rank))
        .map(|(idx, _)| idx)
}

fn group_indices(
    cards: &[Card],
    rank_counts: &HashMap<Rank, usize>,
    count: usize,
    max_groups: usize,
) -> Vec<usize> {
    let mut ranks: Vec<Rank> = rank_counts
        .iter()
        .filter(|(_, &c)| c == count)
        .map(|(r, _)| *r)
        .collect();
    ranks.sort_by(|a, b| rank_value(*b).cmp(&rank_value(*a)));
    ranks.truncate(max_groups);

    cards
        .iter()
        .enumerate()
        .filter(|(_, card)| !card.is_stone() && ranks.contains(&card.rank))
        .map(|(idx, _)| idx)
        .collect()
}
