//! Card definitions and the static card catalog.
//!
//! This module contains:
//! - Property colors with their completeness and rent tables
//! - Card kinds (money, property, action, rent)
//! - The `Catalog`: a deterministic mapping from card id to card definition,
//!   built once at process start and referenced everywhere by id lookup
//! - Game constants (turn budget, hand limit, win threshold, ...)

use serde::{Deserialize, Serialize};

/// Stable card identifier, assigned densely at catalog-build time.
pub type CardId = u32;

/// Identifier for a property set. Allocated by the game state.
pub type SetId = u32;

/// Player seat index (0-based, fixed at game start).
pub type PlayerId = u8;

/// Cards a player may play per turn.
pub const PLAYS_PER_TURN: u32 = 3;

/// Cards drawn at the start of a normal turn.
pub const DRAW_PER_TURN: usize = 2;

/// Cards drawn when starting a turn with an empty hand.
pub const DRAW_ON_EMPTY_HAND: usize = 5;

/// Cards dealt to each player when the game begins.
pub const DEAL_SIZE: usize = 5;

/// Maximum hand size at end of turn; excess is force-discarded.
pub const HAND_LIMIT: usize = 7;

/// Complete sets needed to win.
pub const SETS_TO_WIN: usize = 3;

/// Amount every player owes on a Birthday card.
pub const BIRTHDAY_AMOUNT: u32 = 2;

/// Amount the target owes on a Debt Collector card.
pub const DEBT_AMOUNT: u32 = 5;

/// Rent bonus added by a house on a complete set.
pub const HOUSE_RENT_BONUS: u32 = 3;

/// Rent bonus added by a hotel on a complete set.
pub const HOTEL_RENT_BONUS: u32 = 4;

/// Property colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Brown,
    LightBlue,
    Pink,
    Orange,
    Red,
    Yellow,
    Green,
    DarkBlue,
    Railroad,
    Utility,
}

impl Color {
    /// All colors, in catalog order.
    pub const ALL: [Color; 10] = [
        Color::Brown,
        Color::LightBlue,
        Color::Pink,
        Color::Orange,
        Color::Red,
        Color::Yellow,
        Color::Green,
        Color::DarkBlue,
        Color::Railroad,
        Color::Utility,
    ];

    /// Number of properties of this color that make a set complete.
    pub fn required_count(self) -> usize {
        match self {
            Color::Brown | Color::DarkBlue | Color::Utility => 2,
            Color::Railroad => 4,
            _ => 3,
        }
    }

    /// Base rent per owned-property count. Indexed by `count - 1`,
    /// capped at the end of the table.
    pub fn rent_tiers(self) -> &'static [u32] {
        match self {
            Color::Brown => &[1, 2],
            Color::LightBlue => &[1, 2, 3],
            Color::Pink => &[1, 2, 4],
            Color::Orange => &[1, 3, 5],
            Color::Red => &[2, 3, 6],
            Color::Yellow => &[2, 4, 6],
            Color::Green => &[2, 4, 7],
            Color::DarkBlue => &[3, 8],
            Color::Railroad => &[1, 2, 3, 4],
            Color::Utility => &[1, 2],
        }
    }

    /// Base rent for owning `count` properties of this color.
    pub fn base_rent(self, count: usize) -> u32 {
        if count == 0 {
            return 0;
        }
        let tiers = self.rent_tiers();
        tiers[count.min(tiers.len()) - 1]
    }
}

/// Typed effects for action cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Draw two cards.
    PassGo,
    /// Charge one player a fixed debt.
    DebtCollector,
    /// Charge every player a fixed amount.
    Birthday,
    /// Steal one property from an incomplete set.
    SlyDeal,
    /// Swap one of your properties for an opponent's.
    ForcedDeal,
    /// Steal a whole complete set.
    Dealbreaker,
    /// Block (or un-block) the most recent play in an interaction.
    JustSayNo,
    /// Doubles a rent request it is attached to.
    DoubleRent,
    /// Development for a complete set.
    House,
    /// Development for a complete set that already has a house.
    Hotel,
}

/// What a card is, independent of its id and point value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    /// Pure money, only ever banked or paid.
    Money,
    /// A property. One color is mono; all colors is a universal wild;
    /// two or more (but not all) is a dual wild.
    Property { colors: Vec<Color> },
    /// A typed action effect.
    Action { action: ActionKind },
    /// Rent restricted to a subset of colors. All colors = wild rent,
    /// which may target a single player.
    Rent { colors: Vec<Color> },
}

/// An immutable card definition. Cards have no identity beyond their id;
/// the catalog is the single source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Point value when banked or offered as payment.
    pub value: u32,
    pub kind: CardKind,
}

impl Card {
    pub fn is_property(&self) -> bool {
        matches!(self.kind, CardKind::Property { .. })
    }

    /// A property valid as every color. May join sets but never found one,
    /// and is never payable.
    pub fn is_universal_wild(&self) -> bool {
        match &self.kind {
            CardKind::Property { colors } => colors.len() == Color::ALL.len(),
            _ => false,
        }
    }

    /// The colors a property or rent card supports.
    pub fn colors(&self) -> &[Color] {
        match &self.kind {
            CardKind::Property { colors } | CardKind::Rent { colors } => colors,
            _ => &[],
        }
    }

    /// The implied color of a mono property, if any.
    pub fn single_color(&self) -> Option<Color> {
        match &self.kind {
            CardKind::Property { colors } if colors.len() == 1 => Some(colors[0]),
            _ => None,
        }
    }

    pub fn is_action(&self, action: ActionKind) -> bool {
        matches!(&self.kind, CardKind::Action { action: a } if *a == action)
    }

    pub fn is_rent(&self) -> bool {
        matches!(self.kind, CardKind::Rent { .. })
    }

    /// Wild rent covers every color and is the only rent that may be
    /// explicitly targeted.
    pub fn is_wild_rent(&self) -> bool {
        match &self.kind {
            CardKind::Rent { colors } => colors.len() == Color::ALL.len(),
            _ => false,
        }
    }

    /// Whether this card may sit in a bank (money, actions and rents may;
    /// properties may not).
    pub fn is_bankable(&self) -> bool {
        !self.is_property()
    }

    pub fn is_development(&self) -> bool {
        self.is_action(ActionKind::House) || self.is_action(ActionKind::Hotel)
    }
}

/// The static card catalog: card id -> immutable definition.
///
/// Built deterministically once per process. Handlers treat a missing id as
/// a validation failure, never a crash. No mutation after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    cards: Vec<Card>,
}

impl Catalog {
    /// Build the standard 106-card deck.
    pub fn standard() -> Self {
        let mut b = CatalogBuilder::default();

        // Money: 1M x6, 2M x5, 3M x3, 4M x3, 5M x2, 10M x1
        for (value, count) in [(1, 6), (2, 5), (3, 3), (4, 3), (5, 2), (10, 1)] {
            b.push_n(count, value, CardKind::Money);
        }

        // Mono properties, one per slot in the color's set requirement.
        for (color, value) in [
            (Color::Brown, 1),
            (Color::LightBlue, 1),
            (Color::Pink, 2),
            (Color::Orange, 2),
            (Color::Red, 3),
            (Color::Yellow, 3),
            (Color::Green, 4),
            (Color::DarkBlue, 4),
            (Color::Railroad, 2),
            (Color::Utility, 2),
        ] {
            b.push_n(
                color.required_count(),
                value,
                CardKind::Property {
                    colors: vec![color],
                },
            );
        }

        // Dual wilds.
        for (pair, value, count) in [
            ([Color::Pink, Color::Orange], 2, 2),
            ([Color::LightBlue, Color::Brown], 1, 1),
            ([Color::LightBlue, Color::Railroad], 4, 1),
            ([Color::DarkBlue, Color::Green], 4, 1),
            ([Color::Green, Color::Railroad], 4, 1),
            ([Color::Red, Color::Yellow], 3, 2),
            ([Color::Utility, Color::Railroad], 2, 1),
        ] {
            b.push_n(
                count,
                value,
                CardKind::Property {
                    colors: pair.to_vec(),
                },
            );
        }

        // Universal wilds: worth nothing, never payable.
        b.push_n(
            2,
            0,
            CardKind::Property {
                colors: Color::ALL.to_vec(),
            },
        );

        // Actions.
        for (action, value, count) in [
            (ActionKind::Dealbreaker, 5, 2),
            (ActionKind::JustSayNo, 4, 3),
            (ActionKind::SlyDeal, 3, 3),
            (ActionKind::ForcedDeal, 3, 4),
            (ActionKind::DebtCollector, 3, 3),
            (ActionKind::Birthday, 2, 3),
            (ActionKind::DoubleRent, 1, 2),
            (ActionKind::House, 3, 3),
            (ActionKind::Hotel, 4, 2),
            (ActionKind::PassGo, 1, 10),
        ] {
            b.push_n(count, value, CardKind::Action { action });
        }

        // Two-color rents.
        for pair in [
            [Color::DarkBlue, Color::Green],
            [Color::Brown, Color::LightBlue],
            [Color::Pink, Color::Orange],
            [Color::Railroad, Color::Utility],
            [Color::Red, Color::Yellow],
        ] {
            b.push_n(
                2,
                1,
                CardKind::Rent {
                    colors: pair.to_vec(),
                },
            );
        }

        // Wild rents.
        b.push_n(
            3,
            3,
            CardKind::Rent {
                colors: Color::ALL.to_vec(),
            },
        );

        Self { cards: b.cards }
    }

    /// Look up a card by id.
    pub fn lookup(&self, id: CardId) -> Option<&Card> {
        self.cards.get(id as usize)
    }

    /// Number of cards in the deck.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// All card ids, in catalog order. Used to seed the draw pile.
    pub fn all_ids(&self) -> Vec<CardId> {
        (0..self.cards.len() as CardId).collect()
    }

    /// Total point value of a slice of card ids. Unknown ids count zero.
    pub fn total_value(&self, ids: &[CardId]) -> u32 {
        ids.iter()
            .filter_map(|&id| self.lookup(id))
            .map(|c| c.value)
            .sum()
    }
}

#[derive(Default)]
struct CatalogBuilder {
    cards: Vec<Card>,
}

impl CatalogBuilder {
    fn push_n(&mut self, count: usize, value: u32, kind: CardKind) {
        for _ in 0..count {
            let id = self.cards.len() as CardId;
            self.cards.push(Card {
                id,
                value,
                kind: kind.clone(),
            });
        }
    }
}
