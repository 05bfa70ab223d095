//! Property sets and the per-player property ledger.
//!
//! The ledger owns every played property for one player: a forward map of
//! set id -> `PropertySet` plus two derived indices (card id -> set id,
//! development id -> set id) for O(1) lookup. The three maps mutate only
//! inside this module's operations, and every operation detects its illegal
//! path before touching state.

use crate::cards::{ActionKind, Card, CardId, Catalog, Color, SetId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A same-color grouping of played property cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySet {
    pub id: SetId,
    /// None only while the set holds nothing but universal wilds.
    pub color: Option<Color>,
    /// Property cards, in play order.
    pub cards: Vec<CardId>,
    pub house: Option<CardId>,
    pub hotel: Option<CardId>,
    /// Derived: `color` assigned and card count meets the color requirement.
    pub complete: bool,
}

impl PropertySet {
    fn new(id: SetId, color: Option<Color>) -> Self {
        Self {
            id,
            color,
            cards: Vec::new(),
            house: None,
            hotel: None,
            complete: false,
        }
    }

    fn recompute_complete(&mut self) {
        self.complete = match self.color {
            Some(color) => self.cards.len() >= color.required_count(),
            None => false,
        };
    }

    fn is_empty(&self) -> bool {
        self.cards.is_empty() && self.house.is_none() && self.hotel.is_none()
    }

    /// Rent bonus from developments. Only complete sets keep developments,
    /// so this is zero the moment completeness breaks.
    pub fn development_bonus(&self) -> u32 {
        let mut bonus = 0;
        if self.house.is_some() {
            bonus += crate::cards::HOUSE_RENT_BONUS;
        }
        if self.hotel.is_some() {
            bonus += crate::cards::HOTEL_RENT_BONUS;
        }
        bonus
    }
}

/// Result of removing a property card from a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedProperty {
    /// The set the card left.
    pub set_id: SetId,
    /// Developments stripped because the set lost completeness. The caller
    /// places these on the discard pile.
    pub discarded_developments: Vec<CardId>,
}

/// One player's property sets with derived membership indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyLedger {
    sets: HashMap<SetId, PropertySet>,
    card_index: HashMap<CardId, SetId>,
    development_index: HashMap<CardId, SetId>,
}

impl PropertyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, set_id: SetId) -> Option<&PropertySet> {
        self.sets.get(&set_id)
    }

    /// The set a played property card belongs to.
    pub fn set_of_card(&self, card_id: CardId) -> Option<SetId> {
        self.card_index.get(&card_id).copied()
    }

    /// The set a played development belongs to.
    pub fn set_of_development(&self, card_id: CardId) -> Option<SetId> {
        self.development_index.get(&card_id).copied()
    }

    pub fn sets(&self) -> impl Iterator<Item = &PropertySet> {
        self.sets.values()
    }

    pub fn complete_set_count(&self) -> usize {
        self.sets.values().filter(|s| s.complete).count()
    }

    /// Number of property cards in sets of the given color.
    pub fn color_card_count(&self, color: Color) -> usize {
        self.sets
            .values()
            .filter(|s| s.color == Some(color))
            .map(|s| s.cards.len())
            .sum()
    }

    /// Every property card in the ledger, in set-id order.
    pub fn all_cards(&self) -> Vec<CardId> {
        let mut ids: Vec<SetId> = self.sets.keys().copied().collect();
        ids.sort_unstable();
        ids.iter()
            .flat_map(|id| self.sets[id].cards.iter().copied())
            .collect()
    }

    /// Place a property card, preferring an existing incomplete set of the
    /// chosen color, then an incomplete colorless set, then a new set under
    /// `fresh_set_id`. Universal wilds may only join, never found. Returns
    /// the set the card landed in, or None if placement is illegal.
    pub fn add_property(&mut self, card: &Card, color: Color, fresh_set_id: SetId) -> Option<SetId> {
        if !card.is_property() || !card.colors().contains(&color) {
            return None;
        }
        if self.card_index.contains_key(&card.id) {
            return None;
        }

        let target = self
            .pick_set(|s| !s.complete && s.color == Some(color))
            .or_else(|| self.pick_set(|s| s.color.is_none()));

        let set_id = match target {
            Some(id) => id,
            None if card.is_universal_wild() => return None,
            None => {
                self.sets
                    .insert(fresh_set_id, PropertySet::new(fresh_set_id, Some(color)));
                fresh_set_id
            }
        };

        let set = self.sets.get_mut(&set_id).expect("picked set exists");
        // A non-universal card fixes the color of a colorless set.
        if set.color.is_none() && !card.is_universal_wild() {
            set.color = Some(color);
        }
        set.cards.push(card.id);
        set.recompute_complete();
        self.card_index.insert(card.id, set_id);
        Some(set_id)
    }

    /// Whether `add_property` would succeed, without mutating. Used to keep
    /// transfers all-or-nothing: verification precedes removal elsewhere.
    pub fn can_add_property(&self, card: &Card, color: Color) -> bool {
        if !card.is_property() || !card.colors().contains(&color) {
            return false;
        }
        if self.card_index.contains_key(&card.id) {
            return false;
        }
        if card.is_universal_wild() {
            self.sets
                .values()
                .any(|s| (!s.complete && s.color == Some(color)) || s.color.is_none())
        } else {
            true
        }
    }

    /// Place a property into one specific incomplete set, bypassing the
    /// placement preference. Universal wilds may join any incomplete set.
    pub fn add_property_to_set(&mut self, card: &Card, color: Color, set_id: SetId) -> bool {
        if !card.is_property() || self.card_index.contains_key(&card.id) {
            return false;
        }
        let Some(set) = self.sets.get_mut(&set_id) else {
            return false;
        };
        if set.complete {
            return false;
        }
        if !card.is_universal_wild() {
            if !card.colors().contains(&color) {
                return false;
            }
            match set.color {
                Some(existing) if existing != color => return false,
                Some(_) => {}
                None => set.color = Some(color),
            }
        }
        set.cards.push(card.id);
        set.recompute_complete();
        self.card_index.insert(card.id, set_id);
        true
    }

    /// Found a brand-new set for a card, never joining an existing one.
    /// Universal wilds are rejected: they may only join.
    pub fn found_new_set(&mut self, card: &Card, color: Color, fresh_set_id: SetId) -> Option<SetId> {
        if !card.is_property()
            || card.is_universal_wild()
            || !card.colors().contains(&color)
            || self.card_index.contains_key(&card.id)
            || self.sets.contains_key(&fresh_set_id)
        {
            return None;
        }
        let mut set = PropertySet::new(fresh_set_id, Some(color));
        set.cards.push(card.id);
        set.recompute_complete();
        self.card_index.insert(card.id, fresh_set_id);
        self.sets.insert(fresh_set_id, set);
        Some(fresh_set_id)
    }

    /// Remove a property card. Strips developments if completeness breaks,
    /// resets the set color when only universal wilds remain, and prunes the
    /// set once it holds nothing.
    pub fn remove_property(&mut self, card_id: CardId, catalog: &Catalog) -> Option<RemovedProperty> {
        let set_id = *self.card_index.get(&card_id)?;
        let set = self.sets.get_mut(&set_id)?;
        let pos = set.cards.iter().position(|&c| c == card_id)?;

        set.cards.remove(pos);
        self.card_index.remove(&card_id);

        // Color resets only when every remaining card is a universal wild.
        let all_universal = set
            .cards
            .iter()
            .all(|&c| catalog.lookup(c).is_some_and(|card| card.is_universal_wild()));
        if all_universal {
            set.color = None;
        }

        set.recompute_complete();

        let mut discarded = Vec::new();
        if !set.complete {
            if let Some(house) = set.house.take() {
                self.development_index.remove(&house);
                discarded.push(house);
            }
            if let Some(hotel) = set.hotel.take() {
                self.development_index.remove(&hotel);
                discarded.push(hotel);
            }
        }

        if set.is_empty() {
            self.sets.remove(&set_id);
        }

        Some(RemovedProperty {
            set_id,
            discarded_developments: discarded,
        })
    }

    /// Attach a house or hotel to a complete set. House before hotel, at
    /// most one of each.
    pub fn add_development(&mut self, card_id: CardId, kind: ActionKind, set_id: SetId) -> bool {
        let Some(set) = self.sets.get_mut(&set_id) else {
            return false;
        };
        if !set.complete || self.development_index.contains_key(&card_id) {
            return false;
        }
        match kind {
            ActionKind::House if set.house.is_none() => set.house = Some(card_id),
            ActionKind::Hotel if set.house.is_some() && set.hotel.is_none() => {
                set.hotel = Some(card_id)
            }
            _ => return false,
        }
        self.development_index.insert(card_id, set_id);
        true
    }

    pub fn remove_development(&mut self, card_id: CardId) -> bool {
        let Some(set_id) = self.development_index.remove(&card_id) else {
            return false;
        };
        if let Some(set) = self.sets.get_mut(&set_id) {
            if set.house == Some(card_id) {
                set.house = None;
            } else if set.hotel == Some(card_id) {
                set.hotel = None;
            }
            if set.is_empty() {
                self.sets.remove(&set_id);
            }
        }
        true
    }

    /// Detach a whole set, dropping every derived index entry for it.
    /// Used for set transfer and the remove/re-add refresh idiom.
    pub fn remove_set(&mut self, set_id: SetId) -> Option<PropertySet> {
        let set = self.sets.remove(&set_id)?;
        for card in &set.cards {
            self.card_index.remove(card);
        }
        if let Some(house) = set.house {
            self.development_index.remove(&house);
        }
        if let Some(hotel) = set.hotel {
            self.development_index.remove(&hotel);
        }
        Some(set)
    }

    /// Insert a whole set, re-deriving every index entry for it.
    pub fn insert_set(&mut self, set: PropertySet) {
        for card in &set.cards {
            self.card_index.insert(*card, set.id);
        }
        if let Some(house) = set.house {
            self.development_index.insert(house, set.id);
        }
        if let Some(hotel) = set.hotel {
            self.development_index.insert(hotel, set.id);
        }
        self.sets.insert(set.id, set);
    }

    /// Lowest-id set matching the predicate, for deterministic placement.
    fn pick_set<F: Fn(&PropertySet) -> bool>(&self, pred: F) -> Option<SetId> {
        self.sets
            .values()
            .filter(|s| pred(s))
            .map(|s| s.id)
            .min()
    }
}
