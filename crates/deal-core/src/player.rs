//! Per-player state: hand, bank, and property ledger.

use crate::cards::{CardId, Catalog, PlayerId};
use crate::property::PropertyLedger;
use serde::{Deserialize, Serialize};

/// A single player's state.
///
/// The hand is visible only to its owner; the bank and ledger are public.
/// Snapshots replace the hand with its count for everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Seat index, fixed at game start.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Cards in hand, in draw order.
    pub hand: Vec<CardId>,
    /// Banked money and action cards. Treated as an unordered set.
    pub bank: Vec<CardId>,
    /// Played properties.
    pub properties: PropertyLedger,
}

impl PlayerState {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::new(),
            bank: Vec::new(),
            properties: PropertyLedger::new(),
        }
    }

    pub fn has_in_hand(&self, card_id: CardId) -> bool {
        self.hand.contains(&card_id)
    }

    /// Remove a card from hand. Returns false if not held.
    pub fn take_from_hand(&mut self, card_id: CardId) -> bool {
        if let Some(pos) = self.hand.iter().position(|&c| c == card_id) {
            self.hand.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn has_in_bank(&self, card_id: CardId) -> bool {
        self.bank.contains(&card_id)
    }

    /// Remove a card from the bank. Returns false if not banked.
    pub fn take_from_bank(&mut self, card_id: CardId) -> bool {
        if let Some(pos) = self.bank.iter().position(|&c| c == card_id) {
            self.bank.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn bank_value(&self, catalog: &Catalog) -> u32 {
        catalog.total_value(&self.bank)
    }

    /// Everything the player can legally offer as payment: the whole bank
    /// plus every non-universal-wild property.
    pub fn payable_cards(&self, catalog: &Catalog) -> Vec<CardId> {
        let mut cards = self.bank.clone();
        cards.extend(
            self.properties
                .all_cards()
                .into_iter()
                .filter(|&id| catalog.lookup(id).is_some_and(|c| !c.is_universal_wild())),
        );
        cards
    }

    /// Total value of everything payable.
    pub fn payable_value(&self, catalog: &Catalog) -> u32 {
        catalog.total_value(&self.payable_cards(catalog))
    }

    pub fn complete_set_count(&self) -> usize {
        self.properties.complete_set_count()
    }
}
