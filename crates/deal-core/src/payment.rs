//! Payment settlement for rent and fixed charges.
//!
//! Verification fully precedes mutation: every offered card is checked for
//! membership in the payer's bank or ledger, universal wilds are refused,
//! and the short-pay regime (total payable <= amount owed means the offer
//! must be everything payable) is enforced before a single card moves.
//! Transfer is all-or-nothing.

use crate::cards::{CardId, Color, PlayerId, SetId};
use crate::game::GameState;

/// The applied result of a settled charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Bank cards moved to the payee's bank.
    pub bank_cards: Vec<CardId>,
    /// Properties moved to the payee's ledger, with their destination set.
    pub properties: Vec<(CardId, SetId)>,
}

/// Rent settlement additionally reports where the value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentSettlement {
    pub settlement: Settlement,
    pub bank_value: u32,
    pub property_value: u32,
}

/// The verified transfer plan: which offered cards come from the bank and
/// which from the ledger (with the color they occupied there).
struct Offer {
    bank_cards: Vec<CardId>,
    properties: Vec<(CardId, Color)>,
    bank_value: u32,
    property_value: u32,
}

/// Settle a fixed charge (birthday, debt collector). Returns None without
/// mutating anything if the offer is illegal.
pub fn settle_charge(
    state: &mut GameState,
    payer: PlayerId,
    payee: PlayerId,
    offered: &[CardId],
    amount: u32,
) -> Option<Settlement> {
    let offer = verify_offer(state, payer, offered, amount)?;
    Some(execute(state, payer, payee, offer))
}

/// Settle a rent charge. Same rules as [`settle_charge`], but the result
/// tracks bank-sourced and property-sourced value separately.
pub fn settle_rent(
    state: &mut GameState,
    payer: PlayerId,
    payee: PlayerId,
    offered: &[CardId],
    amount: u32,
) -> Option<RentSettlement> {
    let offer = verify_offer(state, payer, offered, amount)?;
    let bank_value = offer.bank_value;
    let property_value = offer.property_value;
    let settlement = execute(state, payer, payee, offer);
    Some(RentSettlement {
        settlement,
        bank_value,
        property_value,
    })
}

/// Check every offered card and the payment regime. No mutation.
fn verify_offer(state: &GameState, payer: PlayerId, offered: &[CardId], amount: u32) -> Option<Offer> {
    let player = state.get_player(payer)?;

    // Duplicate ids would double-count value.
    for (i, id) in offered.iter().enumerate() {
        if offered[..i].contains(id) {
            return None;
        }
    }

    let mut offer = Offer {
        bank_cards: Vec::new(),
        properties: Vec::new(),
        bank_value: 0,
        property_value: 0,
    };

    for &id in offered {
        let card = state.catalog.lookup(id)?;
        if card.is_universal_wild() {
            return None;
        }
        if player.has_in_bank(id) {
            offer.bank_cards.push(id);
            offer.bank_value += card.value;
        } else if let Some(set_id) = player.properties.set_of_card(id) {
            // The color it occupied at the payer decides its destination.
            let color = player.properties.get(set_id)?.color?;
            offer.properties.push((id, color));
            offer.property_value += card.value;
        } else {
            return None;
        }
    }

    let offered_value = offer.bank_value + offer.property_value;
    let total_payable = player.payable_value(&state.catalog);

    if total_payable <= amount {
        // Short-pay regime: the offer must be everything payable.
        let mut everything = player.payable_cards(&state.catalog);
        let mut given: Vec<CardId> = offered.to_vec();
        everything.sort_unstable();
        given.sort_unstable();
        if given != everything {
            return None;
        }
    } else if offered_value < amount {
        return None;
    }

    Some(offer)
}

/// Apply a verified offer. Developments broken loose at the payer go to
/// the discard pile; properties re-home at the payee under the color they
/// held at the payer.
fn execute(state: &mut GameState, payer: PlayerId, payee: PlayerId, offer: Offer) -> Settlement {
    for &id in &offer.bank_cards {
        state.players[payer as usize].take_from_bank(id);
        state.players[payee as usize].bank.push(id);
    }

    let mut placed = Vec::with_capacity(offer.properties.len());
    for &(id, color) in &offer.properties {
        let removed = state.players[payer as usize]
            .properties
            .remove_property(id, &state.catalog)
            .expect("verified property exists at payer");
        state.discard.extend(removed.discarded_developments);

        let card = state
            .catalog
            .lookup(id)
            .expect("verified card exists")
            .clone();
        let fresh = state.alloc_set_id();
        let dest = state.players[payee as usize]
            .properties
            .add_property(&card, color, fresh)
            .expect("verified color is valid for this card");
        placed.push((id, dest));
    }

    Settlement {
        bank_cards: offer.bank_cards,
        properties: placed,
    }
}
