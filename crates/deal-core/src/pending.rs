//! In-flight adversarial exchanges awaiting a response.
//!
//! A pending interaction tracks one directed exchange (rent charge, debt,
//! birthday, steal, swap, set steal) between an initiator and a target,
//! including the Just-Say-No escalation ladder on both sides. The registry
//! holds every unresolved interaction for a game; a multi-target effect
//! fans out one entry per victim.

use crate::cards::{CardId, Color, PlayerId, SetId};
use serde::{Deserialize, Serialize};

/// The triggering payload of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Claim {
    /// Rent charge. The amount is recomputed at settlement time from the
    /// charger's holdings, so the request stores its inputs.
    Rent { color: Color, doublers: u32 },
    /// Fixed debt charge.
    DebtCollect,
    /// Fixed birthday charge.
    Birthday,
    /// Steal one property from an incomplete set. `color_choice` is where
    /// the initiator will place a stolen wild.
    SlyDeal {
        target_card: CardId,
        color_choice: Option<Color>,
    },
    /// Swap `offered_card` (initiator's) for `target_card` (victim's).
    ForcedDeal {
        target_card: CardId,
        offered_card: CardId,
        color_choice: Option<Color>,
    },
    /// Steal a whole complete set.
    Dealbreaker { target_set: SetId },
}

impl Claim {
    /// Whether settlement is a payment (vs a card/set transfer).
    pub fn is_charge(&self) -> bool {
        matches!(self, Claim::Rent { .. } | Claim::DebtCollect | Claim::Birthday)
    }
}

/// One directed adversarial exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInteraction {
    /// Initiating player.
    pub from: PlayerId,
    /// Responding / target player.
    pub to: PlayerId,
    pub claim: Claim,
    /// Cards that initiated the exchange (the action card plus doublers).
    pub initial: Vec<CardId>,
    /// Escalations played by the initiator after a block.
    pub offense: Vec<CardId>,
    /// Block cards played by the target.
    pub defense: Vec<CardId>,
    /// Which side must respond next.
    pub awaiting: PlayerId,
}

impl PendingInteraction {
    pub fn new(from: PlayerId, to: PlayerId, claim: Claim, initial: Vec<CardId>) -> Self {
        Self {
            from,
            to,
            claim,
            initial,
            offense: Vec::new(),
            defense: Vec::new(),
            awaiting: to,
        }
    }

    /// An interaction is cancelled exactly when every offensive play has
    /// been matched by a block. A cancelled interaction transfers nothing.
    pub fn is_cancelled(&self) -> bool {
        self.initial.len() + self.offense.len() == self.defense.len()
    }

    /// The party opposite `player`, if `player` is involved at all.
    pub fn counterparty(&self, player: PlayerId) -> Option<PlayerId> {
        if player == self.from {
            Some(self.to)
        } else if player == self.to {
            Some(self.from)
        } else {
            None
        }
    }
}

/// The set of unresolved interactions for one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRegistry {
    entries: Vec<PendingInteraction>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingInteraction> {
        self.entries.iter()
    }

    /// Register an interaction. Rejected if one already exists for the same
    /// (from, to) pair.
    pub fn add(&mut self, interaction: PendingInteraction) -> bool {
        if self
            .entries
            .iter()
            .any(|e| e.from == interaction.from && e.to == interaction.to)
        {
            return false;
        }
        self.entries.push(interaction);
        true
    }

    pub fn remove(&mut self, from: PlayerId, to: PlayerId) -> Option<PendingInteraction> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.from == from && e.to == to)?;
        Some(self.entries.remove(pos))
    }

    /// The interaction currently awaiting `player`'s response. When several
    /// fan-out entries converge on one initiator, `counterparty` picks the
    /// exchange; otherwise the single match is returned.
    pub fn awaiting(
        &self,
        player: PlayerId,
        counterparty: Option<PlayerId>,
    ) -> Option<&PendingInteraction> {
        self.entries.iter().find(|e| {
            e.awaiting == player
                && counterparty.is_none_or(|other| e.counterparty(player) == Some(other))
        })
    }

    /// Mutable variant of [`awaiting`](Self::awaiting).
    pub fn awaiting_mut(
        &mut self,
        player: PlayerId,
        counterparty: Option<PlayerId>,
    ) -> Option<&mut PendingInteraction> {
        self.entries.iter_mut().find(|e| {
            e.awaiting == player
                && counterparty.is_none_or(|other| e.counterparty(player) == Some(other))
        })
    }
}
