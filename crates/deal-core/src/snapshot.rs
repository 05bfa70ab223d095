//! Per-seat redacted views of the game state.
//!
//! The authoritative `GameState` knows every hand; clients must not. A
//! snapshot shows the viewer their own hand and reduces everyone else's to
//! a count. Banks, ledgers, the discard pile, and pending interactions are
//! public information and pass through unchanged.

use crate::cards::{CardId, PlayerId};
use crate::game::GameState;
use crate::pending::PendingInteraction;
use crate::player::PlayerState;
use crate::property::PropertySet;
use serde::{Deserialize, Serialize};

/// What one player is allowed to see of another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub hand_count: usize,
    pub bank: Vec<CardId>,
    pub sets: Vec<PropertySet>,
}

impl PlayerView {
    fn of(player: &PlayerState) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            hand_count: player.hand.len(),
            bank: player.bank.clone(),
            sets: player.properties.sets().cloned().collect(),
        }
    }
}

/// Everything one seat may know about the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub viewer: PlayerId,
    pub hand: Vec<CardId>,
    pub players: Vec<PlayerView>,
    pub active_player: PlayerId,
    pub plays_left: u32,
    pub turn_started: bool,
    pub draw_pile_count: usize,
    pub discard: Vec<CardId>,
    pub interactions: Vec<PendingInteraction>,
    pub winner: Option<PlayerId>,
}

impl GameSnapshot {
    pub fn for_player(state: &GameState, viewer: PlayerId) -> Self {
        let hand = state
            .get_player(viewer)
            .map(|p| p.hand.clone())
            .unwrap_or_default();
        Self {
            viewer,
            hand,
            players: state.players.iter().map(PlayerView::of).collect(),
            active_player: state.active_player,
            plays_left: state.plays_left,
            turn_started: state.turn_started,
            draw_pile_count: state.draw_pile.len(),
            discard: state.discard.clone(),
            interactions: state.interactions.iter().cloned().collect(),
            winner: state.winner,
        }
    }
}
