//! Game room management.

use deal_core::{GameAction, GameEvent, GameSnapshot, GameState, PlayerId};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{PlayerInfo, RoomInfo, RoomStatus};

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Not the host")]
    NotHost,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Not enough players")]
    NotEnoughPlayers,

    #[error("Game not started")]
    GameNotStarted,

    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

/// A player in a game room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
    /// Seat in the game (0-4), assigned when the game starts
    pub seat: Option<PlayerId>,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            connected: true,
            seat: None,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            connected: self.connected,
        }
    }
}

/// A game room that can hold multiple players.
pub struct GameRoom {
    pub id: Uuid,
    pub name: String,
    pub max_players: u8,
    pub host_id: Uuid,
    pub status: RoomStatus,
    pub players: HashMap<Uuid, RoomPlayer>,
    /// Join order; seat assignment maps names back to joiners at start
    pub player_order: Vec<Uuid>,
    /// The game state (once started)
    pub game: Option<GameState>,
}

impl GameRoom {
    pub fn new(id: Uuid, host_id: Uuid, host_name: String, max_players: u8) -> Self {
        let mut players = HashMap::new();
        players.insert(host_id, RoomPlayer::new(host_id, host_name.clone()));

        Self {
            id,
            name: format!("{}'s Game", host_name),
            max_players: max_players.clamp(2, 5),
            host_id,
            status: RoomStatus::Waiting,
            players,
            player_order: vec![host_id],
            game: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    pub fn add_player(&mut self, player_id: Uuid, name: String) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        self.players.insert(player_id, RoomPlayer::new(player_id, name));
        self.player_order.push(player_id);
        Ok(())
    }

    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        self.players.remove(&player_id);
        self.player_order.retain(|&id| id != player_id);

        // If host left, assign new host
        if player_id == self.host_id && !self.player_order.is_empty() {
            self.host_id = self.player_order[0];
        }

        // Return true if room is now empty
        Ok(self.players.is_empty())
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.connected = connected;
        }
    }

    pub fn start_game(&mut self, requester_id: Uuid) -> Result<(), RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.players.len() < 2 {
            return Err(RoomError::NotEnoughPlayers);
        }

        let player_names: Vec<String> = self
            .player_order
            .iter()
            .filter_map(|id| self.players.get(id).map(|p| p.name.clone()))
            .collect();

        // The engine shuffles seating; map seats back to room players by
        // name (join names are not required to be unique, so take each
        // match once).
        let game = GameState::new(player_names);
        let mut claimed: Vec<PlayerId> = Vec::new();
        for &player_id in &self.player_order {
            let room_player = self.players.get_mut(&player_id).expect("in order list");
            let seat = game
                .players
                .iter()
                .find(|p| p.name == room_player.name && !claimed.contains(&p.id))
                .map(|p| p.id)
                .expect("every joiner has a seat");
            claimed.push(seat);
            room_player.seat = Some(seat);
        }

        self.game = Some(game);
        self.status = RoomStatus::InGame;

        Ok(())
    }

    /// Apply a game action on behalf of a room player.
    ///
    /// No turn pre-check here: charge payments, deal responses, and blocks
    /// are legal off-turn. The engine decides what the seat may do.
    pub fn apply_action(
        &mut self,
        player_id: Uuid,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, RoomError> {
        let seat = self
            .players
            .get(&player_id)
            .ok_or(RoomError::PlayerNotInRoom)?
            .seat
            .ok_or(RoomError::GameNotStarted)?;
        let game = self.game.as_mut().ok_or(RoomError::GameNotStarted)?;

        let events = game
            .apply_action(seat, action)
            .map_err(|e| RoomError::InvalidAction(e.to_string()))?;

        if game.is_finished() {
            self.status = RoomStatus::Finished;
        } else if self.status == RoomStatus::Finished {
            // A restart brings a finished room back into play.
            self.status = RoomStatus::InGame;
        }

        Ok(events)
    }

    /// This room player's redacted view of the game.
    pub fn snapshot_for(&self, player_id: Uuid) -> Option<GameSnapshot> {
        let seat = self.players.get(&player_id)?.seat?;
        let game = self.game.as_ref()?;
        Some(GameSnapshot::for_player(game, seat))
    }

    pub fn get_active_player(&self) -> Option<usize> {
        self.game.as_ref().map(|g| g.active_player as usize)
    }

    pub fn get_winner(&self) -> Option<(usize, String)> {
        let game = self.game.as_ref()?;
        let seat = game.winner?;
        let name = game.get_player(seat)?.name.clone();
        Some((seat as usize, name))
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            players: self
                .player_order
                .iter()
                .filter_map(|id| self.players.get(id).map(|p| p.to_info()))
                .collect(),
            max_players: self.max_players,
            host_id: self.host_id,
            status: self.status,
        }
    }
}
