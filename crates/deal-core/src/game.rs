//! Core game state machine.
//!
//! This module contains the main `GameState` struct and the action
//! dispatcher. Every inbound action funnels through [`GameState::apply_action`],
//! which validates fully before mutating: an `Err` is a silent no-op (state
//! unchanged, nothing broadcast), while deliberate "wasted play" penalties
//! are `Ok` results carrying an `ActionWasted` event.

use crate::actions::{ChargeKind, GameAction, GameEvent};
use crate::cards::{
    ActionKind, Card, CardId, CardKind, Catalog, Color, PlayerId, SetId, BIRTHDAY_AMOUNT,
    DEAL_SIZE, DEBT_AMOUNT, DRAW_ON_EMPTY_HAND, DRAW_PER_TURN, HAND_LIMIT, PLAYS_PER_TURN,
    SETS_TO_WIN,
};
use crate::payment;
use crate::pending::{Claim, InteractionRegistry, PendingInteraction};
use crate::player::PlayerState;
use crate::property::PropertyLedger;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that reject an action. Every variant is a silent no-op from the
/// protocol's perspective: the state is returned unchanged and nothing is
/// broadcast to the room.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Turn has not started")]
    TurnNotStarted,

    #[error("Turn already started")]
    TurnAlreadyStarted,

    #[error("An interaction is pending")]
    InteractionPending,

    #[error("No interaction awaits this player")]
    NoPendingInteraction,

    #[error("No plays remaining")]
    NoPlaysRemaining,

    #[error("Don't have that card")]
    NoSuchCard,

    #[error("Wrong kind of card")]
    WrongCardKind,

    #[error("Invalid color choice")]
    InvalidColor,

    #[error("Invalid target")]
    InvalidTarget,

    #[error("Invalid placement")]
    InvalidPlacement,

    #[error("Invalid payment")]
    InvalidPayment,

    #[error("Invalid block")]
    InvalidBlock,

    #[error("Game is over")]
    GameOver,

    #[error("Game is not over")]
    GameNotOver,
}

/// The complete authoritative state of one game room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// The static card catalog.
    pub catalog: Catalog,
    /// Face-down draw pile; the top is the end.
    pub draw_pile: Vec<CardId>,
    /// Face-up discard pile, also the reshuffle source.
    pub discard: Vec<CardId>,
    /// Players in turn order, fixed and randomized at game start.
    pub players: Vec<PlayerState>,
    /// Seat whose turn it is.
    pub active_player: PlayerId,
    /// Plays remaining this turn.
    pub plays_left: u32,
    /// False only before the first StartTurn after construction/restart.
    pub turn_started: bool,
    /// In-flight adversarial exchanges.
    pub interactions: InteractionRegistry,
    /// Set the instant any player reaches the win threshold.
    pub winner: Option<PlayerId>,
    /// Allocator for property set ids.
    next_set_id: SetId,
}

impl GameState {
    /// Create a new game, shuffling the deck and the seat order, and deal
    /// the opening hands.
    pub fn new(player_names: Vec<String>) -> Self {
        assert!(
            (2..=5).contains(&player_names.len()),
            "Must have 2-5 players"
        );

        let mut names = player_names;
        let mut rng = rand::thread_rng();
        names.shuffle(&mut rng);

        let players: Vec<PlayerState> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| PlayerState::new(i as PlayerId, name))
            .collect();

        let catalog = Catalog::standard();
        let mut draw_pile = catalog.all_ids();
        draw_pile.shuffle(&mut rng);

        let mut state = Self {
            catalog,
            draw_pile,
            discard: Vec::new(),
            players,
            active_player: 0,
            plays_left: 0,
            turn_started: false,
            interactions: InteractionRegistry::new(),
            winner: None,
            next_set_id: 1,
        };

        for seat in 0..state.players.len() {
            state.draw_cards(seat as PlayerId, DEAL_SIZE);
        }

        state
    }

    /// Re-deal in place after a finished game, keeping the seat roster.
    fn restart(&mut self) {
        let names: Vec<String> = self.players.iter().map(|p| p.name.clone()).collect();
        *self = Self::new(names);
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(id as usize)
    }

    fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut PlayerState> {
        self.players.get_mut(id as usize)
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// Allocate a fresh, game-unique property set id.
    pub(crate) fn alloc_set_id(&mut self) -> SetId {
        let id = self.next_set_id;
        self.next_set_id += 1;
        id
    }

    /// Draw up to `count` cards for a player, reshuffling the discard pile
    /// into the draw pile when it empties. Returns how many were drawn.
    fn draw_cards(&mut self, player: PlayerId, count: usize) -> usize {
        let mut drawn = 0;
        for _ in 0..count {
            if self.draw_pile.is_empty() {
                if self.discard.is_empty() {
                    break;
                }
                self.draw_pile.append(&mut self.discard);
                self.draw_pile.shuffle(&mut rand::thread_rng());
            }
            if let Some(card) = self.draw_pile.pop() {
                if let Some(p) = self.get_player_mut(player) {
                    p.hand.push(card);
                    drawn += 1;
                }
            }
        }
        drawn
    }

    /// Look up a card the actor must hold in hand.
    fn card_in_hand(&self, actor: PlayerId, id: CardId) -> Result<Card, GameError> {
        let player = self.get_player(actor).ok_or(GameError::InvalidTarget)?;
        if !player.has_in_hand(id) {
            return Err(GameError::NoSuchCard);
        }
        self.catalog
            .lookup(id)
            .cloned()
            .ok_or(GameError::NoSuchCard)
    }

    /// Gate for actions that spend a play of the active player's turn.
    fn ensure_can_play(&self, actor: PlayerId, plays_needed: u32) -> Result<(), GameError> {
        if actor != self.active_player {
            return Err(GameError::NotYourTurn);
        }
        if !self.turn_started {
            return Err(GameError::TurnNotStarted);
        }
        if !self.interactions.is_empty() {
            return Err(GameError::InteractionPending);
        }
        if self.plays_left < plays_needed {
            return Err(GameError::NoPlaysRemaining);
        }
        Ok(())
    }

    /// Gate for turn-scoped actions that do not spend a play.
    fn ensure_turn_scoped(&self, actor: PlayerId) -> Result<(), GameError> {
        if actor != self.active_player {
            return Err(GameError::NotYourTurn);
        }
        if !self.turn_started {
            return Err(GameError::TurnNotStarted);
        }
        if !self.interactions.is_empty() {
            return Err(GameError::InteractionPending);
        }
        Ok(())
    }

    fn check_win(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) {
        if self.winner.is_some() {
            return;
        }
        let Some(p) = self.get_player(player) else {
            return;
        };
        let complete = p.complete_set_count();
        if complete >= SETS_TO_WIN {
            self.winner = Some(player);
            events.push(GameEvent::GameWon {
                player,
                complete_sets: complete,
            });
        }
    }

    /// Apply an action to the game state.
    pub fn apply_action(
        &mut self,
        actor: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.get_player(actor).is_none() {
            return Err(GameError::InvalidTarget);
        }
        if self.winner.is_some() && !matches!(action, GameAction::RestartGame) {
            return Err(GameError::GameOver);
        }

        match action {
            GameAction::StartTurn => self.handle_start_turn(actor),
            GameAction::EndTurn => self.handle_end_turn(actor),
            GameAction::PlayProperty { id, color } => self.handle_play_property(actor, id, color),
            GameAction::PlayMoney { id } => self.handle_play_money(actor, id),
            GameAction::PassGo { id } => self.handle_pass_go(actor, id),
            GameAction::PlayDoubleRent { id } => self.handle_play_double_rent(actor, id),
            GameAction::PlayDevelopment { id, target_set } => {
                self.handle_play_development(actor, id, target_set)
            }
            GameAction::RequestRent {
                id,
                doublers,
                source_set,
                color,
                target,
            } => self.handle_request_rent(actor, id, doublers, source_set, color, target),
            GameAction::DebtCollect { id, target } => self.handle_debt_collect(actor, id, target),
            GameAction::Birthday { id } => self.handle_birthday(actor, id),
            GameAction::AcceptCharge { payment } => self.handle_accept_charge(actor, payment),
            GameAction::SlyDeal {
                id,
                target_card,
                color_choice,
            } => self.handle_sly_deal(actor, id, target_card, color_choice),
            GameAction::ForcedDeal {
                id,
                target_card,
                card_to_give,
                color_choice,
            } => self.handle_forced_deal(actor, id, target_card, card_to_give, color_choice),
            GameAction::Dealbreaker { id, target_set } => {
                self.handle_dealbreaker(actor, id, target_set)
            }
            GameAction::AcceptDeal { color_choice } => self.handle_accept_deal(actor, color_choice),
            GameAction::JustSayNo { ids, responding_to } => {
                self.handle_just_say_no(actor, ids, responding_to)
            }
            GameAction::AcceptJustSayNo { responding_to } => {
                self.handle_accept_just_say_no(actor, responding_to)
            }
            GameAction::Discard { card_id } => self.handle_discard(actor, card_id),
            GameAction::MoveProperty {
                card_id,
                from_set,
                to_set,
                color_choice,
            } => self.handle_move_property(actor, card_id, from_set, to_set, color_choice),
            GameAction::RestartGame => self.handle_restart(actor),
        }
    }

    // ==================== Turn Management ====================

    fn handle_start_turn(&mut self, actor: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        if actor != self.active_player {
            return Err(GameError::NotYourTurn);
        }
        if self.turn_started {
            return Err(GameError::TurnAlreadyStarted);
        }

        let count = if self.players[actor as usize].hand.is_empty() {
            DRAW_ON_EMPTY_HAND
        } else {
            DRAW_PER_TURN
        };
        let drawn = self.draw_cards(actor, count);
        self.plays_left = PLAYS_PER_TURN;
        self.turn_started = true;

        Ok(vec![GameEvent::TurnStarted {
            player: actor,
            drawn,
        }])
    }

    fn handle_end_turn(&mut self, actor: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_turn_scoped(actor)?;

        // Force-discard excess non-property cards from the hand tail.
        let mut forced = Vec::new();
        {
            let catalog = &self.catalog;
            let hand = &mut self.players[actor as usize].hand;
            let mut idx = hand.len();
            while hand.len() > HAND_LIMIT && idx > 0 {
                idx -= 1;
                let id = hand[idx];
                let is_property = catalog.lookup(id).is_some_and(|c| c.is_property());
                if !is_property {
                    hand.remove(idx);
                    forced.push(id);
                }
            }
        }
        self.discard.extend(forced.iter().copied());

        let next = (self.active_player + 1) % self.player_count() as PlayerId;
        self.active_player = next;

        let count = if self.players[next as usize].hand.is_empty() {
            DRAW_ON_EMPTY_HAND
        } else {
            DRAW_PER_TURN
        };
        let drawn = self.draw_cards(next, count);
        self.plays_left = PLAYS_PER_TURN;

        Ok(vec![GameEvent::TurnEnded {
            player: actor,
            next_player: next,
            forced_discards: forced,
            drawn,
        }])
    }

    // ==================== Plays ====================

    fn handle_play_property(
        &mut self,
        actor: PlayerId,
        id: CardId,
        color: Color,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_play(actor, 1)?;
        let card = self.card_in_hand(actor, id)?;
        if !card.is_property() {
            return Err(GameError::WrongCardKind);
        }
        if !card.colors().contains(&color) {
            return Err(GameError::InvalidColor);
        }

        let fresh = self.alloc_set_id();
        let set_id = self.players[actor as usize]
            .properties
            .add_property(&card, color, fresh)
            .ok_or(GameError::InvalidPlacement)?;

        self.players[actor as usize].take_from_hand(id);
        self.plays_left -= 1;

        let complete = self.players[actor as usize]
            .properties
            .get(set_id)
            .is_some_and(|s| s.complete);

        let mut events = vec![GameEvent::PropertyPlayed {
            player: actor,
            card: id,
            set_id,
            complete,
        }];
        self.check_win(actor, &mut events);
        Ok(events)
    }

    fn handle_play_money(&mut self, actor: PlayerId, id: CardId) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_play(actor, 1)?;
        let card = self.card_in_hand(actor, id)?;
        if !card.is_bankable() {
            return Err(GameError::WrongCardKind);
        }

        self.players[actor as usize].take_from_hand(id);
        self.players[actor as usize].bank.push(id);
        self.plays_left -= 1;

        Ok(vec![GameEvent::MoneyBanked { player: actor, card: id }])
    }

    fn handle_pass_go(&mut self, actor: PlayerId, id: CardId) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_play(actor, 1)?;
        let card = self.card_in_hand(actor, id)?;
        if !card.is_action(ActionKind::PassGo) {
            return Err(GameError::WrongCardKind);
        }

        self.players[actor as usize].take_from_hand(id);
        self.discard.push(id);
        self.plays_left -= 1;
        let drawn = self.draw_cards(actor, DRAW_PER_TURN);

        Ok(vec![GameEvent::PassGoPlayed { player: actor, drawn }])
    }

    /// A doubler on its own has no rent to modify; it deposits to the bank
    /// at face value.
    fn handle_play_double_rent(
        &mut self,
        actor: PlayerId,
        id: CardId,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_play(actor, 1)?;
        let card = self.card_in_hand(actor, id)?;
        if !card.is_action(ActionKind::DoubleRent) {
            return Err(GameError::WrongCardKind);
        }

        self.players[actor as usize].take_from_hand(id);
        self.players[actor as usize].bank.push(id);
        self.plays_left -= 1;

        Ok(vec![GameEvent::MoneyBanked { player: actor, card: id }])
    }

    fn handle_play_development(
        &mut self,
        actor: PlayerId,
        id: CardId,
        target_set: SetId,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_play(actor, 1)?;
        let card = self.card_in_hand(actor, id)?;
        let kind = match card.kind {
            CardKind::Action {
                action: action @ (ActionKind::House | ActionKind::Hotel),
            } => action,
            _ => return Err(GameError::WrongCardKind),
        };

        // The play is announced: from here the card is consumed whether or
        // not the target is eligible.
        self.players[actor as usize].take_from_hand(id);
        self.plays_left -= 1;

        if self.players[actor as usize]
            .properties
            .add_development(id, kind, target_set)
        {
            return Ok(vec![GameEvent::DevelopmentPlayed {
                player: actor,
                card: id,
                set_id: target_set,
            }]);
        }

        // Wasted play: discard with an explanation.
        let reason = match self.players[actor as usize].properties.get(target_set) {
            None => "no such property set".to_string(),
            Some(set) if !set.complete => "target set is not complete".to_string(),
            Some(set) if kind == ActionKind::House && set.house.is_some() => {
                "set already has a house".to_string()
            }
            Some(set) if kind == ActionKind::Hotel && set.house.is_none() => {
                "a hotel requires a house first".to_string()
            }
            Some(_) => "set already has a hotel".to_string(),
        };
        self.discard.push(id);
        Ok(vec![GameEvent::ActionWasted {
            player: actor,
            card: id,
            reason,
        }])
    }

    // ==================== Charges ====================

    fn handle_request_rent(
        &mut self,
        actor: PlayerId,
        id: CardId,
        doublers: Vec<CardId>,
        source_set: SetId,
        color: Option<Color>,
        target: Option<PlayerId>,
    ) -> Result<Vec<GameEvent>, GameError> {
        // Rent consumes one play per doubler on top of its own.
        let plays_needed = 1 + doublers.len() as u32;
        self.ensure_can_play(actor, plays_needed)?;

        let rent_card = self.card_in_hand(actor, id)?;
        if !rent_card.is_rent() {
            return Err(GameError::WrongCardKind);
        }
        for (i, &d) in doublers.iter().enumerate() {
            if d == id || doublers[..i].contains(&d) {
                return Err(GameError::NoSuchCard);
            }
            let card = self.card_in_hand(actor, d)?;
            if !card.is_action(ActionKind::DoubleRent) {
                return Err(GameError::WrongCardKind);
            }
        }

        // Color falls back from the explicit choice to the source set.
        let color = match color {
            Some(c) => {
                if !rent_card.colors().contains(&c) {
                    return Err(GameError::InvalidColor);
                }
                c
            }
            None => {
                let set = self.players[actor as usize]
                    .properties
                    .get(source_set)
                    .ok_or(GameError::InvalidColor)?;
                let c = set.color.ok_or(GameError::InvalidColor)?;
                if !rent_card.colors().contains(&c) {
                    return Err(GameError::InvalidColor);
                }
                c
            }
        };

        // Only wild rent may single out a victim.
        let targets: Vec<PlayerId> = match target {
            Some(t) => {
                if !rent_card.is_wild_rent() || t == actor || self.get_player(t).is_none() {
                    return Err(GameError::InvalidTarget);
                }
                vec![t]
            }
            None => (0..self.player_count() as PlayerId)
                .filter(|&p| p != actor)
                .collect(),
        };

        let amount = self.rent_amount(actor, color, doublers.len() as u32);
        if amount == 0 {
            // No properties of that color: nothing to charge.
            return Err(GameError::InvalidColor);
        }

        // One interaction per victim, all sharing the same claim.
        for &victim in &targets {
            let interaction = PendingInteraction::new(
                actor,
                victim,
                Claim::Rent {
                    color,
                    doublers: doublers.len() as u32,
                },
                vec![id],
            );
            if !self.interactions.add(interaction) {
                return Err(GameError::InteractionPending);
            }
        }

        self.players[actor as usize].take_from_hand(id);
        self.discard.push(id);
        for &d in &doublers {
            self.players[actor as usize].take_from_hand(d);
            self.discard.push(d);
        }
        self.plays_left -= plays_needed;

        Ok(vec![GameEvent::RentRequested {
            requester: actor,
            targets,
            color,
            amount,
            doublers: doublers.len() as u32,
        }])
    }

    /// Rent owed to `charger` for `color`: the tier for their current card
    /// count in that color, plus development bonuses on complete sets of
    /// that color, doubled per doubler.
    fn rent_amount(&self, charger: PlayerId, color: Color, doublers: u32) -> u32 {
        let Some(player) = self.get_player(charger) else {
            return 0;
        };
        let count = player.properties.color_card_count(color);
        let base = color.base_rent(count);
        let bonus: u32 = player
            .properties
            .sets()
            .filter(|s| s.complete && s.color == Some(color))
            .map(|s| s.development_bonus())
            .sum();
        (base + bonus) * 2u32.pow(doublers)
    }

    fn handle_debt_collect(
        &mut self,
        actor: PlayerId,
        id: CardId,
        target: PlayerId,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_play(actor, 1)?;
        let card = self.card_in_hand(actor, id)?;
        if !card.is_action(ActionKind::DebtCollector) {
            return Err(GameError::WrongCardKind);
        }
        if target == actor || self.get_player(target).is_none() {
            return Err(GameError::InvalidTarget);
        }

        let interaction = PendingInteraction::new(actor, target, Claim::DebtCollect, vec![id]);
        if !self.interactions.add(interaction) {
            return Err(GameError::InteractionPending);
        }

        self.players[actor as usize].take_from_hand(id);
        self.discard.push(id);
        self.plays_left -= 1;

        Ok(vec![GameEvent::ChargeRequested {
            requester: actor,
            target,
            kind: ChargeKind::DebtCollector,
            amount: DEBT_AMOUNT,
        }])
    }

    fn handle_birthday(&mut self, actor: PlayerId, id: CardId) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_play(actor, 1)?;
        let card = self.card_in_hand(actor, id)?;
        if !card.is_action(ActionKind::Birthday) {
            return Err(GameError::WrongCardKind);
        }

        let victims: Vec<PlayerId> = (0..self.player_count() as PlayerId)
            .filter(|&p| p != actor)
            .collect();
        for &victim in &victims {
            let interaction = PendingInteraction::new(actor, victim, Claim::Birthday, vec![id]);
            if !self.interactions.add(interaction) {
                return Err(GameError::InteractionPending);
            }
        }

        self.players[actor as usize].take_from_hand(id);
        self.discard.push(id);
        self.plays_left -= 1;

        Ok(victims
            .into_iter()
            .map(|target| GameEvent::ChargeRequested {
                requester: actor,
                target,
                kind: ChargeKind::Birthday,
                amount: BIRTHDAY_AMOUNT,
            })
            .collect())
    }

    fn handle_accept_charge(
        &mut self,
        actor: PlayerId,
        payment: Vec<CardId>,
    ) -> Result<Vec<GameEvent>, GameError> {
        let interaction = self
            .interactions
            .awaiting(actor, None)
            .ok_or(GameError::NoPendingInteraction)?;
        if !interaction.claim.is_charge() {
            return Err(GameError::WrongCardKind);
        }
        if interaction.is_cancelled() {
            return Err(GameError::InvalidBlock);
        }
        let payee = interaction.from;

        let (amount, is_rent) = match interaction.claim {
            Claim::Birthday => (BIRTHDAY_AMOUNT, false),
            Claim::DebtCollect => (DEBT_AMOUNT, false),
            Claim::Rent { color, doublers } => (self.rent_amount(payee, color, doublers), true),
            _ => return Err(GameError::WrongCardKind),
        };

        let (bank_cards, properties) = if is_rent {
            let settled = payment::settle_rent(self, actor, payee, &payment, amount)
                .ok_or(GameError::InvalidPayment)?;
            (settled.settlement.bank_cards, settled.settlement.properties)
        } else {
            let settled = payment::settle_charge(self, actor, payee, &payment, amount)
                .ok_or(GameError::InvalidPayment)?;
            (settled.bank_cards, settled.properties)
        };

        self.interactions.remove(payee, actor);

        let mut events = vec![GameEvent::ChargeSettled {
            payer: actor,
            payee,
            bank_cards,
            properties,
        }];
        self.check_win(payee, &mut events);
        Ok(events)
    }

    // ==================== Steals ====================

    /// The owner of a played property card, excluding `except`.
    fn owner_of_card(&self, card_id: CardId, except: PlayerId) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.id != except && p.properties.set_of_card(card_id).is_some())
            .map(|p| p.id)
    }

    fn handle_sly_deal(
        &mut self,
        actor: PlayerId,
        id: CardId,
        target_card: CardId,
        color_choice: Option<Color>,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_play(actor, 1)?;
        let card = self.card_in_hand(actor, id)?;
        if !card.is_action(ActionKind::SlyDeal) {
            return Err(GameError::WrongCardKind);
        }

        let victim = self
            .owner_of_card(target_card, actor)
            .ok_or(GameError::InvalidTarget)?;
        let victim_state = &self.players[victim as usize];
        let set_id = victim_state
            .properties
            .set_of_card(target_card)
            .ok_or(GameError::InvalidTarget)?;
        if victim_state
            .properties
            .get(set_id)
            .is_none_or(|s| s.complete)
        {
            // Complete sets are only takeable via Dealbreaker.
            return Err(GameError::InvalidTarget);
        }

        // The stolen card must have somewhere to land before the exchange
        // is offered; an unplaceable steal could never be accepted and
        // would strand the interaction.
        self.verify_transfer(victim, actor, target_card, color_choice)?;

        let interaction = PendingInteraction::new(
            actor,
            victim,
            Claim::SlyDeal {
                target_card,
                color_choice,
            },
            vec![id],
        );
        if !self.interactions.add(interaction) {
            return Err(GameError::InteractionPending);
        }

        self.players[actor as usize].take_from_hand(id);
        self.discard.push(id);
        self.plays_left -= 1;

        Ok(vec![GameEvent::SlyDealRequested {
            requester: actor,
            target: victim,
            card: target_card,
        }])
    }

    fn handle_forced_deal(
        &mut self,
        actor: PlayerId,
        id: CardId,
        target_card: CardId,
        card_to_give: CardId,
        color_choice: Option<Color>,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_play(actor, 1)?;
        let card = self.card_in_hand(actor, id)?;
        if !card.is_action(ActionKind::ForcedDeal) {
            return Err(GameError::WrongCardKind);
        }

        // A malformed swap is an announced-and-wasted play, not a silent
        // rejection. The whole swap is planned here so acceptance can never
        // strand the exchange.
        let victim = self.owner_of_card(target_card, actor);
        let victim = victim.filter(|&v| {
            self.plan_swap(actor, v, target_card, card_to_give, color_choice, None)
                .is_ok()
        });

        self.players[actor as usize].take_from_hand(id);
        self.plays_left -= 1;
        self.discard.push(id);

        let Some(victim) = victim else {
            return Ok(vec![GameEvent::ActionWasted {
                player: actor,
                card: id,
                reason: "forced deal needs two swappable properties in incomplete sets"
                    .to_string(),
            }]);
        };

        let interaction = PendingInteraction::new(
            actor,
            victim,
            Claim::ForcedDeal {
                target_card,
                offered_card: card_to_give,
                color_choice,
            },
            vec![id],
        );
        if !self.interactions.add(interaction) {
            // Re-validated above; pending interactions already gated the play.
            return Ok(vec![GameEvent::ActionWasted {
                player: actor,
                card: id,
                reason: "an exchange with that player is already pending".to_string(),
            }]);
        }

        Ok(vec![GameEvent::ForcedDealRequested {
            requester: actor,
            target: victim,
            take: target_card,
            give: card_to_give,
        }])
    }

    fn handle_dealbreaker(
        &mut self,
        actor: PlayerId,
        id: CardId,
        target_set: SetId,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_play(actor, 1)?;
        let card = self.card_in_hand(actor, id)?;
        if !card.is_action(ActionKind::Dealbreaker) {
            return Err(GameError::WrongCardKind);
        }

        // Dealbreaker only takes complete sets.
        let victim = self
            .players
            .iter()
            .find(|p| p.id != actor && p.properties.get(target_set).is_some())
            .map(|p| p.id)
            .ok_or(GameError::InvalidTarget)?;
        if self.players[victim as usize]
            .properties
            .get(target_set)
            .is_none_or(|s| !s.complete)
        {
            return Err(GameError::InvalidTarget);
        }

        let interaction =
            PendingInteraction::new(actor, victim, Claim::Dealbreaker { target_set }, vec![id]);
        if !self.interactions.add(interaction) {
            return Err(GameError::InteractionPending);
        }

        self.players[actor as usize].take_from_hand(id);
        self.discard.push(id);
        self.plays_left -= 1;

        Ok(vec![GameEvent::DealbreakerRequested {
            requester: actor,
            target: victim,
            set_id: target_set,
        }])
    }

    fn handle_accept_deal(
        &mut self,
        actor: PlayerId,
        color_choice: Option<Color>,
    ) -> Result<Vec<GameEvent>, GameError> {
        let interaction = self
            .interactions
            .awaiting(actor, None)
            .ok_or(GameError::NoPendingInteraction)?;
        if interaction.is_cancelled() {
            return Err(GameError::InvalidBlock);
        }
        if actor != interaction.to {
            return Err(GameError::InvalidTarget);
        }
        let initiator = interaction.from;
        let claim = interaction.claim.clone();

        let mut events = match claim {
            Claim::SlyDeal {
                target_card,
                color_choice: requester_color,
            } => {
                let to_set =
                    self.transfer_property(actor, initiator, target_card, requester_color)?;
                vec![GameEvent::SlyDealAccepted {
                    requester: initiator,
                    victim: actor,
                    card: target_card,
                    to_set,
                }]
            }
            Claim::ForcedDeal {
                target_card,
                offered_card,
                color_choice: requester_color,
            } => {
                // Both cards leave their sets before either lands, so one
                // half of the swap cannot complete a set out from under the
                // other half. A responder color the swap cannot place falls
                // back to the resolution the deal was planned with.
                let plan = self
                    .plan_swap(
                        initiator,
                        actor,
                        target_card,
                        offered_card,
                        requester_color,
                        color_choice,
                    )
                    .or_else(|_| {
                        self.plan_swap(
                            initiator,
                            actor,
                            target_card,
                            offered_card,
                            requester_color,
                            None,
                        )
                    })?;
                let taken_to_set = plan.taken_to_set;
                let given_to_set = plan.given_to_set;
                self.players[initiator as usize].properties = plan.initiator_ledger;
                self.players[actor as usize].properties = plan.victim_ledger;
                self.discard.extend(plan.discards);
                vec![GameEvent::ForcedDealAccepted {
                    requester: initiator,
                    victim: actor,
                    taken: target_card,
                    taken_to_set,
                    given: offered_card,
                    given_to_set,
                }]
            }
            Claim::Dealbreaker { target_set } => {
                let set = self.players[actor as usize]
                    .properties
                    .remove_set(target_set)
                    .ok_or(GameError::InvalidTarget)?;
                self.players[initiator as usize].properties.insert_set(set);
                vec![GameEvent::DealbreakerAccepted {
                    requester: initiator,
                    victim: actor,
                    set_id: target_set,
                }]
            }
            _ => return Err(GameError::WrongCardKind),
        };

        self.interactions.remove(initiator, actor);
        self.check_win(initiator, &mut events);
        // A forced deal swap can make either side a winner.
        self.check_win(actor, &mut events);
        Ok(events)
    }

    /// The color a transferred card will occupy at its destination:
    /// explicit choice when the card supports it, else the card's own
    /// color, else the color it occupied at the source. The source set
    /// must exist and be incomplete.
    fn resolve_transfer_color(
        &self,
        owner: PlayerId,
        card_id: CardId,
        color_choice: Option<Color>,
    ) -> Result<Color, GameError> {
        let card = self
            .catalog
            .lookup(card_id)
            .ok_or(GameError::NoSuchCard)?;
        let source = &self.players[owner as usize].properties;
        let set = source
            .get(source.set_of_card(card_id).ok_or(GameError::InvalidTarget)?)
            .ok_or(GameError::InvalidTarget)?;
        if set.complete {
            return Err(GameError::InvalidTarget);
        }
        color_choice
            .filter(|c| card.colors().contains(c))
            .or_else(|| card.single_color())
            .or(set.color)
            .ok_or(GameError::InvalidColor)
    }

    /// Check that `card_id` can leave `from`'s ledger and land at `to`
    /// under the color resolution rules, without mutating.
    fn verify_transfer(
        &self,
        from: PlayerId,
        to: PlayerId,
        card_id: CardId,
        color_choice: Option<Color>,
    ) -> Result<Color, GameError> {
        let color = self.resolve_transfer_color(from, card_id, color_choice)?;
        let card = self
            .catalog
            .lookup(card_id)
            .ok_or(GameError::NoSuchCard)?;
        if !self.players[to as usize]
            .properties
            .can_add_property(card, color)
        {
            return Err(GameError::InvalidPlacement);
        }
        Ok(color)
    }

    /// Plan a forced-deal swap without touching live state. Both cards are
    /// removed from cloned ledgers before either lands, then re-homed, so a
    /// card arriving in the set its counterpart just left cannot trip the
    /// incomplete-source rule mid-swap. The plan carries the rebuilt
    /// ledgers and the developments the removals broke loose.
    fn plan_swap(
        &mut self,
        initiator: PlayerId,
        victim: PlayerId,
        target_card: CardId,
        offered_card: CardId,
        take_choice: Option<Color>,
        give_choice: Option<Color>,
    ) -> Result<SwapPlan, GameError> {
        let take_color = self.resolve_transfer_color(victim, target_card, take_choice)?;
        let give_color = self.resolve_transfer_color(initiator, offered_card, give_choice)?;
        let target = self
            .catalog
            .lookup(target_card)
            .cloned()
            .ok_or(GameError::NoSuchCard)?;
        let offered = self
            .catalog
            .lookup(offered_card)
            .cloned()
            .ok_or(GameError::NoSuchCard)?;

        let mut victim_ledger = self.players[victim as usize].properties.clone();
        let mut initiator_ledger = self.players[initiator as usize].properties.clone();
        let mut discards = Vec::new();

        let removed = victim_ledger
            .remove_property(target_card, &self.catalog)
            .ok_or(GameError::InvalidTarget)?;
        discards.extend(removed.discarded_developments);
        let removed = initiator_ledger
            .remove_property(offered_card, &self.catalog)
            .ok_or(GameError::InvalidTarget)?;
        discards.extend(removed.discarded_developments);

        let fresh = self.alloc_set_id();
        let taken_to_set = initiator_ledger
            .add_property(&target, take_color, fresh)
            .ok_or(GameError::InvalidPlacement)?;
        let fresh = self.alloc_set_id();
        let given_to_set = victim_ledger
            .add_property(&offered, give_color, fresh)
            .ok_or(GameError::InvalidPlacement)?;

        Ok(SwapPlan {
            initiator_ledger,
            victim_ledger,
            discards,
            taken_to_set,
            given_to_set,
        })
    }

    /// Move one property card between ledgers. Developments broken loose at
    /// the source go to the discard pile. Returns the destination set.
    fn transfer_property(
        &mut self,
        from: PlayerId,
        to: PlayerId,
        card_id: CardId,
        color_choice: Option<Color>,
    ) -> Result<SetId, GameError> {
        let color = self.verify_transfer(from, to, card_id, color_choice)?;
        let card = self
            .catalog
            .lookup(card_id)
            .expect("verified card exists")
            .clone();

        let removed = self.players[from as usize]
            .properties
            .remove_property(card_id, &self.catalog)
            .expect("verified membership");
        self.discard.extend(removed.discarded_developments);

        let fresh = self.alloc_set_id();
        let dest = self.players[to as usize]
            .properties
            .add_property(&card, color, fresh)
            .expect("verified placement");
        Ok(dest)
    }

    // ==================== Blocks ====================

    fn handle_just_say_no(
        &mut self,
        actor: PlayerId,
        ids: Vec<CardId>,
        responding_to: Option<PlayerId>,
    ) -> Result<Vec<GameEvent>, GameError> {
        if ids.is_empty() {
            return Err(GameError::InvalidBlock);
        }
        for (i, &id) in ids.iter().enumerate() {
            if ids[..i].contains(&id) {
                return Err(GameError::NoSuchCard);
            }
            let card = self.card_in_hand(actor, id)?;
            if !card.is_action(ActionKind::JustSayNo) {
                return Err(GameError::WrongCardKind);
            }
        }

        let interaction = self
            .interactions
            .awaiting(actor, responding_to)
            .ok_or(GameError::NoPendingInteraction)?;
        let counterparty = interaction
            .counterparty(actor)
            .ok_or(GameError::InvalidTarget)?;

        // Each side may play at most as many blocks as the other side has
        // outstanding unmatched plays.
        let k = ids.len();
        let legal = if actor == interaction.to {
            interaction.defense.len() + k <= interaction.initial.len() + interaction.offense.len()
        } else {
            interaction.offense.len() + k <= interaction.defense.len()
        };
        if !legal {
            return Err(GameError::InvalidBlock);
        }

        let is_target = actor == interaction.to;
        let interaction = self
            .interactions
            .awaiting_mut(actor, responding_to)
            .expect("looked up above");
        if is_target {
            interaction.defense.extend(ids.iter().copied());
        } else {
            interaction.offense.extend(ids.iter().copied());
        }
        interaction.awaiting = counterparty;
        let cancelled = interaction.is_cancelled();

        // Block cards discard immediately.
        for &id in &ids {
            self.players[actor as usize].take_from_hand(id);
            self.discard.push(id);
        }

        Ok(vec![GameEvent::InteractionBlocked {
            player: actor,
            counterparty,
            cards: ids,
            cancelled,
        }])
    }

    fn handle_accept_just_say_no(
        &mut self,
        actor: PlayerId,
        responding_to: PlayerId,
    ) -> Result<Vec<GameEvent>, GameError> {
        let interaction = self
            .interactions
            .awaiting(actor, Some(responding_to))
            .ok_or(GameError::NoPendingInteraction)?;
        // Only the initiator concedes a cancelled exchange.
        if actor != interaction.from || !interaction.is_cancelled() {
            return Err(GameError::InvalidBlock);
        }

        self.interactions.remove(actor, responding_to);
        Ok(vec![GameEvent::BlockAccepted {
            player: actor,
            counterparty: responding_to,
        }])
    }

    // ==================== Housekeeping ====================

    fn handle_discard(&mut self, actor: PlayerId, card_id: CardId) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_turn_scoped(actor)?;
        if !self.players[actor as usize].take_from_hand(card_id) {
            return Err(GameError::NoSuchCard);
        }
        self.discard.push(card_id);
        Ok(vec![GameEvent::CardDiscarded {
            player: actor,
            card: card_id,
        }])
    }

    fn handle_move_property(
        &mut self,
        actor: PlayerId,
        card_id: CardId,
        from_set: Option<SetId>,
        to_set: Option<SetId>,
        color_choice: Option<Color>,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_turn_scoped(actor)?;

        let card = self
            .catalog
            .lookup(card_id)
            .cloned()
            .ok_or(GameError::NoSuchCard)?;
        let ledger = &self.players[actor as usize].properties;
        let source_set = ledger.set_of_card(card_id).ok_or(GameError::NoSuchCard)?;
        if from_set.is_some_and(|f| f != source_set) {
            return Err(GameError::InvalidTarget);
        }

        let color = color_choice
            .filter(|c| card.colors().contains(c))
            .or_else(|| card.single_color());

        // Validate the destination fully before removing from the source.
        match to_set {
            Some(dest) => {
                if dest == source_set {
                    return Err(GameError::InvalidTarget);
                }
                let set = ledger.get(dest).ok_or(GameError::InvalidTarget)?;
                if set.complete {
                    return Err(GameError::InvalidPlacement);
                }
                if !card.is_universal_wild() {
                    let color = color.ok_or(GameError::InvalidColor)?;
                    if set.color.is_some_and(|c| c != color) {
                        return Err(GameError::InvalidPlacement);
                    }
                }
            }
            None => {
                if card.is_universal_wild() {
                    return Err(GameError::InvalidPlacement);
                }
                if color.is_none() {
                    return Err(GameError::InvalidColor);
                }
            }
        }

        let removed = self.players[actor as usize]
            .properties
            .remove_property(card_id, &self.catalog)
            .expect("membership checked above");
        self.discard.extend(removed.discarded_developments);

        let dest = match to_set {
            Some(dest) => {
                // Universal wilds keep the destination's color; the chosen
                // color only matters for color-bearing cards.
                let color = color.unwrap_or(Color::Brown);
                if !self.players[actor as usize]
                    .properties
                    .add_property_to_set(&card, color, dest)
                {
                    // Validated above; unreachable in normal operation.
                    return Err(GameError::InvalidPlacement);
                }
                dest
            }
            None => {
                let fresh = self.alloc_set_id();
                self.players[actor as usize]
                    .properties
                    .found_new_set(&card, color.expect("checked above"), fresh)
                    .expect("validated above")
            }
        };

        let mut events = vec![GameEvent::PropertyMoved {
            player: actor,
            card: card_id,
            from_set: source_set,
            to_set: dest,
        }];
        self.check_win(actor, &mut events);
        Ok(events)
    }

    fn handle_restart(&mut self, _actor: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        if self.winner.is_none() {
            return Err(GameError::GameNotOver);
        }
        self.restart();
        Ok(vec![GameEvent::GameRestarted])
    }
}

/// A fully verified forced-deal swap, ready to commit.
struct SwapPlan {
    initiator_ledger: PropertyLedger,
    victim_ledger: PropertyLedger,
    discards: Vec<CardId>,
    taken_to_set: SetId,
    given_to_set: SetId,
}
