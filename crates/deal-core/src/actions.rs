//! Game actions that players can take.
//!
//! This module defines all possible actions in the game and the broadcast
//! events that result from those actions. Both are closed tagged unions;
//! the dispatcher in `game` matches them exhaustively.

use crate::cards::{CardId, Color, PlayerId, SetId};
use serde::{Deserialize, Serialize};

/// All possible actions a player can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Turn Management ====================
    /// Draw the opening hand for a turn. Only needed for the first turn
    /// after construction or restart; EndTurn draws for every later turn.
    StartTurn,
    /// End the turn: enforce the hand limit, advance, draw for the next
    /// player. Blocked while any interaction is pending.
    EndTurn,

    // ==================== Plays ====================
    /// Play a property from hand under the chosen color.
    PlayProperty { id: CardId, color: Color },
    /// Bank a money or action card for its point value.
    PlayMoney { id: CardId },
    /// Draw two cards.
    PassGo { id: CardId },
    /// A doubler played outside a rent request; deposits to the bank.
    PlayDoubleRent { id: CardId },
    /// Attach a house or hotel to a complete set.
    PlayDevelopment { id: CardId, target_set: SetId },

    // ==================== Charges ====================
    /// Charge rent for a color. `doublers` each double the amount and each
    /// consume an extra play. Only wild rent may name a `target`; the color
    /// falls back to the source set's color when not given.
    RequestRent {
        id: CardId,
        doublers: Vec<CardId>,
        source_set: SetId,
        color: Option<Color>,
        target: Option<PlayerId>,
    },
    /// Charge one player a fixed debt.
    DebtCollect { id: CardId, target: PlayerId },
    /// Charge every other player the birthday amount.
    Birthday { id: CardId },
    /// Pay off the charge currently awaiting this player.
    AcceptCharge { payment: Vec<CardId> },

    // ==================== Steals ====================
    /// Steal a property from an incomplete set.
    SlyDeal {
        id: CardId,
        target_card: CardId,
        color_choice: Option<Color>,
    },
    /// Swap one of your properties for an opponent's; both from
    /// incomplete sets.
    ForcedDeal {
        id: CardId,
        target_card: CardId,
        card_to_give: CardId,
        color_choice: Option<Color>,
    },
    /// Steal a whole complete set.
    Dealbreaker { id: CardId, target_set: SetId },
    /// Concede the steal currently awaiting this player. `color_choice`
    /// places the card received back in a forced deal.
    AcceptDeal { color_choice: Option<Color> },

    // ==================== Blocks ====================
    /// Play one or more Just Say No cards against the exchange awaiting
    /// this player. `responding_to` disambiguates when several fanned-out
    /// exchanges await the same initiator.
    JustSayNo {
        ids: Vec<CardId>,
        responding_to: Option<PlayerId>,
    },
    /// Accept that a block stands: the exchange is void, nothing transfers.
    AcceptJustSayNo { responding_to: PlayerId },

    // ==================== Housekeeping ====================
    /// Discard a card from hand.
    Discard { card_id: CardId },
    /// Re-home a property between sets or into a new set (`to_set` None).
    MoveProperty {
        card_id: CardId,
        from_set: Option<SetId>,
        to_set: Option<SetId>,
        color_choice: Option<Color>,
    },
    /// Re-deal after a finished game.
    RestartGame,
}

/// Fixed-amount charge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeKind {
    Birthday,
    DebtCollector,
}

/// Events that occur as a result of actions. Every event that starts an
/// adversarial exchange carries the requester id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A turn began and the player drew cards.
    TurnStarted { player: PlayerId, drawn: usize },

    /// A property was placed.
    PropertyPlayed {
        player: PlayerId,
        card: CardId,
        set_id: SetId,
        complete: bool,
    },

    /// A card was banked for its value.
    MoneyBanked { player: PlayerId, card: CardId },

    /// A card went to the discard pile from hand.
    CardDiscarded { player: PlayerId, card: CardId },

    /// Pass Go was played.
    PassGoPlayed { player: PlayerId, drawn: usize },

    /// Rent was requested from one or more players.
    RentRequested {
        requester: PlayerId,
        targets: Vec<PlayerId>,
        color: Color,
        amount: u32,
        doublers: u32,
    },

    /// A fixed charge (birthday / debt collector) was requested.
    ChargeRequested {
        requester: PlayerId,
        target: PlayerId,
        kind: ChargeKind,
        amount: u32,
    },

    /// A charge was paid. Properties carry their destination set.
    ChargeSettled {
        payer: PlayerId,
        payee: PlayerId,
        bank_cards: Vec<CardId>,
        properties: Vec<(CardId, SetId)>,
    },

    /// A sly deal was announced.
    SlyDealRequested {
        requester: PlayerId,
        target: PlayerId,
        card: CardId,
    },

    /// A forced deal was announced.
    ForcedDealRequested {
        requester: PlayerId,
        target: PlayerId,
        take: CardId,
        give: CardId,
    },

    /// A dealbreaker was announced.
    DealbreakerRequested {
        requester: PlayerId,
        target: PlayerId,
        set_id: SetId,
    },

    /// A sly deal went through; the card landed in `to_set`.
    SlyDealAccepted {
        requester: PlayerId,
        victim: PlayerId,
        card: CardId,
        to_set: SetId,
    },

    /// A forced deal went through.
    ForcedDealAccepted {
        requester: PlayerId,
        victim: PlayerId,
        taken: CardId,
        taken_to_set: SetId,
        given: CardId,
        given_to_set: SetId,
    },

    /// A dealbreaker went through; the whole set changed owners.
    DealbreakerAccepted {
        requester: PlayerId,
        victim: PlayerId,
        set_id: SetId,
    },

    /// Just Say No cards were played against an exchange.
    InteractionBlocked {
        player: PlayerId,
        counterparty: PlayerId,
        cards: Vec<CardId>,
        cancelled: bool,
    },

    /// The initiator conceded a blocked exchange; nothing transferred.
    BlockAccepted {
        player: PlayerId,
        counterparty: PlayerId,
    },

    /// A house or hotel was attached.
    DevelopmentPlayed {
        player: PlayerId,
        card: CardId,
        set_id: SetId,
    },

    /// A card was irrevocably announced but illegal; consumed and
    /// discarded with a human-readable reason.
    ActionWasted {
        player: PlayerId,
        card: CardId,
        reason: String,
    },

    /// A property moved between sets.
    PropertyMoved {
        player: PlayerId,
        card: CardId,
        from_set: SetId,
        to_set: SetId,
    },

    /// Turn ended; excess cards were force-discarded and the next player
    /// drew.
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
        forced_discards: Vec<CardId>,
        drawn: usize,
    },

    /// A player reached the winning number of complete sets.
    GameWon {
        player: PlayerId,
        complete_sets: usize,
    },

    /// The game was re-dealt after finishing.
    GameRestarted,
}
