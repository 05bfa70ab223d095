//! Dealbreaker - a property-trading card game engine
//!
//! This crate provides the core game logic for Dealbreaker, including:
//! - The fixed 106-card catalog (money, properties, actions, rents)
//! - Property set ledgers with wilds, houses and hotels
//! - Turn and play accounting with full rule enforcement
//! - Adversarial exchanges (rent, charges, steals) resolved through a
//!   pending-interaction registry with Just-Say-No escalation
//!
//! # Architecture
//!
//! The engine is transport-agnostic: every action funnels through
//! [`GameState::apply_action`], which either rejects with a [`GameError`]
//! (state untouched) or commits and returns the [`GameEvent`]s to
//! broadcast. The server crate wraps this in a room layer.
//!
//! # Modules
//!
//! - [`cards`]: Card catalog, colors, rent tables, game constants
//! - [`property`]: Per-player property set ledger
//! - [`player`]: Hand, bank, and ledger for one seat
//! - [`pending`]: Unresolved adversarial exchanges
//! - [`payment`]: Charge settlement and the short-pay regime
//! - [`game`]: Game state machine
//! - [`snapshot`]: Per-seat redacted views

pub mod actions;
pub mod cards;
pub mod game;
pub mod payment;
pub mod pending;
pub mod player;
pub mod property;
pub mod snapshot;

// Re-export commonly used types
pub use actions::{ChargeKind, GameAction, GameEvent};
pub use cards::{ActionKind, Card, CardId, CardKind, Catalog, Color, PlayerId, SetId};
pub use game::{GameError, GameState};
pub use payment::{RentSettlement, Settlement};
pub use pending::{Claim, InteractionRegistry, PendingInteraction};
pub use player::PlayerState;
pub use property::{PropertyLedger, PropertySet};
pub use snapshot::{GameSnapshot, PlayerView};
