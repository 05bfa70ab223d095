//! Integration tests for the Dealbreaker game engine.
//!
//! These tests verify complete game flows: property plays through set
//! completion, rent with blocking and escalation, steals, payment
//! settlement, and wins.

use deal_core::*;
use pretty_assertions::assert_eq;

/// Find a catalog card matching a predicate, skipping any already taken.
fn find_card<F>(game: &GameState, taken: &[CardId], pred: F) -> CardId
where
    F: Fn(&Card) -> bool,
{
    (0..game.catalog.len() as CardId)
        .find(|id| !taken.contains(id) && pred(game.catalog.lookup(*id).unwrap()))
        .expect("catalog has a matching card")
}

/// A started three-player game with all hands emptied for staging.
fn staged_game() -> GameState {
    let mut game = GameState::new(vec!["A".to_string(), "B".to_string(), "C".to_string()]);
    game.apply_action(0, GameAction::StartTurn).unwrap();
    for p in &mut game.players {
        p.hand.clear();
        p.bank.clear();
    }
    game
}

fn give(game: &mut GameState, player: PlayerId, card: CardId) {
    game.players[player as usize].hand.push(card);
}

#[test]
fn test_building_a_set_to_completion() {
    let mut game = staged_game();
    let blue1 = find_card(&game, &[], |c| c.single_color() == Some(Color::DarkBlue));
    let blue2 = find_card(&game, &[blue1], |c| {
        c.single_color() == Some(Color::DarkBlue)
    });
    give(&mut game, 0, blue1);
    give(&mut game, 0, blue2);

    // First card founds a new, incomplete set and spends one play.
    let events = game
        .apply_action(
            0,
            GameAction::PlayProperty {
                id: blue1,
                color: Color::DarkBlue,
            },
        )
        .unwrap();
    let GameEvent::PropertyPlayed { set_id, complete, .. } = events[0] else {
        panic!("expected PropertyPlayed");
    };
    assert!(!complete, "DarkBlue requires two cards");
    assert_eq!(game.plays_left, 2);
    let set = game.players[0].properties.get(set_id).unwrap();
    assert_eq!(set.cards.len(), 1);

    // Second card lands in the same set and completes it.
    let events = game
        .apply_action(
            0,
            GameAction::PlayProperty {
                id: blue2,
                color: Color::DarkBlue,
            },
        )
        .unwrap();
    let GameEvent::PropertyPlayed {
        set_id: second_set,
        complete,
        ..
    } = events[0]
    else {
        panic!("expected PropertyPlayed");
    };
    assert_eq!(second_set, set_id, "joins the existing incomplete set");
    assert!(complete);
    assert_eq!(game.players[0].complete_set_count(), 1);
    assert_eq!(game.plays_left, 1);
}

#[test]
fn test_rent_on_complete_set_charges_everyone() {
    let mut game = staged_game();
    let blue1 = find_card(&game, &[], |c| c.single_color() == Some(Color::DarkBlue));
    let blue2 = find_card(&game, &[blue1], |c| {
        c.single_color() == Some(Color::DarkBlue)
    });
    let rent = find_card(&game, &[], |c| {
        c.is_rent() && !c.is_wild_rent() && c.colors().contains(&Color::DarkBlue)
    });
    give(&mut game, 0, blue1);
    give(&mut game, 0, blue2);
    give(&mut game, 0, rent);

    for id in [blue1, blue2] {
        game.apply_action(
            0,
            GameAction::PlayProperty {
                id,
                color: Color::DarkBlue,
            },
        )
        .unwrap();
    }
    let set_id = game.players[0].properties.set_of_card(blue1).unwrap();

    let events = game
        .apply_action(
            0,
            GameAction::RequestRent {
                id: rent,
                doublers: vec![],
                source_set: set_id,
                color: Some(Color::DarkBlue),
                target: None,
            },
        )
        .unwrap();
    let GameEvent::RentRequested {
        targets, amount, ..
    } = &events[0]
    else {
        panic!("expected RentRequested");
    };
    // Two DarkBlue cards: capped tier index 1 of [3, 8].
    assert_eq!(*amount, 8);
    assert_eq!(targets, &vec![1, 2]);

    // One interaction per victim, each awaiting that victim.
    for victim in [1, 2] {
        let pending = game.interactions.awaiting(victim, None).unwrap();
        assert_eq!(pending.from, 0);
        assert_eq!(pending.awaiting, victim);
    }
    assert_eq!(game.plays_left, 0);
}

#[test]
fn test_just_say_no_and_escalation() {
    let mut game = staged_game();
    let debt = find_card(&game, &[], |c| c.is_action(ActionKind::DebtCollector));
    let jsn1 = find_card(&game, &[], |c| c.is_action(ActionKind::JustSayNo));
    let jsn2 = find_card(&game, &[jsn1], |c| c.is_action(ActionKind::JustSayNo));
    give(&mut game, 0, debt);
    give(&mut game, 1, jsn1);
    give(&mut game, 0, jsn2);

    game.apply_action(0, GameAction::DebtCollect { id: debt, target: 1 })
        .unwrap();

    // Victim blocks: one initial play matched by one defense cancels.
    let events = game
        .apply_action(
            1,
            GameAction::JustSayNo {
                ids: vec![jsn1],
                responding_to: None,
            },
        )
        .unwrap();
    let GameEvent::InteractionBlocked { cancelled, .. } = events[0] else {
        panic!("expected InteractionBlocked");
    };
    assert!(cancelled);
    let pending = game.interactions.awaiting(0, Some(1)).unwrap();
    assert_eq!(pending.defense, vec![jsn1]);

    // Initiator escalates: the block is itself blocked, reopening the
    // charge and handing the response back to the victim.
    let events = game
        .apply_action(
            0,
            GameAction::JustSayNo {
                ids: vec![jsn2],
                responding_to: Some(1),
            },
        )
        .unwrap();
    let GameEvent::InteractionBlocked { cancelled, .. } = events[0] else {
        panic!("expected InteractionBlocked");
    };
    assert!(!cancelled, "escalation un-cancels");
    let pending = game.interactions.awaiting(1, None).unwrap();
    assert_eq!(pending.offense, vec![jsn2]);

    // Victim has no more blocks and must now pay (here: nothing payable,
    // so the empty short-pay offer settles it).
    let events = game
        .apply_action(1, GameAction::AcceptCharge { payment: vec![] })
        .unwrap();
    assert!(matches!(events[0], GameEvent::ChargeSettled { .. }));
    assert!(game.interactions.is_empty());
}

#[test]
fn test_conceding_a_block_voids_the_charge() {
    let mut game = staged_game();
    let debt = find_card(&game, &[], |c| c.is_action(ActionKind::DebtCollector));
    let jsn = find_card(&game, &[], |c| c.is_action(ActionKind::JustSayNo));
    let five = find_card(&game, &[], |c| c.kind == CardKind::Money && c.value == 5);
    give(&mut game, 0, debt);
    give(&mut game, 1, jsn);
    game.players[1].bank.push(five);

    game.apply_action(0, GameAction::DebtCollect { id: debt, target: 1 })
        .unwrap();
    game.apply_action(
        1,
        GameAction::JustSayNo {
            ids: vec![jsn],
            responding_to: None,
        },
    )
    .unwrap();

    // Only the initiator may concede, and only a cancelled exchange.
    assert!(game
        .apply_action(1, GameAction::AcceptJustSayNo { responding_to: 0 })
        .is_err());
    let events = game
        .apply_action(0, GameAction::AcceptJustSayNo { responding_to: 1 })
        .unwrap();
    assert_eq!(
        events,
        vec![GameEvent::BlockAccepted {
            player: 0,
            counterparty: 1
        }]
    );
    assert!(game.interactions.is_empty());
    assert!(game.players[1].has_in_bank(five), "nothing transferred");
}

#[test]
fn test_birthday_settles_per_victim_and_unblocks_turn() {
    let mut game = staged_game();
    let birthday = find_card(&game, &[], |c| c.is_action(ActionKind::Birthday));
    let two_a = find_card(&game, &[], |c| c.kind == CardKind::Money && c.value == 2);
    let two_b = find_card(&game, &[two_a], |c| c.kind == CardKind::Money && c.value == 2);
    give(&mut game, 0, birthday);
    game.players[1].bank.push(two_a);
    game.players[2].bank.push(two_b);

    let events = game
        .apply_action(0, GameAction::Birthday { id: birthday })
        .unwrap();
    assert_eq!(events.len(), 2, "one charge per opponent");

    // The turn is stuck until both victims settle.
    assert_eq!(
        game.apply_action(0, GameAction::EndTurn),
        Err(GameError::InteractionPending)
    );

    game.apply_action(1, GameAction::AcceptCharge { payment: vec![two_a] })
        .unwrap();
    assert_eq!(
        game.apply_action(0, GameAction::EndTurn),
        Err(GameError::InteractionPending)
    );
    game.apply_action(2, GameAction::AcceptCharge { payment: vec![two_b] })
        .unwrap();

    assert_eq!(game.players[0].bank_value(&game.catalog), 4);
    assert!(game.apply_action(0, GameAction::EndTurn).is_ok());
}

#[test]
fn test_sly_deal_flow_with_win() {
    let mut game = staged_game();

    // Seat 0 holds two complete sets and one Green short of a third.
    let sly = find_card(&game, &[], |c| c.is_action(ActionKind::SlyDeal));
    give(&mut game, 0, sly);

    let mut taken = vec![sly];
    for color in [Color::DarkBlue, Color::Brown] {
        for _ in 0..color.required_count() {
            let id = find_card(&game, &taken, |c| c.single_color() == Some(color));
            taken.push(id);
            let card = game.catalog.lookup(id).unwrap().clone();
            let fresh = 800 + taken.len() as SetId;
            game.players[0].properties.add_property(&card, color, fresh);
        }
    }
    for _ in 0..Color::Green.required_count() - 1 {
        let id = find_card(&game, &taken, |c| c.single_color() == Some(Color::Green));
        taken.push(id);
        let card = game.catalog.lookup(id).unwrap().clone();
        let fresh = 850 + taken.len() as SetId;
        game.players[0]
            .properties
            .add_property(&card, Color::Green, fresh);
    }
    assert_eq!(game.players[0].complete_set_count(), 2);

    // Seat 1 holds a lone Green in an incomplete set.
    let green = find_card(&game, &taken, |c| c.single_color() == Some(Color::Green));
    let green_card = game.catalog.lookup(green).unwrap().clone();
    game.players[1]
        .properties
        .add_property(&green_card, Color::Green, 899);

    let events = game
        .apply_action(
            0,
            GameAction::SlyDeal {
                id: sly,
                target_card: green,
                color_choice: None,
            },
        )
        .unwrap();
    assert_eq!(
        events,
        vec![GameEvent::SlyDealRequested {
            requester: 0,
            target: 1,
            card: green,
        }]
    );

    let events = game
        .apply_action(1, GameAction::AcceptDeal { color_choice: None })
        .unwrap();
    let GameEvent::SlyDealAccepted { card, to_set, .. } = events[0] else {
        panic!("expected SlyDealAccepted");
    };
    assert_eq!(card, green);
    let dest = game.players[0].properties.get(to_set).unwrap();
    assert!(dest.complete, "stolen card completes the Green set");
    assert!(game.players[1].properties.set_of_card(green).is_none());

    // Third complete set wins the game on the spot.
    assert_eq!(
        events[1],
        GameEvent::GameWon {
            player: 0,
            complete_sets: 3
        }
    );
    assert_eq!(game.winner, Some(0));
}

#[test]
fn test_sly_deal_rejects_complete_sets() {
    let mut game = staged_game();
    let sly = find_card(&game, &[], |c| c.is_action(ActionKind::SlyDeal));
    give(&mut game, 0, sly);

    let mut taken = vec![sly];
    for _ in 0..Color::DarkBlue.required_count() {
        let id = find_card(&game, &taken, |c| c.single_color() == Some(Color::DarkBlue));
        taken.push(id);
        let card = game.catalog.lookup(id).unwrap().clone();
        game.players[1]
            .properties
            .add_property(&card, Color::DarkBlue, 900 + taken.len() as SetId);
    }

    let blue = taken[1];
    assert_eq!(
        game.apply_action(
            0,
            GameAction::SlyDeal {
                id: sly,
                target_card: blue,
                color_choice: None,
            }
        ),
        Err(GameError::InvalidTarget)
    );
    assert!(game.players[0].has_in_hand(sly), "silent rejection");
}

#[test]
fn test_forced_deal_swaps_both_ways() {
    let mut game = staged_game();
    let forced = find_card(&game, &[], |c| c.is_action(ActionKind::ForcedDeal));
    give(&mut game, 0, forced);

    let red = find_card(&game, &[], |c| c.single_color() == Some(Color::Red));
    let green = find_card(&game, &[], |c| c.single_color() == Some(Color::Green));
    let red_card = game.catalog.lookup(red).unwrap().clone();
    let green_card = game.catalog.lookup(green).unwrap().clone();
    game.players[0]
        .properties
        .add_property(&red_card, Color::Red, 900);
    game.players[1]
        .properties
        .add_property(&green_card, Color::Green, 901);

    game.apply_action(
        0,
        GameAction::ForcedDeal {
            id: forced,
            target_card: green,
            card_to_give: red,
            color_choice: None,
        },
    )
    .unwrap();

    let events = game
        .apply_action(1, GameAction::AcceptDeal { color_choice: None })
        .unwrap();
    assert!(matches!(events[0], GameEvent::ForcedDealAccepted { .. }));
    assert!(game.players[0].properties.set_of_card(green).is_some());
    assert!(game.players[1].properties.set_of_card(red).is_some());
    assert!(game.players[0].properties.set_of_card(red).is_none());
}

#[test]
fn test_forced_deal_swap_within_one_color() {
    // Taking the third Green lands in the set the given Green is about to
    // leave; the swap must not trip over its own halfway state.
    let mut game = staged_game();
    let forced = find_card(&game, &[], |c| c.is_action(ActionKind::ForcedDeal));
    give(&mut game, 0, forced);

    let green1 = find_card(&game, &[], |c| c.single_color() == Some(Color::Green));
    let green2 = find_card(&game, &[green1], |c| c.single_color() == Some(Color::Green));
    let green3 = find_card(&game, &[green1, green2], |c| {
        c.single_color() == Some(Color::Green)
    });
    for id in [green1, green2] {
        let card = game.catalog.lookup(id).unwrap().clone();
        game.players[0]
            .properties
            .add_property(&card, Color::Green, 930);
    }
    let green3_card = game.catalog.lookup(green3).unwrap().clone();
    game.players[1]
        .properties
        .add_property(&green3_card, Color::Green, 931);

    game.apply_action(
        0,
        GameAction::ForcedDeal {
            id: forced,
            target_card: green3,
            card_to_give: green1,
            color_choice: None,
        },
    )
    .unwrap();

    let events = game
        .apply_action(1, GameAction::AcceptDeal { color_choice: None })
        .unwrap();
    assert!(matches!(events[0], GameEvent::ForcedDealAccepted { .. }));

    // Each side ends with as many Greens as it started with; no set
    // completed mid-swap and nobody won.
    assert!(game.players[0].properties.set_of_card(green3).is_some());
    assert!(game.players[1].properties.set_of_card(green1).is_some());
    assert!(game.players[0].properties.set_of_card(green1).is_none());
    assert_eq!(game.players[0].complete_set_count(), 0);
    assert_eq!(game.players[1].complete_set_count(), 0);
    assert_eq!(game.winner, None);
    assert!(game.interactions.is_empty());
}

#[test]
fn test_sly_deal_rejected_when_wild_has_no_home() {
    // A universal wild can only join an existing set. Stealing one into an
    // empty ledger has nowhere to land, so the play is refused up front
    // instead of leaving an exchange nobody can accept.
    let mut game = staged_game();
    let sly = find_card(&game, &[], |c| c.is_action(ActionKind::SlyDeal));
    give(&mut game, 0, sly);

    let red = find_card(&game, &[], |c| c.single_color() == Some(Color::Red));
    let wild = find_card(&game, &[], |c| c.is_universal_wild());
    let red_card = game.catalog.lookup(red).unwrap().clone();
    let wild_card = game.catalog.lookup(wild).unwrap().clone();
    game.players[1]
        .properties
        .add_property(&red_card, Color::Red, 940);
    game.players[1]
        .properties
        .add_property(&wild_card, Color::Red, 941);

    assert_eq!(
        game.apply_action(
            0,
            GameAction::SlyDeal {
                id: sly,
                target_card: wild,
                color_choice: None,
            }
        ),
        Err(GameError::InvalidPlacement)
    );
    assert!(game.players[0].has_in_hand(sly), "silent rejection");
    assert!(game.interactions.is_empty());
    assert!(game.apply_action(0, GameAction::EndTurn).is_ok());
}

#[test]
fn test_forced_deal_wasted_when_swap_cannot_land() {
    // Taking a universal wild while giving away the initiator's only
    // property leaves the wild with no set to join. The announced play is
    // wasted rather than stalling the room.
    let mut game = staged_game();
    let forced = find_card(&game, &[], |c| c.is_action(ActionKind::ForcedDeal));
    give(&mut game, 0, forced);

    let green = find_card(&game, &[], |c| c.single_color() == Some(Color::Green));
    let red = find_card(&game, &[], |c| c.single_color() == Some(Color::Red));
    let wild = find_card(&game, &[], |c| c.is_universal_wild());
    let green_card = game.catalog.lookup(green).unwrap().clone();
    let red_card = game.catalog.lookup(red).unwrap().clone();
    let wild_card = game.catalog.lookup(wild).unwrap().clone();
    game.players[0]
        .properties
        .add_property(&green_card, Color::Green, 950);
    game.players[1]
        .properties
        .add_property(&red_card, Color::Red, 951);
    game.players[1]
        .properties
        .add_property(&wild_card, Color::Red, 952);

    let events = game
        .apply_action(
            0,
            GameAction::ForcedDeal {
                id: forced,
                target_card: wild,
                card_to_give: green,
                color_choice: None,
            },
        )
        .unwrap();
    assert!(matches!(
        events[0],
        GameEvent::ActionWasted { card, .. } if card == forced
    ));
    assert!(!game.players[0].has_in_hand(forced), "the play is spent");
    assert!(game.discard.contains(&forced));
    assert_eq!(game.plays_left, 2);

    // Nothing moved and the turn is not stuck.
    assert!(game.players[0].properties.set_of_card(green).is_some());
    assert!(game.players[1].properties.set_of_card(wild).is_some());
    assert!(game.interactions.is_empty());
    assert!(game.apply_action(0, GameAction::EndTurn).is_ok());
}

#[test]
fn test_dealbreaker_takes_the_whole_set() {
    let mut game = staged_game();
    let breaker = find_card(&game, &[], |c| c.is_action(ActionKind::Dealbreaker));
    give(&mut game, 0, breaker);

    let mut taken = vec![breaker];
    for _ in 0..Color::Brown.required_count() {
        let id = find_card(&game, &taken, |c| c.single_color() == Some(Color::Brown));
        taken.push(id);
        let card = game.catalog.lookup(id).unwrap().clone();
        game.players[2]
            .properties
            .add_property(&card, Color::Brown, 910);
    }
    let set_id = game.players[2].properties.set_of_card(taken[1]).unwrap();
    assert!(game.players[2].properties.get(set_id).unwrap().complete);

    game.apply_action(
        0,
        GameAction::Dealbreaker {
            id: breaker,
            target_set: set_id,
        },
    )
    .unwrap();
    let events = game
        .apply_action(2, GameAction::AcceptDeal { color_choice: None })
        .unwrap();
    assert!(matches!(events[0], GameEvent::DealbreakerAccepted { .. }));

    // Set moved intact, id preserved.
    let set = game.players[0].properties.get(set_id).unwrap();
    assert!(set.complete);
    assert_eq!(set.cards.len(), Color::Brown.required_count());
    assert!(game.players[2].properties.get(set_id).is_none());
}

#[test]
fn test_rent_payment_with_property_rehoming() {
    let mut game = staged_game();
    let blue1 = find_card(&game, &[], |c| c.single_color() == Some(Color::DarkBlue));
    let blue2 = find_card(&game, &[blue1], |c| {
        c.single_color() == Some(Color::DarkBlue)
    });
    let rent = find_card(&game, &[], |c| {
        c.is_rent() && !c.is_wild_rent() && c.colors().contains(&Color::DarkBlue)
    });
    give(&mut game, 0, blue1);
    give(&mut game, 0, blue2);
    give(&mut game, 0, rent);
    for id in [blue1, blue2] {
        game.apply_action(
            0,
            GameAction::PlayProperty {
                id,
                color: Color::DarkBlue,
            },
        )
        .unwrap();
    }
    let set_id = game.players[0].properties.set_of_card(blue1).unwrap();

    // Victims: 1 can only short-pay with a lone Red property, 2 pays cash.
    let red = find_card(&game, &[], |c| c.single_color() == Some(Color::Red));
    let red_card = game.catalog.lookup(red).unwrap().clone();
    game.players[1]
        .properties
        .add_property(&red_card, Color::Red, 900);
    let ten = find_card(&game, &[], |c| c.kind == CardKind::Money && c.value == 10);
    game.players[2].bank.push(ten);

    game.apply_action(
        0,
        GameAction::RequestRent {
            id: rent,
            doublers: vec![],
            source_set: set_id,
            color: Some(Color::DarkBlue),
            target: None,
        },
    )
    .unwrap();

    let events = game
        .apply_action(1, GameAction::AcceptCharge { payment: vec![red] })
        .unwrap();
    let GameEvent::ChargeSettled { properties, .. } = &events[0] else {
        panic!("expected ChargeSettled");
    };
    let (card, dest) = properties[0];
    assert_eq!(card, red);
    // The Red card re-homes in a Red set at the payee.
    assert_eq!(
        game.players[0].properties.get(dest).unwrap().color,
        Some(Color::Red)
    );

    // Overpaying with a 10 settles without change.
    game.apply_action(2, GameAction::AcceptCharge { payment: vec![ten] })
        .unwrap();
    assert!(game.players[0].has_in_bank(ten));
    assert!(game.interactions.is_empty());
}

#[test]
fn test_developments_raise_rent() {
    let mut game = staged_game();
    let house = find_card(&game, &[], |c| c.is_action(ActionKind::House));
    let hotel = find_card(&game, &[], |c| c.is_action(ActionKind::Hotel));
    let rent = find_card(&game, &[], |c| {
        c.is_rent() && !c.is_wild_rent() && c.colors().contains(&Color::DarkBlue)
    });

    let mut taken = vec![house, hotel, rent];
    for _ in 0..Color::DarkBlue.required_count() {
        let id = find_card(&game, &taken, |c| c.single_color() == Some(Color::DarkBlue));
        taken.push(id);
        let card = game.catalog.lookup(id).unwrap().clone();
        game.players[0]
            .properties
            .add_property(&card, Color::DarkBlue, 920);
    }
    let set_id = game.players[0].properties.set_of_card(taken[3]).unwrap();

    give(&mut game, 0, house);
    give(&mut game, 0, hotel);
    give(&mut game, 0, rent);
    game.apply_action(
        0,
        GameAction::PlayDevelopment {
            id: house,
            target_set: set_id,
        },
    )
    .unwrap();
    game.apply_action(
        0,
        GameAction::PlayDevelopment {
            id: hotel,
            target_set: set_id,
        },
    )
    .unwrap();

    let events = game
        .apply_action(
            0,
            GameAction::RequestRent {
                id: rent,
                doublers: vec![],
                source_set: set_id,
                color: Some(Color::DarkBlue),
                target: None,
            },
        )
        .unwrap();
    let GameEvent::RentRequested { amount, .. } = events[0] else {
        panic!("expected RentRequested");
    };
    // Base 8 plus house 3 plus hotel 4.
    assert_eq!(amount, 15);
}

#[test]
fn test_doubled_rent_consumes_extra_plays() {
    let mut game = staged_game();
    let blue = find_card(&game, &[], |c| c.single_color() == Some(Color::DarkBlue));
    let rent = find_card(&game, &[], |c| {
        c.is_rent() && !c.is_wild_rent() && c.colors().contains(&Color::DarkBlue)
    });
    let doubler = find_card(&game, &[], |c| c.is_action(ActionKind::DoubleRent));
    give(&mut game, 0, blue);
    give(&mut game, 0, rent);
    give(&mut game, 0, doubler);

    game.apply_action(
        0,
        GameAction::PlayProperty {
            id: blue,
            color: Color::DarkBlue,
        },
    )
    .unwrap();
    let set_id = game.players[0].properties.set_of_card(blue).unwrap();
    assert_eq!(game.plays_left, 2);

    let events = game
        .apply_action(
            0,
            GameAction::RequestRent {
                id: rent,
                doublers: vec![doubler],
                source_set: set_id,
                color: Some(Color::DarkBlue),
                target: None,
            },
        )
        .unwrap();
    let GameEvent::RentRequested { amount, doublers, .. } = events[0] else {
        panic!("expected RentRequested");
    };
    // One Blue card: tier 3, doubled once.
    assert_eq!(amount, 6);
    assert_eq!(doublers, 1);
    assert_eq!(game.plays_left, 0, "rent and its doubler both cost a play");
}

#[test]
fn test_wild_rent_targets_a_single_player() {
    let mut game = staged_game();
    let blue = find_card(&game, &[], |c| c.single_color() == Some(Color::DarkBlue));
    let wild_rent = find_card(&game, &[], |c| c.is_wild_rent());
    give(&mut game, 0, blue);
    give(&mut game, 0, wild_rent);

    game.apply_action(
        0,
        GameAction::PlayProperty {
            id: blue,
            color: Color::DarkBlue,
        },
    )
    .unwrap();
    let set_id = game.players[0].properties.set_of_card(blue).unwrap();

    let events = game
        .apply_action(
            0,
            GameAction::RequestRent {
                id: wild_rent,
                doublers: vec![],
                source_set: set_id,
                color: Some(Color::DarkBlue),
                target: Some(2),
            },
        )
        .unwrap();
    let GameEvent::RentRequested { targets, .. } = &events[0] else {
        panic!("expected RentRequested");
    };
    assert_eq!(targets, &vec![2]);
    assert!(game.interactions.awaiting(1, None).is_none());
    assert!(game.interactions.awaiting(2, None).is_some());
}

#[test]
fn test_full_turn_cycle() {
    let mut game = GameState::new(vec!["A".to_string(), "B".to_string()]);

    game.apply_action(0, GameAction::StartTurn).unwrap();
    assert_eq!(game.players[0].hand.len(), 7);

    let events = game.apply_action(0, GameAction::EndTurn).unwrap();
    let GameEvent::TurnEnded { next_player, drawn, .. } = events[0] else {
        panic!("expected TurnEnded");
    };
    assert_eq!(next_player, 1);
    assert_eq!(drawn, 2);
    assert_eq!(game.players[1].hand.len(), 7);

    // The second player's turn is live without StartTurn.
    assert_eq!(game.plays_left, 3);
    assert_eq!(
        game.apply_action(1, GameAction::StartTurn),
        Err(GameError::TurnAlreadyStarted)
    );
    game.apply_action(1, GameAction::EndTurn).unwrap();
    assert_eq!(game.active_player, 0);
}

#[test]
fn test_move_property_reassigns_a_wild() {
    let mut game = staged_game();
    // A dual wild covering DarkBlue, parked under DarkBlue.
    let wild = find_card(&game, &[], |c| {
        c.is_property() && !c.is_universal_wild() && c.colors().len() == 2
    });
    let wild_card = game.catalog.lookup(wild).unwrap().clone();
    let other_color = *wild_card
        .colors()
        .iter()
        .find(|&&c| c != wild_card.colors()[0])
        .unwrap();
    give(&mut game, 0, wild);

    game.apply_action(
        0,
        GameAction::PlayProperty {
            id: wild,
            color: wild_card.colors()[0],
        },
    )
    .unwrap();
    let from_set = game.players[0].properties.set_of_card(wild).unwrap();

    let events = game
        .apply_action(
            0,
            GameAction::MoveProperty {
                card_id: wild,
                from_set: Some(from_set),
                to_set: None,
                color_choice: Some(other_color),
            },
        )
        .unwrap();
    let GameEvent::PropertyMoved { to_set, .. } = events[0] else {
        panic!("expected PropertyMoved");
    };
    let set = game.players[0].properties.get(to_set).unwrap();
    assert_eq!(set.color, Some(other_color));
    // Moving costs no play.
    assert_eq!(game.plays_left, 3);
}
