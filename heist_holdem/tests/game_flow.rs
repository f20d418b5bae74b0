/// Integration tests for session flow scenarios.
///
/// These drive the session aggregate through its public API with the
/// real hand evaluator: joining and reconnecting, hand lifecycle,
/// token claims, settlement quorum, and snapshot visibility.
use heist_holdem::game::entities::{PlayerId, TablePhase, TokenValue};
use heist_holdem::{Game, GameError, SessionConfig, TokenSource};

fn pid(s: &str) -> PlayerId {
    PlayerId::new(s)
}

fn game_with_players(n: usize) -> Game {
    let mut game = Game::new(SessionConfig::default());
    for i in 1..=n {
        game.join_or_reconnect(
            &format!("conn-{i}"),
            &pid(&format!("player-{i}")),
            &format!("Thief {i}"),
            false,
        )
        .unwrap();
    }
    game
}

/// Claim token `i` for player `i` and settle everyone, which advances
/// the phase once the last settle lands.
fn claim_and_settle_all(game: &mut Game, n: usize) {
    for i in 1..=n {
        game.take_token(&pid(&format!("player-{i}")), i as TokenValue, &TokenSource::Bank)
            .unwrap();
    }
    for i in 1..=n {
        game.toggle_settle(&pid(&format!("player-{i}"))).unwrap();
    }
}

#[test]
fn test_lobby_reported_until_first_hand() {
    let game = game_with_players(3);
    let view = game.get_state(Some(&pid("player-1")));
    assert_eq!(view.phase, TablePhase::Lobby);
    assert!(view.community_cards.is_empty());
    assert_eq!(view.vaults, 0);
    assert_eq!(view.alarms, 0);
}

#[test]
fn test_cannot_start_hand_with_two_players() {
    let mut game = game_with_players(2);
    assert_eq!(game.start(), Err(GameError::NotEnoughPlayers { needed: 3 }));
    assert_eq!(game.get_state(None).phase, TablePhase::Lobby);
}

#[test]
fn test_start_deals_two_cards_per_player() {
    let mut game = game_with_players(4);
    game.start().unwrap();

    let view = game.get_state(None);
    assert_eq!(view.phase, TablePhase::Preflop);
    assert_eq!(view.tokens_available, vec![1, 2, 3, 4]);

    // A neutral viewer sees that everyone holds a hand, but not what.
    let me = game.get_state(Some(&pid("player-1")));
    assert_eq!(me.me.unwrap().hole_cards.len(), 2);
}

#[test]
fn test_settle_quorum_reveals_the_flop() {
    let mut game = game_with_players(3);
    game.start().unwrap();

    claim_and_settle_all(&mut game, 3);

    let view = game.get_state(None);
    assert_eq!(view.phase, TablePhase::Flop);
    assert_eq!(view.community_cards.len(), 3);
    // Fresh token economy for the new phase.
    assert_eq!(view.tokens_available, vec![1, 2, 3]);
    for player in &view.players {
        assert!(player.held_token.is_none());
        assert!(!player.is_settled);
    }
}

#[test]
fn test_full_hand_reaches_result() {
    let mut game = game_with_players(3);
    game.start().unwrap();

    // PREFLOP, FLOP, TURN, RIVER; the last settle triggers showdown.
    for _ in 0..4 {
        claim_and_settle_all(&mut game, 3);
    }

    let view = game.get_state(Some(&pid("player-1")));
    assert_eq!(view.phase, TablePhase::Result);
    assert_eq!(view.community_cards.len(), 5);
    // Exactly one of the counters moved, whichever way the guesses went.
    assert_eq!(view.vaults + view.alarms, 1);
    assert!(!view.result_message.is_empty());

    // RESULT reveals every hand and the per-phase detail.
    for player in &view.players {
        assert_eq!(player.hole_cards.len(), 2);
    }
    let details = view.result_details.expect("detail rows at RESULT");
    assert_eq!(details.len(), 3);
    for detail in &details {
        assert_eq!(detail.rows.len(), 3);
    }
}

#[test]
fn test_result_details_withheld_mid_hand() {
    let mut game = game_with_players(3);
    game.start().unwrap();
    let view = game.get_state(Some(&pid("player-1")));
    assert!(view.result_details.is_none());
    assert!(view.result_message.is_empty());
}

#[test]
fn test_other_hands_hidden_mid_hand() {
    let mut game = game_with_players(3);
    game.start().unwrap();

    let view = game.get_state(Some(&pid("player-1")));
    for player in &view.players {
        if player.id == pid("player-1") {
            assert_eq!(player.hole_cards.len(), 2);
        } else {
            assert!(player.hole_cards.is_empty());
        }
    }
}

#[test]
fn test_take_and_return_round_trip() {
    let mut game = game_with_players(3);
    game.start().unwrap();

    let before = game.get_state(None).tokens_available;
    game.take_token(&pid("player-2"), 3, &TokenSource::Bank).unwrap();
    assert_eq!(game.get_state(None).tokens_available, vec![1, 2]);
    game.return_token(&pid("player-2")).unwrap();
    assert_eq!(game.get_state(None).tokens_available, before);
}

#[test]
fn test_steal_leaves_bank_untouched() {
    let mut game = game_with_players(3);
    game.start().unwrap();

    game.take_token(&pid("player-1"), 2, &TokenSource::Bank).unwrap();
    let bank = game.get_state(None).tokens_available;

    game.take_token(&pid("player-3"), 2, &TokenSource::Player(pid("player-1")))
        .unwrap();

    let view = game.get_state(None);
    assert_eq!(view.tokens_available, bank);
    let thief = view.players.iter().find(|p| p.id == pid("player-3")).unwrap();
    let victim = view.players.iter().find(|p| p.id == pid("player-1")).unwrap();
    assert_eq!(thief.held_token, Some(2));
    assert_eq!(victim.held_token, None);
}

#[test]
fn test_mid_hand_joiner_is_queued_observer() {
    let mut game = game_with_players(3);
    game.start().unwrap();

    game.join_or_reconnect("conn-4", &pid("player-4"), "Latecomer", false)
        .unwrap();

    let view = game.get_state(Some(&pid("player-4")));
    let late = view.me.unwrap();
    assert!(late.is_observer);
    assert!(late.queued_to_join);
    assert!(late.hole_cards.is_empty());

    // Next deal brings them in.
    game.start().unwrap();
    let view = game.get_state(Some(&pid("player-4")));
    let late = view.me.unwrap();
    assert!(!late.is_observer);
    assert!(!late.queued_to_join);
    assert_eq!(late.hole_cards.len(), 2);
    assert_eq!(view.tokens_available, vec![1, 2, 3, 4]);
}

#[test]
fn test_reconnect_resumes_hand() {
    let mut game = game_with_players(3);
    game.start().unwrap();
    let dealt = game
        .get_state(Some(&pid("player-1")))
        .me
        .unwrap()
        .hole_cards;

    assert!(game.handle_disconnect("conn-1"));
    let view = game.get_state(None);
    let gone = view.players.iter().find(|p| p.id == pid("player-1")).unwrap();
    assert!(!gone.is_connected);

    game.join_or_reconnect("conn-1b", &pid("player-1"), "Thief 1", false)
        .unwrap();
    let back = game.get_state(Some(&pid("player-1"))).me.unwrap();
    assert!(back.is_connected);
    assert!(!back.is_observer);
    assert_eq!(back.hole_cards, dealt);
}

#[test]
fn test_disconnected_player_can_be_removed() {
    let mut game = game_with_players(3);
    game.start().unwrap();
    game.take_token(&pid("player-2"), 1, &TokenSource::Bank).unwrap();

    assert_eq!(
        game.remove_disconnected_player(&pid("player-2")),
        Err(GameError::StillConnected)
    );

    game.handle_disconnect("conn-2");
    game.remove_disconnected_player(&pid("player-2")).unwrap();

    let view = game.get_state(None);
    assert_eq!(view.players.len(), 2);
    assert!(view.players.iter().all(|p| p.id != pid("player-2")));
    // Their token went back to the bank on the way out.
    assert_eq!(view.tokens_available, vec![1, 2, 3]);

    // The survivors' settlement quorum works without the removed seat.
    game.take_token(&pid("player-1"), 1, &TokenSource::Bank).unwrap();
    game.take_token(&pid("player-3"), 2, &TokenSource::Bank).unwrap();
    game.toggle_settle(&pid("player-1")).unwrap();
    game.toggle_settle(&pid("player-3")).unwrap();
    assert_eq!(game.get_state(None).phase, TablePhase::Flop);
}

#[test]
fn test_restart_zeroes_counters_and_redeals() {
    let mut game = game_with_players(3);
    game.start().unwrap();
    for _ in 0..4 {
        claim_and_settle_all(&mut game, 3);
    }
    let after_hand = game.get_state(None);
    assert_eq!(after_hand.vaults + after_hand.alarms, 1);

    game.restart_full_game().unwrap();
    let view = game.get_state(None);
    assert_eq!(view.phase, TablePhase::Preflop);
    assert_eq!(view.vaults, 0);
    assert_eq!(view.alarms, 0);
    assert!(view.result_message.is_empty());
    assert!(view.community_cards.is_empty());
}

#[test]
fn test_chat_round_trips_into_snapshots() {
    let mut game = game_with_players(2);
    game.add_chat_message(&pid("player-1"), "nice and quiet in here")
        .unwrap();
    game.add_chat_message(&pid("player-2"), "too quiet").unwrap();

    let view = game.get_state(None);
    assert_eq!(view.chat_log.len(), 2);
    assert_eq!(view.chat_log[0].author, "Thief 1");
    assert_eq!(view.chat_log[1].text, "too quiet");
}

#[test]
fn test_tomato_appears_in_snapshots() {
    let mut game = game_with_players(2);
    game.throw_tomato(&pid("player-1"), &pid("player-2")).unwrap();

    let view = game.get_state(None);
    let tomato = view.tomato_event.expect("tomato within TTL");
    assert_eq!(tomato.from, "Thief 1");
    assert_eq!(tomato.to, "Thief 2");
}

#[test]
fn test_observer_watches_without_playing() {
    let mut game = game_with_players(3);
    game.join_or_reconnect("conn-obs", &pid("watcher"), "Lookout", true)
        .unwrap();
    game.start().unwrap();

    assert_eq!(
        game.take_token(&pid("watcher"), 1, &TokenSource::Bank),
        Err(GameError::ObserverExcluded)
    );

    // Observers see every hand even mid-phase.
    let view = game.get_state(Some(&pid("watcher")));
    for player in view.players.iter().filter(|p| !p.is_observer) {
        assert_eq!(player.hole_cards.len(), 2);
    }
}
