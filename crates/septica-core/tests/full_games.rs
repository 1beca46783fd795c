use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use septica_core::game::{Action, GameRoom, PlayOutcome};
use septica_core::model::hand::Hand;
use septica_core::model::player::{PlayerCount, PlayerId};

fn seated_room(count: PlayerCount, seed: u64) -> GameRoom {
    let mut room = GameRoom::with_seed("table", count, seed);
    for seat in 0..count.seats() {
        room.add_player(PlayerId::new(format!("p{seat}"))).unwrap();
    }
    room.start();
    room
}

fn check_invariants(room: &GameRoom, count: PlayerCount) {
    assert_eq!(room.cards_in_play(), count.deck_size());
    assert!(room.turn_index() < room.players().len());
    assert!(!(room.waiting_for_response() && room.waiting_for_initiator_response()));
    assert_eq!(room.current_lead().is_some(), !room.trick().is_empty());
    assert_eq!(room.round_initiator().is_some(), !room.trick().is_empty());
    for player in room.players() {
        assert!(player.hand().len() <= Hand::FULL);
    }

    let plays = room.trick().plays();
    if count.uses_duel() {
        // Two seats trade cuts, each spending at most a full hand.
        assert!(plays.len() <= 2 * Hand::FULL);
        for window in plays.windows(2) {
            assert_ne!(window[0].player_id, window[1].player_id);
        }
        for window in plays.windows(3) {
            assert_eq!(window[0].player_id, window[2].player_id);
        }
    } else {
        assert!(plays.len() <= count.seats());
    }
}

/// Drives a whole game with uniformly chosen legal actions.
fn play_out(count: PlayerCount, seed: u64, picks: u64) -> GameRoom {
    let mut room = seated_room(count, seed);
    let mut chooser = StdRng::seed_from_u64(picks);
    let mut steps = 0;
    while !room.is_finished() {
        check_invariants(&room, count);
        let player = room.current_player().cloned().unwrap();
        let actions = room.legal_actions(&player);
        let action = *actions
            .choose(&mut chooser)
            .unwrap_or_else(|| panic!("{player} is stuck in {:?}", room.phase()));
        room.apply(&player, action).unwrap();
        steps += 1;
        assert!(steps <= 2 * count.deck_size(), "game did not terminate");
    }
    check_invariants(&room, count);
    room
}

fn collected_points(room: &GameRoom) -> usize {
    room.players()
        .iter()
        .flat_map(|p| p.collected())
        .filter(|card| card.is_point())
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_games_conserve_cards_and_finish(
        seats in 2u8..=4,
        seed in any::<u64>(),
        picks in any::<u64>(),
    ) {
        let count = PlayerCount::from_u8(seats).unwrap();
        let room = play_out(count, seed, picks);
        prop_assert_eq!(room.deck_len(), 0);
        prop_assert!(room.players().iter().all(|p| p.hand().is_empty()));
        prop_assert_eq!(collected_points(&room), 8);

        let result = room.result().unwrap();
        let best = room.scores().seats().iter().map(|s| s.points).max().unwrap();
        prop_assert_eq!(result.points, best);
        for winner in result.winner.ids() {
            prop_assert_eq!(room.scores().score(winner), Some(best));
        }
    }
}

#[test]
fn every_trick_is_won_by_a_seated_player() {
    let mut room = seated_room(PlayerCount::Four, 99);
    let mut chooser = StdRng::seed_from_u64(4);
    while !room.is_finished() {
        let player = room.current_player().cloned().unwrap();
        let actions = room.legal_actions(&player);
        let action = *actions.choose(&mut chooser).unwrap();
        if let PlayOutcome::TrickWon { winner, .. } = room.apply(&player, action).unwrap() {
            assert!(room.seat_of(&winner).is_some());
            assert!(room.current_player().is_some());
        }
    }
}

#[test]
fn passing_is_only_offered_to_a_cut_initiator() {
    let mut room = seated_room(PlayerCount::Two, 5);
    let mut chooser = StdRng::seed_from_u64(5);
    while !room.is_finished() {
        let player = room.current_player().cloned().unwrap();
        let actions = room.legal_actions(&player);
        let can_pass = actions.contains(&Action::Pass);
        assert_eq!(can_pass, room.waiting_for_initiator_response());
        let action = *actions.choose(&mut chooser).unwrap();
        room.apply(&player, action).unwrap();
    }
}

#[test]
fn same_seed_replays_the_same_game() {
    let first = play_out(PlayerCount::Three, 17, 3);
    let second = play_out(PlayerCount::Three, 17, 3);
    assert_eq!(first.result(), second.result());
    for (a, b) in first.players().iter().zip(second.players()) {
        assert_eq!(a.collected(), b.collected());
    }
}
