/// Property-based tests for the showdown scorer and hand evaluator.
///
/// These verify the rank-window algebra and evaluator ordering across
/// randomly generated inputs.
use heist_holdem::eval::{FiveCardEvaluator, HandEvaluator};
use heist_holdem::game::entities::{Card, Suit, TokenValue};
use heist_holdem::showdown::{guess_ranks, rank_windows};
use proptest::prelude::*;
use std::collections::BTreeSet;

// Strategy to generate a valid card (values 2-14, aces are value 14).
fn card_strategy() -> impl Strategy<Value = Card> {
    (2u8..=14, 0u8..=3).prop_map(|(value, suit_idx)| {
        let suit = match suit_idx {
            0 => Suit::Club,
            1 => Suit::Diamond,
            2 => Suit::Heart,
            _ => Suit::Spade,
        };
        Card(value, suit)
    })
}

// Strategy to generate a vec of unique cards (no duplicates).
fn unique_cards_strategy(count: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), count..=count).prop_filter(
        "Cards must be unique",
        |cards| {
            let set: BTreeSet<_> = cards.iter().collect();
            set.len() == cards.len()
        },
    )
}

// Strategy to generate a shuffled token permutation 1..=n.
fn token_permutation_strategy() -> impl Strategy<Value = Vec<TokenValue>> {
    (1usize..=10).prop_flat_map(|n| Just((1..=n as TokenValue).collect::<Vec<_>>()).prop_shuffle())
}

proptest! {
    #[test]
    fn test_windows_partition_all_ranks(scores in prop::collection::vec(0u32..40, 1..12)) {
        let windows = rank_windows(&scores);
        prop_assert_eq!(windows.len(), scores.len());

        // Each rank 1..=n is covered exactly once across the windows,
        // counting a window shared by k claimants once.
        let mut covered = vec![0usize; scores.len() + 1];
        let distinct: BTreeSet<(usize, usize)> =
            windows.iter().map(|w| (w.start, w.end)).collect();
        for (start, end) in distinct {
            prop_assert!(start >= 1 && end <= scores.len() && start <= end);
            for rank in start..=end {
                covered[rank] += 1;
            }
        }
        prop_assert!(covered[1..].iter().all(|&c| c == 1), "gaps or overlaps: {covered:?}");
    }

    #[test]
    fn test_equal_scores_share_windows(scores in prop::collection::vec(0u32..6, 2..10)) {
        let windows = rank_windows(&scores);
        for i in 0..scores.len() {
            for j in 0..scores.len() {
                if scores[i] == scores[j] {
                    prop_assert_eq!(windows[i], windows[j]);
                } else {
                    prop_assert_ne!(windows[i], windows[j]);
                }
            }
        }
    }

    #[test]
    fn test_window_width_matches_tie_group(scores in prop::collection::vec(0u32..6, 1..10)) {
        let windows = rank_windows(&scores);
        for (i, window) in windows.iter().enumerate() {
            let ties = scores.iter().filter(|&&s| s == scores[i]).count();
            prop_assert_eq!(window.end - window.start + 1, ties);
        }
    }

    #[test]
    fn test_rank_windows_deterministic(scores in prop::collection::vec(0u32..40, 1..12)) {
        prop_assert_eq!(rank_windows(&scores), rank_windows(&scores));
    }

    #[test]
    fn test_guess_ranks_are_a_permutation(tokens in token_permutation_strategy()) {
        let ranks = guess_ranks(&tokens);
        let seen: BTreeSet<usize> = ranks.iter().copied().collect();
        prop_assert_eq!(seen, (1..=tokens.len()).collect::<BTreeSet<_>>());

        // A strictly higher token always claims a strictly better rank.
        for i in 0..tokens.len() {
            for j in 0..tokens.len() {
                if tokens[i] > tokens[j] {
                    prop_assert!(ranks[i] < ranks[j]);
                }
            }
        }
    }

    #[test]
    fn test_window_distance_zero_iff_inside(
        scores in prop::collection::vec(0u32..10, 1..8),
        guess in 1usize..8,
    ) {
        for window in rank_windows(&scores) {
            prop_assert_eq!(window.distance(guess) == 0, window.contains(guess));
        }
    }

    #[test]
    fn test_evaluator_deterministic(cards in unique_cards_strategy(7)) {
        let evaluator = FiveCardEvaluator;
        let a = evaluator.evaluate(&cards[..5], &cards[5..]);
        let b = evaluator.evaluate(&cards[..5], &cards[5..]);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn test_evaluator_ignores_card_order(cards in unique_cards_strategy(7)) {
        let evaluator = FiveCardEvaluator;
        let forward = evaluator.evaluate(&cards[..5], &cards[5..]);
        let mut reversed = cards.clone();
        reversed.reverse();
        let backward = evaluator.evaluate(&reversed[..5], &reversed[5..]);
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn test_more_community_cards_never_weaken(cards in unique_cards_strategy(7)) {
        // The best five of a superset can only match or beat the
        // subset's best five; scores shrink as cards are revealed.
        let evaluator = FiveCardEvaluator;
        let hole = &cards[5..];
        let flop = evaluator.evaluate(&cards[..3], hole);
        let turn = evaluator.evaluate(&cards[..4], hole);
        let river = evaluator.evaluate(&cards[..5], hole);
        prop_assert!(turn <= flop);
        prop_assert!(river <= turn);
    }

    #[test]
    fn test_classify_never_panics(cards in unique_cards_strategy(7)) {
        let evaluator = FiveCardEvaluator;
        let score = evaluator.evaluate(&cards[..5], &cards[5..]);
        prop_assert!(!evaluator.classify(score).is_empty());
    }
}
