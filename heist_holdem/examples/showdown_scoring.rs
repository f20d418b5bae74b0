//! Showdown Scoring Example
//!
//! Demonstrates how token claims are judged against true hand strength:
//! rank windows for ties, window-distance errors, and the narrative.

use heist_holdem::eval::{FiveCardEvaluator, HandEvaluator};
use heist_holdem::game::entities::{Card, Suit};
use heist_holdem::showdown::{self, Claimant};

fn main() {
    println!("=== Showdown Scoring Example ===\n");

    let evaluator = FiveCardEvaluator;

    // A full board after the river.
    let community = vec![
        Card(14, Suit::Heart), // Ace of Hearts
        Card(13, Suit::Heart), // King of Hearts
        Card(7, Suit::Spade),  // Seven of Spades
        Card(7, Suit::Club),   // Seven of Clubs
        Card(2, Suit::Diamond),
    ];

    // Three players claimed tokens for the final phase. Token 3 says
    // "my hand finishes strongest", token 1 says "weakest".
    let claimants = vec![
        Claimant {
            name: "Lefty".to_string(),
            token: 3,
            hole_cards: vec![Card(14, Suit::Spade), Card(14, Suit::Club)], // aces full
        },
        Claimant {
            name: "Mouse".to_string(),
            token: 1,
            hole_cards: vec![Card(13, Suit::Club), Card(4, Suit::Diamond)], // kings up
        },
        Claimant {
            name: "Grits".to_string(),
            token: 2,
            hole_cards: vec![Card(7, Suit::Diamond), Card(3, Suit::Club)], // trip sevens
        },
    ];

    println!("Board: {}", render(&community));
    for claimant in &claimants {
        let score = evaluator.evaluate(&community, &claimant.hole_cards);
        println!(
            "{} claims token {} holding {} -> {}",
            claimant.name,
            claimant.token,
            render(&claimant.hole_cards),
            evaluator.classify(score),
        );
    }

    let claims = showdown::score_claims(&claimants, &community, &evaluator);

    println!("\nJudgement:");
    for claim in &claims {
        println!(
            "  {}: guessed #{}, true window #{}-{}, error {}",
            claim.name, claim.guess_rank, claim.true_window.start, claim.true_window.end, claim.error,
        );
    }

    println!(
        "\ntotal error: {}, max error: {}",
        showdown::total_error(&claims),
        showdown::max_error(&claims),
    );
    println!(
        "outcome: {}",
        if showdown::max_error(&claims) == 0 {
            "vault cracked"
        } else {
            "alarm tripped"
        }
    );

    println!("\nNarrative:");
    for line in showdown::narrative_lines(&claims) {
        println!("  {line}");
    }

    println!("\n=== End of Showdown Scoring Example ===");
}

fn render(cards: &[Card]) -> String {
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
