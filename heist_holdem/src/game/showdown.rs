//! Showdown scoring: true hand ranking with tie windows, guessed
//! ranking from token claims, and the accuracy judgement that moves the
//! vault/alarm counters.
//!
//! Everything here is a pure function over claimant data so the
//! algorithm can be exercised without a running session.

use serde::{Deserialize, Serialize};

use super::entities::{Card, Phase, TokenValue};
use super::eval::{HandEvaluator, HandScore};

/// A player judged at showdown: the name shown in the narrative, the
/// token claimed for the final phase, and their dealt hole cards.
#[derive(Clone, Debug)]
pub struct Claimant {
    pub name: String,
    pub token: TokenValue,
    pub hole_cards: Vec<Card>,
}

/// Inclusive rank window shared by a group of tied scores. A claimant
/// guessing anywhere inside their window is exactly right.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RankWindow {
    pub start: usize,
    pub end: usize,
}

impl RankWindow {
    pub fn contains(&self, rank: usize) -> bool {
        (self.start..=self.end).contains(&rank)
    }

    /// Distance from a guess to the nearest window endpoint; zero when
    /// the guess falls inside.
    pub fn distance(&self, rank: usize) -> u32 {
        if self.contains(rank) {
            0
        } else if rank < self.start {
            (self.start - rank) as u32
        } else {
            (rank - self.end) as u32
        }
    }
}

/// Accuracy buckets keyed by window distance, clamped at `WayOff`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Perfect,
    Close,
    Off,
    WayOff,
}

impl Accuracy {
    pub fn from_error(error: u32) -> Self {
        match error {
            0 => Self::Perfect,
            1 => Self::Close,
            2 => Self::Off,
            _ => Self::WayOff,
        }
    }
}

/// One claimant's judgement at showdown.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClaimResult {
    pub name: String,
    pub token: TokenValue,
    pub guess_rank: usize,
    pub true_window: RankWindow,
    pub error: u32,
    pub accuracy: Accuracy,
    pub label: String,
}

/// Retrospective row for one player in one earlier betting phase.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PhaseRow {
    pub name: String,
    pub token: TokenValue,
    pub guess_rank: usize,
    pub true_window: RankWindow,
    pub error: u32,
    pub label: String,
}

/// Per-phase accuracy detail shown once the hand reaches `RESULT`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PhaseDetail {
    pub phase: Phase,
    pub rows: Vec<PhaseRow>,
}

/// Full outcome of one showdown.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ShowdownReport {
    pub success: bool,
    pub total_error: u32,
    pub max_error: u32,
    pub claims: Vec<ClaimResult>,
    pub narrative: String,
    pub phase_details: Vec<PhaseDetail>,
}

/// Assign each score an inclusive rank window. Scores are ranked
/// ascending (lower = stronger); tied scores share a window spanning
/// the tie group, and the next group starts past it, so the windows
/// partition `1..=scores.len()`.
pub fn rank_windows(scores: &[HandScore]) -> Vec<RankWindow> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by_key(|&i| scores[i]);

    let mut windows = vec![RankWindow { start: 0, end: 0 }; scores.len()];
    let mut pos = 0;
    while pos < order.len() {
        let mut tie_end = pos;
        while tie_end + 1 < order.len() && scores[order[tie_end + 1]] == scores[order[pos]] {
            tie_end += 1;
        }
        let window = RankWindow {
            start: pos + 1,
            end: tie_end + 1,
        };
        for &idx in &order[pos..=tie_end] {
            windows[idx] = window;
        }
        pos = tie_end + 1;
    }
    windows
}

/// Guessed rank per claimant: tokens ordered descending, so the highest
/// token claims rank 1 (strongest). Token values are unique by the bank
/// invariant.
pub fn guess_ranks(tokens: &[TokenValue]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..tokens.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(tokens[i]));

    let mut ranks = vec![0; tokens.len()];
    for (rank0, &idx) in order.iter().enumerate() {
        ranks[idx] = rank0 + 1;
    }
    ranks
}

/// Judge a set of claimants against a community board.
pub fn score_claims(
    claimants: &[Claimant],
    community: &[Card],
    evaluator: &dyn HandEvaluator,
) -> Vec<ClaimResult> {
    let scores: Vec<HandScore> = claimants
        .iter()
        .map(|c| evaluator.evaluate(community, &c.hole_cards))
        .collect();
    let windows = rank_windows(&scores);
    let tokens: Vec<TokenValue> = claimants.iter().map(|c| c.token).collect();
    let guesses = guess_ranks(&tokens);

    claimants
        .iter()
        .zip(scores)
        .zip(windows)
        .zip(guesses)
        .map(|(((claimant, score), window), guess)| {
            let error = window.distance(guess);
            ClaimResult {
                name: claimant.name.clone(),
                token: claimant.token,
                guess_rank: guess,
                true_window: window,
                error,
                accuracy: Accuracy::from_error(error),
                label: evaluator.classify(score).to_string(),
            }
        })
        .collect()
}

pub fn total_error(claims: &[ClaimResult]) -> u32 {
    claims.iter().map(|c| c.error).sum()
}

pub fn max_error(claims: &[ClaimResult]) -> u32 {
    claims.iter().map(|c| c.error).max().unwrap_or(0)
}

/// Per-phase retrospective rows: one [`PhaseRow`] per token holder,
/// judged against only the community cards revealed as of that phase.
pub fn phase_rows(
    holders: &[Claimant],
    community_prefix: &[Card],
    evaluator: &dyn HandEvaluator,
) -> Vec<PhaseRow> {
    score_claims(holders, community_prefix, evaluator)
        .into_iter()
        .map(|claim| PhaseRow {
            name: claim.name,
            token: claim.token,
            guess_rank: claim.guess_rank,
            true_window: claim.true_window,
            error: claim.error,
            label: claim.label,
        })
        .collect()
}

/// Human-readable recap: perfect guessers grouped into one line, the
/// rest listed with their guess against the true window and hand label.
pub fn narrative_lines(claims: &[ClaimResult]) -> Vec<String> {
    let mut lines = Vec::new();

    let perfect: Vec<&ClaimResult> = claims.iter().filter(|c| c.error == 0).collect();
    if !perfect.is_empty() {
        let names = perfect
            .iter()
            .map(|c| format!("{} ({}★)", c.name, c.token))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("Dead on: {names}"));
    }

    for claim in claims.iter().filter(|c| c.error > 0) {
        let window = if claim.true_window.start == claim.true_window.end {
            format!("#{}", claim.true_window.start)
        } else {
            format!("#{}-{}", claim.true_window.start, claim.true_window.end)
        };
        lines.push(format!(
            "{} ({}★) guessed #{}, actually {} with {}",
            claim.name, claim.token, claim.guess_rank, window, claim.label
        ));
    }

    lines
}
