use std::cmp::Ordering;

use lineup_types::PlayerStats;

/// Applies a finished session to the winner's running stats.
pub fn record_win(stats: &mut PlayerStats, winner_turns: u32) {
    stats.games_played += 1;
    stats.wins += 1;
    let turns = winner_turns as i32;
    stats.best_turns = Some(match stats.best_turns {
        Some(best) => best.min(turns),
        None => turns,
    });
}

/// Applies a finished session to the loser's running stats.
pub fn record_loss(stats: &mut PlayerStats) {
    stats.games_played += 1;
    stats.losses += 1;
}

/// League table order: points first, wins break ties, fewer games played
/// ranks higher among equals.
pub fn league_order(a: &PlayerStats, b: &PlayerStats) -> Ordering {
    b.points()
        .cmp(&a.points())
        .then_with(|| b.wins.cmp(&a.wins))
        .then_with(|| a.games_played.cmp(&b.games_played))
}
