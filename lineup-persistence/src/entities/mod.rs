pub mod player_stats;
pub mod prelude;
pub mod roster_members;
