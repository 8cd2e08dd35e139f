pub mod roster_repository;
pub mod stats_repository;

pub use roster_repository::RosterRepository;
pub use stats_repository::{LeagueEntry, StatsRepository};
