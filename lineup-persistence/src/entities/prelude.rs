pub use super::player_stats::Entity as PlayerStats;
pub use super::roster_members::Entity as RosterMembers;
