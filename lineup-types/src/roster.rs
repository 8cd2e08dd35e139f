use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// A person on the shared squad list. Eligible to be a seated player, a
/// secret target, or an elimination candidate on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RosterMember {
    pub id: Uuid,
    pub name: String,
    pub nickname: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String, // ISO 8601 string
}

impl RosterMember {
    /// Preferred display label, nickname first.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.name)
    }
}

/// Per-member league record. `points` is derived (wins x4 + losses x1) and
/// recomputed wherever the record is assembled, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerStats {
    pub member_id: Uuid,
    pub games_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub best_turns: Option<i32>,
}

impl PlayerStats {
    pub fn zeroed(member_id: Uuid) -> Self {
        Self {
            member_id,
            games_played: 0,
            wins: 0,
            losses: 0,
            best_turns: None,
        }
    }

    pub fn points(&self) -> i32 {
        self.wins * 4 + self.losses
    }
}
