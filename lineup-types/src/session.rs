use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub type SessionId = Uuid;
pub type MemberId = Uuid;

/// One of the two fixed roles in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Seat {
    PlayerOne,
    PlayerTwo,
}

impl Seat {
    pub fn opponent(self) -> Seat {
        match self {
            Seat::PlayerOne => Seat::PlayerTwo,
            Seat::PlayerTwo => Seat::PlayerOne,
        }
    }
}

/// How secret targets get assigned once both seats are claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum TargetMode {
    Select,
    Random,
}

/// Coarse-grained lifecycle stage of a session. Only ever advances
/// forward; the explicit reset action is the single sanctioned regression
/// (back to Playing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SessionPhase {
    Setup,
    TargetSelection,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BoardEntry {
    pub crossed: bool,
}

/// A seat's private elimination tracker. Keyed by roster member id; the two
/// seated players never appear as keys.
pub type Board = HashMap<MemberId, BoardEntry>;

/// Full authoritative state of one game session.
///
/// `player_one_target_id` is the target player one assigned for player two
/// to find, and vice versa; the secret a seat is hunting lives in the
/// *other* seat's field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionState {
    pub id: SessionId,
    pub created_at: String, // ISO 8601 string
    pub player_one_id: MemberId,
    pub player_two_id: MemberId,
    pub target_mode: TargetMode,
    pub phase: SessionPhase,
    pub player_one_joined: bool,
    pub player_two_joined: bool,
    pub player_one_target_id: Option<MemberId>,
    pub player_two_target_id: Option<MemberId>,
    pub player_one_board: Board,
    pub player_two_board: Board,
    pub current_turn: Seat,
    pub turns: u32,
    pub eliminations_this_turn: u32,
    pub winner: Option<Seat>,
    pub winner_guess: Option<MemberId>,
}

impl SessionState {
    pub fn seat_id(&self, seat: Seat) -> MemberId {
        match seat {
            Seat::PlayerOne => self.player_one_id,
            Seat::PlayerTwo => self.player_two_id,
        }
    }

    pub fn is_seated(&self, member_id: MemberId) -> bool {
        member_id == self.player_one_id || member_id == self.player_two_id
    }

    pub fn joined(&self, seat: Seat) -> bool {
        match seat {
            Seat::PlayerOne => self.player_one_joined,
            Seat::PlayerTwo => self.player_two_joined,
        }
    }

    pub fn both_joined(&self) -> bool {
        self.player_one_joined && self.player_two_joined
    }

    /// The target `seat` assigned for its opponent to find.
    pub fn target_assigned_by(&self, seat: Seat) -> Option<MemberId> {
        match seat {
            Seat::PlayerOne => self.player_one_target_id,
            Seat::PlayerTwo => self.player_two_target_id,
        }
    }

    /// The secret `seat` is trying to identify (assigned by the opponent).
    pub fn secret_for(&self, seat: Seat) -> Option<MemberId> {
        self.target_assigned_by(seat.opponent())
    }

    pub fn board(&self, seat: Seat) -> &Board {
        match seat {
            Seat::PlayerOne => &self.player_one_board,
            Seat::PlayerTwo => &self.player_two_board,
        }
    }

    pub fn board_mut(&mut self, seat: Seat) -> &mut Board {
        match seat {
            Seat::PlayerOne => &mut self.player_one_board,
            Seat::PlayerTwo => &mut self.player_two_board,
        }
    }

    /// Member ids still uncrossed on a seat's board.
    pub fn remaining(&self, seat: Seat) -> Vec<MemberId> {
        self.board(seat)
            .iter()
            .filter(|(_, entry)| !entry.crossed)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn crossed_count(&self, seat: Seat) -> usize {
        self.board(seat)
            .values()
            .filter(|entry| entry.crossed)
            .count()
    }

    /// View of the session for one seat: its own secret is masked so a
    /// client can never learn the member it is supposed to find.
    pub fn masked_for_seat(&self, seat: Seat) -> SessionState {
        let mut state = self.clone();
        // Once the game is over the secret is part of the summary.
        if state.phase != SessionPhase::Finished {
            match seat {
                Seat::PlayerOne => state.player_two_target_id = None,
                Seat::PlayerTwo => state.player_one_target_id = None,
            }
        }
        state
    }

    /// Spectator view used by the HTTP state endpoint: both secrets hidden
    /// until the session is finished.
    pub fn spectator_view(&self) -> SessionState {
        let mut state = self.clone();
        if state.phase != SessionPhase::Finished {
            state.player_one_target_id = None;
            state.player_two_target_id = None;
        }
        state
    }
}

/// Listing row for the session overview page.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSummary {
    pub id: SessionId,
    pub created_at: String,
    pub player_one_id: MemberId,
    pub player_two_id: MemberId,
    pub target_mode: TargetMode,
    pub phase: SessionPhase,
}

impl From<&SessionState> for SessionSummary {
    fn from(state: &SessionState) -> Self {
        SessionSummary {
            id: state.id,
            created_at: state.created_at.clone(),
            player_one_id: state.player_one_id,
            player_two_id: state.player_two_id,
            target_mode: state.target_mode,
            phase: state.phase,
        }
    }
}
