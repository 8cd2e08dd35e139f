use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{RosterMember, Seat, SessionError, SessionState};

/// Commands a client may issue over the websocket. Every session mutation
/// goes through one of these; clients never write session fields directly.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    JoinSession { session_id: String },
    LeaveSession,
    ClaimSeat { seat: Seat },
    SelectTarget { member_id: Uuid },
    RandomizeTargets,
    Eliminate { member_id: Uuid },
    ConfirmGuess { member_id: Uuid },
    EndTurn,
    ResetSession,
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    SessionJoined {
        state: SessionState,
        roster: Vec<RosterMember>,
    },
    SessionLeft,
    SeatClaimed {
        seat: Seat,
    },
    /// Broadcast after every committed mutation. Each recipient gets a view
    /// masked for its own seat.
    SessionUpdate {
        state: SessionState,
    },
    /// Crossing would leave a single candidate; the server proposes it as
    /// the final guess and waits for an explicit `ConfirmGuess`.
    FinalGuessProposed {
        candidate_id: Uuid,
    },
    SessionFinished {
        winner: Seat,
        guess_id: Uuid,
        target_id: Uuid,
    },
    SessionReset,
    ActionRejected {
        error: SessionError,
    },
    Error {
        message: String,
    },
}
