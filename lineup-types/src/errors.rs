use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::SessionPhase;

/// Rule violations raised by the session state machine. All of these are
/// recoverable: the session is left untouched and the actor is told why.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SessionError {
    #[error("session {session_id} not found")]
    SessionNotFound { session_id: String },
    #[error("roster member {member_id} not found")]
    MemberNotFound { member_id: String },
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("action not allowed in the {current:?} phase")]
    WrongPhase { current: SessionPhase },
    #[error("the seated players cannot be chosen")]
    SeatedPlayer,
    #[error("your opponent already assigned that member as your target")]
    TargetAlreadyTaken,
    #[error("targets have not been assigned yet")]
    TargetsNotAssigned,
    #[error("no eligible roster members to draw targets from")]
    NoEligibleTargets,
    #[error("that member is not on your board")]
    MemberNotOnBoard { member_id: String },
    #[error("that member is already crossed off")]
    AlreadyCrossed,
    #[error("only one elimination is allowed per turn")]
    EliminationLimitReached,
    #[error("both seats must reference different roster members")]
    IdenticalSeats,
    #[error("internal error: {message}")]
    Internal { message: String },
}
