use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use lineup_core::{EliminationOutcome, GuessOutcome, Session, SessionRules};
use lineup_persistence::{RosterRepository, StatsRepository};
use lineup_types::{
    MemberId, Seat, SessionError, SessionId, SessionPhase, SessionState, SessionSummary,
    TargetMode,
};

struct ActiveSession {
    session: Session,
    last_activity: Instant,
}

impl ActiveSession {
    fn new(session: Session) -> Self {
        Self {
            session,
            last_activity: Instant::now(),
        }
    }

    fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Owns every live session. Sessions are kept in memory; only roster data
/// and league stats touch the database.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, ActiveSession>>,
    rules: SessionRules,
    roster: RosterRepository,
    stats: StatsRepository,
}

impl SessionManager {
    pub fn new(roster: RosterRepository, stats: StatsRepository, rules: SessionRules) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            rules,
            roster,
            stats,
        }
    }

    pub fn roster(&self) -> &RosterRepository {
        &self.roster
    }

    pub fn stats(&self) -> &StatsRepository {
        &self.stats
    }

    /// Starts a session between two roster members. The roster is
    /// snapshotted into the boards at this moment; later roster edits do
    /// not touch running sessions.
    pub async fn create_session(
        &self,
        player_one_id: MemberId,
        player_two_id: MemberId,
        target_mode: TargetMode,
    ) -> Result<SessionState, SessionError> {
        for member_id in [player_one_id, player_two_id] {
            let found = self
                .roster
                .find_by_id(member_id)
                .await
                .map_err(internal)?
                .is_some();
            if !found {
                return Err(SessionError::MemberNotFound {
                    member_id: member_id.to_string(),
                });
            }
        }

        let roster_ids: Vec<MemberId> = self
            .roster
            .list()
            .await
            .map_err(internal)?
            .into_iter()
            .map(|m| m.id)
            .collect();

        // The boards snapshot the roster minus the two seats; a session
        // with nothing to guess at is refused outright.
        if !roster_ids
            .iter()
            .any(|&id| id != player_one_id && id != player_two_id)
        {
            return Err(SessionError::NoEligibleTargets);
        }

        let session = Session::new(
            Uuid::new_v4(),
            player_one_id,
            player_two_id,
            target_mode,
            &roster_ids,
            self.rules,
        )?;
        let state = session.state.clone();

        let mut sessions = self.sessions.write().await;
        sessions.insert(state.id, ActiveSession::new(session));
        info!(session = %state.id, "session created");
        Ok(state)
    }

    /// Session summaries, newest first.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .map(|active| SessionSummary::from(&active.session.state))
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    pub async fn get_state(&self, session_id: SessionId) -> Option<SessionState> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&session_id)
            .map(|active| active.session.state.clone())
    }

    pub async fn claim_seat(
        &self,
        session_id: SessionId,
        seat: Seat,
    ) -> Result<SessionState, SessionError> {
        let mut sessions = self.sessions.write().await;
        let active = Self::lookup(&mut sessions, session_id)?;
        {
            let mut rng = rand::rng();
            active.session.claim_seat(seat, &mut rng)?;
        }
        Ok(active.session.state.clone())
    }

    pub async fn select_target(
        &self,
        session_id: SessionId,
        seat: Seat,
        member_id: MemberId,
    ) -> Result<SessionState, SessionError> {
        let mut sessions = self.sessions.write().await;
        let active = Self::lookup(&mut sessions, session_id)?;
        active.session.select_target(seat, member_id)?;
        Ok(active.session.state.clone())
    }

    pub async fn randomize_targets(
        &self,
        session_id: SessionId,
    ) -> Result<SessionState, SessionError> {
        let mut sessions = self.sessions.write().await;
        let active = Self::lookup(&mut sessions, session_id)?;
        {
            let mut rng = rand::rng();
            active.session.randomize_targets(&mut rng)?;
        }
        Ok(active.session.state.clone())
    }

    pub async fn eliminate(
        &self,
        session_id: SessionId,
        seat: Seat,
        member_id: MemberId,
    ) -> Result<(EliminationOutcome, SessionState), SessionError> {
        let mut sessions = self.sessions.write().await;
        let active = Self::lookup(&mut sessions, session_id)?;
        let outcome = active.session.eliminate(seat, member_id)?;
        Ok((outcome, active.session.state.clone()))
    }

    /// Resolves a final guess. A decided session has its result written to
    /// the league before this returns; a stats write failure is logged but
    /// never rolls the game back.
    pub async fn confirm_guess(
        &self,
        session_id: SessionId,
        seat: Seat,
        member_id: MemberId,
    ) -> Result<(GuessOutcome, SessionState), SessionError> {
        let (outcome, state) = {
            let mut sessions = self.sessions.write().await;
            let active = Self::lookup(&mut sessions, session_id)?;
            let outcome = active.session.confirm_guess(seat, member_id)?;
            (outcome, active.session.state.clone())
        };

        let decided = match &outcome {
            GuessOutcome::Correct {
                winner,
                winner_turns,
                ..
            }
            | GuessOutcome::WrongOpponentWins {
                winner,
                winner_turns,
                ..
            } => Some((*winner, *winner_turns)),
            GuessOutcome::WrongCrossedOff { .. } => None,
        };

        if let Some((winner, winner_turns)) = decided {
            let winner_id = state.seat_id(winner);
            let loser_id = state.seat_id(winner.opponent());
            if let Err(e) = self
                .stats
                .record_result(winner_id, loser_id, winner_turns)
                .await
            {
                error!(session = %session_id, "failed to record session result: {e}");
            }
        }

        Ok((outcome, state))
    }

    pub async fn end_turn(
        &self,
        session_id: SessionId,
        seat: Seat,
    ) -> Result<SessionState, SessionError> {
        let mut sessions = self.sessions.write().await;
        let active = Self::lookup(&mut sessions, session_id)?;
        active.session.end_turn(seat)?;
        Ok(active.session.state.clone())
    }

    pub async fn reset_session(
        &self,
        session_id: SessionId,
    ) -> Result<SessionState, SessionError> {
        let mut sessions = self.sessions.write().await;
        let active = Self::lookup(&mut sessions, session_id)?;
        active.session.reset()?;
        Ok(active.session.state.clone())
    }

    pub async fn cleanup_idle_sessions(&self, timeout: Duration) {
        let expired: Vec<SessionId> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .filter(|(_, active)| {
                    active.is_expired(timeout)
                        || (active.session.state.phase == SessionPhase::Finished
                            && active.is_expired(timeout / 4))
                })
                .map(|(&id, _)| id)
                .collect()
        };

        if expired.is_empty() {
            return;
        }

        let mut sessions = self.sessions.write().await;
        for session_id in expired {
            sessions.remove(&session_id);
            info!(session = %session_id, "idle session removed");
        }
    }

    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    fn lookup(
        sessions: &mut HashMap<SessionId, ActiveSession>,
        session_id: SessionId,
    ) -> Result<&mut ActiveSession, SessionError> {
        let active = sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        active.update_activity();
        Ok(active)
    }
}

fn internal(e: anyhow::Error) -> SessionError {
    error!("roster lookup failed: {e}");
    SessionError::Internal {
        message: "roster unavailable".to_string(),
    }
}
