use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::session_manager::SessionManager;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use lineup_core::{EliminationOutcome, GuessOutcome};
use lineup_types::{ClientMessage, Seat, ServerMessage, SessionError, SessionId, SessionState};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    session_manager: Arc<SessionManager>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        session_manager: Arc<SessionManager>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            session_manager,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        match message {
            ClientMessage::JoinSession { session_id } => self.handle_join(session_id).await,
            ClientMessage::LeaveSession => self.handle_leave().await,
            ClientMessage::ClaimSeat { seat } => self.handle_claim_seat(seat).await,
            ClientMessage::SelectTarget { member_id } => self.handle_select_target(member_id).await,
            ClientMessage::RandomizeTargets => self.handle_randomize_targets().await,
            ClientMessage::Eliminate { member_id } => self.handle_eliminate(member_id).await,
            ClientMessage::ConfirmGuess { member_id } => self.handle_confirm_guess(member_id).await,
            ClientMessage::EndTurn => self.handle_end_turn().await,
            ClientMessage::ResetSession => self.handle_reset().await,
            ClientMessage::Heartbeat => Ok(()),
        }
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);
        // Sessions survive a dropped socket; the player can rejoin and
        // reclaim the same seat.
        self.connection_manager
            .set_connection_session(self.connection_id, None)
            .await;
    }

    async fn handle_join(&self, session_id: String) -> Result<(), String> {
        info!(
            "Connection {} joining session {}",
            self.connection_id, session_id
        );

        let session_id: SessionId = match Uuid::parse_str(&session_id) {
            Ok(id) => id,
            Err(_) => {
                return self
                    .send_rejection(SessionError::SessionNotFound { session_id })
                    .await;
            }
        };

        let Some(state) = self.session_manager.get_state(session_id).await else {
            return self
                .send_rejection(SessionError::SessionNotFound {
                    session_id: session_id.to_string(),
                })
                .await;
        };

        let roster = self
            .session_manager
            .roster()
            .list()
            .await
            .map_err(|e| e.to_string())?;

        self.connection_manager
            .set_connection_session(self.connection_id, Some(session_id))
            .await;

        // Until a seat is claimed the joiner is a spectator.
        self.send_message(ServerMessage::SessionJoined {
            state: state.spectator_view(),
            roster,
        })
        .await
    }

    async fn handle_leave(&self) -> Result<(), String> {
        self.connection_manager
            .set_connection_session(self.connection_id, None)
            .await;
        self.send_message(ServerMessage::SessionLeft).await
    }

    async fn handle_claim_seat(&self, seat: Seat) -> Result<(), String> {
        let Some(session_id) = self.require_session().await? else {
            return Ok(());
        };

        match self.session_manager.claim_seat(session_id, seat).await {
            Ok(state) => {
                self.connection_manager
                    .set_connection_seat(self.connection_id, seat)
                    .await;
                self.send_message(ServerMessage::SeatClaimed { seat }).await?;
                self.broadcast_state(session_id, &state).await;
                Ok(())
            }
            Err(error) => self.send_rejection(error).await,
        }
    }

    async fn handle_select_target(&self, member_id: Uuid) -> Result<(), String> {
        let Some((session_id, seat)) = self.require_seat().await? else {
            return Ok(());
        };

        match self
            .session_manager
            .select_target(session_id, seat, member_id)
            .await
        {
            Ok(state) => {
                self.broadcast_state(session_id, &state).await;
                Ok(())
            }
            Err(error) => self.send_rejection(error).await,
        }
    }

    async fn handle_randomize_targets(&self) -> Result<(), String> {
        let Some((session_id, _seat)) = self.require_seat().await? else {
            return Ok(());
        };

        match self.session_manager.randomize_targets(session_id).await {
            Ok(state) => {
                self.broadcast_state(session_id, &state).await;
                Ok(())
            }
            Err(error) => self.send_rejection(error).await,
        }
    }

    async fn handle_eliminate(&self, member_id: Uuid) -> Result<(), String> {
        let Some((session_id, seat)) = self.require_seat().await? else {
            return Ok(());
        };

        match self
            .session_manager
            .eliminate(session_id, seat, member_id)
            .await
        {
            Ok((EliminationOutcome::FinalGuessProposed { candidate }, _state)) => {
                // Only the acting player sees the proposal; nothing changed
                // for anyone else.
                self.send_message(ServerMessage::FinalGuessProposed {
                    candidate_id: candidate,
                })
                .await
            }
            Ok((_, state)) => {
                self.broadcast_state(session_id, &state).await;
                Ok(())
            }
            Err(error) => self.send_rejection(error).await,
        }
    }

    async fn handle_confirm_guess(&self, member_id: Uuid) -> Result<(), String> {
        let Some((session_id, seat)) = self.require_seat().await? else {
            return Ok(());
        };

        match self
            .session_manager
            .confirm_guess(session_id, seat, member_id)
            .await
        {
            Ok((outcome, state)) => {
                match outcome {
                    GuessOutcome::Correct { winner, guess, .. }
                    | GuessOutcome::WrongOpponentWins { winner, guess, .. } => {
                        // The session is decided; the guessed-at secret is
                        // public from here on.
                        let target_id = state.secret_for(seat).unwrap_or(guess);
                        self.connection_manager
                            .send_to_session(
                                session_id,
                                ServerMessage::SessionFinished {
                                    winner,
                                    guess_id: guess,
                                    target_id,
                                },
                            )
                            .await;
                    }
                    GuessOutcome::WrongCrossedOff { .. } => {}
                }
                self.broadcast_state(session_id, &state).await;
                Ok(())
            }
            Err(error) => self.send_rejection(error).await,
        }
    }

    async fn handle_end_turn(&self) -> Result<(), String> {
        let Some((session_id, seat)) = self.require_seat().await? else {
            return Ok(());
        };

        match self.session_manager.end_turn(session_id, seat).await {
            Ok(state) => {
                self.broadcast_state(session_id, &state).await;
                Ok(())
            }
            Err(error) => self.send_rejection(error).await,
        }
    }

    async fn handle_reset(&self) -> Result<(), String> {
        let Some((session_id, _seat)) = self.require_seat().await? else {
            return Ok(());
        };

        match self.session_manager.reset_session(session_id).await {
            Ok(state) => {
                self.connection_manager
                    .send_to_session(session_id, ServerMessage::SessionReset)
                    .await;
                self.broadcast_state(session_id, &state).await;
                Ok(())
            }
            Err(error) => self.send_rejection(error).await,
        }
    }

    // A missing session or seat answers with an error message but never
    // tears the socket down.
    async fn require_session(&self) -> Result<Option<SessionId>, String> {
        let connection = self
            .connection_manager
            .get_connection(self.connection_id)
            .await
            .ok_or("Connection not found")?;

        match connection.session_id {
            Some(session_id) => Ok(Some(session_id)),
            None => {
                self.send_error("Join a session first").await?;
                Ok(None)
            }
        }
    }

    async fn require_seat(&self) -> Result<Option<(SessionId, Seat)>, String> {
        let connection = self
            .connection_manager
            .get_connection(self.connection_id)
            .await
            .ok_or("Connection not found")?;

        let Some(session_id) = connection.session_id else {
            self.send_error("Join a session first").await?;
            return Ok(None);
        };
        let Some(seat) = connection.seat else {
            self.send_error("Claim a seat first").await?;
            return Ok(None);
        };
        Ok(Some((session_id, seat)))
    }

    async fn broadcast_state(&self, session_id: SessionId, state: &SessionState) {
        self.connection_manager
            .send_session_state(session_id, state)
            .await;
    }

    async fn send_rejection(&self, error: SessionError) -> Result<(), String> {
        warn!(
            "Rejected action from connection {}: {}",
            self.connection_id, error
        );
        self.send_message(ServerMessage::ActionRejected { error })
            .await
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
    }

    pub(crate) async fn send_error(&self, error_message: &str) -> Result<(), String> {
        self.send_message(ServerMessage::Error {
            message: error_message.to_string(),
        })
        .await
    }
}
