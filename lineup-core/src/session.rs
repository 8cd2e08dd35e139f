use lineup_types::{
    BoardEntry, MemberId, Seat, SessionError, SessionId, SessionPhase, SessionState, TargetMode,
};
use rand::Rng;
use tracing::debug;

use crate::targets::draw_targets;

/// What happens when a wrong final guess is confirmed. The original game
/// shipped both behaviors across revisions; which one applies is a server
/// configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrongGuessPolicy {
    /// A wrong guess immediately hands the win to the opponent.
    SuddenDeath,
    /// The wrongly guessed member is crossed off and the turn passes.
    #[default]
    CrossAndPass,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionRules {
    pub wrong_guess_policy: WrongGuessPolicy,
    /// When set, a seat may cross at most one member per turn before it has
    /// to end the turn or guess.
    pub single_elimination_per_turn: bool,
}

/// Result of an elimination attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EliminationOutcome {
    Crossed(MemberId),
    Uncrossed(MemberId),
    /// Crossing was withheld because it would leave a single candidate;
    /// `candidate` is the implied final guess awaiting confirmation.
    FinalGuessProposed { candidate: MemberId },
}

/// Result of a confirmed final guess.
#[derive(Debug, Clone, PartialEq)]
pub enum GuessOutcome {
    Correct {
        winner: Seat,
        guess: MemberId,
        winner_turns: u32,
    },
    /// Sudden-death policy: the guess was wrong and the opponent wins.
    WrongOpponentWins {
        winner: Seat,
        guess: MemberId,
        winner_turns: u32,
    },
    /// Cross-and-pass policy: the guess was wrong, the guessed member is
    /// crossed off, and the turn has passed.
    WrongCrossedOff { guess: MemberId },
}

/// One game session and its rule set. All mutation goes through the
/// methods below; every rule violation leaves the state untouched.
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    pub rules: SessionRules,
}

impl Session {
    /// Creates a session over a snapshot of the roster. Boards hold every
    /// roster member except the two seated players.
    pub fn new(
        id: SessionId,
        player_one_id: MemberId,
        player_two_id: MemberId,
        target_mode: TargetMode,
        roster_ids: &[MemberId],
        rules: SessionRules,
    ) -> Result<Self, SessionError> {
        if player_one_id == player_two_id {
            return Err(SessionError::IdenticalSeats);
        }

        let board: lineup_types::Board = roster_ids
            .iter()
            .filter(|&&member_id| member_id != player_one_id && member_id != player_two_id)
            .map(|&member_id| (member_id, BoardEntry::default()))
            .collect();

        let state = SessionState {
            id,
            created_at: chrono::Utc::now().to_rfc3339(),
            player_one_id,
            player_two_id,
            target_mode,
            phase: SessionPhase::Setup,
            player_one_joined: false,
            player_two_joined: false,
            player_one_target_id: None,
            player_two_target_id: None,
            player_one_board: board.clone(),
            player_two_board: board,
            current_turn: Seat::PlayerOne,
            turns: 0,
            eliminations_this_turn: 0,
            winner: None,
            winner_guess: None,
        };

        Ok(Self { state, rules })
    }

    /// Member ids eligible as targets or eliminations: the board key set,
    /// fixed at session creation.
    fn eligible_members(&self) -> Vec<MemberId> {
        self.state.player_one_board.keys().copied().collect()
    }

    /// Marks a seat as claimed. Idempotent: re-claiming changes nothing,
    /// and the both-joined transition fires only while the session is still
    /// in the setup phase, so late join events can never re-trigger it.
    ///
    /// The transition is resolved before the joined flag is committed, so
    /// a failed target draw leaves the claim unrecorded.
    pub fn claim_seat<R: Rng + ?Sized>(
        &mut self,
        seat: Seat,
        rng: &mut R,
    ) -> Result<(), SessionError> {
        if self.state.phase == SessionPhase::Setup && self.state.joined(seat.opponent()) {
            match self.state.target_mode {
                TargetMode::Random => {
                    let (one, two) = draw_targets(&self.eligible_members(), rng)?;
                    self.state.player_one_target_id = Some(one);
                    self.state.player_two_target_id = Some(two);
                    self.set_phase(SessionPhase::Playing);
                }
                TargetMode::Select => {
                    self.set_phase(SessionPhase::TargetSelection);
                }
            }
        }

        match seat {
            Seat::PlayerOne => self.state.player_one_joined = true,
            Seat::PlayerTwo => self.state.player_two_joined = true,
        }

        Ok(())
    }

    /// Assigns the target the acting seat picked for its opponent. The pick
    /// must be a board member and must differ from whatever the opponent
    /// already assigned, so the same secret is never in play twice.
    pub fn select_target(&mut self, seat: Seat, member_id: MemberId) -> Result<(), SessionError> {
        if self.state.phase != SessionPhase::TargetSelection {
            return Err(SessionError::WrongPhase {
                current: self.state.phase,
            });
        }
        if self.state.is_seated(member_id) {
            return Err(SessionError::SeatedPlayer);
        }
        if !self.state.player_one_board.contains_key(&member_id) {
            return Err(SessionError::MemberNotFound {
                member_id: member_id.to_string(),
            });
        }
        if self.state.target_assigned_by(seat.opponent()) == Some(member_id) {
            return Err(SessionError::TargetAlreadyTaken);
        }

        match seat {
            Seat::PlayerOne => self.state.player_one_target_id = Some(member_id),
            Seat::PlayerTwo => self.state.player_two_target_id = Some(member_id),
        }

        if self.state.player_one_target_id.is_some() && self.state.player_two_target_id.is_some() {
            self.set_phase(SessionPhase::Playing);
        }

        Ok(())
    }

    /// Manual override: draws both targets at random and starts play,
    /// available while the session has not started playing yet.
    pub fn randomize_targets<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), SessionError> {
        match self.state.phase {
            SessionPhase::Setup | SessionPhase::TargetSelection => {}
            current => return Err(SessionError::WrongPhase { current }),
        }

        let (one, two) = draw_targets(&self.eligible_members(), rng)?;
        self.state.player_one_target_id = Some(one);
        self.state.player_two_target_id = Some(two);
        self.set_phase(SessionPhase::Playing);
        Ok(())
    }

    /// Toggles a member on the acting seat's own board. Crossing the
    /// second-to-last candidate is withheld and answered with a final guess
    /// proposal instead.
    pub fn eliminate(
        &mut self,
        seat: Seat,
        member_id: MemberId,
    ) -> Result<EliminationOutcome, SessionError> {
        self.require_playing_turn(seat)?;

        if self.state.is_seated(member_id) {
            return Err(SessionError::SeatedPlayer);
        }

        let crossed = self
            .state
            .board(seat)
            .get(&member_id)
            .ok_or_else(|| SessionError::MemberNotOnBoard {
                member_id: member_id.to_string(),
            })?
            .crossed;

        if crossed {
            // Uncrossing is always allowed and does not count as an
            // elimination for the per-turn limit.
            self.state.board_mut(seat).insert(member_id, BoardEntry { crossed: false });
            return Ok(EliminationOutcome::Uncrossed(member_id));
        }

        let remaining = self.state.remaining(seat);
        if remaining.len() <= 2 {
            let candidate = remaining
                .iter()
                .copied()
                .find(|&id| id != member_id)
                .unwrap_or(member_id);
            return Ok(EliminationOutcome::FinalGuessProposed { candidate });
        }

        if self.rules.single_elimination_per_turn && self.state.eliminations_this_turn >= 1 {
            return Err(SessionError::EliminationLimitReached);
        }

        self.state.board_mut(seat).insert(member_id, BoardEntry { crossed: true });
        self.state.eliminations_this_turn += 1;
        Ok(EliminationOutcome::Crossed(member_id))
    }

    /// Resolves a confirmed final guess against the secret the opponent
    /// assigned for the acting seat.
    pub fn confirm_guess(
        &mut self,
        seat: Seat,
        member_id: MemberId,
    ) -> Result<GuessOutcome, SessionError> {
        self.require_playing_turn(seat)?;

        if self.state.is_seated(member_id) {
            return Err(SessionError::SeatedPlayer);
        }
        let entry = self.state.board(seat).get(&member_id).ok_or_else(|| {
            SessionError::MemberNotOnBoard {
                member_id: member_id.to_string(),
            }
        })?;
        if entry.crossed {
            return Err(SessionError::AlreadyCrossed);
        }

        let secret = self
            .state
            .secret_for(seat)
            .ok_or(SessionError::TargetsNotAssigned)?;

        if member_id == secret {
            let winner_turns = self.turns_taken(seat);
            self.state.winner = Some(seat);
            self.state.winner_guess = Some(member_id);
            self.set_phase(SessionPhase::Finished);
            debug!(session = %self.state.id, winner = ?seat, "session won by correct guess");
            return Ok(GuessOutcome::Correct {
                winner: seat,
                guess: member_id,
                winner_turns,
            });
        }

        match self.rules.wrong_guess_policy {
            WrongGuessPolicy::SuddenDeath => {
                let winner = seat.opponent();
                let winner_turns = self.turns_taken(winner);
                self.state.winner = Some(winner);
                self.state.winner_guess = Some(member_id);
                self.set_phase(SessionPhase::Finished);
                debug!(session = %self.state.id, winner = ?winner, "session lost by wrong guess");
                Ok(GuessOutcome::WrongOpponentWins {
                    winner,
                    guess: member_id,
                    winner_turns,
                })
            }
            WrongGuessPolicy::CrossAndPass => {
                self.state.board_mut(seat).insert(member_id, BoardEntry { crossed: true });
                self.pass_turn();
                Ok(GuessOutcome::WrongCrossedOff { guess: member_id })
            }
        }
    }

    /// Hands control to the other seat.
    pub fn end_turn(&mut self, seat: Seat) -> Result<(), SessionError> {
        self.require_playing_turn(seat)?;
        self.pass_turn();
        Ok(())
    }

    /// Clears both boards, rewinds to the playing phase with player one to
    /// act, and drops the previous result. Targets are kept as assigned.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        match self.state.phase {
            SessionPhase::Playing | SessionPhase::Finished => {}
            current => return Err(SessionError::WrongPhase { current }),
        }

        for entry in self.state.player_one_board.values_mut() {
            entry.crossed = false;
        }
        for entry in self.state.player_two_board.values_mut() {
            entry.crossed = false;
        }
        self.state.current_turn = Seat::PlayerOne;
        self.state.turns = 0;
        self.state.eliminations_this_turn = 0;
        self.state.winner = None;
        self.state.winner_guess = None;
        self.state.phase = SessionPhase::Playing;
        debug!(session = %self.state.id, "session reset");
        Ok(())
    }

    /// Number of turns the given seat has acted in, counting the one in
    /// progress. Player one opens, so the counter splits evenly with the
    /// opener rounding up.
    ///
    /// The in-progress turn is credited to both seats, so a seat handed
    /// the win by the opponent's wrong guess is recorded at no fewer than
    /// one turn even when it never acted.
    pub fn turns_taken(&self, seat: Seat) -> u32 {
        match seat {
            Seat::PlayerOne => self.state.turns / 2 + 1,
            Seat::PlayerTwo => self.state.turns.div_ceil(2).max(1),
        }
    }

    fn require_playing_turn(&self, seat: Seat) -> Result<(), SessionError> {
        if self.state.phase != SessionPhase::Playing {
            return Err(SessionError::WrongPhase {
                current: self.state.phase,
            });
        }
        if self.state.current_turn != seat {
            return Err(SessionError::NotYourTurn);
        }
        Ok(())
    }

    fn pass_turn(&mut self) {
        self.state.current_turn = self.state.current_turn.opponent();
        self.state.turns += 1;
        self.state.eliminations_this_turn = 0;
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        debug!(session = %self.state.id, from = ?self.state.phase, to = ?phase, "phase transition");
        self.state.phase = phase;
    }
}
