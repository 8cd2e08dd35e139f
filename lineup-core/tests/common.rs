use lineup_core::{Session, SessionRules};
use lineup_types::{MemberId, Seat, TargetMode};
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

/// Creates a roster of `n` fresh member ids.
pub fn make_roster(n: usize) -> Vec<MemberId> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

/// Creates a session with the first two roster members seated.
pub fn create_session(roster: &[MemberId], mode: TargetMode) -> Session {
    Session::new(
        Uuid::new_v4(),
        roster[0],
        roster[1],
        mode,
        roster,
        SessionRules::default(),
    )
    .unwrap()
}

/// Seeded rng so randomized flows are reproducible.
pub fn test_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

/// Joins both seats on a select-mode session and picks fixed targets:
/// roster[2] becomes player two's secret, roster[3] player one's.
pub fn create_playing_session(roster: &[MemberId]) -> Session {
    let mut session = create_session(roster, TargetMode::Select);
    let mut rng = test_rng();
    session.claim_seat(Seat::PlayerOne, &mut rng).unwrap();
    session.claim_seat(Seat::PlayerTwo, &mut rng).unwrap();
    session.select_target(Seat::PlayerOne, roster[2]).unwrap();
    session.select_target(Seat::PlayerTwo, roster[3]).unwrap();
    session
}
