use lineup_types::{MemberId, SessionError};
use rand::Rng;
use rand::seq::SliceRandom;

/// Draws the two secret targets from the eligible pool (the roster minus
/// the seated players) uniformly at random without replacement.
///
/// With a single eligible member both seats share the same target; with an
/// empty pool the draw fails.
pub fn draw_targets<R: Rng + ?Sized>(
    eligible: &[MemberId],
    rng: &mut R,
) -> Result<(MemberId, MemberId), SessionError> {
    match eligible.len() {
        0 => Err(SessionError::NoEligibleTargets),
        1 => Ok((eligible[0], eligible[0])),
        _ => {
            let mut pool = eligible.to_vec();
            let (drawn, _) = pool.partial_shuffle(rng, 2);
            Ok((drawn[0], drawn[1]))
        }
    }
}
