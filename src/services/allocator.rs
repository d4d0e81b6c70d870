//! Team allocation decisions.
//!
//! Pure functions over the current team counts; no I/O and no allocator-side
//! state. Callers re-read counts from the store under the per-match gate, so
//! only the store access needs concurrency control.

use thiserror::Error;

use crate::dao::models::TeamSide;

/// The targeted side (or the whole match) has no seat left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no seat available")]
pub struct TeamFull;

/// Pick the side a joining player lands on.
///
/// Both sides open: the one with strictly fewer players, team A on a tie.
/// One side at capacity: the other. Both at capacity: rejected.
pub fn decide_join(count_a: u64, count_b: u64, team_cap: u64) -> Result<TeamSide, TeamFull> {
    let a_open = count_a < team_cap;
    let b_open = count_b < team_cap;
    match (a_open, b_open) {
        (true, true) => {
            if count_b < count_a {
                Ok(TeamSide::B)
            } else {
                Ok(TeamSide::A)
            }
        }
        (true, false) => Ok(TeamSide::A),
        (false, true) => Ok(TeamSide::B),
        (false, false) => Err(TeamFull),
    }
}

/// Pick the destination of a switching player: always the opposite side,
/// rejected iff that side is at capacity.
pub fn decide_switch(
    current: TeamSide,
    count_other: u64,
    team_cap: u64,
) -> Result<TeamSide, TeamFull> {
    if count_other < team_cap {
        Ok(current.opposite())
    } else {
        Err(TeamFull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_prefers_smaller_team() {
        let cases = [
            // (count_a, count_b, cap) -> side
            (0, 0, 5, TeamSide::A), // tie goes to A
            (2, 2, 5, TeamSide::A),
            (3, 1, 5, TeamSide::B),
            (1, 3, 5, TeamSide::A),
            (0, 4, 5, TeamSide::A),
            (4, 0, 5, TeamSide::B),
        ];
        for (count_a, count_b, cap, expected) in cases {
            assert_eq!(
                decide_join(count_a, count_b, cap),
                Ok(expected),
                "counts ({count_a}, {count_b}) cap {cap}"
            );
        }
    }

    #[test]
    fn join_fills_the_open_side_when_one_is_capped() {
        assert_eq!(decide_join(5, 3, 5), Ok(TeamSide::B));
        assert_eq!(decide_join(3, 5, 5), Ok(TeamSide::A));
        assert_eq!(decide_join(1, 0, 1), Ok(TeamSide::B));
        assert_eq!(decide_join(0, 1, 1), Ok(TeamSide::A));
    }

    #[test]
    fn join_rejects_when_both_sides_are_capped() {
        assert_eq!(decide_join(5, 5, 5), Err(TeamFull));
        assert_eq!(decide_join(1, 1, 1), Err(TeamFull));
    }

    #[test]
    fn switch_always_targets_the_opposite_side() {
        assert_eq!(decide_switch(TeamSide::A, 0, 1), Ok(TeamSide::B));
        assert_eq!(decide_switch(TeamSide::B, 4, 5), Ok(TeamSide::A));
    }

    #[test]
    fn switch_rejects_iff_destination_is_capped() {
        assert_eq!(decide_switch(TeamSide::A, 1, 1), Err(TeamFull));
        assert_eq!(decide_switch(TeamSide::B, 5, 5), Err(TeamFull));
        assert_eq!(decide_switch(TeamSide::B, 4, 5), Ok(TeamSide::A));
    }
}
