//! Match lifecycle rules: scheduled → ongoing → finished.
//!
//! The ongoing state has two sources: the status scheduler persists it in
//! bulk, and read paths derive it from the stored status plus the clock so a
//! match never *looks* scheduled after kick-off, even between scheduler
//! ticks. A stored finished status always wins over time-based derivation.

use std::time::SystemTime;

use thiserror::Error;

use crate::dao::models::MatchStatus;

/// Error returned when an explicit transition would regress the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: a {from:?} match cannot move to {to:?}")]
pub struct InvalidTransition {
    /// Stored status at the time of the request.
    pub from: MatchStatus,
    /// Requested status.
    pub to: MatchStatus,
}

/// Status to present to callers for a match fetched at `now`.
///
/// A stored `Scheduled` whose kick-off has passed reads as `Ongoing`;
/// `Finished` is returned unchanged regardless of time.
pub fn derived_status(stored: MatchStatus, starts_at: SystemTime, now: SystemTime) -> MatchStatus {
    match stored {
        MatchStatus::Scheduled if starts_at <= now => MatchStatus::Ongoing,
        other => other,
    }
}

/// Validate an explicit status transition, returning the target on success.
///
/// Finished is terminal and ongoing never reverts; the time-driven
/// scheduled→ongoing advancement does not go through here (the status
/// scheduler's bulk predicate enforces it).
pub fn validate_transition(
    from: MatchStatus,
    to: MatchStatus,
) -> Result<MatchStatus, InvalidTransition> {
    match (from, to) {
        (MatchStatus::Scheduled, MatchStatus::Ongoing)
        | (MatchStatus::Scheduled, MatchStatus::Finished)
        | (MatchStatus::Ongoing, MatchStatus::Finished) => Ok(to),
        (from, to) => Err(InvalidTransition { from, to }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn past_due_scheduled_reads_as_ongoing() {
        let now = SystemTime::now();
        let kicked_off = now - Duration::from_secs(600);
        assert_eq!(
            derived_status(MatchStatus::Scheduled, kicked_off, now),
            MatchStatus::Ongoing
        );
    }

    #[test]
    fn kickoff_instant_counts_as_started() {
        let now = SystemTime::now();
        assert_eq!(
            derived_status(MatchStatus::Scheduled, now, now),
            MatchStatus::Ongoing
        );
    }

    #[test]
    fn future_scheduled_stays_scheduled() {
        let now = SystemTime::now();
        let upcoming = now + Duration::from_secs(600);
        assert_eq!(
            derived_status(MatchStatus::Scheduled, upcoming, now),
            MatchStatus::Scheduled
        );
    }

    #[test]
    fn stored_finished_always_wins() {
        let now = SystemTime::now();
        let kicked_off = now - Duration::from_secs(600);
        assert_eq!(
            derived_status(MatchStatus::Finished, kicked_off, now),
            MatchStatus::Finished
        );
        let upcoming = now + Duration::from_secs(600);
        assert_eq!(
            derived_status(MatchStatus::Finished, upcoming, now),
            MatchStatus::Finished
        );
    }

    #[test]
    fn stored_ongoing_is_returned_unchanged() {
        let now = SystemTime::now();
        assert_eq!(
            derived_status(MatchStatus::Ongoing, now + Duration::from_secs(60), now),
            MatchStatus::Ongoing
        );
    }

    #[test]
    fn closing_is_allowed_from_both_live_states() {
        assert!(validate_transition(MatchStatus::Scheduled, MatchStatus::Finished).is_ok());
        assert!(validate_transition(MatchStatus::Ongoing, MatchStatus::Finished).is_ok());
    }

    #[test]
    fn finished_is_terminal() {
        let err = validate_transition(MatchStatus::Finished, MatchStatus::Finished).unwrap_err();
        assert_eq!(err.from, MatchStatus::Finished);
        assert!(validate_transition(MatchStatus::Finished, MatchStatus::Ongoing).is_err());
        assert!(validate_transition(MatchStatus::Finished, MatchStatus::Scheduled).is_err());
    }

    #[test]
    fn status_never_regresses() {
        assert!(validate_transition(MatchStatus::Ongoing, MatchStatus::Scheduled).is_err());
    }
}
