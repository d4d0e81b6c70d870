//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a match player count is even and at least 2, so both teams
/// get the same whole-number capacity.
pub fn validate_max_players(max_players: u32) -> Result<(), ValidationError> {
    if max_players < 2 {
        let mut err = ValidationError::new("max_players_too_small");
        err.message = Some(format!("max_players must be at least 2 (got {max_players})").into());
        return Err(err);
    }

    if max_players % 2 != 0 {
        let mut err = ValidationError::new("max_players_odd");
        err.message = Some(
            format!("max_players must be even so both teams hold the same count (got {max_players})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_max_players_valid() {
        assert!(validate_max_players(2).is_ok());
        assert!(validate_max_players(10).is_ok());
        assert!(validate_max_players(22).is_ok());
    }

    #[test]
    fn test_validate_max_players_too_small() {
        assert!(validate_max_players(0).is_err());
        assert!(validate_max_players(1).is_err());
    }

    #[test]
    fn test_validate_max_players_odd() {
        assert!(validate_max_players(3).is_err());
        assert!(validate_max_players(11).is_err());
    }
}
