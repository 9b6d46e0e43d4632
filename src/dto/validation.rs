//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest display name a room may carry.
const ROOM_NAME_MAX_CHARS: usize = 64;

/// Validates that a room display name is non-blank and at most 64 characters.
pub fn validate_room_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("room_name_blank");
        err.message = Some("room name must not be blank".into());
        return Err(err);
    }

    let length = name.chars().count();
    if length > ROOM_NAME_MAX_CHARS {
        let mut err = ValidationError::new("room_name_length");
        err.message = Some(
            format!("room name must be at most {ROOM_NAME_MAX_CHARS} characters (got {length})")
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
    fn test_validate_room_name_valid() {
        assert!(validate_room_name("Party").is_ok());
        assert!(validate_room_name("  late night drive  ").is_ok());
        assert!(validate_room_name(&"x".repeat(64)).is_ok());
    }

    #[test]
    fn test_validate_room_name_blank() {
        assert!(validate_room_name("").is_err());
        assert!(validate_room_name("   ").is_err());
        assert!(validate_room_name("\t\n").is_err());
    }

    #[test]
    fn test_validate_room_name_too_long() {
        assert!(validate_room_name(&"x".repeat(65)).is_err());
    }
}
