use rustrict::CensorStr;

/// Validate and sanitize a player display name at the HTTP boundary.
/// Returns the trimmed name on success, or an error message.
pub fn validate_player_name(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.chars().count() > 20 {
        return Err("Name must be 20 characters or fewer".to_string());
    }
    if trimmed.is_inappropriate() {
        return Err("Name contains inappropriate language".to_string());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(validate_player_name("  Alice  ").unwrap(), "Alice");
    }

    #[test]
    fn rejects_empty_names() {
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("   ").is_err());
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(21);
        assert!(validate_player_name(&long).is_err());
        let max = "a".repeat(20);
        assert!(validate_player_name(&max).is_ok());
    }
}
