use super::ApiError;

pub fn validate_user_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid user ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_option_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Option name cannot be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id(1).is_ok());
        assert!(validate_user_id(12345).is_ok());
        assert!(validate_user_id(0).is_err());
        assert!(validate_user_id(-1).is_err());
    }

    #[test]
    fn test_validate_option_name() {
        assert_eq!(validate_option_name(" system_name ").unwrap(), "system_name");
        assert!(validate_option_name("").is_err());
        assert!(validate_option_name("   ").is_err());
    }
}
