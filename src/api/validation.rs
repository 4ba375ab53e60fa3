use super::ApiError;

pub fn validate_generation_input<'a>(
    target_audience: &'a str,
    help_description: &'a str,
) -> Result<(&'a str, &'a str), ApiError> {
    let target_audience = target_audience.trim();
    let help_description = help_description.trim();

    if target_audience.is_empty() {
        return Err(ApiError::validation("Target audience is required"));
    }

    if help_description.is_empty() {
        return Err(ApiError::validation("Help description is required"));
    }

    Ok((target_audience, help_description))
}

pub fn validate_account_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid account ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_avatar_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid avatar ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_generation_input() {
        assert!(validate_generation_input("Thai moms", "learning English").is_ok());
        assert!(validate_generation_input("  padded  ", "ok").is_ok());
        assert!(validate_generation_input("", "ok").is_err());
        assert!(validate_generation_input("ok", "   ").is_err());
    }

    #[test]
    fn test_validate_generation_input_trims() {
        let (audience, help) = validate_generation_input("  Thai moms ", " English ").unwrap();
        assert_eq!(audience, "Thai moms");
        assert_eq!(help, "English");
    }

    #[test]
    fn test_validate_account_id() {
        assert!(validate_account_id(1).is_ok());
        assert!(validate_account_id(0).is_err());
        assert!(validate_account_id(-5).is_err());
    }

    #[test]
    fn test_validate_avatar_id() {
        assert!(validate_avatar_id(42).is_ok());
        assert!(validate_avatar_id(0).is_err());
    }
}
