//! Validation utilities for the Taller Window & Door Management Platform

/// Validate item code format (3-20 uppercase alphanumeric, dashes allowed)
pub fn validate_item_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Item code must be at least 3 characters");
    }
    if code.len() > 20 {
        return Err("Item code must be at most 20 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Item code must be uppercase alphanumeric with optional dashes");
    }
    Ok(())
}

/// Validate username (3-32 lowercase alphanumeric, dots and underscores)
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 || username.len() > 32 {
        return Err("Username must be 3-32 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_')
    {
        return Err("Username must be lowercase alphanumeric with dots or underscores");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a non-empty display name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name must not be empty");
    }
    if name.len() > 200 {
        return Err("Name must be at most 200 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_code_valid() {
        assert!(validate_item_code("PRF-40X40").is_ok());
        assert!(validate_item_code("VID6MM").is_ok());
    }

    #[test]
    fn test_validate_item_code_invalid() {
        assert!(validate_item_code("AB").is_err()); // Too short
        assert!(validate_item_code("prf-40").is_err()); // Lowercase
        assert!(validate_item_code("PRF 40").is_err()); // Space
        assert!(validate_item_code(&"X".repeat(21)).is_err()); // Too long
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("maria.lopez").is_ok());
        assert!(validate_username("taller_01").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("Maria").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("contrasena1").is_ok());
        assert!(validate_password("corta").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Obra Calle Mayor 12").is_ok());
        assert!(validate_name("   ").is_err());
    }
}
