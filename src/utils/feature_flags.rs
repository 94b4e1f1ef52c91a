use crate::constants::env;

pub fn is_truthy(value: impl AsRef<str>) -> bool {
    matches!(
        value.as_ref().trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub fn env_flag(key: &str) -> bool {
    std::env::var(key).ok().map(is_truthy).unwrap_or(false)
}

/// Read on every call so the toggle can flip without a restart.
pub fn is_debug_enabled() -> bool {
    env_flag(env::DEBUG)
}

#[cfg(test)]
mod tests {
    use super::is_truthy;

    #[test]
    fn truthy_values_are_case_and_space_insensitive() {
        assert!(is_truthy(" TRUE "));
        assert!(is_truthy("on"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("enabled"));
    }
}
