use std::env;
use std::str::FromStr;

/// Parse a boolean value from a string, supporting multiple formats
///
/// Accepts: "true", "false", "1", "0", "yes", "no" (case insensitive)
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Reads and parses an environment variable.
///
/// Unset or blank values yield `Ok(None)`; values that do not parse are an
/// error naming the variable.
pub fn env_parsed<T>(key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {key} environment variable: {e}")),
        _ => Ok(None),
    }
}

/// Reads a boolean environment variable with [`parse_bool`].
pub fn env_bool(key: &str) -> Result<Option<bool>, String> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_bool(&raw)
            .map(Some)
            .ok_or_else(|| format!("Invalid {key} environment variable: expected a boolean")),
        _ => Ok(None),
    }
}
