use std::env::var;

/// Get the value of ENV var, or a default
///
/// Only when:
/// - It is set
/// - It is not empty
pub fn env_var_or_else<F>(var_name: &'static str, or_else: F) -> String
where
    F: FnOnce() -> String,
{
    match var(var_name) {
        Ok(value) if !value.is_empty() => value,
        _ => or_else(),
    }
}

/// Is the ENV var set to a truthy value?
///
/// Unset or empty means `default`
pub fn env_flag(var_name: &'static str, default: bool) -> bool {
    match var(var_name) {
        Ok(value) if !value.is_empty() => {
            matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
        }
        _ => default,
    }
}
