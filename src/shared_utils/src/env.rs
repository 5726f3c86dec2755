use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading environment variables.
#[derive(Debug, Error)]
pub enum EnvVarError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    Missing(String),

    /// The variable is set but its value does not parse into the expected type.
    #[error("Invalid value for environment variable {name}: {value:?}")]
    Invalid { name: String, value: String },
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, EnvVarError> {
    std::env::var(name).map_err(|_| EnvVarError::Missing(name.to_string()))
}

/// Reads an optional override from the environment.
///
/// Unset and blank variables both yield `Ok(None)`; a value that fails to
/// parse into `T` is an error rather than being silently ignored.
pub fn env_override<T: FromStr>(name: &str) -> Result<Option<T>, EnvVarError> {
    let Ok(value) = get_env_var(name) else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| EnvVarError::Invalid {
            name: name.to_string(),
            value,
        })
}
