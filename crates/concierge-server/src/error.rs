use thiserror::Error;

pub const ENV_PREFIX: &str = "CONCIERGE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration, set the environment variable {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a dotted configuration key,
/// e.g. `weather.api_key` -> `CONCIERGE_WEATHER__API_KEY`
pub fn to_env_var(field_path: &str) -> String {
    let nested = field_path
        .split('.')
        .filter(|part| !part.is_empty())
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("__");
    format!("{}_{}", ENV_PREFIX, nested)
}

/// Dotted key named by a deserialization error such as
/// "missing field `api_key` for key `weather`"
pub fn missing_field_path(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let (field, rest) = rest.split_once('`')?;

    let parent = rest
        .strip_prefix(" for key `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(key, _)| key)
        .filter(|key| !key.is_empty());

    Some(match parent {
        Some(parent) => format!("{}.{}", parent, field),
        None => field.to_string(),
    })
}
