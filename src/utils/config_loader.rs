use dotenvy::dotenv;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::env;
use std::path::Path;
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Error loading config: {0}")]
    ConfigError(String),
}

/// Read a TOML file, expand `${VAR}` references from the environment (and `.env`) and deserialize it.
pub async fn load_from_file<T: DeserializeOwned>(file_name: impl AsRef<Path>) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = tokio::fs::read_to_string(file_name).await?;
    parse_config(&contents)
}

pub fn parse_config<T: DeserializeOwned>(contents: &str) -> Result<T, LoadConfigError> {
    let contents = expand_vars(contents)?;
    let config: T = toml::from_str(&contents)?;
    Ok(config)
}

fn expand_vars(raw_config: &str) -> Result<String, LoadConfigError> {
    // Unset variables are left as-is so toml reports them in context.
    let re = Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)\}").map_err(|e| LoadConfigError::ConfigError(e.to_string()))?;
    Ok(re
        .replace_all(raw_config, |caps: &Captures| match env::var(&caps[1]) {
            Ok(val) => val,
            Err(_) => caps[0].to_string(),
        })
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Section {
        name: String,
        threshold: f64,
    }

    #[test]
    fn test_expand_vars_substitutes_environment() {
        // SAFETY: test-local variable name, not read by any other test.
        unsafe { env::set_var("MEV_BATCH_TEST_SECTION_NAME", "weth") };
        let section: Section = parse_config("name = \"${MEV_BATCH_TEST_SECTION_NAME}\"\nthreshold = 0.5\n").unwrap();
        assert_eq!(section.name, "weth");
        assert_eq!(section.threshold, 0.5);
    }

    #[test]
    fn test_unknown_variable_is_left_untouched() {
        let expanded = expand_vars("value = \"${MEV_BATCH_DEFINITELY_UNSET_VAR}\"").unwrap();
        assert_eq!(expanded, "value = \"${MEV_BATCH_DEFINITELY_UNSET_VAR}\"");
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result: Result<Section, _> = parse_config("name = ");
        assert!(matches!(result, Err(LoadConfigError::TomlError(_))));
    }

    #[tokio::test]
    async fn test_load_from_missing_file_is_io_error() {
        let result: Result<Section, _> = load_from_file("/nonexistent/mev-batch/config.toml").await;
        assert!(matches!(result, Err(LoadConfigError::IoError(_))));
    }
}
