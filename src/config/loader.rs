//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{EngineConfig, RoutesFile};
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::tree::{ConfigurationError, RouteTree};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Routes(#[from] ConfigurationError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate an engine configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load a declarative route table from a TOML file and compile it.
///
/// Compiling doubles as validation: structural problems surface as
/// `ConfigurationError`s.
pub fn load_routes(path: &Path) -> Result<RouteTree, ConfigError> {
    let content = fs::read_to_string(path)?;
    let file: RoutesFile = toml::from_str(&content)?;
    let specs = file.routes.iter().map(|entry| entry.to_spec()).collect();
    Ok(RouteTree::build(specs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use std::sync::atomic::{AtomicU32, Ordering};

    struct TempPath(std::path::PathBuf);

    impl Drop for TempPath {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn temp_file(content: &str) -> TempPath {
        static SEQ: AtomicU32 = AtomicU32::new(0);
        let path = std::env::temp_dir().join(format!(
            "waypoint-test-{}-{}.toml",
            std::process::id(),
            SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        TempPath(path)
    }

    #[test]
    fn test_load_config_rejects_zero_timeout() {
        let file = temp_file("[timeouts]\nloader_secs = 0\n");
        let err = load_config(&file.0).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_routes_compiles_tree() {
        let file = temp_file(
            r#"
            [[routes]]
            path = "contacts"

              [[routes.children]]
              path = ":id"
            "#,
        );
        let tree = load_routes(&file.0).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_load_routes_surfaces_configuration_error() {
        let file = temp_file(
            r#"
            [[routes]]
            path = "contacts"

              [[routes.children]]
              index = true

              [[routes.children]]
              index = true
            "#,
        );
        let err = load_routes(&file.0).unwrap_err();
        assert!(matches!(err, ConfigError::Routes(_)));
    }
}
