//! Reading an environment block out of a CDK-style context file.

use crate::error::ConfigError;
use crate::models::ConfigModel;
use serde_json::Value;
use std::path::Path;

/// Load the config for `env_name` from a JSON file.
///
/// # Arguments
/// * `path` - Path to the context file (e.g. `cdk.json`)
/// * `env_name` - Environment key to select (e.g. `dev`)
pub fn load_environment(path: &Path, env_name: &str) -> Result<ConfigModel, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Reading configuration from {} (env={env_name})", path.display());
    parse_environment(&json, env_name)
}

/// Parse the config for `env_name` from JSON text.
///
/// The block is looked up under `context.<env>` first, then `<env>` at the root.
/// Only the shape is checked here; [`ConfigModel::validate`] runs when planning.
pub fn parse_environment(json: &str, env_name: &str) -> Result<ConfigModel, ConfigError> {
    let root: Value = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
        path: "<root>".to_string(),
        message: e.to_string(),
    })?;

    let block = root
        .get("context")
        .and_then(|ctx| ctx.get(env_name))
        .or_else(|| root.get(env_name))
        .ok_or_else(|| ConfigError::UnknownEnvironment(env_name.to_string()))?;

    // Re-serialize the block so serde_path_to_error can report field paths.
    let text = block.to_string();
    let de = &mut serde_json::Deserializer::from_str(&text);
    serde_path_to_error::deserialize(de).map_err(|e| {
        let path = match e.path().to_string().as_str() {
            "." => env_name.to_string(),
            field => format!("{env_name}.{field}"),
        };
        ConfigError::Parse {
            path,
            message: e.inner().to_string(),
        }
    })
}

/// Environment names present in the file, in file order.
pub fn list_environments(json: &str) -> Result<Vec<String>, ConfigError> {
    let root: Value = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
        path: "<root>".to_string(),
        message: e.to_string(),
    })?;
    let scope = root.get("context").unwrap_or(&root);
    Ok(scope
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter(|(_, v)| v.get("vpc_cidr_block").is_some())
                .map(|(k, _)| k.clone())
                .collect()
        })
        .unwrap_or_default())
}
