//! Initialization overrides the global config, from a manual config or a yaml file or
//! environment variables, and initializes the global logger.

use crate::{config, config::ConfigEntity, Result};

/// `init_default` initializes sentinel-circuit using the configuration from system
/// environment and the default value.
#[inline]
pub fn init_default() -> Result<()> {
    init_with_config_file(&mut String::new())
}

/// `init_with_config` initializes sentinel-circuit using given config.
#[inline]
pub fn init_with_config(config_entity: ConfigEntity) -> Result<()> {
    config_entity.check()?;
    config::reset_global_config(config_entity);
    config::override_config_from_env_and_init_log()
}

/// `init_with_config_file` loads the general configuration from the given YAML file.
/// A blank path is resolved from `SENTINEL_CONFIG_FILE_PATH`, and the resolved path is written back.
#[inline]
pub fn init_with_config_file(config_path: &mut String) -> Result<()> {
    config::init_config_with_yaml(config_path)
}
