use super::{constant::*, ConfigEntity};
use crate::{circuitbreaker::CircuitConfig, logging, utils, Error, Result};
use lazy_static::lazy_static;
use serde_yaml;
use std::env;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<ConfigEntity> = RwLock::new(ConfigEntity::new());
}

#[inline]
fn global_config() -> RwLockReadGuard<'static, ConfigEntity> {
    GLOBAL_CONFIG.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn reset_global_config(entity: ConfigEntity) {
    *GLOBAL_CONFIG.write().unwrap_or_else(PoisonError::into_inner) = entity;
}

// init_config_with_yaml loads general configuration from the YAML file under provided path.
pub fn init_config_with_yaml(config_path: &mut String) -> Result<()> {
    apply_yaml_config_file(config_path)?;
    override_config_from_env_and_init_log()
}

// apply_yaml_config_file loads general configuration from the given YAML file.
fn apply_yaml_config_file(config_path: &mut String) -> Result<()> {
    // Priority: system environment > YAML file > default config
    if utils::is_blank(config_path) {
        *config_path = env::var(CONF_FILE_PATH_ENV_KEY).unwrap_or_else(|_| CONFIG_FILENAME.into());
    }
    load_global_config_from_yaml_file(config_path)
}

fn load_global_config_from_yaml_file(path_str: &str) -> Result<()> {
    if path_str == CONFIG_FILENAME {
        return Ok(());
    }
    let path = Path::new(path_str);
    if !path.exists() {
        return Err(Error::msg(format!(
            "YAML configuration file {} does not exist",
            path_str
        )));
    }
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    let entity: ConfigEntity = serde_yaml::from_str(&content)?;
    entity.check()?;
    logging::info!("[Config] Resolving config from file, file {}", path_str);
    reset_global_config(entity);
    Ok(())
}

pub fn override_config_from_env_and_init_log() -> Result<()> {
    override_items_from_system_env()?;
    init_log()
}

fn override_items_from_system_env() -> Result<()> {
    let app_name = match env::var(APP_NAME_ENV_KEY) {
        Ok(name) if !utils::is_blank(&name) => name,
        _ => return Ok(()),
    };
    let mut cfg = GLOBAL_CONFIG.write().unwrap_or_else(PoisonError::into_inner);
    cfg.config.app.app_name = app_name;
    cfg.check()
}

pub fn init_log() -> Result<()> {
    logging::logger_init(log_config_file())?;
    logging::info!("[Config] App name resolved, appName {}", app_name());
    logging::info!(
        "[Config] Print effective global config, globalConfig {}",
        *global_config()
    );
    Ok(())
}

#[inline]
pub fn log_config_file() -> Option<String> {
    let file = global_config().config.log.config_file.clone();
    if utils::is_blank(&file) {
        None
    } else {
        Some(file)
    }
}

#[inline]
pub fn app_name() -> String {
    global_config().config.app.app_name.clone()
}

/// `default_circuit_config` is applied to circuits registered without their own config.
#[inline]
pub fn default_circuit_config() -> CircuitConfig {
    global_config().config.circuit.clone()
}
