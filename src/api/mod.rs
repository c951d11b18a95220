//! mod `api` provides the topmost fundamental APIs for users of sentinel-circuit.
//! Initialization is optional, circuits built without it take the default config.
//! There are three ways to perform initialization:
//!
//!  1. `init_default()`, using the default config and the system environment.
//!  2. `init_with_config(config_entity: ConfigEntity)`, using a customized `ConfigEntity`.
//!  3. `init_with_config_file(config_path: &mut String)`, using a yaml file.

mod circuit;
mod init;

pub use circuit::*;
pub use init::*;
