use cfg_if::cfg_if;
pub use log::{debug, error, info, trace, warn};

cfg_if! {
    if #[cfg(feature = "logger_env")] {
        use crate::config::DEFAULT_LOG_LEVEL;
        use crate::Result;
        fn init_env_logger() {
            // a second initialization is a no-op
            let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_LEVEL))
                .try_init();
        }
        pub fn logger_init(_: Option<String>) -> Result<()> {
            init_env_logger();
            Ok(())
        }
    }
    else if #[cfg(feature = "logger_log4rs")] {
        use crate::{Error, Result};
        use std::path::Path;
        fn init_log4rs(file_name: Option<String>) -> Result<()> {
            let file_name = file_name.ok_or_else(|| Error::msg("Must provide a configuration file for log4rs crate"))?;
            let path = Path::new(&file_name);
            if path.exists() {
                log4rs::init_file(path, Default::default())?;
            }
            Ok(())
        }
        pub fn logger_init(file_name: Option<String>) -> Result<()> {
            init_log4rs(file_name)
        }
    } else {
        pub fn logger_init(_: Option<String>) -> crate::Result<()> {
            Ok(())
        }
    }
}
