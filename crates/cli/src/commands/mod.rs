//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_session;
pub use validate::run_validate;

use std::path::Path;

use contracts::PacerConfig;

use crate::error::{CliError, Result};

/// Load a configuration file, or the defaults when no path is given
fn load_config(path: Option<&Path>) -> Result<PacerConfig> {
    let Some(path) = path else {
        return Ok(PacerConfig::default());
    };

    if !path.exists() {
        return Err(CliError::config_not_found(path));
    }

    config_loader::ConfigLoader::load_from_path(path).map_err(|e| CliError::config_load(path, e))
}
