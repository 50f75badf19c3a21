//! Discover command - report whether subst applies to a directory

use std::path::Path;

use subst_core::{CoreError, OVERRIDE_FILE_NAME, contains_override_file};

use crate::error::{CliError, Result};

/// Name printed for plugin discovery
pub const PLUGIN_NAME: &str = "subst";

pub fn run(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(CoreError::RootNotFound {
            path: dir.to_path_buf(),
        }
        .into());
    }

    if contains_override_file(dir) {
        tracing::debug!(dir = %dir.display(), "found override files");
        println!("{}", PLUGIN_NAME);
        Ok(())
    } else {
        Err(CliError::NotDiscovered {
            file: OVERRIDE_FILE_NAME.to_string(),
            path: dir.to_path_buf(),
        })
    }
}
