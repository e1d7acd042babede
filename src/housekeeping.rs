use crate::config::Config;
use crate::error::{Result, SubfetchError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Create the workspace and output directories. Existing ones are fine.
///
/// The output directory may not be the workspace or sit inside it: purging
/// the workspace would delete the finished videos.
pub fn prepare_dirs(config: &Config) -> Result<()> {
    fs::create_dir_all(&config.temp_dir)?;
    fs::create_dir_all(&config.output_dir)?;

    let workspace = fs::canonicalize(&config.temp_dir)?;
    let output = fs::canonicalize(&config.output_dir)?;
    if output.starts_with(&workspace) {
        return Err(SubfetchError::Usage(format!(
            "The output directory {} must be outside the temporary workspace {}",
            config.output_dir.display(),
            config.temp_dir.display()
        )));
    }
    debug!(
        "Workspace {}, output {}",
        config.temp_dir.display(),
        config.output_dir.display()
    );
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed: usize,
    pub failed: Vec<PathBuf>,
}

/// Delete everything inside `dir`, keeping `dir` itself.
///
/// A failure on one entry does not stop the others.
pub fn purge_workspace(dir: &Path) -> PurgeReport {
    let mut report = PurgeReport::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Nothing to purge in {}: {}", dir.display(), e);
            return report;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match removed {
            Ok(()) => report.removed += 1,
            Err(e) => {
                warn!("Could not delete {}: {}", path.display(), e);
                report.failed.push(path);
            }
        }
    }

    report
}
