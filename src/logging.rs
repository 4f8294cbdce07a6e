use env_logger::{Builder, Env, Target};
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::Error;

/// Route `log` records to `path`, appending. The filter comes from
/// `RUST_LOG` and defaults to `info`. The terminal belongs to the UI, so
/// nothing is written to stderr.
pub fn init_file(path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::LogFile {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::LogFile {
            path: path.to_path_buf(),
            source,
        })?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;

    log::info!("logging to {}", path.display());
    Ok(())
}

/// Plain stderr logging for headless runs, silent unless `RUST_LOG` is set.
pub fn init_stderr() -> crate::Result<()> {
    Builder::from_env(Env::default().default_filter_or("off"))
        .target(Target::Stderr)
        .try_init()?;
    Ok(())
}
