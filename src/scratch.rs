//! Scratch-directory preparation for the browser process.
//!
//! Chrome in a constrained sandbox needs writable user-data, data and cache
//! directories before launch. Creation happens best-effort: the browser can
//! often fall back to directories it already has, so failures here are
//! demoted to warnings and the run continues.

use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectories created under the scratch base
pub const SCRATCH_SUBDIRS: [&str; 3] = ["user-data", "data-path", "cache"];

/// Prepare the browser scratch directories under `base`.
///
/// Returns the warnings collected along the way (empty = clean). Each
/// warning is also logged; none of them aborts the run.
pub fn prepare(base: &Path) -> Vec<String> {
    let mut warnings = Vec::new();

    for subdir in SCRATCH_SUBDIRS {
        let dir = base.join(subdir);
        if let Err(err) = create_world_writable(&dir) {
            let warning = format!("could not prepare scratch dir {}: {}", dir.display(), err);
            log::warn!("{}", warning);
            warnings.push(warning);
        }
    }

    warnings
}

/// Path of the browser user-data directory under `base`
pub fn user_data_dir(base: &Path) -> PathBuf {
    base.join(SCRATCH_SUBDIRS[0])
}

fn create_world_writable(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(dir)?.permissions();
        perms.set_mode(0o777);
        fs::set_permissions(dir, perms)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_creates_all_subdirs() {
        let base = tempfile::tempdir().unwrap();
        let warnings = prepare(base.path());
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
        for subdir in SCRATCH_SUBDIRS {
            assert!(base.path().join(subdir).is_dir());
        }
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let base = tempfile::tempdir().unwrap();
        assert!(prepare(base.path()).is_empty());
        assert!(prepare(base.path()).is_empty());
    }

    #[test]
    fn test_prepare_reports_unusable_base() {
        // A regular file where the base directory should be makes every
        // create_dir_all fail, regardless of the user running the tests.
        let base = tempfile::tempdir().unwrap();
        let blocked = base.path().join("blocked");
        fs::write(&blocked, b"not a directory").unwrap();

        let warnings = prepare(&blocked);
        assert_eq!(warnings.len(), SCRATCH_SUBDIRS.len());
    }

    #[test]
    fn test_user_data_dir() {
        assert_eq!(
            user_data_dir(Path::new("/tmp/web-vision")),
            PathBuf::from("/tmp/web-vision/user-data")
        );
    }
}
