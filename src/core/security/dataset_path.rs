use std::io;
use std::path::{Path, PathBuf};

use crate::core::config::Config;

/// Errors that can occur during dataset path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is outside the allowed data root '{root}'")]
    OutsideDataRoot { path: PathBuf, root: PathBuf },

    #[error("Symlink '{path}' points outside the allowed data root")]
    SymlinkOutsideRoot { path: PathBuf },

    #[error("Cannot canonicalize path '{path}': {error}")]
    CannotCanonicalize { path: PathBuf, error: io::Error },

    #[error("Dataset not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("IO error for path '{path}': {error}")]
    Io { path: PathBuf, error: io::Error },
}

/// Validates that a dataset path may be read under the configured policy.
///
/// Canonicalizes the input (resolving `.`, `..`, and symlinks) and, when a
/// data root is configured, rejects any path that resolves outside it.
/// Symlinks are additionally checked against the symlink policy so a link
/// inside the root cannot smuggle in a file from outside.
///
/// Returns the canonicalized path on success; datasets are always opened
/// through the returned path, never the caller-supplied one.
pub fn validate_dataset_path(
    input_path: &str,
    config: &Config,
) -> Result<PathBuf, PathSecurityError> {
    let path = Path::new(input_path);

    let Some(ref root) = config.data.root_path else {
        // No root configured: any existing, resolvable path is fine.
        return canonicalize_path(path);
    };

    let canonical_root = root.canonicalize().map_err(|e| PathSecurityError::Io {
        path: root.clone(),
        error: e,
    })?;

    if !path.exists() {
        return Err(PathSecurityError::NotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_symlink() && !config.data.allow_symlinks {
        let target = path.read_link().map_err(|e| PathSecurityError::Io {
            path: path.to_path_buf(),
            error: e,
        })?;

        let canonical_target =
            canonicalize_path(&target).map_err(|_| PathSecurityError::SymlinkOutsideRoot {
                path: path.to_path_buf(),
            })?;

        if !canonical_target.starts_with(&canonical_root) {
            return Err(PathSecurityError::SymlinkOutsideRoot {
                path: path.to_path_buf(),
            });
        }
    }

    let canonical_path = path
        .canonicalize()
        .map_err(|e| PathSecurityError::CannotCanonicalize {
            path: path.to_path_buf(),
            error: e,
        })?;

    if !canonical_path.starts_with(&canonical_root) {
        return Err(PathSecurityError::OutsideDataRoot {
            path: canonical_path,
            root: canonical_root,
        });
    }

    Ok(canonical_path)
}

fn canonicalize_path(path: &Path) -> Result<PathBuf, PathSecurityError> {
    path.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathSecurityError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            PathSecurityError::CannotCanonicalize {
                path: path.to_path_buf(),
                error: e,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_with_root(root: Option<PathBuf>, allow_symlinks: bool) -> Config {
        use crate::core::config::DataConfig;

        let mut config = Config::default();
        config.data = DataConfig {
            root_path: root,
            allow_symlinks,
        };
        config
    }

    #[test]
    fn test_no_root_allows_existing_paths() {
        let temp_dir = TempDir::new().unwrap();
        let csv = temp_dir.path().join("data.csv");
        fs::write(&csv, "a,b\n1,2\n").unwrap();

        let config = config_with_root(None, true);
        assert!(validate_dataset_path(csv.to_str().unwrap(), &config).is_ok());
    }

    #[test]
    fn test_path_within_root() {
        let temp_dir = TempDir::new().unwrap();
        let csv = temp_dir.path().join("data.csv");
        fs::write(&csv, "a,b\n1,2\n").unwrap();

        let config = config_with_root(Some(temp_dir.path().to_path_buf()), true);
        assert!(validate_dataset_path(csv.to_str().unwrap(), &config).is_ok());
    }

    #[test]
    fn test_path_outside_root() {
        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let csv = outside_dir.path().join("data.csv");
        fs::write(&csv, "a,b\n1,2\n").unwrap();

        let config = config_with_root(Some(root_dir.path().to_path_buf()), true);
        let result = validate_dataset_path(csv.to_str().unwrap(), &config);

        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideDataRoot { .. })
        ));
    }

    #[test]
    fn test_path_traversal_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("datasets");
        fs::create_dir(&subdir).unwrap();

        let csv = temp_dir.path().join("secret.csv");
        fs::write(&csv, "a,b\n1,2\n").unwrap();

        let config = config_with_root(Some(subdir.clone()), true);
        let traversal = subdir.join("../secret.csv");
        let result = validate_dataset_path(traversal.to_str().unwrap(), &config);

        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideDataRoot { .. })
        ));
    }

    #[test]
    fn test_nonexistent_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.csv");

        let config = config_with_root(Some(temp_dir.path().to_path_buf()), true);
        let result = validate_dataset_path(missing.to_str().unwrap(), &config);

        assert!(matches!(result, Err(PathSecurityError::NotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_blocked() {
        use std::os::unix::fs::symlink;

        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();

        let target = outside_dir.path().join("data.csv");
        let link = root_dir.path().join("link.csv");
        fs::write(&target, "a,b\n1,2\n").unwrap();
        symlink(&target, &link).unwrap();

        let config = config_with_root(Some(root_dir.path().to_path_buf()), true);
        let result = validate_dataset_path(link.to_str().unwrap(), &config);

        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_disallowed_by_config() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("data.csv");
        let link = temp_dir.path().join("link.csv");
        fs::write(&target, "a,b\n1,2\n").unwrap();
        symlink(&target, &link).unwrap();

        let config = config_with_root(Some(temp_dir.path().to_path_buf()), false);
        // Within the root, but the policy forbids following links. Within-root
        // symlinks are still allowed when the policy permits them.
        assert!(validate_dataset_path(link.to_str().unwrap(), &config).is_ok());

        let outside = TempDir::new().unwrap();
        let far_target = outside.path().join("far.csv");
        let far_link = temp_dir.path().join("far.csv");
        fs::write(&far_target, "a,b\n1,2\n").unwrap();
        symlink(&far_target, &far_link).unwrap();
        assert!(validate_dataset_path(far_link.to_str().unwrap(), &config).is_err());
    }
}
