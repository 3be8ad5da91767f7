//! Atomic artifact writing.
//!
//! Every artifact of a build lands in the output directory or none does:
//!
//! 1. **Validate**: every file name is checked before anything touches disk.
//!    Names that escape the output directory after normalisation are rejected.
//! 2. **Stage**: contents go to `<name>.skein-tmp` files beside their targets.
//! 3. **Commit**: each temp file is renamed over its target.
//!
//! A failure during staging removes every temp file. A failure during commit
//! also removes the targets this write created; files that existed before
//! are left with whichever contents they have.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::{debug, warn};

use super::Artifact;
use crate::{Error, Result};

const TEMP_SUFFIX: &str = ".skein-tmp";

/// Write `artifacts` into `dir`, returning the absolute path of each file in
/// artifact order. With `clean`, the directory is emptied first (after all
/// names have been validated).
///
/// ```no_run
/// use skein_bundler::output::writer::write_artifacts;
/// use skein_bundler::Artifact;
/// use std::path::Path;
///
/// let artifacts = vec![Artifact::bundle("main", "main.js".into(), b"..".to_vec())];
/// write_artifacts(&artifacts, Path::new("dist"), false).unwrap();
/// ```
pub fn write_artifacts(artifacts: &[Artifact], dir: &Path, clean: bool) -> Result<Vec<PathBuf>> {
    let dir = validate_and_normalize_dir(dir)?;

    let mut operations = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let target = validate_output_path(&dir, &artifact.file_name)?;
        operations.push((target, artifact.content.as_slice()));
    }

    if clean {
        clean_dir(&dir)?;
    }

    fs::create_dir_all(&dir).map_err(|e| {
        Error::WriteFailure(format!(
            "Failed to create output directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    write_files_atomic(&operations)?;
    Ok(operations.into_iter().map(|(path, _)| path).collect())
}

/// Normalise and absolutise the output directory.
fn validate_and_normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();

    let absolute = if cleaned.is_absolute() {
        cleaned
    } else {
        std::env::current_dir()
            .map_err(|e| {
                Error::InvalidOutputPath(format!("Failed to get current directory: {}", e))
            })?
            .join(&cleaned)
            .clean()
    };

    Ok(absolute)
}

/// Resolve `filename` under `base_dir`, rejecting anything that escapes it.
pub(crate) fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.is_empty() {
        return Err(Error::InvalidOutputPath("Filename is empty".to_string()));
    }

    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }

    #[cfg(target_os = "windows")]
    {
        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_uppercase())
            .unwrap_or_default();
        let device_names = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        if device_names.contains(&stem.as_str()) {
            return Err(Error::InvalidOutputPath(format!(
                "Filename is a reserved device name: {}",
                filename
            )));
        }
    }

    let filename_path = Path::new(filename).clean();
    let full_path = base_dir.join(&filename_path).clean();

    if full_path == base_dir || !full_path.starts_with(base_dir) {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

fn clean_dir(dir: &Path) -> Result<()> {
    if dir.parent().is_none() {
        return Err(Error::InvalidOutputPath(format!(
            "Refusing to clean '{}'",
            dir.display()
        )));
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let path = entry?.path();
        let result = if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| {
            Error::WriteFailure(format!("Failed to clean '{}': {}", path.display(), e))
        })?;
    }

    debug!(dir = %dir.display(), "Cleaned output directory");
    Ok(())
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

struct Staged {
    temp: PathBuf,
    target: PathBuf,
    existed: bool,
}

/// Two-phase write: stage every file, then rename each into place.
fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut staged: Vec<Staged> = Vec::with_capacity(operations.len());

    for (target, content) in operations {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup(&staged, 0);
                Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp = temp_path(target);
        fs::write(&temp, content).map_err(|e| {
            cleanup(&staged, 0);
            let _ = fs::remove_file(&temp);
            Error::WriteFailure(format!(
                "Failed to write temporary file '{}': {}",
                temp.display(),
                e
            ))
        })?;

        staged.push(Staged {
            temp,
            target: target.clone(),
            existed: target.exists(),
        });
    }

    for (committed, file) in staged.iter().enumerate() {
        fs::rename(&file.temp, &file.target).map_err(|e| {
            cleanup(&staged, committed);
            Error::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                file.temp.display(),
                file.target.display(),
                e
            ))
        })?;
    }

    Ok(())
}

/// Undo a partial write. The first `committed` entries were already renamed.
fn cleanup(staged: &[Staged], committed: usize) {
    for (index, file) in staged.iter().enumerate() {
        let path = if index < committed {
            if file.existed {
                continue;
            }
            &file.target
        } else {
            &file.temp
        };

        if path.exists() {
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "Failed to roll back output file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_output_path_normal() {
        let base = Path::new("/tmp/output");
        assert_eq!(
            validate_output_path(base, "main.js").unwrap(),
            Path::new("/tmp/output/main.js")
        );
        assert_eq!(
            validate_output_path(base, "./assets/index.html").unwrap(),
            Path::new("/tmp/output/assets/index.html")
        );
    }

    #[test]
    fn test_validate_output_path_traversal() {
        let base = Path::new("/tmp/output");
        for name in ["../etc/passwd", "safe/../../../../etc/passwd", "/etc/passwd", ".", ""] {
            assert!(
                matches!(validate_output_path(base, name), Err(Error::InvalidOutputPath(_))),
                "{name} should be rejected"
            );
        }
        assert!(validate_output_path(base, "file\0name.js").is_err());
    }

    #[test]
    fn temp_names_do_not_collide() {
        assert_ne!(
            temp_path(Path::new("/out/main.js")),
            temp_path(Path::new("/out/main.css"))
        );
        assert_eq!(
            temp_path(Path::new("/out/main.js")),
            Path::new("/out/main.js.skein-tmp")
        );
    }

    #[test]
    fn failed_stage_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        // A regular file where a directory is needed makes staging the second write fail.
        fs::write(dir.path().join("blocked"), "").unwrap();

        let first = dir.path().join("main.js");
        let second = dir.path().join("blocked/index.html");
        let err = write_files_atomic(&[(first.clone(), b"a"), (second, b"b")]).unwrap_err();

        assert!(matches!(err, Error::WriteFailure(_)));
        assert!(!first.exists());
        assert!(!temp_path(&first).exists());
    }

    #[test]
    fn failed_commit_removes_new_targets_only() {
        let dir = TempDir::new().unwrap();
        let kept = dir.path().join("kept.js");
        fs::write(&kept, "old").unwrap();
        let created = dir.path().join("created.js");

        let staged = vec![
            Staged {
                temp: temp_path(&kept),
                target: kept.clone(),
                existed: true,
            },
            Staged {
                temp: temp_path(&created),
                target: created.clone(),
                existed: false,
            },
        ];
        fs::write(&created, "new").unwrap();
        cleanup(&staged, 2);

        assert!(kept.exists());
        assert!(!created.exists());
    }
}
