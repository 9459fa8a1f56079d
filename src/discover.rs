use crate::config::AppendConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

const BACKUP_SUFFIX: &str = "_backup";

/// The loading export and the ledger it is appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    pub loading: PathBuf,
    pub target: PathBuf,
}

/// Find both inputs in `folder` by case-insensitive file name fragment.
///
/// Entries are visited in name order. Backups written by earlier runs never
/// count as the ledger.
pub fn find_inputs(folder: &Path, config: &AppendConfig) -> Result<InputFiles> {
    if !folder.is_dir() {
        return Err(Error::FileNotFound(folder.to_path_buf()));
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    let loading_pattern = config.loading_pattern.to_lowercase();
    let target_pattern = config.target_pattern.to_lowercase();

    let loading = entries
        .iter()
        .find(|path| file_name_lower(path).contains(&loading_pattern))
        .cloned();
    let target = entries
        .iter()
        .find(|path| {
            let name = file_name_lower(path);
            name.contains(&target_pattern) && !is_backup(path)
        })
        .cloned();

    match (loading, target) {
        (Some(loading), Some(target)) => Ok(InputFiles { loading, target }),
        (loading, target) => {
            let mut missing = Vec::new();
            if loading.is_none() {
                missing.push(config.loading_pattern.as_str());
            }
            if target.is_none() {
                missing.push(config.target_pattern.as_str());
            }
            Err(Error::MissingInputs {
                folder: folder.to_path_buf(),
                missing: missing.join(", "),
            })
        }
    }
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn is_backup(path: &Path) -> bool {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_lowercase().ends_with(BACKUP_SUFFIX))
        .unwrap_or(false)
}

/// `dir/Seguimento.xlsx` → `dir/Seguimento_backup.xlsx`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{BACKUP_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{BACKUP_SUFFIX}"),
    };
    path.with_file_name(name)
}

/// Copy `path` to its backup location, replacing an older backup.
pub fn create_backup(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let backup = backup_path(path);
    std::fs::copy(path, &backup)?;
    Ok(backup)
}
