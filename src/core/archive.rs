// ─── Archive extraction ───
// Unpacks companion archives into an instance. Every entry is checked
// before anything is written; a single entry that would land outside the
// target directory aborts the whole archive.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::core::error::{UpdaterError, UpdaterResult};

/// Resolve `entry_name` under `target` without touching the filesystem.
///
/// Returns `PathTraversal` when the normalized path escapes `target`.
pub fn resolve_entry_path(target: &Path, entry_name: &str) -> UpdaterResult<PathBuf> {
    let traversal = || UpdaterError::PathTraversal {
        entry: entry_name.to_string(),
        target: target.to_path_buf(),
    };

    let normalized = entry_name.replace('\\', "/");
    let mut relative = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(traversal());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(traversal()),
        }
    }

    let resolved = target.join(relative);
    if !resolved.starts_with(target) {
        return Err(traversal());
    }
    Ok(resolved)
}

/// Extract `zip_path` into `target_dir`, overwriting existing files.
///
/// Directory entries replace any existing directory of the same name.
pub fn extract_zip(zip_path: &Path, target_dir: &Path) -> UpdaterResult<()> {
    let zip_file = File::open(zip_path).map_err(|e| UpdaterError::io(zip_path, e))?;
    let mut archive = zip::ZipArchive::new(zip_file)?;

    std::fs::create_dir_all(target_dir).map_err(|e| UpdaterError::io(target_dir, e))?;

    let mut planned = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        let out_path = resolve_entry_path(target_dir, entry.name())?;
        planned.push((index, out_path, entry.is_dir()));
    }

    for (index, out_path, is_dir) in planned {
        if is_dir {
            if out_path == target_dir {
                continue;
            }
            if out_path.is_dir() {
                std::fs::remove_dir_all(&out_path).map_err(|e| UpdaterError::io(&out_path, e))?;
            }
            std::fs::create_dir_all(&out_path).map_err(|e| UpdaterError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| UpdaterError::io(parent, e))?;
        }

        let mut zipped = archive.by_index(index)?;
        let mut out = File::create(&out_path).map_err(|e| UpdaterError::io(&out_path, e))?;
        std::io::copy(&mut zipped, &mut out).map_err(|e| UpdaterError::io(&out_path, e))?;
        debug!("Extracted {:?}", out_path);
    }

    Ok(())
}
