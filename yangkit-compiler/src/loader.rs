//! Locating module source files on disk
//!
//! Modules are stored as `name.yang`, `name@YYYY-MM-DD.yang` or the
//! `.yin` equivalents. The search covers the caller-configured search
//! paths plus the current working directory; subdirectories of
//! explicit search paths are walked one level, the working directory
//! is never recursed.

use crate::parser::{check_date, SchemaFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use yangkit_core::error::Result;

/// A located module source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedModule {
    /// Path of the best matching file
    pub path: PathBuf,
    /// Format derived from the file suffix
    pub format: SchemaFormat,
    /// Revision encoded in the filename, if any
    pub revision: Option<String>,
}

/// Search the filesystem for the source of a module or submodule
///
/// With `revision` given an exact filename match wins immediately;
/// otherwise the revisioned file with the greatest date is chosen and
/// un-revisioned files are used only when no revisioned file exists.
///
/// # Errors
///
/// Returns an IO error only when the working directory cannot be
/// determined; unreadable directories are logged and skipped.
pub fn search_local_file(
    search_paths: &[PathBuf],
    use_cwd: bool,
    name: &str,
    revision: Option<&str>,
) -> Result<Option<LocatedModule>> {
    // Directory stack; the flag marks directories whose immediate
    // subdirectories may still be visited.
    let mut dirs: Vec<(PathBuf, bool)> = Vec::new();

    if use_cwd {
        let cwd = std::env::current_dir()?;
        if !search_paths.iter().any(|p| *p == cwd) {
            dirs.push((cwd, false));
        }
    }
    for path in search_paths {
        dirs.push((path.clone(), true));
    }

    let mut best: Option<LocatedModule> = None;

    while let Some((dir, walk_subdirs)) = dirs.pop() {
        debug!(directory = %dir.display(), module = name, "searching for module source");
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    directory = %dir.display(),
                    error = %err,
                    "unable to open directory while searching for modules"
                );
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if walk_subdirs {
                    dirs.push((path, false));
                }
                continue;
            }
            if !path.is_file() {
                continue;
            }

            let Some(candidate) = match_filename(&path, name) else {
                continue;
            };

            match revision {
                Some(wanted) => {
                    match &candidate.revision {
                        Some(found) if found == wanted => {
                            // Exact revision match ends the search
                            return Ok(Some(candidate));
                        }
                        Some(_) => {}
                        None => {
                            // Un-revisioned fallback, kept while the
                            // exact revision is still being looked for
                            best = Some(candidate);
                        }
                    }
                }
                None => {
                    if let Some(current) = &best {
                        match (&current.revision, &candidate.revision) {
                            (_, None) => continue,
                            (Some(old), Some(new)) if old >= new => continue,
                            _ => {}
                        }
                    }
                    best = Some(candidate);
                }
            }
        }
    }

    Ok(best)
}

/// Match one directory entry against the searched module name
fn match_filename(path: &Path, name: &str) -> Option<LocatedModule> {
    let filename = path.file_name()?.to_str()?;

    let format = SchemaFormat::from_path(path)?;
    let stem = filename.strip_suffix(match format {
        SchemaFormat::Yang => ".yang",
        SchemaFormat::Yin => ".yin",
    })?;

    let rest = stem.strip_prefix(name)?;
    let revision = match rest.as_bytes().first() {
        None => None,
        Some(b'@') => {
            let rev = &rest[1..];
            if check_date(rev).is_err() {
                return None;
            }
            Some(rev.to_string())
        }
        // a longer module name sharing the prefix
        Some(_) => return None,
    };

    Some(LocatedModule {
        path: path.to_path_buf(),
        format,
        revision,
    })
}
