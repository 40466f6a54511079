//! Gzip tar extraction with root-directory normalization.
//!
//! Release archives come in two shapes: everything wrapped in one top-level
//! directory, or files sitting directly at the archive root. The first shape
//! extracts as-is; the second is redirected into a synthetic directory named
//! after the archive so that the caller always receives a single root path.

use crate::core::{WrunnerError, WrunnerResult};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::info;

struct ArchiveMember {
    path: PathBuf,
    is_dir: bool,
}

/// Extract a `.tar.gz` archive into `dest_dir` and return the extracted
/// root directory.
pub fn extract(archive_path: &Path, dest_dir: &Path) -> WrunnerResult<PathBuf> {
    let filename = archive_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            WrunnerError::Parse(format!("Malformed archive name: {}", archive_path.display()))
        })?;

    let members = read_members(archive_path)?;

    info!("Extracting {} to {}", filename, dest_dir.display());

    let mut archive = open_archive(archive_path)?;

    if has_root_directory(&members) {
        archive.unpack(dest_dir)?;
        info!("File extraction completed.");

        return Ok(dest_dir.join(&members[0].path));
    }

    let root = dest_dir.join(strip_extensions(filename, 2));
    fs::create_dir_all(&root)?;
    archive.unpack(&root)?;
    info!("File extraction completed.");

    Ok(root)
}

fn open_archive(archive_path: &Path) -> WrunnerResult<Archive<GzDecoder<File>>> {
    let file = File::open(archive_path)?;
    Ok(Archive::new(GzDecoder::new(file)))
}

/// List member paths in the order they appear in the archive.
fn read_members(archive_path: &Path) -> WrunnerResult<Vec<ArchiveMember>> {
    let mut archive = open_archive(archive_path)?;
    let mut members = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        let path = entry.path()?.to_path_buf();
        members.push(ArchiveMember {
            path,
            is_dir: entry.header().entry_type().is_dir(),
        });
    }

    Ok(members)
}

/// Whether every member lies under the first member, which must be a
/// directory. Order-sensitive: only member 0 is considered as the root.
fn has_root_directory(members: &[ArchiveMember]) -> bool {
    let Some(first) = members.first() else {
        return false;
    };

    first.is_dir
        && members
            .iter()
            .all(|member| member.path.starts_with(&first.path))
}

/// Remove `n` trailing extensions: `name.tar.gz` with `n = 2` -> `name`.
fn strip_extensions(filename: &str, n: usize) -> String {
    let mut name = filename;
    for _ in 0..n {
        name = Path::new(name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(name);
    }
    name.to_string()
}
