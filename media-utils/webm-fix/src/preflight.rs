use std::path::Path;

use crate::error::{Error, Result};

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Check the paths before handing them to a repairer.
///
/// The source must be a readable regular file. The destination must not be
/// the source and its directory must exist.
pub fn check_paths(source: &Path, destination: &Path) -> Result<()> {
    let meta = match std::fs::metadata(source) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::SourceDoesNotExist(source.to_path_buf()));
        }
        Err(e) => {
            return Err(Error::SourceNotReadable {
                path: source.to_path_buf(),
                source: e,
            });
        }
    };
    if !meta.is_file() {
        return Err(Error::SourceNotAFile(source.to_path_buf()));
    }
    std::fs::File::open(source).map_err(|e| Error::SourceNotReadable {
        path: source.to_path_buf(),
        source: e,
    })?;

    if is_same_file(source, destination) {
        return Err(Error::DestinationIsSource(destination.to_path_buf()));
    }

    // A bare file name has an empty parent: the working directory.
    if let Some(dir) = destination.parent() {
        if !dir.as_os_str().is_empty() && !dir.is_dir() {
            return Err(Error::DestinationDirMissing(dir.to_path_buf()));
        }
    }
    Ok(())
}
