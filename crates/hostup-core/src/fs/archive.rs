//! Source and toolchain archive extraction.
//!
//! Supports gzip-compressed tarballs (`.tar.gz`, `.tgz`) and zip archives.
//! Entries that would land outside the destination are rejected.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::{IoResultExt, ProvisionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    TarGz,
    Zip,
}

fn archive_kind(path: &Path) -> Option<ArchiveKind> {
    let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveKind::TarGz)
    } else if name.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else {
        None
    }
}

/// Extract `archive` into `dest`, creating `dest` if needed.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<(), ProvisionError> {
    let kind = archive_kind(archive)
        .ok_or_else(|| ProvisionError::UnsupportedArchive(archive.to_path_buf()))?;

    fs::create_dir_all(dest)
        .io_context(|| format!("Failed to create extract directory: {}", dest.display()))?;

    tracing::debug!(archive = %archive.display(), dest = %dest.display(), "extracting");
    match kind {
        ArchiveKind::TarGz => extract_tar_gz(archive, dest),
        ArchiveKind::Zip => extract_zip(archive, dest),
    }
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), ProvisionError> {
    let file =
        File::open(archive).io_context(|| format!("Failed to open {}", archive.display()))?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tar.set_preserve_permissions(true);

    let read_err = |source| ProvisionError::io(format!("Failed to read {}", archive.display()), source);

    for entry in tar.entries().map_err(read_err)? {
        let mut entry = entry.map_err(read_err)?;
        let path = entry.path().map_err(read_err)?.into_owned();
        let unpacked = entry
            .unpack_in(dest)
            .io_context(|| format!("Failed to unpack {}", path.display()))?;
        if !unpacked {
            return Err(escaping_entry(archive, &path));
        }
    }
    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), ProvisionError> {
    let file =
        File::open(archive).io_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| ProvisionError::io(format!("Failed to read {}", archive.display()), e.into()))?;

    for i in 0..zip.len() {
        let mut file = zip.by_index(i).map_err(|e| {
            ProvisionError::io(format!("Failed to read zip entry {}", i), e.into())
        })?;

        let outpath = match file.enclosed_name() {
            Some(path) => dest.join(path),
            None => return Err(escaping_entry(archive, Path::new(file.name()))),
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)
                .io_context(|| format!("Failed to create directory: {}", outpath.display()))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).io_context(|| {
                format!("Failed to create parent directory: {}", parent.display())
            })?;
        }
        let mut outfile = File::create(&outpath)
            .io_context(|| format!("Failed to create file: {}", outpath.display()))?;
        io::copy(&mut file, &mut outfile)
            .io_context(|| format!("Failed to write file: {}", outpath.display()))?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))
                .io_context(|| format!("Failed to set mode on {}", outpath.display()))?;
        }
    }
    Ok(())
}

fn escaping_entry(archive: &Path, entry: &Path) -> ProvisionError {
    ProvisionError::io(
        format!(
            "Archive {} contains an entry outside the extract directory: {}",
            archive.display(),
            entry.display()
        ),
        io::Error::new(io::ErrorKind::InvalidData, "path traversal"),
    )
}

/// The single top-level directory of an extracted archive, if there is one.
pub fn single_root(dir: &Path) -> Result<Option<PathBuf>, ProvisionError> {
    let mut entries = fs::read_dir(dir)
        .io_context(|| format!("Failed to read dir: {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()
        .io_context(|| format!("Failed to read dir entries: {}", dir.display()))?;

    if entries.len() != 1 {
        return Ok(None);
    }
    let entry = entries.remove(0);
    let is_dir = entry
        .file_type()
        .io_context(|| format!("Failed to stat {}", entry.path().display()))?
        .is_dir();
    Ok(is_dir.then(|| entry.path()))
}
