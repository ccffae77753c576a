//! Packaging of job sources into deployable archives

use crate::core::config::JobConfig;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Errors raised while building an archive
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Source directory does not exist: [{0}]")]
    MissingSource(PathBuf),

    #[error("I/O error on [{path}]: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk [{path}]: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to write archive [{path}]: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PackageError + '_ {
    move |source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Archive name of an entry, always `/`-separated
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Keep the Unix mode of the entry so executables stay executable
#[cfg(unix)]
fn entry_options(entry: &walkdir::DirEntry, options: FileOptions) -> FileOptions {
    use std::os::unix::fs::PermissionsExt;
    match entry.metadata() {
        Ok(metadata) => options.unix_permissions(metadata.permissions().mode()),
        Err(_) => options,
    }
}

#[cfg(not(unix))]
fn entry_options(_entry: &walkdir::DirEntry, options: FileOptions) -> FileOptions {
    options
}

/// Zip `root_dir` into `<archive_base>.zip` and return the archive path
///
/// Entries are stored relative to `root_dir`, directories included. Parent
/// directories of the archive are created when missing.
pub fn package_directory(archive_base: &Path, root_dir: &Path) -> Result<PathBuf, PackageError> {
    if !root_dir.is_dir() {
        return Err(PackageError::MissingSource(root_dir.to_path_buf()));
    }

    let mut archive_name = archive_base.as_os_str().to_os_string();
    archive_name.push(".zip");
    let archive_path = PathBuf::from(archive_name);

    if let Some(parent) = archive_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    info!("Creating archive: {} ...", archive_path.display());
    let file = File::create(&archive_path).map_err(io_error(&archive_path))?;
    write_archive(file, root_dir, &archive_path)?;

    Ok(archive_path)
}

fn write_archive<W: Write + Seek>(
    writer: W,
    root_dir: &Path,
    archive_path: &Path,
) -> Result<(), PackageError> {
    let zip_error = |source: zip::result::ZipError| PackageError::Zip {
        path: archive_path.to_path_buf(),
        source,
    };
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(root_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| PackageError::Walk {
            path: root_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path == archive_path {
            continue;
        }

        let relative = path.strip_prefix(root_dir).unwrap_or(path);
        let name = entry_name(relative);
        let options = entry_options(&entry, options);

        if entry.file_type().is_dir() {
            debug!("Adding directory {}/", name);
            zip.add_directory(format!("{}/", name), options)
                .map_err(zip_error)?;
        } else {
            debug!("Adding file {}", name);
            zip.start_file(name, options).map_err(zip_error)?;
            let mut source = File::open(path).map_err(io_error(path))?;
            std::io::copy(&mut source, &mut zip).map_err(io_error(path))?;
        }
    }

    zip.finish().map_err(zip_error)?;
    Ok(())
}

/// Package `<source_dir>/<job>` into `<artefact_dir>/<job>/<job>.zip`
///
/// Returns `None` when the job config declares no artifact.
pub fn package_job(
    job: &JobConfig,
    job_name: &str,
    source_dir: &Path,
    artefact_dir: &Path,
) -> Result<Option<PathBuf>, PackageError> {
    if !job.has_artifact() {
        info!("There is no corresponding artefact path for the job: [{}]", job_name);
        return Ok(None);
    }

    let root = source_dir.join(job_name);
    let archive_base = artefact_dir.join(job_name).join(job_name);
    let archive = package_directory(&archive_base, &root)?;
    info!("Successfully packaged job: [{}]", job_name);
    Ok(Some(archive))
}
