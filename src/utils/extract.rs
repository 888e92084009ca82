//! Container detection and staging for downloaded artifacts.
//!
//! The container is picked from the URL path suffix when it has a known one
//! (`.tar.gz`, `.tgz`, `.tar`, `.zip`, `.gz`), otherwise from the leading
//! magic bytes of the content. Anything unrecognised is a bare binary.

use flate2::read::GzDecoder;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SNIFF_LEN: u64 = 512;
const TAR_MAGIC_OFFSET: usize = 257;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("archive entry \"{0}\" escapes the destination directory")]
    UnsafeEntry(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Tar,
    Zip,
    /// A single gzip-compressed file.
    Gzip,
    Binary,
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::Tar => "tar",
            ArchiveKind::Zip => "zip",
            ArchiveKind::Gzip => "gzip",
            ArchiveKind::Binary => "binary",
        };
        f.write_str(name)
    }
}

impl ArchiveKind {
    pub fn from_extension(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveKind::Tar)
        } else if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else if name.ends_with(".gz") {
            Some(ArchiveKind::Gzip)
        } else {
            None
        }
    }

    pub fn sniff(header: &[u8]) -> Self {
        if header.starts_with(&[0x1f, 0x8b]) {
            ArchiveKind::Gzip
        } else if header.starts_with(b"PK\x03\x04") {
            ArchiveKind::Zip
        } else if header.get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5) == Some(&b"ustar"[..]) {
            ArchiveKind::Tar
        } else {
            ArchiveKind::Binary
        }
    }

    pub fn detect(name_hint: &str, artifact: &Path) -> Result<Self, ExtractError> {
        match Self::from_extension(name_hint) {
            Some(kind) => Ok(kind),
            None => Ok(Self::sniff(&read_header(artifact)?)),
        }
    }
}

/// Stages a downloaded `artifact` and consumes it.
///
/// Archives are unpacked into `dst_root`. A bare binary (or a gzip stream that
/// does not hold a tar) is moved to `binary_target`. Returns the container that
/// was actually found, so `.gz` input reports `TarGz` when it held a tar.
pub fn stage_artifact(
    artifact: &Path,
    name_hint: &str,
    dst_root: &Path,
    binary_target: &Path,
) -> Result<ArchiveKind, ExtractError> {
    let kind = ArchiveKind::detect(name_hint, artifact)?;
    tracing::debug!(%kind, artifact = %artifact.display(), "staging artifact");

    let staged = match kind {
        ArchiveKind::TarGz => {
            extract_tar(GzDecoder::new(open(artifact)?), dst_root)?;
            ArchiveKind::TarGz
        }
        ArchiveKind::Tar => {
            extract_tar(open(artifact)?, dst_root)?;
            ArchiveKind::Tar
        }
        ArchiveKind::Zip => {
            extract_zip(artifact, dst_root)?;
            ArchiveKind::Zip
        }
        ArchiveKind::Gzip => {
            let inflated = artifact.with_extension("inflated");
            inflate(artifact, &inflated)?;
            remove(artifact)?;

            if ArchiveKind::sniff(&read_header(&inflated)?) == ArchiveKind::Tar {
                extract_tar(open(&inflated)?, dst_root)?;
                remove(&inflated)?;
                ArchiveKind::TarGz
            } else {
                place_binary(&inflated, binary_target)?;
                ArchiveKind::Gzip
            }
        }
        ArchiveKind::Binary => {
            place_binary(artifact, binary_target)?;
            ArchiveKind::Binary
        }
    };

    if matches!(staged, ArchiveKind::TarGz | ArchiveKind::Tar | ArchiveKind::Zip) && artifact.exists() {
        remove(artifact)?;
    }

    Ok(staged)
}

fn extract_tar<R: Read>(reader: R, extract_dir: &Path) -> Result<(), ExtractError> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.unpack(extract_dir).map_err(io_err(extract_dir))
}

fn extract_zip(archive_path: &Path, extract_dir: &Path) -> Result<(), ExtractError> {
    let file = open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => return Err(ExtractError::UnsafeEntry(entry.name().to_string())),
        };
        let outpath = extract_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(io_err(&outpath))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let mut outfile = File::create(&outpath).map_err(io_err(&outpath))?;
        io::copy(&mut entry, &mut outfile).map_err(io_err(&outpath))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))
                    .map_err(io_err(&outpath))?;
            }
        }
    }

    Ok(())
}

fn inflate(archive_path: &Path, dest: &Path) -> Result<(), ExtractError> {
    let mut decoder = GzDecoder::new(open(archive_path)?);
    let mut out = File::create(dest).map_err(io_err(dest))?;
    io::copy(&mut decoder, &mut out).map_err(io_err(archive_path))?;
    Ok(())
}

fn place_binary(from: &Path, target: &Path) -> Result<(), ExtractError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    fs::rename(from, target).map_err(io_err(target))
}

fn read_header(path: &Path) -> Result<Vec<u8>, ExtractError> {
    let mut header = Vec::with_capacity(SNIFF_LEN as usize);
    open(path)?
        .take(SNIFF_LEN)
        .read_to_end(&mut header)
        .map_err(io_err(path))?;
    Ok(header)
}

fn open(path: &Path) -> Result<File, ExtractError> {
    File::open(path).map_err(io_err(path))
}

fn remove(path: &Path) -> Result<(), ExtractError> {
    fs::remove_file(path).map_err(io_err(path))
}

fn io_err(path: &Path) -> impl Fn(io::Error) -> ExtractError + '_ {
    move |source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    }
}
