use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

use super::error::DownloadError;
use crate::utils::checksum::{self, Checksum};
use crate::utils::download::Transport;
use crate::utils::extract;

const DOWNLOAD_FILE: &str = "download.part";

/// Downloads the artifact at `url` into `dst_root` and checks that it provides
/// an executable named `daemon_name`.
///
/// Archives are unpacked into `dst_root`; a bare binary is stored as
/// `dst_root/bin/<daemon_name>`. The executable is looked up at
/// `bin/<daemon_name>` first and then at the root. Returns its path.
pub fn download_upgrade(
    dst_root: &Path,
    url: &str,
    daemon_name: &str,
    transport: &dyn Transport,
) -> Result<PathBuf, DownloadError> {
    if !is_plain_file_name(daemon_name) {
        return Err(DownloadError::InvalidDaemonName(daemon_name.to_string()));
    }

    let parsed = Url::parse(url).map_err(|source| DownloadError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let pinned = Checksum::from_url(&parsed)?;
    let fetch_url = checksum::strip_checksum(&parsed);

    fs::create_dir_all(dst_root).map_err(io_err(dst_root))?;
    let artifact = dst_root.join(DOWNLOAD_FILE);
    {
        let mut file = File::create(&artifact).map_err(io_err(&artifact))?;
        let bytes = transport.fetch(&fetch_url, &mut file)?;
        file.flush().map_err(io_err(&artifact))?;
        tracing::debug!(url = %fetch_url, bytes, dst = %dst_root.display(), "artifact downloaded");
    }

    if let Some(pinned) = pinned {
        pinned.verify_file(&artifact)?;
        tracing::debug!(algorithm = %pinned.algorithm, "artifact checksum verified");
    }

    let bin_target = dst_root.join("bin").join(daemon_name);
    let kind = extract::stage_artifact(&artifact, fetch_url.path(), dst_root, &bin_target)?;
    tracing::debug!(%kind, "artifact staged");

    let binary = locate_binary(dst_root, daemon_name)?;
    ensure_binary(&binary)?;
    Ok(binary)
}

fn locate_binary(dst_root: &Path, daemon_name: &str) -> Result<PathBuf, DownloadError> {
    [dst_root.join("bin").join(daemon_name), dst_root.join(daemon_name)]
        .into_iter()
        .find(|candidate| candidate.symlink_metadata().is_ok())
        .ok_or_else(|| DownloadError::MissingBinary {
            daemon_name: daemon_name.to_string(),
            root: dst_root.to_path_buf(),
        })
}

/// Checks that `path` is a regular file and is executable, adding the execute
/// bits when they are missing.
///
/// Symlinks are rejected without being followed: an artifact must carry the
/// binary itself.
pub fn ensure_binary(path: &Path) -> Result<(), DownloadError> {
    let meta = fs::symlink_metadata(path).map_err(io_err(path))?;
    if !meta.file_type().is_file() {
        return Err(DownloadError::NotRegularFile(path.to_path_buf()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if meta.permissions().mode() & 0o111 != 0 {
            return Ok(());
        }

        tracing::debug!(path = %path.display(), "marking binary executable");
        let mut perms = meta.permissions();
        perms.set_mode(perms.mode() | 0o111);
        fs::set_permissions(path, perms).map_err(io_err(path))?;

        let mode = fs::symlink_metadata(path)
            .map_err(io_err(path))?
            .permissions()
            .mode();
        if mode & 0o111 == 0 {
            return Err(DownloadError::NotExecutable(path.to_path_buf()));
        }
    }

    Ok(())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> DownloadError + '_ {
    move |source| DownloadError::Io {
        path: path.to_path_buf(),
        source,
    }
}
