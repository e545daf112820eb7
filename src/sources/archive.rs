//! Archive sources - dependencies downloaded as `.zip` or `.tar.gz`.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use url::Url;

use crate::util::errors::VendorError;
use crate::util::fs::write_atomic;
use crate::util::hash::{sha256_bytes, sha256_file};

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    /// Detect the format from a file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else {
            None
        }
    }
}

/// Download (if needed) and unpack an archive into the scratch workspace.
///
/// The archive is expected to contain a single top-level directory called
/// `name`. If that directory already exists nothing happens; if only the
/// downloaded archive exists it is unpacked without touching the network.
/// Unpacking happens in a staging directory next to the tree, which is only
/// renamed into place once extraction finished, so an interrupted or failed
/// run never leaves a partial tree behind. Returns the path of the unpacked
/// tree.
pub fn acquire_archive(
    scratch: &Path,
    name: &str,
    url: &Url,
    sha256: Option<&str>,
) -> Result<PathBuf> {
    let tree = scratch.join(name);
    if tree.exists() {
        tracing::info!("{} is already unpacked", name);
        return Ok(tree);
    }

    let archive_path = scratch.join(archive_file_name(name, url));

    if archive_path.exists() {
        if let Some(expected) = sha256 {
            let actual = sha256_file(&archive_path)?;
            verify_checksum(name, expected, &actual)?;
        }
    } else {
        tracing::info!("Downloading {}", url);
        let bytes = download(name, url)?;
        if let Some(expected) = sha256 {
            verify_checksum(name, expected, &sha256_bytes(&bytes))?;
        }
        write_atomic(&archive_path, &bytes)?;
    }

    tracing::info!("Unpacking {}", archive_path.display());
    let extraction = |message: String| VendorError::Extraction {
        archive: archive_path.clone(),
        message,
    };

    // dropped (and removed) on every early return
    let staging = tempfile::TempDir::new_in(scratch)
        .map_err(|e| extraction(format!("failed to create staging directory: {}", e)))?;
    extract(&archive_path, staging.path())?;

    let unpacked = staging.path().join(name);
    if !unpacked.is_dir() {
        return Err(extraction(format!("archive has no top-level `{}` directory", name)).into());
    }
    std::fs::rename(&unpacked, &tree).map_err(|e| {
        extraction(format!("failed to move tree into {}: {}", tree.display(), e))
    })?;

    Ok(tree)
}

/// File name the archive is stored under: the last URL path segment, or the
/// dependency name when the URL has none.
fn archive_file_name(name: &str, url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}.zip", name))
}

fn verify_checksum(name: &str, expected: &str, actual: &str) -> Result<()> {
    if !expected.eq_ignore_ascii_case(actual) {
        return Err(VendorError::ChecksumMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
        .into());
    }
    tracing::debug!("Checksum verified for {}: {}", name, &actual[..16]);
    Ok(())
}

fn download(name: &str, url: &Url) -> Result<Vec<u8>> {
    let network = |message: String| VendorError::Network {
        name: name.to_string(),
        url: url.to_string(),
        message,
    };

    let response = reqwest::blocking::get(url.as_str()).map_err(|e| network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(network(format!("HTTP {}", response.status())).into());
    }

    let bytes = response
        .bytes()
        .map_err(|e| network(format!("failed to read response body: {}", e)))?;

    Ok(bytes.to_vec())
}

/// Unpack an archive into `dest`, refusing entries that would escape it.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let extraction = |message: String| VendorError::Extraction {
        archive: archive.to_path_buf(),
        message,
    };

    let format = ArchiveFormat::from_path(archive)
        .ok_or_else(|| extraction("unsupported archive format".to_string()))?;

    std::fs::create_dir_all(dest).map_err(|e| extraction(e.to_string()))?;

    match format {
        ArchiveFormat::Zip => extract_zip(archive, dest).map_err(|e| extraction(e.to_string()))?,
        ArchiveFormat::TarGz => {
            extract_tar_gz(archive, dest).map_err(|e| extraction(e.to_string()))?
        }
    }

    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> io::Result<()> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(io::Error::other)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(io::Error::other)?;
        let relative = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("entry escapes destination: {}", entry.name()),
            )
        })?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> io::Result<()> {
    let file = File::open(archive)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut tar = tar::Archive::new(decoder);

    for entry in tar.entries()? {
        let mut entry = entry?;
        // unpack_in skips entries whose path would leave `dest`
        if !entry.unpack_in(dest)? {
            tracing::debug!(
                "Skipping archive entry outside destination: {}",
                entry.path()?.display()
            );
        }
    }

    Ok(())
}
