//! # pdfium-loader
//!
//! Find a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render`, downloading a prebuilt one on first use.
//!
//! Resolution order, first match wins:
//!
//! 1. `PDFIUM_LIB_PATH` pointing at an existing library file.
//! 2. The per-release cache directory ([`cache_dir`]).
//! 3. A download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    from which only the library file is extracted into the cache.
//!
//! The resolved path is memoised for the process lifetime, so only the first
//! call can touch the network.
//!
//! ```rust,no_run
//! let pdfium = pdfium_loader::bind_pdfium(Some(&|done, total| {
//!     if let Some(total) = total {
//!         eprint!("\rPDFium {done}/{total} bytes");
//!     }
//! }))
//! .expect("PDFium unavailable");
//! # drop(pdfium);
//! ```
//!
//! ## Environment
//!
//! - `PDFIUM_LIB_PATH`: use this library file, never download.
//! - `PDFIUM_LOADER_CACHE_DIR`: root of the cache instead of the platform
//!   cache directory.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// pdfium-binaries release tag (`chromium/<tag>`).
pub const PDFIUM_RELEASE: &str = "7690";

const RELEASES_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

const CHUNK: usize = 64 * 1024;

/// Upper bound on the buffer reserved up front from `Content-Length`.
const MAX_PREALLOC: u64 = 32 * 1024 * 1024;

/// Download progress: `(bytes_so_far, content_length)`. May borrow from the
/// caller, e.g. a progress bar on its stack.
pub type DownloadProgress<'a> = dyn Fn(u64, Option<u64>) + Sync + 'a;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("No prebuilt PDFium for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cannot prepare cache directory '{path}': {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("PDFium download failed: {0}")]
    Download(String),

    #[error("PDFium archive is unusable: {0}")]
    Extract(String),

    #[error("Cannot load PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platforms ───────────────────────────────────────────────────────────────

/// Where the library lives for one OS/architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Release asset, e.g. `pdfium-linux-x64.tgz`.
    pub archive: &'static str,
    /// Path of the library inside the archive.
    pub member: &'static str,
    /// File name the library is cached under.
    pub file_name: &'static str,
}

impl Platform {
    pub fn current() -> Result<Self, LoaderError> {
        Self::for_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn for_target(os: &str, arch: &str) -> Result<Self, LoaderError> {
        const DYLIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
        const SO: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
        const DLL: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

        let (archive, (member, file_name)) = match (os, arch) {
            ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", DYLIB),
            ("macos", "x86_64") => ("pdfium-mac-x64.tgz", DYLIB),
            ("linux", "x86_64") => ("pdfium-linux-x64.tgz", SO),
            ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", SO),
            ("windows", "x86_64") => ("pdfium-win-x64.tgz", DLL),
            ("windows", "aarch64") => ("pdfium-win-arm64.tgz", DLL),
            ("windows", "x86") => ("pdfium-win-x86.tgz", DLL),
            _ => {
                return Err(LoaderError::UnsupportedPlatform {
                    os: os.to_string(),
                    arch: arch.to_string(),
                })
            }
        };
        Ok(Platform {
            archive,
            member,
            file_name,
        })
    }

    fn download_url(&self) -> String {
        format!("{RELEASES_URL}/chromium%2F{PDFIUM_RELEASE}/{}", self.archive)
    }
}

// ── Cache ───────────────────────────────────────────────────────────────────

/// Directory holding the cached library for [`PDFIUM_RELEASE`].
///
/// `<platform cache>/docshift/pdfium-<release>`, or
/// `$PDFIUM_LOADER_CACHE_DIR/pdfium-<release>` when that is set.
pub fn cache_dir() -> PathBuf {
    let leaf = format!("pdfium-{PDFIUM_RELEASE}");
    if let Some(root) = std::env::var_os("PDFIUM_LOADER_CACHE_DIR") {
        return PathBuf::from(root).join(leaf);
    }
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("docshift")
        .join(leaf)
}

fn env_override() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os("PDFIUM_LIB_PATH")?);
    if path.is_file() {
        Some(path)
    } else {
        warn!(
            "PDFIUM_LIB_PATH '{}' does not exist, falling back to the cache",
            path.display()
        );
        None
    }
}

/// The library path if it is available without a download.
pub fn locate() -> Option<PathBuf> {
    if let Some(path) = RESOLVED.get() {
        return Some(path.clone());
    }
    env_override().or_else(|| {
        let platform = Platform::current().ok()?;
        let cached = cache_dir().join(platform.file_name);
        cached.is_file().then_some(cached)
    })
}

/// True when binding will not need network access.
pub fn is_available_offline() -> bool {
    locate().is_some()
}

// ── Resolve & bind ──────────────────────────────────────────────────────────

static RESOLVED: OnceLock<PathBuf> = OnceLock::new();

/// Path to a PDFium library, downloading it into the cache if needed.
pub fn ensure_library(progress: Option<&DownloadProgress<'_>>) -> Result<PathBuf, LoaderError> {
    if let Some(path) = RESOLVED.get() {
        return Ok(path.clone());
    }
    let path = match locate() {
        Some(path) => {
            debug!("Using PDFium at {}", path.display());
            path
        }
        None => download_into_cache(progress)?,
    };
    Ok(RESOLVED.get_or_init(|| path).clone())
}

/// Bind PDFium, downloading it first if needed.
pub fn bind_pdfium(progress: Option<&DownloadProgress<'_>>) -> Result<Pdfium, LoaderError> {
    let path = ensure_library(progress)?;
    bind_from(&path)
}

/// Bind the library at `path` without consulting the cache.
pub fn bind_from(path: &Path) -> Result<Pdfium, LoaderError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| LoaderError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn download_into_cache(progress: Option<&DownloadProgress<'_>>) -> Result<PathBuf, LoaderError> {
    let platform = Platform::current()?;
    let dir = cache_dir();
    fs::create_dir_all(&dir).map_err(|source| LoaderError::Cache {
        path: dir.clone(),
        source,
    })?;

    let url = platform.download_url();
    info!("Downloading PDFium {PDFIUM_RELEASE} from {url}");
    let archive = fetch(&url, progress)?;

    let dest = dir.join(platform.file_name);
    unpack_member(&archive, platform.member, &dest)?;
    info!("PDFium cached at {}", dest.display());
    Ok(dest)
}

fn fetch(url: &str, progress: Option<&DownloadProgress<'_>>) -> Result<Vec<u8>, LoaderError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-loader/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| LoaderError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| LoaderError::Download(format!("GET {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(LoaderError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    read_body(&mut response, total, progress)
        .map_err(|e| LoaderError::Download(format!("reading body: {e}")))
}

/// Read `reader` to the end, reporting progress after every chunk.
///
/// `total` is only a hint: the reservation is capped at [`MAX_PREALLOC`] and
/// the buffer grows with what actually arrives.
fn read_body(
    reader: &mut impl Read,
    total: Option<u64>,
    progress: Option<&DownloadProgress<'_>>,
) -> io::Result<Vec<u8>> {
    let mut body = Vec::with_capacity(total.unwrap_or(0).min(MAX_PREALLOC) as usize);
    let mut chunk = vec![0u8; CHUNK];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        body.extend_from_slice(&chunk[..n]);
        if let Some(cb) = progress {
            cb(body.len() as u64, total);
        }
    }
    Ok(body)
}

/// Extract `member` from a `.tgz` into `dest`.
///
/// The library is unpacked next to `dest` and renamed into place, so a
/// crashed extraction never leaves a truncated library in the cache.
fn unpack_member(tgz: &[u8], member: &str, dest: &Path) -> Result<(), LoaderError> {
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(tgz));
    let entries = archive
        .entries()
        .map_err(|e| LoaderError::Extract(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| LoaderError::Extract(e.to_string()))?;
        let matches = entry
            .path()
            .map(|p| p.to_string_lossy() == member)
            .map_err(|e| LoaderError::Extract(e.to_string()))?;
        if !matches {
            continue;
        }

        let partial = dest.with_extension("partial");
        entry
            .unpack(&partial)
            .map_err(|e| LoaderError::Extract(format!("unpacking {member}: {e}")))?;
        fs::rename(&partial, dest).map_err(|source| LoaderError::Cache {
            path: dest.to_path_buf(),
            source,
        })?;
        return Ok(());
    }

    Err(LoaderError::Extract(format!("'{member}' missing from archive")))
}
