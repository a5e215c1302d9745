// ── File-backed supplicant channel ──

use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{BridgeError, SupplicantChannel};

/// Well-known locations of the P2P supplicant configuration.
pub const CONF_PATH_VENDOR: &str = "/data/vendor/wifi/wpa/p2p_supplicant.conf";
pub const CONF_PATH_LEGACY: &str = "/data/misc/wifi/p2p_supplicant.conf";

/// Reads and writes a `p2p_supplicant.conf` directly.
///
/// Writes go to a sibling temp file first and are renamed into place. The
/// replacement keeps the mode and, where permitted, the owner of the file
/// it replaces.
#[derive(Debug, Clone)]
pub struct FileChannel {
    path: PathBuf,
}

impl FileChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    async fn replace_with(
        &self,
        tmp: &Path,
        contents: &str,
        original: Option<&Metadata>,
    ) -> std::io::Result<()> {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(tmp).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        if let Some(meta) = original {
            tokio::fs::set_permissions(tmp, meta.permissions()).await?;
            #[cfg(unix)]
            keep_owner(tmp, meta);
        }
        tokio::fs::rename(tmp, &self.path).await
    }

    fn map_io(&self, err: &std::io::Error) -> BridgeError {
        match err.kind() {
            ErrorKind::InvalidData => BridgeError::ParseFailure {
                reason: format!("{} is not valid UTF-8", self.path.display()),
            },
            _ => BridgeError::Unavailable {
                reason: format!("{}: {err}", self.path.display()),
            },
        }
    }
}

impl SupplicantChannel for FileChannel {
    async fn read_config(&self) -> Result<String, BridgeError> {
        debug!(path = %self.path.display(), "reading supplicant configuration");
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.map_io(&e))
    }

    async fn write_config(&self, contents: String) -> Result<(), BridgeError> {
        let tmp = self.tmp_path();
        let original = tokio::fs::metadata(&self.path).await.ok();
        if let Err(e) = self.replace_with(&tmp, &contents, original.as_ref()).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %cleanup, "stale temp file left behind");
                }
            }
            return Err(self.map_io(&e));
        }
        debug!(path = %self.path.display(), "supplicant configuration written");
        Ok(())
    }
}

/// Best effort: only a privileged writer may hand the file back to its owner.
#[cfg(unix)]
fn keep_owner(path: &Path, original: &Metadata) {
    use std::os::unix::fs::MetadataExt;

    if let Err(e) = std::os::unix::fs::chown(path, Some(original.uid()), Some(original.gid())) {
        warn!(
            path = %path.display(),
            error = %e,
            "could not keep supplicant configuration owner"
        );
    }
}
