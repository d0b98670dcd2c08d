use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ssh2::{ErrorCode, Session, Sftp};

use crate::api::error;
use crate::modules::storage::{validate_name, BlobStore};
use crate::utils::format_size;

// libssh2 LIBSSH2_FX_NO_SUCH_FILE
const FX_NO_SUCH_FILE: i32 = 2;

struct Settings {
    host: String,
    port: u16,
    username: String,
    password: String,
    remote_dir: String,
    timeout: Duration,
}

/// Blobs on a remote host over SFTP.
///
/// Each operation opens its own SSH session and closes it when done, so no
/// connection state is shared between requests. libssh2 is blocking, so the
/// work runs on the blocking pool.
#[derive(Clone)]
pub struct SftpStore {
    settings: Arc<Settings>,
}

struct Connection {
    session: Session,
    sftp: Sftp,
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.session.disconnect(None, "closing", None);
    }
}

fn is_not_found(err: &ssh2::Error) -> bool {
    err.code() == ErrorCode::SFTP(FX_NO_SUCH_FILE)
}

/// Forward slashes and no trailing slash, except for the root itself.
fn normalize_dir(dir: &str) -> String {
    let dir = dir.replace('\\', "/");
    match dir.trim_end_matches('/') {
        "" if dir.starts_with('/') => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// libssh2 takes milliseconds as a u32; longer timeouts saturate.
fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

impl SftpStore {
    pub fn new(
        host: String,
        port: u16,
        username: String,
        password: String,
        remote_dir: String,
        timeout: Duration,
    ) -> Self {
        let remote_dir = normalize_dir(&remote_dir);
        Self { settings: Arc::new(Settings { host, port, username, password, remote_dir, timeout }) }
    }

    /// `remote_dir` is already normalised.
    fn remote_path(remote_dir: &str, name: &str) -> PathBuf {
        PathBuf::from(format!("{}/{}", remote_dir.trim_end_matches('/'), name))
    }

    fn connect(settings: &Settings) -> Result<Connection, error::SystemError> {
        let addr = (settings.host.as_str(), settings.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                std::io::Error::other(format!("Cannot resolve {}", settings.host))
            })?;

        let tcp = TcpStream::connect_timeout(&addr, settings.timeout)?;
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.set_timeout(timeout_millis(settings.timeout));
        session.handshake()?;
        session.userauth_password(&settings.username, &settings.password)?;
        if !session.authenticated() {
            return Err(error::SystemError::InternalError(
                format!("SFTP authentication failed for {}", settings.username).into(),
            ));
        }

        let sftp = session.sftp()?;
        Self::mkdir_p(&sftp, Path::new(&settings.remote_dir));

        Ok(Connection { session, sftp })
    }

    /// Creates every missing component of `dir`, outermost first.
    fn mkdir_p(sftp: &Sftp, dir: &Path) {
        if sftp.stat(dir).is_ok() {
            return;
        }

        let mut missing: Vec<&Path> =
            dir.ancestors().filter(|p| !p.as_os_str().is_empty() && *p != Path::new("/")).collect();
        missing.reverse();

        for path in missing {
            if sftp.stat(path).is_err() {
                // a concurrent request may have created it already
                if let Err(e) = sftp.mkdir(path, 0o755) {
                    log::debug!("mkdir {} failed: {}", path.display(), e);
                }
            }
        }
    }

    async fn run<T, F>(&self, name: &str, op: F) -> Result<T, error::SystemError>
    where
        T: Send + 'static,
        F: FnOnce(&Sftp, PathBuf) -> Result<T, error::SystemError> + Send + 'static,
    {
        validate_name(name)?;
        let settings = self.settings.clone();
        let path = Self::remote_path(&settings.remote_dir, name);

        tokio::task::spawn_blocking(move || {
            let conn = Self::connect(&settings)?;
            op(&conn.sftp, path)
        })
        .await
        .map_err(|e| error::SystemError::InternalError(Box::new(e)))?
    }
}

#[async_trait::async_trait]
impl BlobStore for SftpStore {
    fn backend(&self) -> &'static str {
        "sftp"
    }

    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), error::SystemError> {
        let bytes = bytes.to_vec();
        let len = bytes.len();
        self.run(name, move |sftp, path| {
            let mut file = sftp.create(&path)?;
            file.write_all(&bytes)?;
            drop(file);

            // confirm the write landed before the caller records metadata
            sftp.stat(&path).map_err(|_| {
                error::SystemError::InternalError(
                    format!("Upload of {} could not be verified", path.display()).into(),
                )
            })?;
            log::debug!("SFTP put {} ({})", path.display(), format_size(len as u64));
            Ok(())
        })
        .await
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, error::SystemError> {
        self.run(name, |sftp, path| {
            let mut file = sftp.open(&path).map_err(|e| {
                if is_not_found(&e) {
                    error::SystemError::not_found("File not found in storage")
                } else {
                    e.into()
                }
            })?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            Ok(buf)
        })
        .await
    }

    async fn delete(&self, name: &str) -> Result<(), error::SystemError> {
        self.run(name, |sftp, path| match sftp.unlink(&path) {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(e.into()),
        })
        .await
    }

    async fn exists(&self, name: &str) -> Result<bool, error::SystemError> {
        self.run(name, |sftp, path| match sftp.stat(&path) {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e.into()),
        })
        .await
    }

    async fn size(&self, name: &str) -> Result<u64, error::SystemError> {
        self.run(name, |sftp, path| match sftp.stat(&path) {
            Ok(stat) => Ok(stat.size.unwrap_or(0)),
            Err(e) if is_not_found(&e) => {
                Err(error::SystemError::not_found("File not found in storage"))
            }
            Err(e) => Err(e.into()),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(remote_dir: &str) -> SftpStore {
        SftpStore::new(
            "unreachable.invalid".to_string(),
            22,
            "nobody".to_string(),
            String::new(),
            remote_dir.to_string(),
            Duration::from_millis(10),
        )
    }

    #[test]
    fn test_remote_dir_normalised_once_for_mkdir_and_paths() {
        assert_eq!(normalize_dir("/data/uploads"), "/data/uploads");
        assert_eq!(normalize_dir("/data/uploads//"), "/data/uploads");
        assert_eq!(normalize_dir("\\data\\uploads\\"), "/data/uploads");
        assert_eq!(normalize_dir("uploads/"), "uploads");
        assert_eq!(normalize_dir("/"), "/");
        assert_eq!(normalize_dir("\\"), "/");

        let settings = store("\\srv\\docs\\").settings;
        assert_eq!(settings.remote_dir, "/srv/docs");
        assert_eq!(
            SftpStore::remote_path(&settings.remote_dir, "a.txt"),
            PathBuf::from("/srv/docs/a.txt")
        );
        assert_eq!(
            Path::new(&settings.remote_dir).ancestors().collect::<Vec<_>>(),
            vec![Path::new("/srv/docs"), Path::new("/srv"), Path::new("/")]
        );

        let root = store("/").settings;
        assert_eq!(SftpStore::remote_path(&root.remote_dir, "a.txt"), PathBuf::from("/a.txt"));
    }

    #[test]
    fn test_timeout_saturates_instead_of_wrapping() {
        assert_eq!(timeout_millis(Duration::from_secs(10)), 10_000);
        assert_eq!(timeout_millis(Duration::from_millis(u64::from(u32::MAX))), u32::MAX);
        // 2^32 ms would wrap to 0, which libssh2 reads as "no timeout"
        assert_eq!(timeout_millis(Duration::from_millis(1 << 32)), u32::MAX);
        assert_eq!(timeout_millis(Duration::from_secs(u64::MAX)), u32::MAX);
    }

    #[actix_web::test]
    async fn test_invalid_name_rejected_before_connecting() {
        let store = store("/tmp");
        assert!(matches!(
            store.exists("../x").await,
            Err(error::SystemError::BadRequest(_))
        ));
    }
}
