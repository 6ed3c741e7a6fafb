use crate::RemoteResult;
use crate::config::DeployConfig;
use anyhow::{Context, bail};
use ssh2::{Session, Sftp};
use std::fs::{self, File};
use std::io::{self, Read};
use std::net::TcpStream;
use std::path::Path;
use walkdir::WalkDir;

/// A password-authenticated SSH session to the deployment server.
///
/// Host keys are not verified: the pipeline targets a disposable staging
/// host and the credentials already travel as plaintext environment
/// variables. Sessions live for a single stage invocation.
pub struct RemoteSession {
    session: Session,
}

impl RemoteSession {
    /// Open a TCP connection, perform the SSH handshake, and authenticate
    /// with the configured password.
    pub fn connect(config: &DeployConfig) -> RemoteResult<Self> {
        let addr = format!("{}:{}", config.hostname, config.port);
        let tcp = TcpStream::connect(&addr)
            .with_context(|| format!("failed to connect to deployment server {addr}"))?;

        let mut session = Session::new().context("failed to create SSH session")?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .with_context(|| format!("SSH handshake with {addr} failed"))?;
        session
            .userauth_password(&config.username, &config.password)
            .with_context(|| format!("password authentication failed for {}", config.username))?;
        if !session.authenticated() {
            bail!("SSH session is not authenticated after password auth");
        }

        Ok(Self { session })
    }

    /// Create every missing directory along `path`, like `mkdir -p`.
    pub fn mkdir_p(&self, path: &str) -> RemoteResult<()> {
        let sftp = self.sftp()?;
        let mut current = if path.starts_with('/') {
            String::from("/")
        } else {
            String::new()
        };

        for part in path.split('/').filter(|p| !p.is_empty()) {
            if !current.is_empty() && !current.ends_with('/') {
                current.push('/');
            }
            current.push_str(part);

            if sftp.stat(Path::new(&current)).is_err() {
                sftp.mkdir(Path::new(&current), 0o755)
                    .with_context(|| format!("failed to create remote directory {current}"))?;
            }
        }
        Ok(())
    }

    /// Recursively upload the contents of `local` into the remote directory
    /// `remote` (which must already exist; see [`RemoteSession::mkdir_p`]).
    pub fn put_dir(&self, local: &Path, remote: &str) -> RemoteResult<()> {
        let sftp = self.sftp()?;

        for entry in WalkDir::new(local) {
            let entry = entry
                .with_context(|| format!("failed to walk local directory {}", local.display()))?;
            let relative = entry
                .path()
                .strip_prefix(local)
                .context("walked entry escapes its root")?;
            if relative.as_os_str().is_empty() {
                continue;
            }
            let target = format!("{remote}/{}", unix_path(relative)?);

            if entry.file_type().is_dir() {
                if sftp.stat(Path::new(&target)).is_err() {
                    sftp.mkdir(Path::new(&target), 0o755)
                        .with_context(|| format!("failed to create remote directory {target}"))?;
                }
            } else if entry.file_type().is_file() {
                let mut source = File::open(entry.path())
                    .with_context(|| format!("failed to open {}", entry.path().display()))?;
                let mut sink = sftp
                    .create(Path::new(&target))
                    .with_context(|| format!("failed to create remote file {target}"))?;
                io::copy(&mut source, &mut sink)
                    .with_context(|| format!("failed to upload {target}"))?;
            }
        }
        Ok(())
    }

    /// Recursively download the contents of the remote directory `remote`
    /// into `local`, creating `local` if needed.
    pub fn get_dir(&self, remote: &str, local: &Path) -> RemoteResult<()> {
        let sftp = self.sftp()?;
        fs::create_dir_all(local)
            .with_context(|| format!("failed to create local directory {}", local.display()))?;
        download_into(&sftp, remote, local)
    }

    /// Run a shell command remotely and return (stdout, stderr).
    ///
    /// The caller decides what stderr means; the deploy stage treats any
    /// non-empty stderr as a failed deployment.
    pub fn exec(&self, command: &str) -> RemoteResult<(String, String)> {
        let mut channel = self
            .session
            .channel_session()
            .context("failed to open SSH exec channel")?;
        channel
            .exec(command)
            .with_context(|| format!("failed to execute remote command: {command}"))?;

        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .context("failed to read remote stdout")?;
        let mut stderr = String::new();
        channel
            .stderr()
            .read_to_string(&mut stderr)
            .context("failed to read remote stderr")?;

        let _ = channel.wait_close();
        Ok((stdout, stderr))
    }

    fn sftp(&self) -> RemoteResult<Sftp> {
        self.session
            .sftp()
            .context("failed to open SFTP subsystem")
    }
}

fn download_into(sftp: &Sftp, remote_dir: &str, local_dir: &Path) -> RemoteResult<()> {
    let entries = sftp
        .readdir(Path::new(remote_dir))
        .with_context(|| format!("failed to list remote directory {remote_dir}"))?;

    for (remote_path, stat) in entries {
        let name = remote_path
            .file_name()
            .with_context(|| format!("remote entry without a name under {remote_dir}"))?;
        let local_path = local_dir.join(name);
        let remote_child = format!(
            "{}/{}",
            remote_dir.trim_end_matches('/'),
            name.to_string_lossy()
        );

        if stat.is_dir() {
            fs::create_dir_all(&local_path).with_context(|| {
                format!("failed to create local directory {}", local_path.display())
            })?;
            download_into(sftp, &remote_child, &local_path)?;
        } else {
            let mut source = sftp
                .open(Path::new(&remote_child))
                .with_context(|| format!("failed to open remote file {remote_child}"))?;
            let mut sink = File::create(&local_path)
                .with_context(|| format!("failed to create {}", local_path.display()))?;
            io::copy(&mut source, &mut sink)
                .with_context(|| format!("failed to download {remote_child}"))?;
        }
    }
    Ok(())
}

/// Render a relative path with forward slashes for the remote side.
fn unix_path(path: &Path) -> RemoteResult<String> {
    let parts: Vec<&str> = path
        .components()
        .map(|c| {
            c.as_os_str()
                .to_str()
                .context("local path is not valid UTF-8")
        })
        .collect::<RemoteResult<_>>()?;
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_path_joins_components_with_forward_slashes() {
        let path = Path::new("model-3").join("assets").join("weights.mpk");
        assert_eq!(unix_path(&path).unwrap(), "model-3/assets/weights.mpk");
    }
}
