use std::fs::{self, File};
use std::io::{self, ErrorKind, Read};
use std::net::TcpStream;
use std::path::Path;
use std::thread;
use std::time::Duration;

use ssh2::{HashType, Session};
use tracing::debug;

use crate::domain::Credentials;
use crate::error::{ParprintError, Result};
use crate::remote::session::{CommandOutput, RemoteSession};

pub const DEFAULT_HOST: &str = "stu.comp.nus.edu.sg";
pub const DEFAULT_PORT: u16 = 22;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Password-authenticated SSH session; files go over SCP.
pub struct SshSession {
    session: Session,
    host: String,
    closed: bool,
}

impl SshSession {
    pub fn connect(host: &str, port: u16, creds: &Credentials) -> Result<Self> {
        let tcp = TcpStream::connect((host, port))?;
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;

        // Any host key is accepted; record what we saw.
        if let Some(hash) = session.host_key_hash(HashType::Sha256) {
            debug!(host, fingerprint = %hex::encode(hash), "host key");
        }

        session.userauth_password(&creds.username, creds.secret())?;
        if !session.authenticated() {
            return Err(ParprintError::Auth {
                user: creds.username.clone(),
                host: host.to_string(),
            });
        }
        debug!(host, user = %creds.username, "ssh session established");
        Ok(Self {
            session,
            host: host.to_string(),
            closed: false,
        })
    }

}

/// Read both streams until `finished` says the far end is done, never
/// waiting on one while the other has data queued.
fn drain_both<O: Read, E: Read>(
    out: &mut O,
    err: &mut E,
    mut finished: impl FnMut() -> bool,
) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut buf = [0u8; 16 * 1024];
    loop {
        let a = pump(out, &mut buf, &mut stdout)?;
        let b = pump(err, &mut buf, &mut stderr)?;
        if a == 0 && b == 0 {
            if finished() {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
    Ok((stdout, stderr))
}

fn pump<R: Read>(r: &mut R, buf: &mut [u8], into: &mut Vec<u8>) -> io::Result<usize> {
    match r.read(buf) {
        Ok(n) => {
            into.extend_from_slice(&buf[..n]);
            Ok(n)
        }
        Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => Ok(0),
        Err(e) => Err(e),
    }
}

impl RemoteSession for SshSession {
    fn exec(&self, command: &str) -> Result<CommandOutput> {
        let mut channel = self.session.channel_session()?;
        channel.exec(command)?;

        // stdout and stderr share one window; read them side by side.
        self.session.set_blocking(false);
        let drained = drain_both(&mut channel.stream(0), &mut channel.stderr(), || channel.eof());
        self.session.set_blocking(true);
        let (stdout, stderr) = drained?;

        channel.wait_close()?;
        Ok(CommandOutput::from_bytes(channel.exit_status()?, &stdout, &stderr))
    }

    fn upload(&self, local: &Path, remote: &str) -> Result<()> {
        let size = fs::metadata(local)?.len();
        let mut src = File::open(local)?;
        let mut channel = self.session.scp_send(Path::new(remote), 0o644, size, None)?;
        let sent = io::copy(&mut src, &mut channel)?;
        if sent != size {
            return Err(ParprintError::Transport(format!(
                "{}: sent {sent} of {size} bytes",
                local.display()
            )));
        }
        channel.send_eof()?;
        channel.wait_eof()?;
        channel.close()?;
        channel.wait_close()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            debug!(host = %self.host, "disconnect");
            self.session.disconnect(None, "parprint done", None)?;
        }
        Ok(())
    }
}
