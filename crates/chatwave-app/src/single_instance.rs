//! Single-instance guard
//!
//! The running instance owns a loopback TCP listener and records its port in a lock file inside
//! the data directory. A later launch reads the port, sends `activate` and steps aside once the
//! holder acknowledges. A port that accepts but never acknowledges belongs to someone else.

use chatwave_core::{ChatwaveError, ChatwaveResult};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const ACTIVATE: &str = "activate";
const ACK: &str = "ok";
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const ACK_TIMEOUT: Duration = Duration::from_secs(1);
const CLAIM_ATTEMPTS: u32 = 2;
const READ_ATTEMPTS: u32 = 3;
const READ_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Outcome of trying to become the running instance
#[derive(Debug)]
pub enum InstanceLock {
    /// This process owns the lock
    Primary(InstanceGuard),
    /// Another instance was asked to come forward; this process should exit
    Secondary,
}

/// Ownership of the lock file and its listener. The file is removed on drop.
#[derive(Debug)]
pub struct InstanceGuard {
    path: PathBuf,
    listener: Option<TcpListener>,
}

impl InstanceGuard {
    pub fn port(&self) -> Option<u16> {
        self.listener
            .as_ref()
            .and_then(|l| l.local_addr().ok())
            .map(|addr| addr.port())
    }

    /// Accept activation requests on a background thread, calling `on_activate` for each
    pub fn listen<F>(&mut self, on_activate: F) -> ChatwaveResult<()>
    where
        F: Fn() + Send + 'static,
    {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| ChatwaveError::instance("Listener already started"))?;

        std::thread::Builder::new()
            .name("instance-listener".into())
            .spawn(move || {
                for stream in listener.incoming() {
                    let stream = match stream {
                        Ok(stream) => stream,
                        Err(e) => {
                            warn!("Instance listener accept failed: {}", e);
                            continue;
                        }
                    };

                    let mut line = String::new();
                    let mut reader = BufReader::new(stream);
                    if reader.read_line(&mut line).is_ok() && line.trim() == ACTIVATE {
                        if let Err(e) = writeln!(reader.get_mut(), "{}", ACK) {
                            warn!("Failed to acknowledge second launch: {}", e);
                        }
                        info!("Second launch detected, activating");
                        on_activate();
                    }
                }
            })?;

        Ok(())
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove instance lock {:?}: {}", self.path, e);
            }
        }
    }
}

/// Claim the lock at `path`, or hand off to the instance that holds it
pub fn acquire(path: impl AsRef<Path>) -> ChatwaveResult<InstanceLock> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    for attempt in 1..=CLAIM_ATTEMPTS {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let port = listener.local_addr()?.port();

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                file.write_all(port.to_string().as_bytes())?;
                debug!("Instance lock claimed on port {}", port);
                return Ok(InstanceLock::Primary(InstanceGuard {
                    path: path.to_path_buf(),
                    listener: Some(listener),
                }));
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                drop(listener);
                if signal_running_instance(path) {
                    return Ok(InstanceLock::Secondary);
                }

                warn!("Removing stale instance lock (attempt {})", attempt);
                if let Err(e) = std::fs::remove_file(path) {
                    if e.kind() != ErrorKind::NotFound {
                        return Err(e.into());
                    }
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ChatwaveError::instance(format!(
        "Could not claim instance lock at {:?}",
        path
    )))
}

/// Ask the lock holder to activate. False unless it acknowledges.
fn signal_running_instance(path: &Path) -> bool {
    let Some(port) = read_port(path) else {
        return false;
    };

    match handshake(port) {
        Ok(true) => {
            info!("Handed off to running instance on port {}", port);
            true
        }
        Ok(false) => {
            warn!("Port {} answered without acknowledging, lock is stale", port);
            false
        }
        Err(e) => {
            debug!("Running instance unreachable on port {}: {}", port, e);
            false
        }
    }
}

fn handshake(port: u16) -> std::io::Result<bool> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
    stream.set_read_timeout(Some(ACK_TIMEOUT))?;
    writeln!(stream, "{}", ACTIVATE)?;

    let mut reply = String::new();
    match BufReader::new(stream).read_line(&mut reply) {
        Ok(_) => Ok(reply.trim() == ACK),
        Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(false),
        Err(e) => Err(e),
    }
}

// The holder may still be writing the port, so an empty or partial file gets a few retries
fn read_port(path: &Path) -> Option<u16> {
    for attempt in 1..=READ_ATTEMPTS {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                if let Ok(port) = contents.trim().parse::<u16>() {
                    return Some(port);
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => warn!("Failed to read instance lock: {}", e),
        }
        if attempt < READ_ATTEMPTS {
            std::thread::sleep(READ_RETRY_DELAY);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_first_launch_is_primary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.lock");

        let lock = acquire(&path).unwrap();
        let InstanceLock::Primary(guard) = lock else {
            panic!("expected primary");
        };
        let recorded = std::fs::read_to_string(&path).unwrap();
        assert_eq!(recorded, guard.port().unwrap().to_string());
    }

    #[test]
    fn test_second_launch_activates_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.lock");

        let InstanceLock::Primary(mut guard) = acquire(&path).unwrap() else {
            panic!("expected primary");
        };
        let (tx, rx) = mpsc::channel();
        guard
            .listen(move || {
                let _ = tx.send(());
            })
            .unwrap();

        assert!(matches!(acquire(&path).unwrap(), InstanceLock::Secondary));
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_stale_lock_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.lock");

        // Bind and release a port so nothing is listening on it
        let port = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        std::fs::write(&path, port.to_string()).unwrap();

        assert!(matches!(acquire(&path).unwrap(), InstanceLock::Primary(_)));
    }

    #[test]
    fn test_silent_port_holder_is_not_an_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.lock");

        // Some other local service now owns the recorded port and never replies
        let squatter = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = squatter.local_addr().unwrap().port();
        std::fs::write(&path, port.to_string()).unwrap();

        let InstanceLock::Primary(guard) = acquire(&path).unwrap() else {
            panic!("expected primary");
        };
        assert_ne!(guard.port(), Some(port));
        drop(squatter);
    }

    #[test]
    fn test_listener_acknowledges_activation() {
        let dir = tempfile::tempdir().unwrap();
        let InstanceLock::Primary(mut guard) = acquire(dir.path().join("instance.lock")).unwrap() else {
            panic!("expected primary");
        };
        let port = guard.port().unwrap();
        guard.listen(|| {}).unwrap();

        assert!(handshake(port).unwrap());
    }

    #[test]
    fn test_garbage_lock_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.lock");
        std::fs::write(&path, "not a port").unwrap();

        assert!(matches!(acquire(&path).unwrap(), InstanceLock::Primary(_)));
    }

    #[test]
    fn test_lock_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.lock");

        let lock = acquire(&path).unwrap();
        assert!(path.exists());
        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_listen_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let InstanceLock::Primary(mut guard) = acquire(dir.path().join("instance.lock")).unwrap() else {
            panic!("expected primary");
        };
        guard.listen(|| {}).unwrap();
        assert!(guard.listen(|| {}).is_err());
    }
}
