//! Engine process management.
//!
//! Spawning a compiler process and discovering its listening endpoint is
//! separate from talking to it. `EngineProcess` only handles the former,
//! so a session transport can also attach to an engine started by hand.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::error::{Error, Result};
use omdrive::Installation;

/// Settings for spawning and monitoring an engine process.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// How many times to poll for the port file before giving up
    pub port_file_retries: u32,
    /// Pause between polls
    pub retry_interval: Duration,
    /// Additional arguments passed to the engine binary
    pub extra_args: Vec<String>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            port_file_retries: 50,
            retry_interval: Duration::from_millis(100),
            extra_args: Vec::new(),
        }
    }
}

/// Managed engine process running in interactive mode.
///
/// # Port file
///
/// The engine is started with a random session suffix and publishes the
/// address it listens on in a port file under the system temp directory,
/// named `openmodelica.<user>.port.<suffix>`. Spawning blocks until that
/// file shows up with a usable endpoint, or until the configured retries
/// run out. The process is killed and the port file removed on drop.
pub struct EngineProcess {
    child: Child,
    port_file: PathBuf,
    endpoint: String,
}

impl EngineProcess {
    /// Spawns an engine process from the given installation with default
    /// settings.
    pub fn spawn(install: &Installation) -> Result<Self> {
        Self::spawn_with_config(install, ProcessConfig::default())
    }

    /// Spawns an engine process and waits for it to publish its endpoint.
    pub fn spawn_with_config(install: &Installation, config: ProcessConfig) -> Result<Self> {
        install.verify()?;
        let suffix = random_suffix(10);
        let port_file = port_file_path(&suffix);

        let mut child = Command::new(install.binary_path())
            .arg("--interactive=zmq")
            .arg(format!("-z={}", suffix))
            .args(&config.extra_args)
            .env(omdrive::HOME_ENV_VAR, &install.home)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::SpawnFailed(e.to_string()))?;
        debug!(
            "engine process started, pid: {}, port file: {}",
            child.id(),
            port_file.to_string_lossy()
        );

        match wait_for_port_file(&mut child, &port_file, &config) {
            Ok(endpoint) => {
                info!("engine listening at {}", endpoint);
                Ok(Self {
                    child,
                    port_file,
                    endpoint,
                })
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(e)
            }
        }
    }

    /// Endpoint the engine listens on, including the transport prefix.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Kills the engine process and cleans up its port file.
    pub fn shutdown(&mut self) -> Result<()> {
        let _ = self.child.kill();
        self.child.wait()?;
        if self.port_file.is_file() {
            fs::remove_file(&self.port_file)?;
        }
        Ok(())
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("failed shutting down engine process: {}", e);
        }
    }
}

fn wait_for_port_file(child: &mut Child, port_file: &Path, config: &ProcessConfig) -> Result<String> {
    for _ in 0..config.port_file_retries {
        if let Some(status) = child.try_wait()? {
            return Err(Error::SpawnFailed(format!(
                "engine process exited early with status: {}",
                status
            )));
        }
        if let Some(endpoint) = read_port_file(port_file)? {
            return Ok(endpoint);
        }
        thread::sleep(config.retry_interval);
    }
    Err(Error::PortFileNotFound(
        config.port_file_retries,
        port_file.to_string_lossy().to_string(),
    ))
}

fn read_port_file(port_file: &Path) -> Result<Option<String>> {
    if !port_file.is_file() {
        return Ok(None);
    }
    let contents = fs::read_to_string(port_file)?;
    parse_endpoint(&contents).map(Some)
}

fn parse_endpoint(contents: &str) -> Result<String> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidPortFile("file was empty".to_string()));
    }
    Ok(prepend_transport(trimmed))
}

pub(crate) fn prepend_transport(s: &str) -> String {
    if s.contains("://") {
        s.to_string()
    } else {
        format!("tcp://{}", s)
    }
}

fn port_file_path(suffix: &str) -> PathBuf {
    env::temp_dir().join(format!("openmodelica.{}.port.{}", current_user(), suffix))
}

fn current_user() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "nobody".to_string())
}

fn random_suffix(len: usize) -> String {
    thread_rng().sample_iter(&Alphanumeric).take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_gets_transport_prepended() {
        assert_eq!(
            prepend_transport("127.0.0.1:43985"),
            "tcp://127.0.0.1:43985"
        );
        assert_eq!(
            prepend_transport("tcp://127.0.0.1:43985"),
            "tcp://127.0.0.1:43985"
        );
        assert_eq!(
            prepend_transport("ipc:///tmp/engine.sock"),
            "ipc:///tmp/engine.sock"
        );
    }

    #[test]
    fn port_file_contents_become_an_endpoint() {
        assert_eq!(
            parse_endpoint(" 127.0.0.1:43985\n").unwrap(),
            "tcp://127.0.0.1:43985"
        );
        assert!(parse_endpoint("  \n").is_err());
    }

    #[test]
    fn port_file_name_carries_user_and_suffix() {
        let path = port_file_path("a1b2c3");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("openmodelica."));
        assert!(name.ends_with(".port.a1b2c3"));
    }

    #[test]
    fn suffixes_are_alphanumeric() {
        let suffix = random_suffix(10);
        assert_eq!(suffix.len(), 10);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn missing_port_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openmodelica.nobody.port.xyz");
        assert!(read_port_file(&path).unwrap().is_none());

        fs::write(&path, "127.0.0.1:39861\n").unwrap();
        assert_eq!(
            read_port_file(&path).unwrap().unwrap(),
            "tcp://127.0.0.1:39861"
        );
    }
}
