//! ZeroMQ session transport.

use std::time::Duration;

use zmq::SocketType;

use crate::error::{Error, Result};
use crate::process::{prepend_transport, EngineProcess, ProcessConfig};
use omdrive::expr::Expr;
use omdrive::{Installation, Session};

/// Settings for establishing a session over zmq.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Receive timeout for replies. `None` blocks until the engine answers,
    /// which matches how long compilations can legitimately take. A session
    /// that has timed out is out of step with the engine and has to be
    /// dropped and reconnected.
    pub recv_timeout: Option<Duration>,
    /// Settings used when the session spawns its own engine process
    pub process: ProcessConfig,
}

/// Request-reply session with an engine over a zmq `REQ` socket.
///
/// # Owning the engine process
///
/// A session obtained through [`spawn`](ZmqSession::spawn) manages the
/// engine process it started and tears it down when dropped. A session
/// obtained through [`connect`](ZmqSession::connect) attaches to an
/// engine someone else started and leaves it running.
pub struct ZmqSession {
    ctx: zmq::Context,
    socket: zmq::Socket,
    process: Option<EngineProcess>,
}

impl ZmqSession {
    /// Spawns a new engine process and connects to it.
    pub fn spawn(install: &Installation) -> Result<Self> {
        Self::spawn_with_config(install, SessionConfig::default())
    }

    pub fn spawn_with_config(install: &Installation, config: SessionConfig) -> Result<Self> {
        let process = EngineProcess::spawn_with_config(install, config.process.clone())?;
        let mut session = Self::connect_with_config(process.endpoint(), &config)?;
        session.process = Some(process);
        Ok(session)
    }

    /// Connects to an engine that is already listening at the given
    /// endpoint.
    pub fn connect(endpoint: &str) -> Result<Self> {
        Self::connect_with_config(endpoint, &SessionConfig::default())
    }

    pub fn connect_with_config(endpoint: &str, config: &SessionConfig) -> Result<Self> {
        let ctx = zmq::Context::new();
        let socket = ctx.socket(SocketType::REQ)?;
        if let Some(timeout) = config.recv_timeout {
            socket.set_rcvtimeo(timeout_millis(timeout))?;
        }
        socket.connect(&prepend_transport(endpoint))?;

        let mut session = Self {
            ctx,
            socket,
            process: None,
        };
        session.handshake()?;
        Ok(session)
    }

    /// Engine process owned by this session, if it spawned one.
    pub fn process(&self) -> Option<&EngineProcess> {
        self.process.as_ref()
    }

    /// Asks the engine to shut down. The reply is not waited for.
    pub fn quit(&mut self) -> Result<()> {
        self.socket.set_sndtimeo(100)?;
        self.socket.send(Expr::Quit.to_string().as_str(), 0)?;
        Ok(())
    }

    // Confirms there is a live engine on the other end before handing the
    // session out.
    fn handshake(&mut self) -> Result<()> {
        let reply = self.request(&Expr::GetVersion.to_string())?;
        if reply.trim().is_empty() {
            return Err(Error::HandshakeFailed(reply));
        }
        debug!("connected to engine: {}", reply.trim());
        Ok(())
    }

    fn request(&mut self, expr: &str) -> Result<String> {
        trace!("sending: {}", expr);
        self.socket.send(expr, 0)?;
        let bytes = match self.socket.recv_bytes(0) {
            Ok(bytes) => bytes,
            // the req socket keeps awaiting the reply that never came,
            // after this the session can only be dropped
            Err(zmq::Error::EAGAIN) => return Err(Error::TimedOut),
            Err(e) => return Err(e.into()),
        };
        let reply = String::from_utf8_lossy(&bytes).to_string();
        trace!("received: {}", reply);
        Ok(reply)
    }
}

impl Session for ZmqSession {
    fn send_expression(&mut self, expr: &str) -> omdrive::Result<String> {
        self.request(expr)
            .map_err(|e| omdrive::Error::SessionError(e.to_string()))
    }
}

impl Drop for ZmqSession {
    fn drop(&mut self) {
        // only spawn-owned engines get the teardown quit
        if self.process.is_none() {
            return;
        }
        if let Err(e) = self.quit() {
            debug!("failed sending quit on teardown: {}", e);
        }
    }
}

fn timeout_millis(timeout: Duration) -> i32 {
    timeout.as_millis().min(std::i32::MAX as u128) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_timeouts_saturate_at_i32_max() {
        assert_eq!(timeout_millis(Duration::from_millis(250)), 250);
        assert_eq!(timeout_millis(Duration::from_secs(1u64 << 40)), std::i32::MAX);
    }

    #[test]
    fn dropping_an_attached_session_sends_no_quit() {
        let sink_ctx = zmq::Context::new();
        let sink = sink_ctx.socket(SocketType::REP).unwrap();
        sink.bind("tcp://127.0.0.1:*").unwrap();
        let endpoint = sink.get_last_endpoint().unwrap().unwrap();

        let ctx = zmq::Context::new();
        let socket = ctx.socket(SocketType::REQ).unwrap();
        socket.connect(&endpoint).unwrap();
        drop(ZmqSession {
            ctx,
            socket,
            process: None,
        });

        sink.set_rcvtimeo(200).unwrap();
        assert!(matches!(sink.recv_bytes(0), Err(zmq::Error::EAGAIN)));
    }
}
