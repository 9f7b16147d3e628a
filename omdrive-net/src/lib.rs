//! This library connects `omdrive` to an actual engine process.
//!
//! `omdrive-core` is transport-agnostic. It defines the `Session` trait
//! and everything layered on top of it, but on its own it cannot reach
//! any engine. The two pieces that close the gap live here.
//!
//! [`EngineProcess`] launches the engine binary in interactive mode and
//! discovers the endpoint it bound. The engine announces itself through
//! a port file in the system temp directory, named after the current
//! user and a one-off suffix passed on the command line. Spawning blocks
//! until that file shows up, with a bounded number of polls. The
//! installation root is handed to the child through its environment
//! only, the parent process environment is never touched.
//!
//! [`ZmqSession`] wraps a single ZeroMQ request socket speaking the
//! engine's text protocol and implements the core `Session` trait, so a
//! connected session can be passed straight to `omdrive_core::run`.
//!
//!
//! # Using the transport ("driver")
//!
//! Due to the way `cargo` handles crate features, and to keep builds
//! free of the native ZeroMQ dependency unless it is actually wanted,
//! this crate doesn't enable the driver by default. To actually connect
//! to an engine:
//!
//! ```toml
//! omdrive-net = { version = "*", features = ["zmq_transport"] }
//! ```
//!
//! Without the feature only the process management half is compiled.
//!
//! ## Example
//!
//! ```ignore
//! extern crate omdrive_core as omdrive;
//!
//! use omdrive::{Installation, SimulationRequest};
//! use omdrive_net::ZmqSession;
//!
//! pub fn main() {
//!     let install = Installation::detect();
//!     let mut session = ZmqSession::spawn(&install).unwrap();
//!     let request = SimulationRequest::new("Machine.Drive")
//!         .in_dirs("./work", "./work/sim");
//!     let outcome = omdrive::run(&mut session, &request).unwrap();
//!     println!("ran {} steps", outcome.report.steps.len());
//! }
//! ```
//!
//! [`EngineProcess`]: process/struct.EngineProcess.html
//! [`ZmqSession`]: session/struct.ZmqSession.html

#![allow(unused)]

#[macro_use]
extern crate log;

extern crate omdrive_core as omdrive;

mod error;

pub mod process;

#[cfg(feature = "zmq_transport")]
pub mod session;

pub use error::{Error, Result};
pub use process::{EngineProcess, ProcessConfig};

#[cfg(feature = "zmq_transport")]
pub use session::{SessionConfig, ZmqSession};
