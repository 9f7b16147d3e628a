//! This library implements the core simulation-driving functionality.
//!
//! Programming interface is centered around the [`SimulationRequest`]
//! structure and the [`run`] function. A request describes a single
//! simulation of a Modelica model: which system libraries to load, which
//! model files to bring in, where the engine should do its work and what
//! numeric options to simulate with. [`run`] pushes that request through
//! an interactive engine session, step by step, and hands back a
//! [`RunReport`] along with the parsed [`SimResults`].
//!
//! The heavy lifting is all done by the external engine. Compilation,
//! solving and result-file decoding happen on the other side of the
//! session; this library only prepares directories, issues commands in
//! the right order and moves the produced artifact into place.
//!
//!
//! # Networking
//!
//! By itself, this library does not talk to any engine process. It defines
//! the [`Session`] trait and everything layered on top of it. For a concrete
//! session implementation, including engine process startup and the ZeroMQ
//! request socket, see `omdrive-net`.
//!
//! # Using the library
//!
//! To use `omdrive-core` in your Rust project add the following to your
//! `Cargo.toml`:
//!
//! ```toml
//! omdrive-core = "0.1.0"
//! ```
//!
//! ## Example
//!
//! Here's a very simple example of how the library can be used inside your
//! program, assuming `session` implements [`Session`]:
//!
//! ```ignore
//! extern crate omdrive_core as omdrive;
//! use omdrive::{Library, SimulationRequest};
//!
//! pub fn main() {
//!     let request = SimulationRequest::new("Machine.Drive")
//!         .in_dirs("./work", "./work/sim")
//!         .with_library(Library::versioned("Modelica", "3.2.3"));
//!     let outcome = omdrive::run(&mut session, &request).unwrap();
//!     for step in &outcome.report.steps {
//!         println!("{}", step);
//!     }
//! }
//! ```
//!
//! [`SimulationRequest`]: request/struct.SimulationRequest.html
//! [`RunReport`]: report/struct.RunReport.html
//! [`SimResults`]: result/struct.SimResults.html
//! [`Session`]: session/trait.Session.html
//! [`run`]: run/fn.run.html

#![allow(unused)]

#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;

// reexports
pub use error::{Error, Result};
pub use install::Installation;
pub use report::{RunReport, RunStep, StepKind, StepStatus};
pub use request::{Library, SimulateOptions, SimulationRequest};
pub use result::SimResults;
pub use run::{load_results, run, RunOutcome};
pub use session::Session;

pub mod error;
pub mod expr;
pub mod install;
pub mod report;
pub mod request;
pub mod result;
pub mod run;
pub mod session;

mod util;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the engine installation root.
pub const HOME_ENV_VAR: &str = "OPENMODELICAHOME";

/// Default engine installation root, used when no explicit path is given
/// and the environment variable is unset.
#[cfg(windows)]
pub const DEFAULT_HOME: &str = "C:/OpenModelica";
/// Default engine installation root, used when no explicit path is given
/// and the environment variable is unset.
#[cfg(not(windows))]
pub const DEFAULT_HOME: &str = "/usr";

/// Suffix the engine appends to the model name when writing the result
/// file.
pub const RESULT_FILE_SUFFIX: &str = "_res.mat";

/// Solver tolerance used when the request doesn't specify one.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
/// Output interval count the engine assumes on its own.
pub const DEFAULT_INTERVALS: u32 = 500;

/// Name of the variable holding the simulation time axis.
pub const TIME_SIGNAL: &str = "time";

/// Floating point number type used throughout the library.
pub type Float = f64;
