//! Session endpoint seam.

use std::path::Path;

use crate::error::Result;
use crate::expr::Expr;

/// Interface to an interactive engine session.
///
/// The whole protocol rides on a single primitive: an expression goes
/// over, reply text comes back. Concrete implementations live outside
/// this crate, `omdrive-net` ships one speaking ZeroMQ. Implementations
/// report their transport failures as [`Error::SessionError`].
///
/// [`Error::SessionError`]: ../error/enum.Error.html
pub trait Session {
    /// Sends a single expression, blocking until the reply text arrives.
    fn send_expression(&mut self, expr: &str) -> Result<String>;

    /// Sends a typed command.
    fn eval(&mut self, expr: &Expr) -> Result<String> {
        self.send_expression(&expr.to_string())
    }

    /// Loads a file into the session.
    fn load_file(&mut self, path: &Path) -> Result<String> {
        self.eval(&Expr::LoadFile(path.to_path_buf()))
    }
}
