//! Typed commands and their textual expression form.
//!
//! The session endpoint only understands expression text. Commands are
//! kept as structured values for as long as possible and serialized at
//! the last moment, right before getting pushed over the session. Replies
//! coming back the other way are handled by the [`reply`] submodule.
//!
//! [`reply`]: reply/index.html

use std::fmt;
use std::path::{Path, PathBuf};

use crate::request::{Library, SimulateOptions};

pub mod reply;

/// Single command understood by the session endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Load a system library, optionally pinned to a version
    LoadModel(Library),
    /// Load a model file from disk
    LoadFile(PathBuf),
    /// Flatten the given model class
    InstantiateModel(String),
    /// Simulate the given model class with assembled options
    Simulate(String, SimulateOptions),
    /// Change the session working directory
    Cd(PathBuf),
    /// Query the engine version string
    GetVersion,
    /// Drain the engine diagnostics buffer
    GetErrorString,
    /// List variable names stored in a result file
    ReadResultVars(PathBuf),
    /// Read value series for the given variables from a result file
    ReadResult(PathBuf, Vec<String>),
    /// Release the most recently opened result file
    CloseResultFile,
    /// Terminate the session endpoint
    Quit,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::LoadModel(lib) => match &lib.version {
                Some(version) => {
                    write!(f, "loadModel({},{{{}}})", lib.name, string_literal(version))
                }
                None => write!(f, "loadModel({})", lib.name),
            },
            Expr::LoadFile(path) => write!(f, "loadFile({})", path_literal(path)),
            Expr::InstantiateModel(model) => write!(f, "instantiateModel({})", model),
            Expr::Simulate(model, options) => {
                write!(f, "simulate({},{})", model, options.to_arg_string())
            }
            Expr::Cd(path) => write!(f, "cd({})", path_literal(path)),
            Expr::GetVersion => write!(f, "getVersion()"),
            Expr::GetErrorString => write!(f, "getErrorString()"),
            Expr::ReadResultVars(path) => {
                write!(f, "readSimulationResultVars({})", path_literal(path))
            }
            Expr::ReadResult(path, vars) => write!(
                f,
                "readSimulationResult({},{{{}}})",
                path_literal(path),
                vars.join(",")
            ),
            Expr::CloseResultFile => write!(f, "closeSimulationResultFile()"),
            Expr::Quit => write!(f, "quit()"),
        }
    }
}

/// Wraps a string in double quotes, escaping quotes and backslashes.
pub(crate) fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Turns a path into a quoted expression literal.
///
/// The engine accepts forward slashes on every platform, so backslashes
/// are normalized away instead of escaped.
pub(crate) fn path_literal(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    string_literal(&normalized)
}

/// Checks whether the given name can stand where the engine expects
/// a class reference. Qualified names are allowed, every dot-separated
/// segment has to start with a letter or an underscore.
pub fn is_valid_class_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    name.split('.').all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Library, SimulateOptions};

    #[test]
    fn load_model_forms() {
        let plain = Expr::LoadModel(Library::new("Modelica"));
        assert_eq!(plain.to_string(), "loadModel(Modelica)");
        let pinned = Expr::LoadModel(Library::versioned("Modelica", "3.2.3"));
        assert_eq!(pinned.to_string(), "loadModel(Modelica,{\"3.2.3\"})");
    }

    #[test]
    fn load_file_normalizes_separators() {
        let expr = Expr::LoadFile(PathBuf::from(r"C:\models\machine.mo"));
        assert_eq!(expr.to_string(), "loadFile(\"C:/models/machine.mo\")");
    }

    #[test]
    fn simulate_carries_assembled_options() {
        let expr = Expr::Simulate("Machine.Drive".to_string(), SimulateOptions::default());
        assert_eq!(
            expr.to_string(),
            "simulate(Machine.Drive,tolerance=0.000001)"
        );
    }

    #[test]
    fn result_read_forms() {
        let vars = Expr::ReadResultVars(PathBuf::from("work/M_res.mat"));
        assert_eq!(
            vars.to_string(),
            "readSimulationResultVars(\"work/M_res.mat\")"
        );
        let read = Expr::ReadResult(
            PathBuf::from("work/M_res.mat"),
            vec!["time".to_string(), "der(x)".to_string()],
        );
        assert_eq!(
            read.to_string(),
            "readSimulationResult(\"work/M_res.mat\",{time,der(x)})"
        );
    }

    #[test]
    fn bare_commands() {
        assert_eq!(Expr::GetVersion.to_string(), "getVersion()");
        assert_eq!(Expr::GetErrorString.to_string(), "getErrorString()");
        assert_eq!(Expr::CloseResultFile.to_string(), "closeSimulationResultFile()");
        assert_eq!(Expr::Quit.to_string(), "quit()");
        assert_eq!(
            Expr::Cd(PathBuf::from("/tmp/sims")).to_string(),
            "cd(\"/tmp/sims\")"
        );
    }

    #[test]
    fn literal_escaping() {
        assert_eq!(string_literal("a\"b"), "\"a\\\"b\"");
        assert_eq!(string_literal("plain"), "\"plain\"");
    }

    #[test]
    fn class_name_validation() {
        assert!(is_valid_class_name("Machine"));
        assert!(is_valid_class_name("Modelica.Blocks.Step"));
        assert!(is_valid_class_name("_internal.M2"));
        assert!(!is_valid_class_name(""));
        assert!(!is_valid_class_name("2fast"));
        assert!(!is_valid_class_name("a..b"));
        assert!(!is_valid_class_name("der(x)"));
        assert!(!is_valid_class_name("has space"));
    }
}
