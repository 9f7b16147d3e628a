//! Simulation request configuration.
//!
//! A [`SimulationRequest`] bundles everything one run needs. It can be
//! assembled in code with the builder methods or read from a TOML file.
//! Requests get validated as a whole before a single command leaves for
//! the session endpoint.
//!
//! [`SimulationRequest`]: struct.SimulationRequest.html

use std::path::{Path, PathBuf};

use semver::VersionReq;

use crate::error::{Error, Result};
use crate::expr;
use crate::util;
use crate::{Float, DEFAULT_INTERVALS, DEFAULT_TOLERANCE, RESULT_FILE_SUFFIX};

/// Single system library load, optionally pinned to a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub version: Option<String>,
}

impl Library {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    pub fn versioned<S: Into<String>>(name: S, version: S) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
        }
    }
}

/// Numeric options passed along with the simulate command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulateOptions {
    pub start_time: Float,
    pub stop_time: Float,
    pub tolerance: Float,
    pub intervals: u32,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            stop_time: 0.0,
            tolerance: DEFAULT_TOLERANCE,
            intervals: DEFAULT_INTERVALS,
        }
    }
}

impl SimulateOptions {
    /// Assembles the option clauses in their command form.
    ///
    /// Tolerance is always present. Start time only appears when
    /// non-zero, stop time only when it lies past the start time, and
    /// the interval count only when it diverges from the engine default.
    pub fn to_clauses(&self) -> Vec<String> {
        let mut clauses = vec![format!("tolerance={}", self.tolerance)];
        if self.start_time != 0.0 {
            clauses.push(format!("startTime={}", self.start_time));
        }
        if self.stop_time > self.start_time {
            clauses.push(format!("stopTime={}", self.stop_time));
        }
        if self.intervals != DEFAULT_INTERVALS {
            clauses.push(format!("numberOfIntervals={}", self.intervals));
        }
        clauses
    }

    pub fn to_arg_string(&self) -> String {
        self.to_clauses().join(",")
    }
}

/// Pairs delimited library names with delimited versions.
///
/// An empty version list means every library loads unversioned. With a
/// non-empty version list the entry counts have to match exactly, each
/// library is paired with the version at its position and an empty
/// version entry stands for an unversioned load. Empty name entries are
/// positional placeholders and never turn into a load request.
pub fn pair_libraries(names: &str, versions: &str) -> Result<Vec<Library>> {
    let name_list = util::split_list(names);
    let version_list = util::split_list(versions);
    if version_list.is_empty() {
        return Ok(name_list
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(Library::new)
            .collect());
    }
    if name_list.len() != version_list.len() {
        return Err(Error::LibraryVersionMismatch(
            name_list.len(),
            version_list.len(),
        ));
    }
    let mut paired = Vec::new();
    for (name, version) in name_list.into_iter().zip(version_list.into_iter()) {
        if name.is_empty() {
            continue;
        }
        if version.is_empty() {
            paired.push(Library::new(name));
        } else {
            paired.push(Library {
                name,
                version: Some(version),
            });
        }
    }
    Ok(paired)
}

/// Everything one simulation run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationRequest {
    /// Model class to instantiate and simulate
    pub model: String,
    /// System libraries loaded before anything else
    pub libraries: Vec<Library>,
    /// Model files loaded after the libraries
    pub files: Vec<PathBuf>,
    /// Additional files loaded after the model files
    pub extra_files: Vec<PathBuf>,
    /// Directory receiving the relocated result file
    pub work_dir: PathBuf,
    /// Scratch directory the engine works in, cleared on every run
    pub sim_dir: PathBuf,
    /// Numeric simulate options
    pub options: SimulateOptions,
    /// Semver requirement for the engine version, unchecked when absent
    pub engine: Option<String>,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            model: String::new(),
            libraries: Vec::new(),
            files: Vec::new(),
            extra_files: Vec::new(),
            work_dir: PathBuf::from("."),
            sim_dir: PathBuf::from("sim"),
            options: SimulateOptions::default(),
            engine: None,
        }
    }
}

impl SimulationRequest {
    pub fn new<S: Into<String>>(model: S) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Creates a request from a TOML file at the given path.
    ///
    /// Relative directories are resolved against the file's parent
    /// directory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut request: SimulationRequest = util::deser_struct_from_path(path.to_path_buf())?;
        if let Some(parent) = path.parent() {
            if request.work_dir.is_relative() {
                request.work_dir = parent.join(&request.work_dir);
            }
            if request.sim_dir.is_relative() {
                request.sim_dir = parent.join(&request.sim_dir);
            }
        }
        Ok(request)
    }

    pub fn in_dirs<P: Into<PathBuf>>(mut self, work_dir: P, sim_dir: P) -> Self {
        self.work_dir = work_dir.into();
        self.sim_dir = sim_dir.into();
        self
    }

    pub fn with_library(mut self, library: Library) -> Self {
        self.libraries.push(library);
        self
    }

    /// Takes libraries as two colon-delimited lists, names and versions,
    /// paired up by position.
    pub fn with_libraries_list(mut self, names: &str, versions: &str) -> Result<Self> {
        self.libraries = pair_libraries(names, versions)?;
        Ok(self)
    }

    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.files.push(path.into());
        self
    }

    /// Takes model files as a colon-delimited list.
    pub fn with_files_list(mut self, list: &str) -> Self {
        self.files = util::split_paths_list(list);
        self
    }

    pub fn with_extra_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.extra_files.push(path.into());
        self
    }

    /// Takes additional files as a colon-delimited list.
    pub fn with_extra_files_list(mut self, list: &str) -> Self {
        self.extra_files = util::split_paths_list(list);
        self
    }

    pub fn with_options(mut self, options: SimulateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_engine_req<S: Into<String>>(mut self, req: S) -> Self {
        self.engine = Some(req.into());
        self
    }

    /// Checks the request before anything is sent anywhere.
    pub fn validate(&self) -> Result<()> {
        if !expr::is_valid_class_name(&self.model) {
            return Err(Error::InvalidModelName(self.model.clone()));
        }
        if self.work_dir.as_os_str().is_empty() || self.sim_dir.as_os_str().is_empty() {
            return Err(Error::InvalidRequest(
                "working and simulation directories must both be set".to_string(),
            ));
        }
        if self.sim_dir == self.work_dir {
            return Err(Error::InvalidRequest(
                "simulation directory must differ from the working directory".to_string(),
            ));
        }
        if let Some(req) = &self.engine {
            VersionReq::parse(req)?;
        }
        Ok(())
    }

    /// Name of the artifact the engine will produce for this request.
    pub fn artifact_name(&self) -> String {
        format!("{}{}", self.model, RESULT_FILE_SUFFIX)
    }

    /// Libraries that actually turn into load commands.
    pub(crate) fn effective_libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.iter().filter(|lib| !lib.name.is_empty())
    }

    /// Model and additional files that actually turn into load commands,
    /// in load order.
    pub(crate) fn effective_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.files
            .iter()
            .chain(self.extra_files.iter())
            .filter(|path| !path.as_os_str().is_empty())
    }
}
