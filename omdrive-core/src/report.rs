//! Structured outcomes for a simulation run.
//!
//! Every command exchanged with the session endpoint lands in the run
//! report as a single step, whether it went through or not. Callers get
//! the full picture as data instead of having to scrape log output.

use std::fmt;

use chrono::{DateTime, Utc};

/// Remote command family a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    Version,
    ChangeDir,
    LoadLibrary,
    LoadFile,
    Instantiate,
    Simulate,
    ReadVars,
    ReadValues,
    CloseResult,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            StepKind::Version => "getVersion",
            StepKind::ChangeDir => "cd",
            StepKind::LoadLibrary => "loadModel",
            StepKind::LoadFile => "loadFile",
            StepKind::Instantiate => "instantiateModel",
            StepKind::Simulate => "simulate",
            StepKind::ReadVars => "readSimulationResultVars",
            StepKind::ReadValues => "readSimulationResult",
            StepKind::CloseResult => "closeSimulationResultFile",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Ok,
    Failed,
}

impl StepStatus {
    pub fn is_ok(&self) -> bool {
        *self == StepStatus::Ok
    }
}

/// One command exchanged with the session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStep {
    pub kind: StepKind,
    /// Expression text as it went over the session
    pub expr: String,
    pub status: StepStatus,
    /// Reply text, trimmed
    pub reply: String,
    /// Drained engine diagnostics, only present for failed steps
    pub diagnostics: Option<String>,
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let status = match self.status {
            StepStatus::Ok => "ok",
            StepStatus::Failed => "failed",
        };
        write!(f, "{} .. {}", self.expr, status)
    }
}

/// Full account of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Model the run was driving
    pub model: String,
    pub started: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
    pub steps: Vec<RunStep>,
}

impl RunReport {
    pub fn new<S: Into<String>>(model: S) -> Self {
        Self {
            model: model.into(),
            started: Utc::now(),
            finished: None,
            steps: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, step: RunStep) {
        self.steps.push(step);
    }

    pub(crate) fn finish(&mut self) {
        self.finished = Some(Utc::now());
    }

    /// True when every recorded step went through.
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|step| step.status.is_ok())
    }

    pub fn failed_steps(&self) -> Vec<&RunStep> {
        self.steps
            .iter()
            .filter(|step| !step.status.is_ok())
            .collect()
    }

    /// First step of the given kind, if any was recorded.
    pub fn step(&self, kind: StepKind) -> Option<&RunStep> {
        self.steps.iter().find(|step| step.kind == kind)
    }
}
