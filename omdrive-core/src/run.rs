//! Drives the fixed simulation sequence over a session.
//!
//! The order never changes: version probe, workspace selection, library
//! loads, file loads, instantiation, simulation, artifact relocation,
//! result read-back. A failing remote step does not abort the run, it
//! gets recorded and the sequence keeps going. Only transport failures,
//! configuration problems and local filesystem errors cut a run short.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::expr::reply::{self, Reply};
use crate::expr::Expr;
use crate::install;
use crate::report::{RunReport, RunStep, StepKind, StepStatus};
use crate::request::SimulationRequest;
use crate::result::SimResults;
use crate::session::Session;
use crate::util;
use crate::RESULT_FILE_SUFFIX;

/// Outcome of a full run.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    /// Only present when the simulate step produced a readable artifact
    pub results: Option<SimResults>,
}

/// Pushes a request through the whole sequence.
///
/// The simulation directory is destroyed and recreated on every call,
/// concurrent runs must not share one. The process working directory and
/// environment are left untouched; directory changes happen inside the
/// session only. The produced artifact is copied into the working
/// directory, replacing any previous copy, and the relocated file is the
/// one handed to the result reader.
pub fn run<S: Session>(session: &mut S, request: &SimulationRequest) -> Result<RunOutcome> {
    request.validate()?;

    util::clear_dir(&request.sim_dir)?;
    fs::create_dir_all(&request.work_dir)?;
    let sim_dir = util::absolutize(&request.sim_dir)?;

    info!("starting run for model: {}", request.model);
    let mut report = RunReport::new(&request.model);

    let version_step = exchange(session, StepKind::Version, Expr::GetVersion, &mut report)?;
    if let Some(requirement) = &request.engine {
        install::check_engine_version(&version_step.reply, requirement)?;
    }

    exchange(
        session,
        StepKind::ChangeDir,
        Expr::Cd(sim_dir.clone()),
        &mut report,
    )?;

    for library in request.effective_libraries() {
        exchange(
            session,
            StepKind::LoadLibrary,
            Expr::LoadModel(library.clone()),
            &mut report,
        )?;
    }
    for file in request.effective_files() {
        exchange(
            session,
            StepKind::LoadFile,
            Expr::LoadFile(file.clone()),
            &mut report,
        )?;
    }

    exchange(
        session,
        StepKind::Instantiate,
        Expr::InstantiateModel(request.model.clone()),
        &mut report,
    )?;

    let simulate_step = exchange(
        session,
        StepKind::Simulate,
        Expr::Simulate(request.model.clone(), request.options),
        &mut report,
    )?;

    let mut results = None;
    if simulate_step.status.is_ok() {
        let artifact = request.artifact_name();
        let produced = sim_dir.join(&artifact);
        if !produced.is_file() {
            return Err(Error::ResultFileNotFound(
                produced.to_string_lossy().to_string(),
            ));
        }
        let target = request.work_dir.join(&artifact);
        util::copy_file_overwrite(&produced, &target)?;
        info!("result file relocated to: {}", target.to_string_lossy());
        let target = util::absolutize(&target)?;
        results = read_results(session, &request.model, &target, &mut report)?;
    } else {
        warn!("simulate step failed, skipping result read-back");
    }

    report.finish();
    Ok(RunOutcome { report, results })
}

/// Reads simulation results back through the session's own result
/// reader.
///
/// `file_name` is the artifact name, `dir` the directory holding it.
pub fn load_results<S: Session>(
    session: &mut S,
    file_name: &str,
    dir: &Path,
) -> Result<SimResults> {
    let file = dir.join(file_name);
    if !file.is_file() {
        return Err(Error::ResultFileNotFound(
            file.to_string_lossy().to_string(),
        ));
    }
    let file = util::absolutize(&file)?;
    let model = file_name.trim_end_matches(RESULT_FILE_SUFFIX);
    let mut report = RunReport::new(model);
    match read_results(session, model, &file, &mut report)? {
        Some(results) => Ok(results),
        None => {
            let reply = report
                .failed_steps()
                .last()
                .map(|step| step.reply.clone())
                .unwrap_or_default();
            Err(Error::UnexpectedReply(reply))
        }
    }
}

/// Variable list first, then one value series per variable, then the
/// file handle gets released. A remote failure along the way yields
/// `None` with the failed step left in the report.
fn read_results<S: Session>(
    session: &mut S,
    model: &str,
    file: &Path,
    report: &mut RunReport,
) -> Result<Option<SimResults>> {
    let vars_step = exchange(
        session,
        StepKind::ReadVars,
        Expr::ReadResultVars(file.to_path_buf()),
        report,
    )?;
    if !vars_step.status.is_ok() {
        return Ok(None);
    }
    let names = reply::parse_string_array(&vars_step.reply)?;
    if names.is_empty() {
        exchange(session, StepKind::CloseResult, Expr::CloseResultFile, report)?;
        return Ok(Some(SimResults::new(model, file)));
    }

    let values_step = exchange(
        session,
        StepKind::ReadValues,
        Expr::ReadResult(file.to_path_buf(), names.clone()),
        report,
    )?;
    exchange(session, StepKind::CloseResult, Expr::CloseResultFile, report)?;
    if !values_step.status.is_ok() {
        return Ok(None);
    }

    let rows = reply::parse_value_matrix(&values_step.reply)?;
    if rows.len() != names.len() {
        return Err(Error::UnexpectedReply(format!(
            "asked for {} variables, got {} series",
            names.len(),
            rows.len()
        )));
    }
    let mut results = SimResults::new(model, file);
    for (name, values) in names.into_iter().zip(rows.into_iter()) {
        results.insert(name, values);
    }
    Ok(Some(results))
}

/// Sends one command, classifies the reply and records the step. Failed
/// steps get the engine diagnostics buffer drained into them.
fn exchange<S: Session>(
    session: &mut S,
    kind: StepKind,
    expr: Expr,
    report: &mut RunReport,
) -> Result<RunStep> {
    let text = expr.to_string();
    debug!("sending: {}", text);
    let raw = session.send_expression(&text)?;
    let classified = Reply::classify(&raw);
    let status = if classified.indicates_success(&expr) {
        StepStatus::Ok
    } else {
        StepStatus::Failed
    };
    let mut diagnostics = None;
    match status {
        StepStatus::Ok => info!("{} .. ok", text),
        StepStatus::Failed => {
            warn!("{} .. failed", text);
            diagnostics = drain_diagnostics(session)?;
            if let Some(diag) = &diagnostics {
                warn!("engine diagnostics: {}", diag);
            }
        }
    }
    let step = RunStep {
        kind,
        expr: text,
        status,
        reply: classified.text(),
        diagnostics,
    };
    report.push(step.clone());
    Ok(step)
}

/// Empties the engine diagnostics buffer. The reply comes back quoted.
fn drain_diagnostics<S: Session>(session: &mut S) -> Result<Option<String>> {
    let raw = session.send_expression(&Expr::GetErrorString.to_string())?;
    let unquoted = raw.trim().trim_matches('"').trim();
    if unquoted.is_empty() {
        Ok(None)
    } else {
        Ok(Some(unquoted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Library, SimulateOptions, SimulationRequest};
    use std::env;

    const VERSION_REPLY: &str = "OpenModelica 1.14.1";

    struct ScriptedSession {
        sent: Vec<String>,
        replies: Vec<(&'static str, String)>,
        artifact: Option<PathBuf>,
    }

    impl ScriptedSession {
        fn new(replies: Vec<(&'static str, String)>) -> Self {
            Self {
                sent: Vec::new(),
                replies,
                artifact: None,
            }
        }

        /// Mimics the engine dropping a result file into its working
        /// directory when the simulate command lands.
        fn producing_artifact(mut self, path: PathBuf) -> Self {
            self.artifact = Some(path);
            self
        }
    }

    impl Session for ScriptedSession {
        fn send_expression(&mut self, expr: &str) -> Result<String> {
            self.sent.push(expr.to_string());
            if expr.starts_with("simulate(") {
                if let Some(path) = &self.artifact {
                    fs::write(path, b"mat-bytes").unwrap();
                }
            }
            for (prefix, reply) in &self.replies {
                if expr.starts_with(prefix) {
                    return Ok(reply.clone());
                }
            }
            Ok("true".to_string())
        }
    }

    fn simulate_record(sim_dir: &Path, model: &str) -> String {
        format!(
            "record SimulationResult\n    resultFile = \"{}/{}_res.mat\",\n    \
             simulationOptions = \"stopTime = 5.0\",\n    \
             messages = \"LOG_SUCCESS | info | The simulation finished successfully.\n\",\n    \
             timeTotal = 0.1\nend SimulationResult;",
            sim_dir.display(),
            model
        )
    }

    fn failing_simulate_record(model: &str) -> String {
        format!(
            "record SimulationResult\n    resultFile = \"\",\n    \
             simulationOptions = \"\",\n    \
             messages = \"Simulation execution failed for model: {}\n\",\n    \
             timeTotal = 0.1\nend SimulationResult;",
            model
        )
    }

    fn happy_replies(sim_dir: &Path, model: &str) -> Vec<(&'static str, String)> {
        vec![
            ("getVersion", VERSION_REPLY.to_string()),
            ("cd(", format!("\"{}\"", sim_dir.display())),
            ("loadModel(", "true".to_string()),
            ("loadFile(", "true".to_string()),
            ("instantiateModel(", format!("class {}\nend {};\n", model, model)),
            ("simulate(", simulate_record(sim_dir, model)),
            ("readSimulationResultVars(", "{\"time\",\"x\"}".to_string()),
            (
                "readSimulationResult(",
                "{{0.0,0.5,1.0},{1.0,2.0,4.0}}".to_string(),
            ),
            ("closeSimulationResultFile", "true".to_string()),
            ("getErrorString", "\"\"".to_string()),
        ]
    }

    fn scratch_dirs() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let root = util::absolutize(tmp.path()).unwrap();
        let work_dir = root.join("work");
        let sim_dir = root.join("sim");
        fs::create_dir_all(&work_dir).unwrap();
        (tmp, work_dir, sim_dir)
    }

    #[test]
    fn full_sequence_in_order() {
        let (_tmp, work_dir, sim_dir) = scratch_dirs();
        let request = SimulationRequest::new("M")
            .in_dirs(work_dir.clone(), sim_dir.clone())
            .with_library(Library::versioned("Modelica", "3.2.3"))
            .with_file(work_dir.join("machine.mo"))
            .with_engine_req("^1.13");
        let mut session = ScriptedSession::new(happy_replies(&sim_dir, "M"))
            .producing_artifact(sim_dir.join("M_res.mat"));

        let cwd_before = env::current_dir().unwrap();
        let outcome = run(&mut session, &request).unwrap();
        assert_eq!(env::current_dir().unwrap(), cwd_before);

        let expected_prefixes = vec![
            "getVersion()",
            "cd(",
            "loadModel(Modelica,{\"3.2.3\"})",
            "loadFile(",
            "instantiateModel(M)",
            "simulate(M,tolerance=0.000001)",
            "readSimulationResultVars(",
            "readSimulationResult(",
            "closeSimulationResultFile()",
        ];
        assert_eq!(session.sent.len(), expected_prefixes.len());
        for (sent, prefix) in session.sent.iter().zip(expected_prefixes) {
            assert!(
                sent.starts_with(prefix),
                "expected \"{}\" to start with \"{}\"",
                sent,
                prefix
            );
        }

        assert!(outcome.report.succeeded());
        assert_eq!(outcome.report.steps.len(), 9);
        assert!(outcome.report.finished.is_some());

        let relocated = work_dir.join("M_res.mat");
        assert!(relocated.is_file());
        let results = outcome.results.unwrap();
        assert_eq!(results.names(), vec!["time", "x"]);
        assert_eq!(results.time().unwrap(), &[0.0, 0.5, 1.0]);
        assert_eq!(results.signal("x").unwrap(), &[1.0, 2.0, 4.0]);
        assert_eq!(results.file, relocated);
    }

    #[test]
    fn invalid_request_sends_nothing() {
        let mut session = ScriptedSession::new(Vec::new());
        let request = SimulationRequest::new("not a class");
        assert!(run(&mut session, &request).is_err());
        assert!(session.sent.is_empty());
    }

    #[test]
    fn pairing_mismatch_raises_before_any_remote_call() {
        let session = ScriptedSession::new(Vec::new());
        let built = SimulationRequest::new("M").with_libraries_list("A:B", "1.0");
        assert!(matches!(
            built.unwrap_err(),
            Error::LibraryVersionMismatch(2, 1)
        ));
        assert!(session.sent.is_empty());
    }

    #[test]
    fn failed_load_is_recorded_and_the_sequence_continues() {
        let (_tmp, work_dir, sim_dir) = scratch_dirs();
        let mut replies = happy_replies(&sim_dir, "M");
        replies.retain(|(prefix, _)| *prefix != "loadModel(" && *prefix != "getErrorString");
        replies.push(("loadModel(", "false".to_string()));
        replies.push((
            "getErrorString",
            "\"[lib.mo:1:1] Error: library not on path\"".to_string(),
        ));
        let request = SimulationRequest::new("M")
            .in_dirs(work_dir, sim_dir.clone())
            .with_library(Library::new("Missing"));
        let mut session =
            ScriptedSession::new(replies).producing_artifact(sim_dir.join("M_res.mat"));

        let outcome = run(&mut session, &request).unwrap();
        assert!(!outcome.report.succeeded());
        let failed = outcome.report.failed_steps();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].kind, StepKind::LoadLibrary);
        assert!(failed[0]
            .diagnostics
            .as_ref()
            .unwrap()
            .contains("library not on path"));
        assert!(session
            .sent
            .iter()
            .any(|e| e.starts_with("instantiateModel(")));
        assert!(session.sent.iter().any(|e| e.starts_with("simulate(")));
        assert!(outcome.results.is_some());
    }

    #[test]
    fn failed_simulate_skips_read_back() {
        let (_tmp, work_dir, sim_dir) = scratch_dirs();
        let mut replies = happy_replies(&sim_dir, "M");
        replies.retain(|(prefix, _)| *prefix != "simulate(");
        replies.push(("simulate(", failing_simulate_record("M")));
        let request = SimulationRequest::new("M").in_dirs(work_dir.clone(), sim_dir);
        let mut session = ScriptedSession::new(replies);

        let outcome = run(&mut session, &request).unwrap();
        assert!(outcome.results.is_none());
        assert!(!outcome.report.succeeded());
        assert!(!work_dir.join("M_res.mat").exists());
        assert!(!session
            .sent
            .iter()
            .any(|e| e.starts_with("readSimulationResult")));
    }

    #[test]
    fn successful_simulate_without_artifact_is_an_error() {
        let (_tmp, work_dir, sim_dir) = scratch_dirs();
        let request = SimulationRequest::new("M").in_dirs(work_dir, sim_dir.clone());
        // no artifact side effect configured
        let mut session = ScriptedSession::new(happy_replies(&sim_dir, "M"));
        assert!(matches!(
            run(&mut session, &request).unwrap_err(),
            Error::ResultFileNotFound(_)
        ));
    }

    #[test]
    fn relocation_overwrites_and_sim_dir_gets_cleared() {
        let (_tmp, work_dir, sim_dir) = scratch_dirs();
        fs::create_dir_all(&sim_dir).unwrap();
        fs::write(sim_dir.join("leftover.txt"), "junk").unwrap();
        fs::write(work_dir.join("M_res.mat"), "stale").unwrap();
        let request = SimulationRequest::new("M").in_dirs(work_dir.clone(), sim_dir.clone());
        let mut session = ScriptedSession::new(happy_replies(&sim_dir, "M"))
            .producing_artifact(sim_dir.join("M_res.mat"));

        run(&mut session, &request).unwrap();
        assert!(!sim_dir.join("leftover.txt").exists());
        assert_eq!(
            fs::read(work_dir.join("M_res.mat")).unwrap(),
            b"mat-bytes".to_vec()
        );
    }

    #[test]
    fn engine_gate_aborts_on_mismatch() {
        let (_tmp, work_dir, sim_dir) = scratch_dirs();
        let mut replies = happy_replies(&sim_dir, "M");
        replies.retain(|(prefix, _)| *prefix != "getVersion");
        replies.push(("getVersion", "OpenModelica 1.2.0".to_string()));
        let request = SimulationRequest::new("M")
            .in_dirs(work_dir, sim_dir)
            .with_engine_req("^1.13");
        let mut session = ScriptedSession::new(replies);

        let err = run(&mut session, &request).unwrap_err();
        assert!(matches!(err, Error::EngineVersionMismatch(_, _)));
        assert_eq!(session.sent.len(), 1);
    }

    #[test]
    fn load_results_standalone() {
        let (_tmp, work_dir, sim_dir) = scratch_dirs();
        fs::write(work_dir.join("M_res.mat"), b"mat-bytes").unwrap();
        let mut session = ScriptedSession::new(happy_replies(&sim_dir, "M"));

        let results = load_results(&mut session, "M_res.mat", &work_dir).unwrap();
        assert_eq!(results.model, "M");
        assert_eq!(results.names(), vec!["time", "x"]);
        assert_eq!(results.last("x").unwrap(), 4.0);
    }

    #[test]
    fn load_results_needs_the_file() {
        let (_tmp, work_dir, sim_dir) = scratch_dirs();
        let mut session = ScriptedSession::new(happy_replies(&sim_dir, "M"));
        assert!(matches!(
            load_results(&mut session, "M_res.mat", &work_dir).unwrap_err(),
            Error::ResultFileNotFound(_)
        ));
        assert!(session.sent.is_empty());
    }
}
