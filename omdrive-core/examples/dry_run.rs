//! This example reads a request file and prints the command sequence a run
//! would issue, without talking to any engine.

#![allow(unused)]

extern crate log;
extern crate omdrive_core as omdrive;
extern crate simplelog;

use std::env;

use omdrive::expr::Expr;
use omdrive::{Installation, SimulationRequest};
use simplelog::{Config, LevelFilter, TermLogger, TerminalMode};

fn main() {
    TermLogger::init(LevelFilter::max(), Config::default(), TerminalMode::Mixed).unwrap();

    // handle path to a request file
    let path = match env::args().nth(1) {
        Some(p) => p,
        None => {
            println!("Please provide a path to a request file");
            return;
        }
    };
    let request = match SimulationRequest::from_path(&path) {
        Ok(r) => r,
        Err(e) => {
            println!("failed reading request at {}: {}", path, e);
            return;
        }
    };
    if let Err(e) = request.validate() {
        println!("invalid request: {}", e);
        return;
    }

    let install = Installation::detect();
    println!("engine binary: {}", install.binary_path().display());
    match install.verify() {
        Ok(()) => println!("engine installation found"),
        Err(e) => println!("engine installation problem: {}", e),
    }

    println!("work dir: {}", request.work_dir.display());
    println!("sim dir: {} (cleared on every run)", request.sim_dir.display());
    println!("a run would issue:");
    println!("  {}", Expr::GetVersion);
    println!("  {}", Expr::Cd(request.sim_dir.clone()));
    for library in &request.libraries {
        println!("  {}", Expr::LoadModel(library.clone()));
    }
    for file in request.files.iter().chain(request.extra_files.iter()) {
        println!("  {}", Expr::LoadFile(file.clone()));
    }
    println!("  {}", Expr::InstantiateModel(request.model.clone()));
    println!(
        "  {}",
        Expr::Simulate(request.model.clone(), request.options)
    );
    println!(
        "  (artifact {} then lands in {})",
        request.artifact_name(),
        request.work_dir.display()
    );
}
