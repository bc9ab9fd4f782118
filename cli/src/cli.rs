use anyhow::{Context, Result};
use braincode::problem::{Limits, Problem, Verdicts};
use braincode::runtime::{calculate_score, first_failure, Judge, JudgeConfig};
use braincode::utils::read_problem;
use braincode::{ByteCode, VM};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use crate::manifest::load_manifest;

#[derive(Parser, Debug)]
#[command(name = "braincode")]
#[command(author, version, about = "Compile, run and judge tape-machine programs", long_about = None)]
pub struct Cli {
    /// Log judging progress
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the canonical form of a program
    Compile {
        /// Program source file
        file: PathBuf,

        /// Reject programs with more instructions
        #[arg(long)]
        max_instructions: Option<usize>,
    },
    /// Run a program
    Run {
        /// Program source file
        file: PathBuf,

        /// Read input from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,

        /// Step limit, 0 for unlimited
        #[arg(long, default_value_t = 0)]
        steps: u64,

        /// Tape length limit in bytes, 0 for unlimited
        #[arg(long, default_value_t = 0)]
        memory: usize,
    },
    /// Build a problem from a JSON manifest and write its binary form
    Pack {
        /// Problem manifest
        manifest: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Judge a submission
    Judge {
        /// Binary problem file or JSON manifest
        problem: PathBuf,

        /// Submission source file
        submission: PathBuf,

        /// Number of worker threads
        #[arg(long)]
        workers: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Executes parsed command lines
#[derive(Debug, Default)]
pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, cli: Cli) -> Result<()> {
        match cli.command {
            Commands::Compile { file, max_instructions } => {
                let source = read_source(&file)?;
                println!("{}", compile_source(&source, max_instructions)?);
            },
            Commands::Run { file, input, steps, memory } => {
                let source = read_source(&file)?;
                let data = match input {
                    Some(path) => fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?,
                    None => {
                        let mut data = Vec::new();
                        io::stdin().read_to_end(&mut data).context("failed to read stdin")?;
                        data
                    },
                };
                let stdout = io::stdout();
                let mut out = stdout.lock();
                run_program(&source, &data, Limits::new(0, steps, memory), &mut out)?;
            },
            Commands::Pack { manifest, output } => {
                let problem = load_manifest(&manifest)?;
                let bytes = problem.to_bytes();
                fs::write(&output, &bytes).with_context(|| format!("failed to write {}", output.display()))?;
                info!("wrote {} bytes to {}", bytes.len(), output.display());
            },
            Commands::Judge { problem, submission, workers, json } => {
                let problem = load_problem(&problem)?;
                let source = read_source(&submission)?;

                let mut config = JudgeConfig::new();
                if let Some(workers) = workers {
                    config = config.with_workers(workers);
                }
                let judge = Judge::with_config(config)?;
                let report = JudgeReport::new(&judge.judge(&problem, &source));

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", report);
                }
            },
        }
        Ok(())
    }
}

/// Program sources are read as raw bytes so error offsets match the file
fn read_source(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Compile a program and return its canonical opcode string
pub fn compile_source(source: &[u8], max_instructions: Option<usize>) -> Result<String> {
    let code = ByteCode::compile_bytes(source, max_instructions)?;
    debug!("compiled {} instructions", code.len());
    Ok(code.to_string())
}

/// Run a program to completion, writing its output to `out`
pub fn run_program<W: Write>(source: &[u8], input: &[u8], limits: Limits, out: &mut W) -> Result<()> {
    let code = ByteCode::compile_bytes(source, limits.instructions())?;
    let mut vm = VM::new(code, input, &mut *out, limits.step_budget(), limits.memory_budget());
    let result = vm.run();
    debug!("used {} bytes of tape, {} steps left", vm.used_memory(), vm.remaining_steps());
    vm.into_output().flush()?;
    result.context("program failed")?;
    Ok(())
}

/// Load a problem from a JSON manifest or a binary problem file
pub fn load_problem(path: &Path) -> Result<Problem> {
    let is_manifest = path.extension().map_or(false, |ext| ext == "json");
    if is_manifest {
        load_manifest(path)
    } else {
        read_problem(path).with_context(|| format!("failed to load {}", path.display()))
    }
}

/// One judged test in a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    pub status: String,
    pub comment: String,
}

/// Verdicts of a submission with its summary status and score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgeReport {
    pub groups: Vec<Vec<TestReport>>,
    pub status: String,
    pub comment: String,
    pub score: f64,
}

impl JudgeReport {
    pub fn new(verdicts: &Verdicts) -> Self {
        let groups = verdicts
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|verdict| TestReport {
                        status: verdict.status.to_string(),
                        comment: verdict.comment.clone(),
                    })
                    .collect()
            })
            .collect();
        let summary = first_failure(verdicts);

        Self {
            groups,
            status: summary.status.to_string(),
            comment: summary.comment,
            score: calculate_score(verdicts),
        }
    }
}

impl fmt::Display for JudgeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, group) in self.groups.iter().enumerate() {
            writeln!(f, "Group {}:", index + 1)?;
            for (test, report) in group.iter().enumerate() {
                if report.comment.is_empty() {
                    writeln!(f, "  Test {}: {}", test + 1, report.status)?;
                } else {
                    writeln!(f, "  Test {}: {}: {}", test + 1, report.status, report.comment.escape_debug())?;
                }
            }
        }
        writeln!(f, "Result: {}", self.status)?;
        writeln!(f, "Score: {:.3}", self.score)
    }
}
