use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use crossbeam::channel::{Receiver, Sender};
use log::{trace, warn};
use crate::bytecode::ByteCode;
use crate::problem::{Checker, Limits, OutputChecker, Status, Verdict};
use crate::vm::VM;

/// Verdict for the test at (group, test)
pub(crate) type JobResult = (usize, usize, Verdict);

/// One test of one submission
pub(crate) struct Job {
    pub code: ByteCode,
    pub input: Vec<u8>,
    pub checker: Arc<Checker>,
    pub limits: Limits,
    pub group: usize,
    pub test: usize,
    pub reply: Sender<JobResult>,
}

/// Worker loop: run jobs until the queue is closed
pub(crate) fn run_worker(jobs: Receiver<Job>) {
    for job in jobs.iter() {
        let verdict = panic::catch_unwind(AssertUnwindSafe(|| execute(&job))).unwrap_or_else(|_| {
            warn!("worker panicked on group {} test {}", job.group, job.test);
            Verdict::new(Status::JudgeFailed, "worker panicked")
        });

        trace!("group {} test {}: {}", job.group, job.test, verdict);
        // the judging call may have given up on this reply
        let _ = job.reply.send((job.group, job.test, verdict));
    }
}

/// Run the submission on one input and check its output
pub(crate) fn execute(job: &Job) -> Verdict {
    let mut vm = VM::new(
        job.code.clone(),
        job.input.as_slice(),
        Vec::new(),
        job.limits.step_budget(),
        job.limits.memory_budget(),
    );

    if let Err(err) = vm.run() {
        return Verdict::new(Status::RuntimeError, err.to_string());
    }

    let output = vm.into_output();
    job.checker.check_output(&job.input, &output)
}
