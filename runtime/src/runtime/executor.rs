use std::thread::{self, JoinHandle};
use crossbeam::channel::{bounded, unbounded, Sender};
use log::{debug, warn};
use crate::bytecode::{ByteCode, CompileError};
use crate::problem::{InputGenerator, Problem, Status, Verdict, Verdicts};
use crate::runtime::worker::{run_worker, Job};
use crate::runtime::{JudgeConfig, JudgeResult};

/// Judge dispatcher: owns a fixed pool of worker threads.
///
/// Every test of a submission becomes one job on a shared rendezvous
/// queue, so dispatching blocks while all workers are busy. Verdicts come
/// back over a reply channel private to each [`Judge::judge`] call, which
/// makes one judge safe to use from several threads at once.
pub struct Judge {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    config: JudgeConfig,
}

impl Judge {
    /// Create a judge with `workers` threads, clamped to at least one
    pub fn new(workers: usize) -> JudgeResult<Self> {
        Self::with_config(JudgeConfig::new().with_workers(workers))
    }

    /// Create a judge with custom configuration
    pub fn with_config(config: JudgeConfig) -> JudgeResult<Self> {
        let (sender, receiver) = bounded::<Job>(0);

        let count = config.workers();
        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let jobs = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name, index))
                .spawn(move || run_worker(jobs))?;
            workers.push(handle);
        }
        debug!("judge started with {} workers", count);

        Ok(Self {
            sender: Some(sender),
            workers,
            config,
        })
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Judge a submission against every test of a problem.
    ///
    /// The result has the group/test shape of the generated data. Compile
    /// and generator failures yield a single verdict instead. The submission
    /// is raw source, text or bytes.
    pub fn judge<S: AsRef<[u8]> + ?Sized>(&self, problem: &Problem, submission: &S) -> Verdicts {
        let limits = problem.limits();

        let code = match ByteCode::compile_bytes(submission.as_ref(), limits.instructions()) {
            Ok(code) => code,
            Err(err) => {
                debug!("submission rejected: {}", err);
                return single(compile_status(&err), err.to_string());
            },
        };
        debug!("submission compiled to {} instructions", code.len());

        let groups = match problem.generator().generate_input() {
            Ok(groups) => groups,
            Err(err) => {
                warn!("input generator failed: {}", err);
                return single(Status::CheckerFailed, err.to_string());
            },
        };

        let mut verdicts: Verdicts = groups
            .iter()
            .map(|group| vec![Verdict::new(Status::JudgeFailed, "test was not judged"); group.len()])
            .collect();

        let Some(sender) = &self.sender else {
            return verdicts;
        };

        let (reply, results) = unbounded();
        let mut jobs = 0usize;
        'dispatch: for (group_index, group) in groups.into_iter().enumerate() {
            for (test_index, input) in group.into_iter().enumerate() {
                let job = Job {
                    code: code.clone(),
                    input,
                    checker: problem.checker().clone(),
                    limits,
                    group: group_index,
                    test: test_index,
                    reply: reply.clone(),
                };
                if sender.send(job).is_err() {
                    warn!("judge workers are gone, {} jobs dispatched", jobs);
                    break 'dispatch;
                }
                jobs += 1;
            }
        }
        debug!("dispatched {} jobs", jobs);

        // the loop ends once every job has dropped its reply sender
        drop(reply);
        for (group, test, verdict) in results.iter() {
            verdicts[group][test] = verdict;
        }

        verdicts
    }
}

impl Drop for Judge {
    fn drop(&mut self) {
        // closing the queue stops the workers
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("judge worker exited with a panic");
            }
        }
    }
}

fn compile_status(err: &CompileError) -> Status {
    match err {
        CompileError::InstructionLimit { .. } => Status::SourceSizeLimit,
        CompileError::UnmatchedBracket { .. } => Status::CompilationFailed,
    }
}

fn single(status: Status, comment: String) -> Verdicts {
    vec![vec![Verdict::new(status, comment)]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::problem::{Checker, Generator, Limits, ListChecker, ProblemDefinition};
    use crate::runtime::calculate_score;
    use crate::sandbox::SandboxLimits;

    const GOOD_SUM: &str = "
        ,
        >,
        <
        [->+<]
        >.
    ";

    const BAD_SUM: &str = "
        ,
        >,
        <
        [->+<]
        >+.
    ";

    const SUM_SOLUTION: &str = r#"
        function solution(input)
            local a = string.byte(input, 1)
            local b = string.byte(input, 2)
            return string.char((a + b) % 256)
        end

        test_data = {
            {
                string.char(0) .. string.char(0),
                string.char(0) .. string.char(1),
                string.char(0) .. string.char(2),
                string.char(0) .. string.char(3),
                string.char(1) .. string.char(0),
                string.char(1) .. string.char(1),
                string.char(1) .. string.char(2),
                string.char(1) .. string.char(3),
                string.char(2) .. string.char(0),
                string.char(2) .. string.char(1),
                string.char(2) .. string.char(2),
                string.char(2) .. string.char(3),
            },
            {
                string.char(5) .. string.char(6),
                string.char(123) .. string.char(22),
                string.char(55) .. string.char(11),
                string.char(1) .. string.char(3),
                string.char(2) .. string.char(0),
                string.char(2) .. string.char(1),
                string.char(2) .. string.char(2),
            },
            {
                string.char(0) .. string.char(1),
                string.char(255) .. string.char(255),
                string.char(1) .. string.char(3),
                string.char(2) .. string.char(0),
                string.char(2) .. string.char(1),
                string.char(2) .. string.char(2),
            }
        }
    "#;

    /// Helper function to create a judge for tests
    fn create_test_judge(workers: usize) -> Judge {
        Judge::new(workers).expect("Failed to create test judge")
    }

    /// A+B modulo 256 with the limits used by the web front end
    fn sum_problem() -> Problem {
        ProblemDefinition::new(Limits::new(100, 10_000, 200))
            .with_lua(SUM_SOLUTION)
            .build()
            .expect("Failed to build A+B problem")
    }

    fn echo_problem(groups: usize, tests: usize) -> Problem {
        let data: Vec<Vec<Vec<u8>>> = (0..groups)
            .map(|g| (0..tests).map(|t| vec![g as u8 + 1, t as u8 + 1, 0]).collect())
            .collect();
        let answers = data.iter().flatten().map(|input| (input.clone(), input[..2].to_vec()));
        Problem::new(
            Generator::List(data.clone()),
            Checker::List(ListChecker::new(answers)),
            Limits::new(100, 10_000, 100),
        )
    }

    fn assert_all(verdicts: &Verdicts, status: Status) {
        for (g, group) in verdicts.iter().enumerate() {
            for (t, verdict) in group.iter().enumerate() {
                assert_eq!(verdict.status, status, "group {} test {}: {}", g, t, verdict);
            }
        }
    }

    #[test]
    fn test_sum_problem_end_to_end() {
        let judge = create_test_judge(1);
        let problem = sum_problem();

        let good = judge.judge(&problem, GOOD_SUM);
        assert_eq!(good.iter().map(Vec::len).collect::<Vec<_>>(), vec![12, 7, 6]);
        assert_all(&good, Status::Accept);
        assert_eq!(calculate_score(&good), 1.0);

        let bad = judge.judge(&problem, BAD_SUM);
        assert_all(&bad, Status::WrongAnswer);
        assert_eq!(calculate_score(&bad), 0.0);
    }

    #[test]
    fn test_zero_and_one_workers() {
        for workers in [0, 1] {
            let judge = create_test_judge(workers);
            assert_eq!(judge.workers(), 1);

            let verdicts = judge.judge(&echo_problem(3, 5), ",.>,.");
            assert_all(&verdicts, Status::Accept);
        }
    }

    #[test]
    fn test_many_workers_keep_order() {
        let judge = create_test_judge(4);
        let problem = echo_problem(4, 16);

        let verdicts = judge.judge(&problem, ",.>,.");
        assert_eq!(verdicts.len(), 4);
        assert!(verdicts.iter().all(|group| group.len() == 16));
        assert_all(&verdicts, Status::Accept);

        // echoing only the first byte is wrong everywhere
        let verdicts = judge.judge(&problem, ",.");
        assert_all(&verdicts, Status::WrongAnswer);
    }

    #[test]
    fn test_submission_bytes_need_not_be_utf8() {
        let judge = create_test_judge(2);
        let verdicts = judge.judge(&echo_problem(2, 3), b"\xff,.>\xfe,.".as_slice());
        assert_all(&verdicts, Status::Accept);

        let verdicts = judge.judge(&echo_problem(1, 1), b"\xe9 ]".as_slice());
        assert_eq!(verdicts[0][0].comment, "compilation error: bracket ']' at offset 2 is unmatched");
    }

    #[test]
    fn test_compile_failures() {
        let judge = create_test_judge(1);
        let problem = sum_problem();

        let verdicts = judge.judge(&problem, ",[.");
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].len(), 1);
        assert_eq!(verdicts[0][0].status, Status::CompilationFailed);

        let verdicts = judge.judge(&problem, &"+".repeat(101));
        assert_eq!(verdicts[0][0].status, Status::SourceSizeLimit);
        assert_eq!(verdicts.len(), 1);
    }

    #[test]
    fn test_runtime_errors() {
        let judge = create_test_judge(2);
        let problem = sum_problem();

        let verdicts = judge.judge(&problem, "+[]");
        assert_all(&verdicts, Status::RuntimeError);
        assert_eq!(verdicts[0][0].comment, "runtime error: step limit");

        let verdicts = judge.judge(&problem, "+[>+]");
        assert_all(&verdicts, Status::RuntimeError);
        assert_eq!(verdicts[0][0].comment, "runtime error: memory limit");

        let verdicts = judge.judge(&problem, "<");
        assert_eq!(verdicts[2][5].comment, "runtime error: head underflow");
    }

    #[test]
    fn test_generator_failure() {
        let judge = create_test_judge(1);
        let problem = Problem::new(
            Generator::lua("test_data = 123", SandboxLimits::default()),
            Checker::List(ListChecker::default()),
            Limits::unlimited(),
        );

        let verdicts = judge.judge(&problem, ",.");
        assert_eq!(verdicts, vec![vec![Verdict::new(Status::CheckerFailed, "invalid test_data type")]]);
    }

    #[test]
    fn test_generator_is_cached_after_first_judge() {
        let judge = create_test_judge(1);
        let problem = sum_problem();
        assert!(!problem.generator().is_cached());

        judge.judge(&problem, GOOD_SUM);
        assert!(problem.generator().is_cached());
    }

    #[test]
    fn test_concurrent_judging() {
        let judge = Arc::new(create_test_judge(3));
        let problem = Arc::new(echo_problem(2, 8));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let judge = judge.clone();
                let problem = problem.clone();
                std::thread::spawn(move || judge.judge(&problem, ",.>,."))
            })
            .collect();

        for handle in handles {
            let verdicts = handle.join().expect("judging thread panicked");
            assert_eq!(calculate_score(&verdicts), 1.0);
        }
    }

    #[test]
    fn test_lua_echo() {
        let checker = r#"
            z = string.char(0)

            function checker(input, output)
                if input == output then
                    return ""
                else
                    return "Expected output to equal input, got: " .. output
                end
            end

            test_data = {
                "hello" .. z,
                "123" .. z,
                "" .. z,
                "Brainfuck!" .. z,
                "a\nb\nc" .. z,
            }
        "#;
        run_lua_problem(checker, ",[.,]>.", ",[,.]");
    }

    #[test]
    fn test_lua_increment_all() {
        let checker = r#"
            z = string.char(0)

            function solution(input)
                local expected = input:gsub(".", function(c)
                    return string.char((c:byte() + 1) % 256)
                end)
                return expected:sub(1, expected:len()-1) .. z
            end

            test_data = {
                "abc" .. z,
                "123" .. z,
                "" .. z,
                "~}|" .. z,
                "hello world" .. z,
            }
        "#;
        run_lua_problem(checker, ",[+.,]>.", ",[-.,]");
    }

    #[test]
    fn test_lua_length() {
        let checker = r#"
            function solution(input)
                return string.char(#input - 1)
            end

            test_data = {
                "\0",
                "a\0",
                "ab\0",
                "abc\0",
                "12345\0",
            }
        "#;
        run_lua_problem(checker, ",[->+<,]>.", "++++[>++++++++<-],[>+<-]>.");
    }

    fn run_lua_problem(script: &str, good: &str, bad: &str) {
        let judge = create_test_judge(1);
        let problem = ProblemDefinition::new(Limits::new(1_000_000, 1_000_000, 1_000_000))
            .with_lua(script)
            .build()
            .expect("Failed to build lua problem");

        let verdicts = judge.judge(&problem, good);
        assert_eq!(calculate_score(&verdicts), 1.0, "good submission: {:?}", verdicts);

        let verdicts = judge.judge(&problem, bad);
        assert_eq!(calculate_score(&verdicts), 0.0, "bad submission: {:?}", verdicts);
    }
}
