use std::sync::Arc;
use mlua::Value;
use crate::sandbox::{Sandbox, SandboxError, SandboxLimits, SandboxResult};

/// Which global function a script is judged with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptMode {
    /// `checker(input, output)` decides the verdict
    Checker,
    /// `solution(input)` returns the expected output
    Solution,
}

/// A validated Lua script that judges one test at a time.
///
/// The script must define `checker(input, output)`, `solution(input)` or
/// both; `checker` wins when both exist. The source is parsed once, at
/// construction, and kept as a binary chunk. Each check loads that chunk
/// into a fresh [`Sandbox`], so the value is immutable and safe to share
/// between threads.
#[derive(Debug, Clone)]
pub struct ScriptChecker {
    source: Arc<str>,
    chunk: Arc<[u8]>,
    mode: ScriptMode,
    limits: SandboxLimits,
}

impl ScriptChecker {
    /// Compile and run the script once to find out which mode it supports
    pub fn new(source: &str, limits: SandboxLimits) -> SandboxResult<Self> {
        let sandbox = Sandbox::new(&limits)?;
        let chunk = sandbox.precompile(source)?;
        sandbox.exec_compiled(&chunk)?;

        let checker = !sandbox.global("checker")?.is_nil();
        let solution = !sandbox.global("solution")?.is_nil();

        let mode = match (checker, solution) {
            (true, _) => ScriptMode::Checker,
            (false, true) => ScriptMode::Solution,
            (false, false) => return Err(SandboxError::NotAChecker),
        };

        Ok(Self {
            source: source.into(),
            chunk: chunk.into(),
            mode,
            limits,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn mode(&self) -> ScriptMode {
        self.mode
    }

    pub fn limits(&self) -> SandboxLimits {
        self.limits
    }

    /// Judge one test.
    ///
    /// An error means the checker itself failed. Otherwise an empty string
    /// is a pass and anything else is the failure comment.
    pub fn check(&self, input: &[u8], output: &[u8]) -> SandboxResult<String> {
        let sandbox = Sandbox::new(&self.limits)?;
        sandbox.exec_compiled(&self.chunk)?;
        sandbox.set_timeout(self.limits.call_timeout);

        match self.mode {
            ScriptMode::Checker => run_checker(&sandbox, input, output),
            ScriptMode::Solution => run_solution(&sandbox, input, output),
        }
    }
}

fn run_checker(sandbox: &Sandbox, input: &[u8], output: &[u8]) -> SandboxResult<String> {
    let checker = sandbox.function("checker")?;
    let args = (sandbox.create_string(input)?, sandbox.create_string(output)?);
    let result: Value = sandbox.call(&checker, args)?;

    match result {
        Value::Nil | Value::Boolean(false) => Ok(String::new()),
        Value::String(ref text) if text.as_bytes().is_empty() => Ok(String::new()),
        Value::Boolean(true) => {
            let stdout = sandbox.stdout();
            if stdout.is_empty() {
                Ok("test failed".to_string())
            } else {
                Ok(stdout)
            }
        },
        other => {
            let mut comment = sandbox.stdout();
            comment.push_str(&sandbox.to_text(other)?);
            Ok(comment)
        },
    }
}

fn run_solution(sandbox: &Sandbox, input: &[u8], output: &[u8]) -> SandboxResult<String> {
    let solution = sandbox.function("solution")?;
    let result: Value = sandbox.call(&solution, sandbox.create_string(input)?)?;

    // Numbers convert the way Lua coerces them to strings
    let expected = match result {
        Value::String(expected) => expected.as_bytes().to_vec(),
        number @ (Value::Integer(_) | Value::Number(_)) => sandbox.to_text(number)?.into_bytes(),
        other => return Err(SandboxError::BadReturn(other.type_name())),
    };

    if expected == output {
        Ok(String::new())
    } else {
        let mut comment = sandbox.stdout();
        comment.push_str("result do not match");
        Ok(comment)
    }
}
