use log::debug;
use crate::bytecode::ByteCode;
use crate::problem::{Checker, Generator, Limits, Problem, ProblemError, ProblemResult, VmSolution};
use crate::sandbox::{SandboxError, SandboxLimits, ScriptChecker};

/// Source parts of a problem as written by its author.
///
/// A Lua script may provide `test_data` and/or a `checker`/`solution`
/// function. Tape programs may provide a generator, a checker or a
/// reference solution. Exactly one checking strategy must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemDefinition {
    pub lua: Option<String>,
    pub generator: Option<String>,
    pub checker: Option<String>,
    pub solution: Option<String>,
    pub limits: Limits,
    pub sandbox: SandboxLimits,
}

impl ProblemDefinition {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn with_lua(mut self, source: impl Into<String>) -> Self {
        self.lua = Some(source.into());
        self
    }

    /// Tape program generating tests
    pub fn with_generator(mut self, source: impl Into<String>) -> Self {
        self.generator = Some(source.into());
        self
    }

    /// Tape program checking outputs
    pub fn with_checker(mut self, source: impl Into<String>) -> Self {
        self.checker = Some(source.into());
        self
    }

    /// Tape program whose output is the expected answer
    pub fn with_solution(mut self, source: impl Into<String>) -> Self {
        self.solution = Some(source.into());
        self
    }

    pub fn with_sandbox(mut self, sandbox: SandboxLimits) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Validate every part and assemble the problem.
    ///
    /// Generators are taken from the Lua script, then the tape generator,
    /// and combined when both exist. A Lua script without `checker` or
    /// `solution` only contributes tests.
    pub fn build(&self) -> ProblemResult<Problem> {
        let lua = self.lua.as_deref().filter(|source| !source.is_empty());
        let generator = self.generator.as_deref().filter(|source| !source.is_empty());
        let checker = self.checker.as_deref().filter(|source| !source.is_empty());
        let solution = self.solution.as_deref().filter(|source| !source.is_empty());

        let mut generators = Vec::new();
        if let Some(source) = lua {
            generators.push(Generator::lua(source, self.sandbox));
        }
        if let Some(source) = generator {
            generators.push(Generator::vm(source).map_err(ProblemError::InvalidGenerator)?);
        }
        if generators.is_empty() {
            return Err(ProblemError::NoGenerator);
        }

        let mut found = None;
        if let Some(source) = checker {
            found = Some(Checker::vm(source).map_err(ProblemError::InvalidChecker)?);
        }
        if let Some(source) = solution {
            if found.is_some() {
                return Err(ProblemError::ManyCheckers);
            }
            let code = ByteCode::compile(source, self.limits.instructions())
                .map_err(ProblemError::InvalidSolution)?;
            let solution = VmSolution::new(code, self.limits.steps(), self.limits.memory());
            found = Some(Checker::Solution(solution));
        }
        if let Some(source) = lua {
            match ScriptChecker::new(source, self.sandbox) {
                Ok(script) => {
                    if found.is_some() {
                        return Err(ProblemError::ManyCheckers);
                    }
                    found = Some(Checker::Lua(script));
                },
                Err(SandboxError::NotAChecker) => debug!("lua script only provides tests"),
                Err(err) => return Err(ProblemError::InvalidScript(err)),
            }
        }

        let checker = found.ok_or(ProblemError::NoChecker)?;
        Ok(Problem::new(Generator::combine(generators), checker, self.limits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::CompileError;
    use crate::problem::InputGenerator;

    const LUA_SOLUTION: &str = r#"
        function solution(input)
            return input
        end
        test_data = {"a", "b"}
    "#;

    const LUA_TESTS: &str = r#"test_data = {"x"}"#;

    fn limits() -> Limits {
        Limits::new(100, 10_000, 200)
    }

    #[test]
    fn test_lua_only() {
        let problem = ProblemDefinition::new(limits()).with_lua(LUA_SOLUTION).build().unwrap();

        assert!(matches!(**problem.checker(), Checker::Lua(_)));
        assert_eq!(problem.limits(), limits());
        assert_eq!(
            problem.generator().generate_input().unwrap(),
            vec![vec![b"a".to_vec()], vec![b"b".to_vec()]]
        );
    }

    #[test]
    fn test_combined_generators() {
        let problem = ProblemDefinition::new(limits())
            .with_lua(LUA_TESTS)
            .with_generator("+.+.+.")
            .with_solution(",.")
            .build()
            .unwrap();

        assert!(matches!(**problem.checker(), Checker::Solution(_)));
        assert_eq!(
            problem.generator().generate_input().unwrap(),
            vec![vec![b"x".to_vec()], vec![vec![3]]]
        );
    }

    #[test]
    fn test_solution_inherits_limits() {
        let problem = ProblemDefinition::new(limits()).with_lua(LUA_TESTS).with_solution(",.").build().unwrap();
        match &**problem.checker() {
            Checker::Solution(solution) => {
                assert_eq!(solution.steps(), Some(10_000));
                assert_eq!(solution.memory(), Some(200));
            },
            other => panic!("expected solution checker, got {:?}", other),
        }
    }

    #[test]
    fn test_many_checkers() {
        let err = ProblemDefinition::new(limits())
            .with_lua(LUA_TESTS)
            .with_checker(",")
            .with_solution(",.")
            .build()
            .unwrap_err();
        assert_eq!(err, ProblemError::ManyCheckers);

        let err = ProblemDefinition::new(limits())
            .with_lua(LUA_SOLUTION)
            .with_checker(",")
            .build()
            .unwrap_err();
        assert_eq!(err, ProblemError::ManyCheckers);
        assert_eq!(err.to_string(), "checker / solution defined multiple times");
    }

    #[test]
    fn test_missing_parts() {
        let err = ProblemDefinition::new(limits()).with_lua(LUA_TESTS).build().unwrap_err();
        assert_eq!(err, ProblemError::NoChecker);

        let err = ProblemDefinition::new(limits()).with_checker(",").build().unwrap_err();
        assert_eq!(err, ProblemError::NoGenerator);
    }

    #[test]
    fn test_invalid_sources() {
        let err = ProblemDefinition::new(limits())
            .with_generator("[")
            .with_checker(",")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ProblemError::InvalidGenerator(CompileError::UnmatchedBracket { bracket: '[', offset: 0 })
        );

        let err = ProblemDefinition::new(limits())
            .with_lua(LUA_TESTS)
            .with_solution(&"+".repeat(101))
            .build()
            .unwrap_err();
        assert_eq!(err, ProblemError::InvalidSolution(CompileError::InstructionLimit { offset: 100 }));

        let err = ProblemDefinition::new(limits()).with_lua("function (").build().unwrap_err();
        assert!(matches!(err, ProblemError::InvalidScript(SandboxError::Compile(_))), "got {:?}", err);
    }
}
