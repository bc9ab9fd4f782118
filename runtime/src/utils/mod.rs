//! Utility functions for problem files

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use crate::problem::{Limits, Problem, ProblemDefinition, ProblemResult};
use crate::serialization::DecodeError;

/// Errors reading a problem file
#[derive(Error, Debug)]
pub enum ProblemFileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid problem file: {0}")]
    Decode(#[from] DecodeError),
}

/// Writes a problem in its binary form to a file
pub fn write_problem<P: AsRef<Path>>(problem: &Problem, path: P) -> Result<(), io::Error> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&problem.to_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Reads a problem written by [`write_problem`]
pub fn read_problem<P: AsRef<Path>>(path: P) -> Result<Problem, ProblemFileError> {
    let data = fs::read(path)?;
    Ok(Problem::from_bytes(&data)?)
}

/// Lua part of the demonstration problem
pub const DEMO_SCRIPT: &str = r#"
function solution(input)
    local a = string.byte(input, 1)
    local b = string.byte(input, 2)
    return string.char((a + b) % 256)
end

function test_data()
    local groups = {}
    for g = 1, 3 do
        local group = {}
        for t = 1, 8 do
            table.insert(group, string.char(random(0, 255), random(0, 255)))
        end
        table.insert(groups, group)
    end
    table.insert(groups, {string.char(255, 255), string.char(0, 0)})
    return groups
end
"#;

/// Generate a simple demonstration problem: add two bytes modulo 256
pub fn generate_demo_problem() -> ProblemResult<Problem> {
    ProblemDefinition::new(Limits::new(100, 10_000, 200))
        .with_lua(DEMO_SCRIPT)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use crate::problem::{InputGenerator, Status};
    use crate::runtime::{calculate_score, Judge};

    #[test]
    fn test_write_and_read_problem() {
        let problem = generate_demo_problem().expect("Failed to build demo problem");
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("demo.problem");

        let result = write_problem(&problem, &file_path);
        assert!(result.is_ok());
        assert!(file_path.exists());

        let loaded = read_problem(&file_path).expect("Failed to read problem back");
        assert_eq!(loaded.limits(), problem.limits());
        assert_eq!(fs::read(&file_path).unwrap(), problem.to_bytes());
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = tempdir().unwrap();
        let result = read_problem(temp_dir.path().join("missing.problem"));
        assert!(matches!(result, Err(ProblemFileError::Io(_))));
    }

    #[test]
    fn test_read_garbage_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("garbage.problem");
        fs::write(&file_path, [7, 0, 0]).unwrap();

        let result = read_problem(&file_path);
        assert!(matches!(result, Err(ProblemFileError::Decode(DecodeError::UnsupportedVersion(7)))));
    }

    #[test]
    fn test_demo_problem_is_deterministic() {
        let first = generate_demo_problem().unwrap();
        let second = generate_demo_problem().unwrap();

        let tests = first.generator().generate_input().unwrap();
        assert_eq!(tests.len(), 4);
        assert_eq!(tests, second.generator().generate_input().unwrap());
    }

    #[test]
    fn test_demo_problem_judging() {
        let judge = Judge::new(2).expect("Failed to create judge");
        let problem = generate_demo_problem().unwrap();

        let verdicts = judge.judge(&problem, ",>,<[->+<]>.");
        assert_eq!(calculate_score(&verdicts), 1.0);

        let verdicts = judge.judge(&problem, ",.");
        assert_eq!(verdicts[3][0].status, Status::WrongAnswer);
    }
}
