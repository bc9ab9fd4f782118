use std::fmt;

/// Outcome category of one judged test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Accept,
    CompilationFailed,
    RuntimeError,
    SourceSizeLimit,
    TimeLimit,
    MemoryLimit,
    WrongAnswer,
    CheckerFailed,
    JudgeFailed,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Status::Accept => "Accept",
            Status::CompilationFailed => "CompilationFailed",
            Status::RuntimeError => "RuntimeError",
            Status::SourceSizeLimit => "SourceSizeLimit",
            Status::TimeLimit => "TimeLimit",
            Status::MemoryLimit => "MemoryLimit",
            Status::WrongAnswer => "WrongAnswer",
            Status::CheckerFailed => "CheckerFailed",
            Status::JudgeFailed => "JudgeFailed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of judging one test: a status plus an optional comment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    pub status: Status,
    pub comment: String,
}

impl Verdict {
    pub fn new(status: Status, comment: impl Into<String>) -> Self {
        Self {
            status,
            comment: comment.into(),
        }
    }

    pub fn accept() -> Self {
        Self::default()
    }

    pub fn is_accept(&self) -> bool {
        self.status == Status::Accept
    }
}

/// Verdict without a comment
impl From<Status> for Verdict {
    fn from(status: Status) -> Self {
        Self::new(status, String::new())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comment.is_empty() {
            write!(f, "{}", self.status)
        } else {
            write!(f, "{}: {}", self.status, self.comment)
        }
    }
}

/// Verdicts in group order, one inner vector per group
pub type Verdicts = Vec<Vec<Verdict>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_accept() {
        let verdict = Verdict::default();
        assert!(verdict.is_accept());
        assert_eq!(verdict, Verdict::accept());
        assert_eq!(Status::default(), Status::Accept);
    }

    #[test]
    fn test_display() {
        assert_eq!(Verdict::accept().to_string(), "Accept");
        assert_eq!(Verdict::from(Status::WrongAnswer).to_string(), "WrongAnswer");
        assert_eq!(
            Verdict::new(Status::RuntimeError, "runtime error: head underflow").to_string(),
            "RuntimeError: runtime error: head underflow"
        );
        assert_eq!(Status::SourceSizeLimit.to_string(), "SourceSizeLimit");
    }
}
