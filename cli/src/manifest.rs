use anyhow::{Context, Result};
use braincode::problem::{Limits, Problem, ProblemDefinition};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Program text given inline or as a path relative to the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Inline(String),
    File { file: PathBuf },
}

impl Source {
    fn resolve(&self, base: &Path) -> Result<String> {
        match self {
            Source::Inline(text) => Ok(text.clone()),
            Source::File { file } => {
                let path = base.join(file);
                fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
            },
        }
    }
}

/// JSON description of a problem.
///
/// ```json
/// {
///     "lua": { "file": "problem.lua" },
///     "solution": ",>,<[->+<]>.",
///     "instructions": 100,
///     "steps": 10000,
///     "memory": 200
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProblemManifest {
    pub lua: Option<Source>,
    pub generator: Option<Source>,
    pub checker: Option<Source>,
    pub solution: Option<Source>,
    pub instructions: usize,
    pub steps: u64,
    pub memory: usize,
}

impl ProblemManifest {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid problem manifest")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Resolve every source against `base` and collect the parts
    pub fn to_definition(&self, base: &Path) -> Result<ProblemDefinition> {
        let mut definition = ProblemDefinition::new(Limits::new(self.instructions, self.steps, self.memory));
        definition.lua = resolve(&self.lua, base).context("lua script")?;
        definition.generator = resolve(&self.generator, base).context("generator")?;
        definition.checker = resolve(&self.checker, base).context("checker")?;
        definition.solution = resolve(&self.solution, base).context("solution")?;
        Ok(definition)
    }
}

fn resolve(source: &Option<Source>, base: &Path) -> Result<Option<String>> {
    source.as_ref().map(|source| source.resolve(base)).transpose()
}

/// Read a manifest file and assemble its problem
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Problem> {
    let path = path.as_ref();
    let manifest = ProblemManifest::from_file(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let definition = manifest.to_definition(base)?;
    let problem = definition
        .build()
        .with_context(|| format!("failed to build problem from {}", path.display()))?;
    Ok(problem)
}
