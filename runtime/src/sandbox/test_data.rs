use std::sync::Arc;
use mlua::{Table, Value};
use crate::problem::TestGroups;
use crate::sandbox::{Sandbox, SandboxError, SandboxLimits, SandboxResult};

/// Highest table index scanned for tests
const MAX_TABLE_SCAN: i64 = 100_000;

/// Extract tests from the `test_data` global of a Lua script.
///
/// Accepted shapes:
///
/// ```lua
/// test_data = "abc"                            -- one test
/// test_data = {"1", "2", "3"}                  -- three single-test groups
/// test_data = {{"1", "2"}, nil, "3", {}}       -- {{"1", "2"}, {"3"}}
/// function test_data() return {"1", "2"} end   -- called with no arguments
/// ```
///
/// Nil entries and empty groups are dropped. The whole run, including the
/// top-level chunk, shares one `call_timeout` budget.
pub fn get_tests(source: &str, limits: &SandboxLimits) -> SandboxResult<TestGroups> {
    let sandbox = Sandbox::new(limits)?;
    sandbox.set_timeout(limits.call_timeout);
    sandbox.exec(source)?;

    let data = match sandbox.global("test_data")? {
        Value::Function(function) => sandbox.call::<Value>(&function, ())?,
        other => other,
    };

    parse_tests(data)
}

fn parse_tests(data: Value) -> SandboxResult<TestGroups> {
    let table = match data {
        Value::String(text) => return Ok(vec![vec![text.as_bytes().to_vec()]]),
        Value::Table(table) => table,
        _ => return Err(SandboxError::InvalidTestData),
    };

    let mut groups = Vec::new();
    for index in 1..=scan_len(&table)? {
        match table.raw_get::<Value>(index)? {
            Value::Nil => continue,
            Value::String(text) => groups.push(vec![text.as_bytes().to_vec()]),
            Value::Table(inner) => {
                let mut group = Vec::new();
                for inner_index in 1..=scan_len(&inner)? {
                    match inner.raw_get::<Value>(inner_index)? {
                        Value::Nil => continue,
                        Value::String(text) => group.push(text.as_bytes().to_vec()),
                        _ => return Err(SandboxError::NestedNonString),
                    }
                }
                if !group.is_empty() {
                    groups.push(group);
                }
            },
            _ => return Err(SandboxError::InvalidElement),
        }
    }

    if groups.is_empty() {
        return Err(SandboxError::EmptyTestData);
    }
    Ok(groups)
}

/// Largest positive integer key, capped at [`MAX_TABLE_SCAN`]
fn scan_len(table: &Table) -> SandboxResult<i64> {
    let mut max = 0;
    for pair in table.clone().pairs::<Value, Value>() {
        if let (Value::Integer(key), _) = pair? {
            max = max.max(key);
        }
    }
    Ok(max.min(MAX_TABLE_SCAN))
}

/// Lua script producing test data on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptGenerator {
    source: Arc<str>,
    limits: SandboxLimits,
}

impl ScriptGenerator {
    pub fn new(source: &str, limits: SandboxLimits) -> Self {
        Self {
            source: source.into(),
            limits,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run the script and extract its tests, see [`get_tests`]
    pub fn generate(&self) -> SandboxResult<TestGroups> {
        get_tests(&self.source, &self.limits)
    }
}
