pub mod cli;
pub mod manifest;

pub use cli::{Cli, CliHandler, Commands, JudgeReport};
pub use manifest::{load_manifest, ProblemManifest};
