//! Run command implementation

use lunabind_engine::Engine;
use std::path::Path;
use std::process::ExitCode;

pub fn run_file(engine: &Engine, path: &Path) -> ExitCode {
    let result = engine.evaluate_file(path);
    super::report(engine, &result)
}
