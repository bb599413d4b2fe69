//! Eval command implementation

use lunabind_engine::Engine;
use std::process::ExitCode;

pub fn eval_source(engine: &Engine, source: &str) -> ExitCode {
    let result = engine.evaluate(source);
    super::report(engine, &result)
}
