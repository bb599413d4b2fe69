//! Command implementations

use lunabind_engine::{Engine, Variant};
use std::process::ExitCode;

pub mod call;
pub mod demo;
pub mod eval;
pub mod run;

/// Print `result`, or the recorded script error on stderr.
///
/// `Invalid` results print nothing.
pub fn report(engine: &Engine, result: &Variant) -> ExitCode {
    if engine.is_error() {
        eprintln!("error {}: {}", engine.error(), engine.error_text());
        return ExitCode::FAILURE;
    }

    if result.is_valid() {
        println!("{}", result);
    }
    ExitCode::SUCCESS
}
