//! Call command implementation

use lunabind_engine::{Engine, Variant};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;

/// Interpret a command line argument: JSON when it parses, a string otherwise
pub fn parse_arg(text: &str) -> Variant {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(json) => Variant::from_json(&json),
        Err(_) => Variant::from(text),
    }
}

pub fn call_function(engine: &Engine, path: &Path, function: &str, args: &[String]) -> ExitCode {
    engine.evaluate_file(path);
    if engine.is_error() {
        return super::report(engine, &Variant::Invalid);
    }

    let args: Vec<Variant> = args.iter().map(|arg| parse_arg(arg)).collect();
    debug!("Calling {} with {} args", function, args.len());

    let result = engine.invoke(function, &args);
    super::report(engine, &result)
}
