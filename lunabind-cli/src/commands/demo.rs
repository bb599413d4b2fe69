//! Demo command implementation
//!
//! Walks through the engine features one step at a time, printing as it
//! goes: script functions, globals, exposed objects and native functions.

use anyhow::Result;
use lunabind_engine::{Engine, Scriptable, Variant};
use std::process::ExitCode;
use std::rc::Rc;

/// Sum all arguments as reals
pub fn sum(args: &[Variant]) -> Variant {
    Variant::Real(args.iter().map(|arg| arg.to_real(0.0)).sum())
}

/// Print each argument on its own line and return nothing
fn print_args(args: &[Variant]) -> Variant {
    for arg in args {
        println!("{}", arg);
    }
    Variant::Invalid
}

pub fn run_demo(engine: &Engine) -> Result<ExitCode> {
    // 1. Evaluate a script
    engine.evaluate("function add(x, y) return x + y end");
    if engine.is_error() {
        eprintln!("Lua error: {}", engine.error_text());
    }

    // 2. Call a script function
    let res = engine.global("add").call((2, 3));
    println!("res = {}", res);

    // 3. Assign a global
    let global = engine.global("GlobalValue");
    global.set("test");

    // 4. Read it back
    println!("GlobalValue = {}", global.value());

    // 5. Expose an object
    let unit = Rc::new(Scriptable::new().with_method("sum", sum));
    engine.register_object("MyUnit", &unit)?;
    engine.evaluate("local s = MyUnit.sum(1, 2, 3, 4, 5)\nprint('sum = ' .. s)");

    // 6. Expose a function
    engine.register_function("test", print_args)?;
    engine.evaluate("test('a', 'b', 'c')");

    // 7. Expose a closure carrying its own data
    engine.register_function_with_data("test2", String::from("test2"), |args, label| {
        for arg in args {
            println!("{}: {}", label, arg);
        }
        Variant::Invalid
    })?;
    engine.evaluate("test2(1, 2, 3)");

    Ok(super::report(engine, &Variant::Invalid))
}
