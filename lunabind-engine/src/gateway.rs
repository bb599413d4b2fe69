//! Native callables installed into the VM
//!
//! Each gateway captures its own marshaling context, so script calls reach
//! host code without consulting any VM global.

use lunabind_core::Variant;
use mlua::{Function, Lua, MultiValue, Table};
use std::rc::{Rc, Weak};
use tracing::debug;

use crate::marshal::Marshaler;
use crate::scriptable::Scriptable;

/// Wrap a host function as a script callable.
///
/// Arguments arrive in call order; an `Invalid` result returns no values.
pub fn native_function<F>(
    lua: &Lua,
    marshaler: Marshaler,
    name: &str,
    log_calls: bool,
    f: F,
) -> mlua::Result<Function>
where
    F: Fn(&[Variant]) -> Variant + 'static,
{
    let name = name.to_string();
    lua.create_function(move |lua, args: MultiValue| {
        let args = marshaler.pop_args(lua, args);
        if log_calls {
            debug!("Gateway call: {} ({} args)", name, args.len());
        }
        let result = f(&args);
        marshaler.push_return(lua, &result)
    })
}

/// Build a table exposing every method of `object`.
///
/// The table holds the object weakly; once the host drops it every entry
/// returns no values.
pub fn scriptable_object(
    lua: &Lua,
    marshaler: Marshaler,
    name: &str,
    log_calls: bool,
    object: &Rc<Scriptable>,
) -> mlua::Result<Table> {
    let table = lua.create_table()?;

    for method in object.method_names() {
        let target: Weak<Scriptable> = Rc::downgrade(object);
        let marshaler = marshaler.clone();
        let qualified = format!("{}.{}", name, method);
        let key = method.to_string();

        let function = lua.create_function(move |lua, args: MultiValue| {
            let Some(target) = target.upgrade() else {
                debug!("Gateway call on dropped object: {}", qualified);
                return Ok(MultiValue::new());
            };
            let args = marshaler.pop_args(lua, args);
            if log_calls {
                debug!("Gateway call: {} ({} args)", qualified, args.len());
            }
            let result = target.invoke_method(&key, &args);
            marshaler.push_return(lua, &result)
        })?;
        table.set(method, function)?;
    }

    Ok(table)
}
