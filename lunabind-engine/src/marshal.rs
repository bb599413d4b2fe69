//! Conversion between host variants and VM values
//!
//! Host → VM conversion is unbounded: host-built values are trusted.
//! VM → host conversion carries a table nesting budget; a table met once
//! the budget is spent becomes `Invalid` inside its parent instead of
//! failing the whole conversion.

use lunabind_core::{Variant, VariantList, VariantMap};
use mlua::{Lua, MultiValue, Value as LuaValue};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{trace, warn};

use crate::handles::HandleRegistry;

/// Conversion context shared by the engine and every gateway it installs
#[derive(Clone)]
pub struct Marshaler {
    max_depth: usize,
    trace: bool,
    handles: Rc<RefCell<HandleRegistry>>,
}

impl Marshaler {
    pub fn new(max_depth: usize, trace: bool, handles: Rc<RefCell<HandleRegistry>>) -> Self {
        Self {
            max_depth,
            trace,
            handles,
        }
    }

    pub fn handles(&self) -> &Rc<RefCell<HandleRegistry>> {
        &self.handles
    }

    /// Convert a host value into a VM value
    pub fn push_value(&self, lua: &Lua, value: &Variant) -> mlua::Result<LuaValue> {
        if self.trace {
            trace!(kind = %value.variant_type(), "push");
        }

        Ok(match value {
            Variant::Boolean(b) => LuaValue::Boolean(*b),
            Variant::Integer(i) => LuaValue::Integer(*i),
            Variant::Real(r) => LuaValue::Number(*r),
            Variant::String(s) => LuaValue::String(lua.create_string(s)?),
            Variant::List(items) => {
                let table = lua.create_table()?;
                // Script arrays start at 1
                for (index, item) in items.iter().enumerate() {
                    table.set(index as i64 + 1, self.push_value(lua, item)?)?;
                }
                LuaValue::Table(table)
            }
            Variant::Map(map) => {
                let table = lua.create_table()?;
                for (key, item) in map {
                    table.set(key.as_str(), self.push_value(lua, item)?)?;
                }
                LuaValue::Table(table)
            }
            Variant::Invalid | Variant::Null => LuaValue::Nil,
        })
    }

    /// Convert call arguments, keeping their order
    pub fn push_args(&self, lua: &Lua, args: &[Variant]) -> mlua::Result<MultiValue> {
        args.iter()
            .map(|arg| self.push_value(lua, arg))
            .collect::<mlua::Result<Vec<_>>>()
            .map(MultiValue::from_vec)
    }

    /// Value returned from a native callable: nothing for `Invalid`, one value otherwise
    pub fn push_return(&self, lua: &Lua, result: &Variant) -> mlua::Result<MultiValue> {
        if !result.is_valid() {
            return Ok(MultiValue::new());
        }
        Ok(MultiValue::from_vec(vec![self.push_value(lua, result)?]))
    }

    /// Convert a VM value with the full nesting budget
    pub fn pop_value(&self, lua: &Lua, value: LuaValue) -> Variant {
        self.pop_value_safe(lua, value, self.max_depth)
    }

    /// Convert a VM value; `remaining` is the number of table levels still allowed
    pub fn pop_value_safe(&self, lua: &Lua, value: LuaValue, remaining: usize) -> Variant {
        let result = match value {
            LuaValue::Nil => Variant::Null,
            LuaValue::Boolean(b) => Variant::Boolean(b),
            // Both number subtypes come back as reals
            LuaValue::Integer(i) => Variant::Real(i as f64),
            LuaValue::Number(n) => Variant::Real(n),
            LuaValue::String(s) => Variant::String(String::from(s.to_string_lossy())),
            LuaValue::Table(table) => self.pop_table(lua, table, remaining),
            // The key is created before the registry is borrowed: creating it
            // may run finalizers that call back into a gateway
            LuaValue::Function(function) => match lua.create_registry_value(function) {
                Ok(key) => Variant::Integer(self.handles.borrow_mut().retain(key)),
                Err(err) => {
                    warn!("Failed to retain script function: {}", err);
                    Variant::Invalid
                }
            },
            _ => Variant::Invalid,
        };

        if self.trace {
            trace!(kind = %result.variant_type(), remaining, "pop");
        }
        result
    }

    fn pop_table(&self, lua: &Lua, table: mlua::Table, remaining: usize) -> Variant {
        if remaining == 0 {
            trace!("table nesting budget exhausted");
            return Variant::Invalid;
        }

        let mut map = VariantMap::new();
        let mut sequence = VariantList::new();

        for pair in table.pairs::<LuaValue, LuaValue>() {
            let (key, value) = match pair {
                Ok(pair) => pair,
                Err(err) => {
                    warn!("Skipping unreadable table entry: {}", err);
                    continue;
                }
            };
            match key {
                LuaValue::String(key) => {
                    let key = String::from(key.to_string_lossy());
                    map.insert(key, self.pop_value_safe(lua, value, remaining - 1));
                }
                _ => sequence.push(self.pop_value_safe(lua, value, remaining - 1)),
            }
        }

        if map.is_empty() {
            // An empty table is a map, never a list
            if sequence.is_empty() {
                Variant::Map(map)
            } else {
                Variant::List(sequence)
            }
        } else {
            for (index, item) in sequence.into_iter().enumerate() {
                map.insert((index + 1).to_string(), item);
            }
            Variant::Map(map)
        }
    }

    /// Recover call arguments in call order.
    ///
    /// Arguments are taken from the top (last argument first) and prepended,
    /// so function handles are allocated from the last argument backwards.
    pub fn pop_args(&self, lua: &Lua, mut args: MultiValue) -> VariantList {
        let mut collected = VecDeque::with_capacity(args.len());
        while let Some(value) = args.pop_back() {
            collected.push_front(self.pop_value(lua, value));
        }
        collected.into()
    }

    /// Fold a return set: none → `Invalid`, one → itself, several → `List`
    pub fn collect_returns(&self, lua: &Lua, values: MultiValue) -> Variant {
        let mut values = self.pop_args(lua, values);
        match values.len() {
            0 => Variant::Invalid,
            1 => values.remove(0),
            _ => Variant::List(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marshaler() -> Marshaler {
        Marshaler::new(16, false, Rc::new(RefCell::new(HandleRegistry::new())))
    }

    fn round_trip(lua: &Lua, m: &Marshaler, value: &Variant) -> Variant {
        let pushed = m.push_value(lua, value).unwrap();
        m.pop_value(lua, pushed)
    }

    #[test]
    fn test_primitive_round_trip() {
        let lua = Lua::new();
        let m = marshaler();

        assert_eq!(round_trip(&lua, &m, &Variant::from(true)), Variant::from(true));
        assert_eq!(round_trip(&lua, &m, &Variant::from(2.5)), Variant::from(2.5));
        assert_eq!(round_trip(&lua, &m, &Variant::from("abc")), Variant::from("abc"));
        assert_eq!(round_trip(&lua, &m, &Variant::Null), Variant::Null);
    }

    #[test]
    fn test_integer_normalizes_to_real() {
        let lua = Lua::new();
        let m = marshaler();

        let back = round_trip(&lua, &m, &Variant::Integer(42));
        assert_eq!(back, Variant::Real(42.0));
        assert_eq!(back.to_integer(0), 42);
    }

    #[test]
    fn test_invalid_pushes_nil() {
        let lua = Lua::new();
        let m = marshaler();
        assert!(m.push_value(&lua, &Variant::Invalid).unwrap().is_nil());
    }

    #[test]
    fn test_list_becomes_one_based_table() {
        let lua = Lua::new();
        let m = marshaler();

        let value = Variant::from(vec![Variant::from("a"), Variant::from("b")]);
        let table = match m.push_value(&lua, &value).unwrap() {
            LuaValue::Table(table) => table,
            other => panic!("expected table, got {:?}", other),
        };
        assert_eq!(table.get::<String>(1).unwrap(), "a");
        assert_eq!(table.get::<String>(2).unwrap(), "b");
        assert_eq!(table.raw_len(), 2);
    }

    #[test]
    fn test_empty_table_is_map() {
        let lua = Lua::new();
        let m = marshaler();

        let table = lua.create_table().unwrap();
        assert_eq!(m.pop_value(&lua, LuaValue::Table(table)), Variant::Map(VariantMap::new()));
    }

    #[test]
    fn test_mixed_table_folds_sequence_into_map() {
        let lua = Lua::new();
        let m = marshaler();

        let table: LuaValue = lua.load("return {10, 20, a = 'x'}").eval().unwrap();
        let value = m.pop_value(&lua, table);

        let mut expected = VariantMap::new();
        expected.insert("1".to_string(), Variant::Real(10.0));
        expected.insert("2".to_string(), Variant::Real(20.0));
        expected.insert("a".to_string(), Variant::from("x"));
        assert_eq!(value, Variant::Map(expected));
    }

    #[test]
    fn test_depth_budget_truncates_nested_tables() {
        let lua = Lua::new();
        let m = Marshaler::new(2, false, Rc::new(RefCell::new(HandleRegistry::new())));

        let table: LuaValue = lua
            .load("return {name = 'outer', inner = {name = 'mid', inner = {name = 'deep'}}}")
            .eval()
            .unwrap();
        let value = m.pop_value(&lua, table);

        let mid = value.get("inner").unwrap();
        assert_eq!(mid.get("name").unwrap(), &Variant::from("mid"));
        assert_eq!(mid.get("inner").unwrap(), &Variant::Invalid);
        assert_eq!(value.get("name").unwrap(), &Variant::from("outer"));
    }

    #[test]
    fn test_function_becomes_handle() {
        let lua = Lua::new();
        let m = marshaler();

        let function: LuaValue = lua.load("return print").eval().unwrap();
        let value = m.pop_value(&lua, function);

        assert_eq!(value, Variant::Integer(1));
        assert_eq!(m.handles().borrow().len(), 1);
    }

    #[test]
    fn test_pop_args_keeps_call_order() {
        let lua = Lua::new();
        let m = marshaler();

        let args = m
            .push_args(&lua, &[Variant::from(1), Variant::from("two"), Variant::from(false)])
            .unwrap();
        assert_eq!(
            m.pop_args(&lua, args),
            vec![Variant::Real(1.0), Variant::from("two"), Variant::from(false)]
        );
    }

    #[test]
    fn test_collect_returns_shapes() {
        let lua = Lua::new();
        let m = marshaler();

        assert_eq!(m.collect_returns(&lua, MultiValue::new()), Variant::Invalid);

        let one = m.push_args(&lua, &[Variant::from("x")]).unwrap();
        assert_eq!(m.collect_returns(&lua, one), Variant::from("x"));

        let many = m.push_args(&lua, &[Variant::from("x"), Variant::Null]).unwrap();
        assert_eq!(
            m.collect_returns(&lua, many),
            Variant::List(vec![Variant::from("x"), Variant::Null])
        );
    }
}
