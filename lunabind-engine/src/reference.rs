//! Handles bound to a named global

use lunabind_core::{Variant, VariantList};

use crate::engine::Engine;

/// Positional arguments accepted by [`Reference::call`]
pub trait IntoArgs {
    fn into_args(self) -> VariantList;
}

impl IntoArgs for () {
    fn into_args(self) -> VariantList {
        VariantList::new()
    }
}

impl IntoArgs for VariantList {
    fn into_args(self) -> VariantList {
        self
    }
}

impl IntoArgs for &[Variant] {
    fn into_args(self) -> VariantList {
        self.to_vec()
    }
}

macro_rules! impl_into_args {
    ($($name:ident),+) => {
        impl<$($name: Into<Variant>),+> IntoArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_args(self) -> VariantList {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_into_args!(A);
impl_into_args!(A, B);
impl_into_args!(A, B, C);
impl_into_args!(A, B, C, D);
impl_into_args!(A, B, C, D, E);

/// A global identifier paired with the engine it lives in.
///
/// A detached reference has no engine: reads and calls yield `Invalid`
/// and writes are ignored.
#[derive(Debug, Clone)]
pub struct Reference<'a> {
    identifier: String,
    engine: Option<&'a Engine>,
}

impl<'a> Reference<'a> {
    pub fn new(engine: &'a Engine, identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            engine: Some(engine),
        }
    }

    pub fn detached(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            engine: None,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_bound(&self) -> bool {
        self.engine.is_some()
    }

    /// Current value of the global
    pub fn value(&self) -> Variant {
        match self.engine {
            Some(engine) => engine.global_value(&self.identifier),
            None => Variant::Invalid,
        }
    }

    /// Overwrite the global
    pub fn set(&self, value: impl Into<Variant>) {
        if let Some(engine) = self.engine {
            engine.set_global_value(&self.identifier, &value.into());
        }
    }

    /// Call the global as a function
    pub fn call(&self, args: impl IntoArgs) -> Variant {
        match self.engine {
            Some(engine) => engine.invoke(&self.identifier, &args.into_args()),
            None => Variant::Invalid,
        }
    }
}
