#![forbid(unsafe_code)]

//! Rebind public facade crate.
//!
//! Re-exports the property engine from `rebind-core` and adds small record
//! types built on it.

pub mod model;

pub use rebind_core as core;

pub mod prelude {
    pub use crate::model::{Item, Rectangle};
    pub use rebind_core::{
        BasicProperty, BindAnd, BindBitNot, BindEqual, BindError, BindGreater, BindGreaterEqual,
        BindLess, BindLessEqual, BindNotEqual, BindOr, Binding, BindingContext, ContextToken, Flow,
        Liveness, Property, ReadOnly,
    };
}
