#![forbid(unsafe_code)]

//! Core: observable properties, lazy binding expressions, and synchronous
//! change propagation.
//!
//! - [`Property`] / [`ReadOnly`]: typed storage cells. Reads are pull-based;
//!   every `value()` recomputes the full expression behind the property.
//! - [`Binding`]: a detached expression built by combining properties,
//!   bindings, and plain values with operators. Assigning it to a property
//!   makes the property follow its inputs.
//! - [`BindingNotifier`]: the per-property node of the change-propagation
//!   graph. Mutations notify callbacks first, then every dependent,
//!   depth-first, exactly once per pass.
//!
//! # Architecture
//!
//! Everything is single-threaded: properties hold `Rc`/`RefCell` state and
//! are neither `Send` nor `Sync`. Storage nodes are reference counted by
//! every reader; notifier edges are weak and pruned lazily when a dependent
//! has gone away.
//!
//! ```
//! use rebind_core::{BindGreater, Property};
//!
//! let mut width = Property::new(100);
//! let height = Property::from_property(&width);
//! let wide = Property::from_binding((&width).greater(&height));
//! let area = Property::from_binding(&width * &height);
//!
//! width.set_value(20);
//! assert_eq!(height.value(), 20);
//! assert_eq!(area.value(), 400);
//! assert!(!wide.value());
//! ```
//!
//! # Feature Flags
//!
//! - `tracing`: emit `tracing` spans and events for propagation passes,
//!   literal writes, unsharing, freezing, edge pruning, and rejected cycles.
//! - `test-helpers`: expose storage-sharing diagnostics for downstream tests.

pub mod binding;
pub mod calc;
mod data;
pub mod dispatch;
pub mod error;
pub mod notifier;
pub mod property;

pub use binding::Binding;
pub use calc::{BinaryOp, Convert, Plain, Truthy, UnaryOp};
pub use data::ReprKind;
pub use dispatch::{
    BindAnd, BindBitNot, BindEqual, BindGreater, BindGreaterEqual, BindLess, BindLessEqual,
    BindNotEqual, BindOr,
};
pub use error::{BindError, Result};
pub use notifier::{BindingContext, BindingNotifier, ContextToken, Flow, Liveness};
pub use property::{BasicProperty, Property, PropertyId, ReadOnly, Value};
