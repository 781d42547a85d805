#![forbid(unsafe_code)]

//! Detached binding expressions.
//!
//! A [`Binding<T>`] is what the operator overloads return: a zero-argument
//! function producing a `T` plus the set of notifiers whose changes can
//! change that result. It is inert until a property absorbs it through
//! [`BasicProperty::from_binding`](crate::BasicProperty::from_binding) or
//! [`BasicProperty::bind`](crate::BasicProperty::bind); until then it only
//! supports inspection and further composition.
//!
//! ```
//! use rebind_core::Property;
//!
//! let mut a = Property::new(2);
//! let b = Property::new(3);
//! let sum = &a + &b;
//! assert_eq!(sum.value(), 5);
//!
//! a.set_value(10);
//! assert_eq!(sum.value(), 13);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::calc::Convert;
use crate::data::Evaluator;
use crate::notifier::NotifierRef;
use crate::property::Value;

/// Lazy expression over properties, with its dependency set.
pub struct Binding<T> {
    eval: Evaluator<T>,
    dependencies: Vec<NotifierRef>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            eval: Rc::clone(&self.eval),
            dependencies: self.dependencies.clone(),
        }
    }
}

impl<T: Value> Binding<T> {
    pub(crate) fn from_parts(eval: Evaluator<T>, dependencies: Vec<NotifierRef>) -> Self {
        let mut unique: Vec<NotifierRef> = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            if !unique.iter().any(|seen| seen.same(&dep)) {
                unique.push(dep);
            }
        }
        Self {
            eval,
            dependencies: unique,
        }
    }

    /// A binding that always yields `value` and depends on nothing.
    #[must_use]
    pub fn constant(value: T) -> Self {
        Self::from_parts(Rc::new(move || value.clone()), Vec::new())
    }

    /// Evaluate the expression now.
    #[must_use]
    pub fn value(&self) -> T {
        (self.eval)()
    }

    /// Number of distinct notifiers this binding depends on.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Transform the result, keeping the dependency set.
    #[must_use]
    pub fn map<U: Value>(&self, f: impl Fn(T) -> U + 'static) -> Binding<U> {
        let eval = Rc::clone(&self.eval);
        Binding::from_parts(Rc::new(move || f(eval())), self.dependencies.clone())
    }

    /// Convert the result to another value type.
    #[must_use]
    pub fn convert<U: Value>(self) -> Binding<U>
    where
        T: Convert<U>,
    {
        let Self { eval, dependencies } = self;
        Binding::from_parts(
            Rc::new(move || <T as Convert<U>>::convert(eval())),
            dependencies,
        )
    }

    pub(crate) fn dependencies(&self) -> &[NotifierRef] {
        &self.dependencies
    }

    pub(crate) fn into_parts(self) -> (Evaluator<T>, Vec<NotifierRef>) {
        (self.eval, self.dependencies)
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("dependencies", &self.dependencies.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Property;

    #[test]
    fn constant_has_no_dependencies() {
        let b = Binding::constant(7);
        assert_eq!(b.value(), 7);
        assert_eq!(b.dependency_count(), 0);
    }

    #[test]
    fn clone_shares_expression() {
        let mut a = Property::new(1);
        let b = &a + 1;
        let c = b.clone();
        a.set_value(41);
        assert_eq!(b.value(), 42);
        assert_eq!(c.value(), 42);
    }

    #[test]
    fn dependencies_are_deduplicated() {
        let a = Property::new(1);
        let b = Property::new(2);
        let expr = (&a + &b) + &a;
        assert_eq!(expr.dependency_count(), 2);
    }

    #[test]
    fn map_keeps_dependencies() {
        let mut a = Property::new(3);
        let label = (&a * 2).map(|v| format!("{v}px"));
        assert_eq!(label.value(), "6px");
        assert_eq!(label.dependency_count(), 1);
        a.set_value(5);
        assert_eq!(label.value(), "10px");
    }

    #[test]
    fn convert_uses_truthiness() {
        let mut a = Property::new(0);
        let flag = (&a + 0).convert::<bool>();
        assert!(!flag.value());
        a.set_value(2);
        assert!(flag.value());
    }

    #[test]
    fn binding_does_not_mutate_operands() {
        let a = Property::new(5);
        let _expr = -&a;
        assert_eq!(a.value(), 5);
        assert_eq!(a.dependent_count(), 0);
    }
}
