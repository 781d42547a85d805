#![forbid(unsafe_code)]

//! Operator dispatch: combining properties, bindings, and plain values.
//!
//! Every operand is one of three kinds, decided by its type alone:
//!
//! | Operand type               | Kind     | Contributes                      |
//! |----------------------------|----------|----------------------------------|
//! | `&BasicProperty<T, _>`     | Property | its slot and its notifier        |
//! | `Binding<T>`, `&Binding<T>`| Binding  | its function and dependency set  |
//! | any [`Plain`] type         | Plain    | a captured copy, no dependencies |
//!
//! The table functions below build the resulting [`Binding`] for each pair
//! of kinds. Pairs with a plain value or a property on the left and a
//! "richer" operand on the right reuse the mirrored function through
//! [`Reversed`].
//!
//! `std::ops` overloads route to these functions. Comparisons and the
//! logical connectives cannot use their std traits (those must return
//! `bool`, not a binding), so they are combinator traits with the same
//! operand table: [`BindEqual`], [`BindLess`], [`BindAnd`], and friends.
//! Unary `!` is logical not; the bitwise complement is
//! [`BindBitNot::bit_not`].
//!
//! ```
//! use rebind_core::{BindAnd, BindGreater, Property};
//!
//! let mut a = Property::new(1);
//! let b = Property::new(2);
//! let both = (&a).greater(0).and(&b);
//! assert!(both.value());
//!
//! a.set_value(0);
//! assert!(!both.value());
//! ```

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};
use std::rc::Rc;

use crate::binding::Binding;
use crate::calc::{self, BinaryOp, Plain, Reversed, UnaryOp};
use crate::property::{BasicProperty, Value};

/// `Property ⊕ Property`.
pub fn property_property<O, L, R, const LW: bool, const RW: bool>(
    lhs: &BasicProperty<L, LW>,
    rhs: &BasicProperty<R, RW>,
) -> Binding<O::Output>
where
    O: BinaryOp<L, R> + 'static,
    O::Output: Value,
    L: Value,
    R: Value,
{
    let (l, r) = (Rc::clone(lhs.slot()), Rc::clone(rhs.slot()));
    Binding::from_parts(
        Rc::new(move || O::calc(l.value(), r.value())),
        vec![lhs.handle(), rhs.handle()],
    )
}

/// `Property ⊕ Plain`.
pub fn property_plain<O, L, R, const LW: bool>(lhs: &BasicProperty<L, LW>, rhs: R) -> Binding<O::Output>
where
    O: BinaryOp<L, R> + 'static,
    O::Output: Value,
    L: Value,
    R: Plain,
{
    let l = Rc::clone(lhs.slot());
    Binding::from_parts(
        Rc::new(move || O::calc(l.value(), rhs.clone())),
        vec![lhs.handle()],
    )
}

/// `Plain ⊕ Property`.
pub fn plain_property<O, L, R, const RW: bool>(lhs: L, rhs: &BasicProperty<R, RW>) -> Binding<O::Output>
where
    O: BinaryOp<L, R> + 'static,
    O::Output: Value,
    L: Plain,
    R: Value,
{
    property_plain::<Reversed<O>, R, L, RW>(rhs, lhs)
}

/// `Binding ⊕ Property`.
pub fn binding_property<O, L, R, const RW: bool>(lhs: Binding<L>, rhs: &BasicProperty<R, RW>) -> Binding<O::Output>
where
    O: BinaryOp<L, R> + 'static,
    O::Output: Value,
    L: Value,
    R: Value,
{
    let (f, mut dependencies) = lhs.into_parts();
    dependencies.push(rhs.handle());
    let r = Rc::clone(rhs.slot());
    Binding::from_parts(Rc::new(move || O::calc(f(), r.value())), dependencies)
}

/// `Property ⊕ Binding`.
pub fn property_binding<O, L, R, const LW: bool>(lhs: &BasicProperty<L, LW>, rhs: Binding<R>) -> Binding<O::Output>
where
    O: BinaryOp<L, R> + 'static,
    O::Output: Value,
    L: Value,
    R: Value,
{
    binding_property::<Reversed<O>, R, L, LW>(rhs, lhs)
}

/// `Binding ⊕ Binding`.
pub fn binding_binding<O, L, R>(lhs: Binding<L>, rhs: Binding<R>) -> Binding<O::Output>
where
    O: BinaryOp<L, R> + 'static,
    O::Output: Value,
    L: Value,
    R: Value,
{
    let (f, mut dependencies) = lhs.into_parts();
    let (g, more) = rhs.into_parts();
    dependencies.extend(more);
    Binding::from_parts(Rc::new(move || O::calc(f(), g())), dependencies)
}

/// `Binding ⊕ Plain`.
pub fn binding_plain<O, L, R>(lhs: Binding<L>, rhs: R) -> Binding<O::Output>
where
    O: BinaryOp<L, R> + 'static,
    O::Output: Value,
    L: Value,
    R: Plain,
{
    let (f, dependencies) = lhs.into_parts();
    Binding::from_parts(Rc::new(move || O::calc(f(), rhs.clone())), dependencies)
}

/// `Plain ⊕ Binding`.
pub fn plain_binding<O, L, R>(lhs: L, rhs: Binding<R>) -> Binding<O::Output>
where
    O: BinaryOp<L, R> + 'static,
    O::Output: Value,
    L: Plain,
    R: Value,
{
    binding_plain::<Reversed<O>, R, L>(rhs, lhs)
}

/// `⊖ Property`.
pub fn unary_property<O, T, const W: bool>(operand: &BasicProperty<T, W>) -> Binding<O::Output>
where
    O: UnaryOp<T> + 'static,
    O::Output: Value,
    T: Value,
{
    let slot = Rc::clone(operand.slot());
    Binding::from_parts(Rc::new(move || O::calc(slot.value())), vec![operand.handle()])
}

/// `⊖ Binding`.
pub fn unary_binding<O, T>(operand: Binding<T>) -> Binding<O::Output>
where
    O: UnaryOp<T> + 'static,
    O::Output: Value,
    T: Value,
{
    let (f, dependencies) = operand.into_parts();
    Binding::from_parts(Rc::new(move || O::calc(f())), dependencies)
}

macro_rules! combinator_traits {
    ($($(#[$doc:meta])* $name:ident :: $method:ident;)*) => {
        $(
            $(#[$doc])*
            pub trait $name<Rhs> {
                type Output;

                fn $method(self, rhs: Rhs) -> Self::Output;
            }
        )*
    };
}

combinator_traits! {
    /// Binding of `lhs == rhs`.
    BindEqual::equal;
    /// Binding of `lhs != rhs`.
    BindNotEqual::not_equal;
    /// Binding of `lhs > rhs`.
    BindGreater::greater;
    /// Binding of `lhs < rhs`.
    BindLess::less;
    /// Binding of `lhs >= rhs`.
    BindGreaterEqual::greater_equal;
    /// Binding of `lhs <= rhs`.
    BindLessEqual::less_equal;
    /// Binding of `lhs && rhs` over truthiness.
    BindAnd::and;
    /// Binding of `lhs || rhs` over truthiness.
    BindOr::or;
}

/// Binding of the bitwise complement.
pub trait BindBitNot {
    type Output;

    fn bit_not(self) -> Self::Output;
}

macro_rules! binary_operator {
    ($Trait:ident :: $method:ident => $Op:ident) => {
        impl<'a, 'b, L: Value, R: Value, const LW: bool, const RW: bool> $Trait<&'b BasicProperty<R, RW>>
            for &'a BasicProperty<L, LW>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: &'b BasicProperty<R, RW>) -> Self::Output {
                property_property::<calc::$Op, L, R, LW, RW>(self, rhs)
            }
        }

        impl<'a, L: Value, R: Value, const LW: bool> $Trait<Binding<R>> for &'a BasicProperty<L, LW>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: Binding<R>) -> Self::Output {
                property_binding::<calc::$Op, L, R, LW>(self, rhs)
            }
        }

        impl<'a, 'b, L: Value, R: Value, const LW: bool> $Trait<&'b Binding<R>> for &'a BasicProperty<L, LW>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: &'b Binding<R>) -> Self::Output {
                property_binding::<calc::$Op, L, R, LW>(self, rhs.clone())
            }
        }

        impl<'a, L: Value, R: Plain, const LW: bool> $Trait<R> for &'a BasicProperty<L, LW>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: R) -> Self::Output {
                property_plain::<calc::$Op, L, R, LW>(self, rhs)
            }
        }

        impl<'b, L: Value, R: Value, const RW: bool> $Trait<&'b BasicProperty<R, RW>> for Binding<L>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: &'b BasicProperty<R, RW>) -> Self::Output {
                binding_property::<calc::$Op, L, R, RW>(self, rhs)
            }
        }

        impl<L: Value, R: Value> $Trait<Binding<R>> for Binding<L>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: Binding<R>) -> Self::Output {
                binding_binding::<calc::$Op, L, R>(self, rhs)
            }
        }

        impl<'b, L: Value, R: Value> $Trait<&'b Binding<R>> for Binding<L>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: &'b Binding<R>) -> Self::Output {
                binding_binding::<calc::$Op, L, R>(self, rhs.clone())
            }
        }

        impl<L: Value, R: Plain> $Trait<R> for Binding<L>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: R) -> Self::Output {
                binding_plain::<calc::$Op, L, R>(self, rhs)
            }
        }

        impl<'a, 'b, L: Value, R: Value, const RW: bool> $Trait<&'b BasicProperty<R, RW>> for &'a Binding<L>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: &'b BasicProperty<R, RW>) -> Self::Output {
                binding_property::<calc::$Op, L, R, RW>(self.clone(), rhs)
            }
        }

        impl<'a, L: Value, R: Value> $Trait<Binding<R>> for &'a Binding<L>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: Binding<R>) -> Self::Output {
                binding_binding::<calc::$Op, L, R>(self.clone(), rhs)
            }
        }

        impl<'a, 'b, L: Value, R: Value> $Trait<&'b Binding<R>> for &'a Binding<L>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: &'b Binding<R>) -> Self::Output {
                binding_binding::<calc::$Op, L, R>(self.clone(), rhs.clone())
            }
        }

        impl<'a, L: Value, R: Plain> $Trait<R> for &'a Binding<L>
        where
            calc::$Op: BinaryOp<L, R>,
            <calc::$Op as BinaryOp<L, R>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as BinaryOp<L, R>>::Output>;

            fn $method(self, rhs: R) -> Self::Output {
                binding_plain::<calc::$Op, L, R>(self.clone(), rhs)
            }
        }

        plain_lhs_operator!(
            $Trait::$method => $Op;
            i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
            String, &'static str
        );
    };
}

// The orphan rule rules out a generic `impl<P: Plain> Add<&BasicProperty<..>>
// for P`, so plain left operands are spelled out per type.
macro_rules! plain_lhs_operator {
    ($Trait:ident :: $method:ident => $Op:ident; $($P:ty),*) => {
        $(
            impl<'b, R: Value, const RW: bool> $Trait<&'b BasicProperty<R, RW>> for $P
            where
                calc::$Op: BinaryOp<$P, R>,
                <calc::$Op as BinaryOp<$P, R>>::Output: Value,
            {
                type Output = Binding<<calc::$Op as BinaryOp<$P, R>>::Output>;

                fn $method(self, rhs: &'b BasicProperty<R, RW>) -> Self::Output {
                    plain_property::<calc::$Op, $P, R, RW>(self, rhs)
                }
            }

            impl<R: Value> $Trait<Binding<R>> for $P
            where
                calc::$Op: BinaryOp<$P, R>,
                <calc::$Op as BinaryOp<$P, R>>::Output: Value,
            {
                type Output = Binding<<calc::$Op as BinaryOp<$P, R>>::Output>;

                fn $method(self, rhs: Binding<R>) -> Self::Output {
                    plain_binding::<calc::$Op, $P, R>(self, rhs)
                }
            }

            impl<'b, R: Value> $Trait<&'b Binding<R>> for $P
            where
                calc::$Op: BinaryOp<$P, R>,
                <calc::$Op as BinaryOp<$P, R>>::Output: Value,
            {
                type Output = Binding<<calc::$Op as BinaryOp<$P, R>>::Output>;

                fn $method(self, rhs: &'b Binding<R>) -> Self::Output {
                    plain_binding::<calc::$Op, $P, R>(self, rhs.clone())
                }
            }
        )*
    };
}

binary_operator!(Add::add => Add);
binary_operator!(Sub::sub => Subtract);
binary_operator!(Mul::mul => Multiply);
binary_operator!(Div::div => Divide);
binary_operator!(Rem::rem => Modulus);
binary_operator!(BitAnd::bitand => BitAnd);
binary_operator!(BitOr::bitor => BitOr);
binary_operator!(BitXor::bitxor => BitXor);
binary_operator!(BindEqual::equal => Equal);
binary_operator!(BindNotEqual::not_equal => NotEqual);
binary_operator!(BindGreater::greater => Greater);
binary_operator!(BindLess::less => Less);
binary_operator!(BindGreaterEqual::greater_equal => GreaterEqual);
binary_operator!(BindLessEqual::less_equal => LessEqual);
binary_operator!(BindAnd::and => LogicalAnd);
binary_operator!(BindOr::or => LogicalOr);

macro_rules! unary_operator {
    ($Trait:ident :: $method:ident => $Op:ident) => {
        impl<'a, T: Value, const W: bool> $Trait for &'a BasicProperty<T, W>
        where
            calc::$Op: UnaryOp<T>,
            <calc::$Op as UnaryOp<T>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as UnaryOp<T>>::Output>;

            fn $method(self) -> Self::Output {
                unary_property::<calc::$Op, T, W>(self)
            }
        }

        impl<T: Value> $Trait for Binding<T>
        where
            calc::$Op: UnaryOp<T>,
            <calc::$Op as UnaryOp<T>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as UnaryOp<T>>::Output>;

            fn $method(self) -> Self::Output {
                unary_binding::<calc::$Op, T>(self)
            }
        }

        impl<'a, T: Value> $Trait for &'a Binding<T>
        where
            calc::$Op: UnaryOp<T>,
            <calc::$Op as UnaryOp<T>>::Output: Value,
        {
            type Output = Binding<<calc::$Op as UnaryOp<T>>::Output>;

            fn $method(self) -> Self::Output {
                unary_binding::<calc::$Op, T>(self.clone())
            }
        }
    };
}

unary_operator!(Neg::neg => Negate);
unary_operator!(Not::not => LogicalNot);
unary_operator!(BindBitNot::bit_not => BitNot);
