#![forbid(unsafe_code)]

//! Operator table for binding expressions.
//!
//! Every operator is a zero-sized type implementing [`BinaryOp`] or
//! [`UnaryOp`]. Operators are selected at compile time as type parameters of
//! the dispatch functions; there is no runtime operator lookup.
//!
//! An operator is only implemented for operand types that support the
//! underlying operation (`std::ops::Add`, `PartialOrd`, [`Truthy`], ...), so
//! combining incompatible properties is rejected by the type checker before
//! any binding exists. Failures of the value type itself (integer overflow in
//! debug builds, division by zero) propagate unchanged.

use std::marker::PhantomData;

/// A pure two-operand operation.
pub trait BinaryOp<L, R> {
    /// Result type of the operation.
    type Output;

    /// Apply the operation.
    fn calc(lhs: L, rhs: R) -> Self::Output;
}

/// A pure one-operand operation.
pub trait UnaryOp<T> {
    /// Result type of the operation.
    type Output;

    /// Apply the operation.
    fn calc(value: T) -> Self::Output;
}

/// Boolean view of a value, used by the logical operators.
///
/// Numbers are truthy when non-zero.
pub trait Truthy {
    /// Whether the value counts as `true`.
    fn truthy(&self) -> bool;
}

impl Truthy for bool {
    #[inline]
    fn truthy(&self) -> bool {
        *self
    }
}

macro_rules! truthy_numbers {
    ($zero:literal => $($t:ty),*) => {
        $(
            impl Truthy for $t {
                #[inline]
                fn truthy(&self) -> bool {
                    *self != $zero
                }
            }
        )*
    };
}

truthy_numbers!(0 => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
truthy_numbers!(0.0 => f32, f64);

/// Conversion applied when a property or binding crosses value types.
///
/// Identity holds for every type. Numbers convert to `bool` through
/// [`Truthy`], `bool` converts to every integer type as `0`/`1`, and the
/// lossless numeric widenings are provided.
pub trait Convert<T> {
    /// Convert into the target value type.
    fn convert(self) -> T;
}

impl<T> Convert<T> for T {
    #[inline]
    fn convert(self) -> T {
        self
    }
}

macro_rules! convert_to_bool {
    ($($t:ty),*) => {
        $(
            impl Convert<bool> for $t {
                #[inline]
                fn convert(self) -> bool {
                    self.truthy()
                }
            }
        )*
    };
}

convert_to_bool!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

macro_rules! convert_from_bool {
    ($($t:ty),*) => {
        $(
            impl Convert<$t> for bool {
                #[inline]
                fn convert(self) -> $t {
                    <$t>::from(self)
                }
            }
        )*
    };
}

convert_from_bool!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! convert_widen {
    ($($from:ty => $($to:ty),+;)*) => {
        $($(
            impl Convert<$to> for $from {
                #[inline]
                fn convert(self) -> $to {
                    <$to>::from(self)
                }
            }
        )+)*
    };
}

convert_widen! {
    i8 => i16, i32, i64, i128, f32, f64;
    i16 => i32, i64, i128, f32, f64;
    i32 => i64, i128, f64;
    i64 => i128;
    u8 => u16, u32, u64, u128, usize, i16, i32, i64, i128, f32, f64;
    u16 => u32, u64, u128, usize, i32, i64, i128, f32, f64;
    u32 => u64, u128, i64, i128, f64;
    u64 => u128, i128;
    f32 => f64;
}

/// Marker for values that enter an expression as plain captured operands.
///
/// Properties and bindings are never `Plain`; this is what lets the operator
/// dispatch tell the three operand kinds apart statically. Implement it for
/// your own value types to combine them with properties.
pub trait Plain: Clone + 'static {}

macro_rules! plain_types {
    ($($t:ty),*) => {
        $(impl Plain for $t {})*
    };
}

plain_types!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String,
    &'static str
);

macro_rules! std_binary_ops {
    ($($(#[$doc:meta])* $name:ident => $tr:ident :: $method:ident;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl<L, R> BinaryOp<L, R> for $name
            where
                L: std::ops::$tr<R>,
            {
                type Output = <L as std::ops::$tr<R>>::Output;

                #[inline]
                fn calc(lhs: L, rhs: R) -> Self::Output {
                    std::ops::$tr::$method(lhs, rhs)
                }
            }
        )*
    };
}

std_binary_ops! {
    /// `lhs + rhs`.
    Add => Add::add;
    /// `lhs - rhs`.
    Subtract => Sub::sub;
    /// `lhs * rhs`.
    Multiply => Mul::mul;
    /// `lhs / rhs`.
    Divide => Div::div;
    /// `lhs % rhs`.
    Modulus => Rem::rem;
    /// `lhs & rhs`.
    BitAnd => BitAnd::bitand;
    /// `lhs | rhs`.
    BitOr => BitOr::bitor;
    /// `lhs ^ rhs`.
    BitXor => BitXor::bitxor;
}

macro_rules! compare_ops {
    ($($(#[$doc:meta])* $name:ident => $bound:ident, |$l:ident, $r:ident| $body:expr;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl<L, R> BinaryOp<L, R> for $name
            where
                L: $bound<R>,
            {
                type Output = bool;

                #[inline]
                fn calc($l: L, $r: R) -> bool {
                    $body
                }
            }
        )*
    };
}

compare_ops! {
    /// `lhs == rhs`.
    Equal => PartialEq, |l, r| l == r;
    /// `lhs != rhs`.
    NotEqual => PartialEq, |l, r| l != r;
    /// `lhs > rhs`.
    Greater => PartialOrd, |l, r| l > r;
    /// `lhs < rhs`.
    Less => PartialOrd, |l, r| l < r;
    /// `lhs >= rhs`.
    GreaterEqual => PartialOrd, |l, r| l >= r;
    /// `lhs <= rhs`.
    LessEqual => PartialOrd, |l, r| l <= r;
}

/// Logical and over [`Truthy`] operands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalAnd;

impl<L: Truthy, R: Truthy> BinaryOp<L, R> for LogicalAnd {
    type Output = bool;

    #[inline]
    fn calc(lhs: L, rhs: R) -> bool {
        lhs.truthy() && rhs.truthy()
    }
}

/// Logical or over [`Truthy`] operands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalOr;

impl<L: Truthy, R: Truthy> BinaryOp<L, R> for LogicalOr {
    type Output = bool;

    #[inline]
    fn calc(lhs: L, rhs: R) -> bool {
        lhs.truthy() || rhs.truthy()
    }
}

/// Adapter that swaps the operands of `O`.
///
/// Lets the dispatch code implement "plain ⊕ property" with the same
/// function that builds "property ⊕ plain".
pub struct Reversed<O>(PhantomData<fn() -> O>);

impl<O, L, R> BinaryOp<L, R> for Reversed<O>
where
    O: BinaryOp<R, L>,
{
    type Output = O::Output;

    #[inline]
    fn calc(lhs: L, rhs: R) -> Self::Output {
        O::calc(rhs, lhs)
    }
}

/// `-value`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Negate;

impl<T: std::ops::Neg> UnaryOp<T> for Negate {
    type Output = T::Output;

    #[inline]
    fn calc(value: T) -> Self::Output {
        -value
    }
}

/// Logical not over a [`Truthy`] operand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalNot;

impl<T: Truthy> UnaryOp<T> for LogicalNot {
    type Output = bool;

    #[inline]
    fn calc(value: T) -> bool {
        !value.truthy()
    }
}

/// Bitwise complement (`std::ops::Not`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitNot;

impl<T: std::ops::Not> UnaryOp<T> for BitNot {
    type Output = T::Output;

    #[inline]
    fn calc(value: T) -> Self::Output {
        !value
    }
}

/// Passes the value through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl<T> UnaryOp<T> for Identity {
    type Output = T;

    #[inline]
    fn calc(value: T) -> T {
        value
    }
}
