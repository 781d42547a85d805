//! Geometry records whose fields are properties.

use rebind_core::{BindEqual, Binding, Property};

/// Positioned box.
#[derive(Debug, Default)]
pub struct Item {
    pub x: Property<i32>,
    pub y: Property<i32>,
    pub width: Property<i32>,
    pub height: Property<i32>,
}

impl Item {
    #[must_use]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x: Property::new(x),
            y: Property::new(y),
            width: Property::new(width),
            height: Property::new(height),
        }
    }

    /// `x + width`, tracking both.
    #[must_use]
    pub fn right(&self) -> Binding<i32> {
        &self.x + &self.width
    }

    /// `y + height`, tracking both.
    #[must_use]
    pub fn bottom(&self) -> Binding<i32> {
        &self.y + &self.height
    }

    #[must_use]
    pub fn area(&self) -> Binding<i32> {
        &self.width * &self.height
    }
}

/// Colored box whose height starts out following its width.
///
/// ```
/// use rebind::prelude::*;
///
/// let mut rect = Rectangle::new(5, 5, 100);
/// assert_eq!(rect.height.value(), 100);
///
/// rect.width.set_value(88);
/// assert_eq!(rect.height.value(), 88);
/// ```
#[derive(Debug)]
pub struct Rectangle {
    pub x: Property<i32>,
    pub y: Property<i32>,
    pub width: Property<i32>,
    pub height: Property<i32>,
    pub color: Property<u32>,
}

impl Rectangle {
    #[must_use]
    pub fn new(x: i32, y: i32, width: i32) -> Self {
        let width = Property::new(width);
        let height = Property::from_property(&width);
        Self {
            x: Property::new(x),
            y: Property::new(y),
            width,
            height,
            color: Property::default(),
        }
    }

    /// Stop following the width and hold `height` instead.
    pub fn set_height(&mut self, height: i32) {
        self.height.set_value(height);
    }

    /// Whether the rectangle is currently square.
    #[must_use]
    pub fn is_square(&self) -> Binding<bool> {
        (&self.width).equal(&self.height)
    }
}
