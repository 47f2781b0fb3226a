//! Screen-space geometry shared by the inventory, matching and mutation code.
//!
//! All rectangles use the global top-left origin that CoreGraphics window
//! lists and the Accessibility API report. `Rect::flipped` converts to and
//! from the bottom-left (Cocoa) convention.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are within `tolerance` of `other`
    pub fn approx_eq(&self, other: &Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance && (self.y - other.y).abs() < tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn approx_eq(&self, other: &Size, tolerance: f64) -> bool {
        (self.width - other.width).abs() < tolerance
            && (self.height - other.height).abs() < tolerance
    }
}

/// Represents the bounds (position and size) of a window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    /// Convert between top-left and bottom-left origin conventions.
    ///
    /// `y' = screen_height - y - height`; applying it twice is the identity.
    pub fn flipped(&self, screen_height: f64) -> Rect {
        Rect {
            origin: Point::new(
                self.origin.x,
                screen_height - self.origin.y - self.size.height,
            ),
            size: self.size,
        }
    }

    /// Move the origin so a window of `size` stays inside `screen`.
    ///
    /// Windows larger than the screen are pinned to the screen's origin.
    pub fn clamp_origin(origin: Point, size: Size, screen: &Rect) -> Point {
        let max_x = screen.origin.x + (screen.size.width - size.width).max(0.0);
        let max_y = screen.origin.y + (screen.size.height - size.height).max(0.0);
        Point::new(
            origin.x.clamp(screen.origin.x, max_x),
            origin.y.clamp(screen.origin.y, max_y),
        )
    }
}
