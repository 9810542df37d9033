use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Grow on every side by `margin`
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    /// Touching edges count as intersecting
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }
}

/// Fire-once visibility trigger.
///
/// The gate fires the first time an observed element intersects the viewport
/// grown by the root margin. Once fired it is unsubscribed and every later
/// observation returns `false`.
#[derive(Debug, Clone)]
pub struct VisibilityGate {
    root_margin: f64,
    subscribed: bool,
}

impl VisibilityGate {
    pub fn new(root_margin: f64) -> Self {
        Self {
            root_margin,
            subscribed: true,
        }
    }

    pub fn observe(&mut self, element: &Rect, viewport: &Rect) -> bool {
        if !self.subscribed {
            return false;
        }
        if element.intersects(&viewport.expand(self.root_margin)) {
            self.subscribed = false;
            return true;
        }
        false
    }

    /// Stop observing without firing
    pub fn disconnect(&mut self) {
        self.subscribed = false;
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn root_margin(&self) -> f64 {
        self.root_margin
    }
}
