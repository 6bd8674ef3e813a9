use serde::{Deserialize, Serialize};

/// Horizontal insertion line, in the collision layer's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Line {
    pub x: f32,
    pub y: f32,
    pub length: f32,
}

impl Line {
    pub fn new(x: f32, y: f32, length: f32) -> Self {
        Self { x, y, length }
    }

    /// The same line indented to `depth`: shifted right by `depth * indent + pad` and
    /// shortened by the same amount so that its right edge stays put.
    pub fn at_depth(&self, depth: usize, indent: f32, pad: f32) -> Line {
        let offset = depth as f32 * indent + pad;
        Line {
            x: self.x + offset,
            y: self.y,
            length: self.length - offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Drop indicator to draw: an insertion line, or an outline around an empty container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Placement {
    Line(Line),
    Rect(Rect),
}

impl Placement {
    pub fn as_line(&self) -> Option<&Line> {
        match self {
            Placement::Line(line) => Some(line),
            Placement::Rect(_) => None,
        }
    }

    pub fn as_rect(&self) -> Option<&Rect> {
        match self {
            Placement::Rect(rect) => Some(rect),
            Placement::Line(_) => None,
        }
    }
}
