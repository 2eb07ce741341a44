use serde::{Deserialize, Serialize};

pub mod codec;
pub mod deform;
pub mod engine;
pub mod frame;
pub mod store;
pub mod topology;

pub use codec::*;
pub use deform::*;
pub use engine::*;
pub use frame::*;
pub use store::*;
pub use topology::*;

/// Affine placement transform as produced by the renderer. Carried opaquely;
/// the engine only ever composes translations onto it.
pub type Affine = euclid::default::Transform2D<f32>;

/// Prefix of the single trailing source line that records committed offsets.
pub const POSITIONS_PREFIX: &str = "%% positions:";

/// Offsets at or below this magnitude (per axis) are dropped on encode.
pub const OFFSET_EPSILON: f32 = 1.0;

/// Margin added around node extents when growing the visible frame.
pub const FRAME_PADDING: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A 2D displacement applied on top of a baseline placement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub dx: f32,
    pub dy: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }

    pub fn midpoint(a: Offset, b: Offset) -> Offset {
        Offset {
            dx: (a.dx + b.dx) / 2.0,
            dy: (a.dy + b.dy) / 2.0,
        }
    }
}

impl std::ops::Add for Offset {
    type Output = Offset;

    fn add(self, other: Offset) -> Offset {
        Offset {
            dx: self.dx + other.dx,
            dy: self.dy + other.dy,
        }
    }
}

/// The coordinate rectangle that defines what portion of the scene is
/// visible or exported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(min_x: f32, min_y: f32, width: f32, height: f32) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f32 {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.min_y + self.height
    }
}

/// One rendered scene as handed over by the external renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub paths: Vec<ScenePath>,
    pub view_box: Frame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    /// Stable across renders of equivalent source.
    pub id: String,
    pub center: Point,
    pub width: f32,
    pub height: f32,
    pub transform: Affine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePath {
    pub id: String,
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<SceneLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneLabel {
    pub transform: Affine,
}

pub fn map_point(transform: &Affine, point: Point) -> Point {
    let mapped = transform.transform_point(euclid::default::Point2D::new(point.x, point.y));
    Point {
        x: mapped.x,
        y: mapped.y,
    }
}

pub fn offset_transform(base: &Affine, offset: Offset) -> Affine {
    base.then_translate(euclid::default::Vector2D::new(offset.dx, offset.dy))
}
