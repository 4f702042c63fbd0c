//! Points, rectangles and detections in pixel coordinates

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the image plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle spanning two opposite corners in any order
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Corners in the order top-left, top-right, bottom-left, bottom-right
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.x, self.bottom()),
            Point::new(self.right(), self.bottom()),
        ]
    }

    /// Half-open containment: the left and top edges are inside, the right and bottom are not
    pub fn contains(&self, p: &Point) -> bool {
        self.x <= p.x && p.x < self.right() && self.y <= p.y && p.y < self.bottom()
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Minimum distance over all 16 corner pairs of the two rectangles.
    ///
    /// Unlike centre distance this stays small for adjacent or partially
    /// overlapping fragments of the same blob, whatever their sizes.
    pub fn corner_distance(&self, other: &Rect) -> f64 {
        let theirs = other.corners();
        self.corners()
            .iter()
            .flat_map(|a| theirs.iter().map(move |b| a.distance(b)))
            .fold(f64::INFINITY, f64::min)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Pixel dimensions of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Length of the frame diagonal, used to make distance thresholds resolution independent
    pub fn diagonal(&self) -> f64 {
        f64::from(self.width).hypot(f64::from(self.height))
    }
}

/// One foreground blob observed in a single frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bounding_box: Rect,
    /// Centre of mass of the blob
    pub centroid: Point,
    /// Zeroth moment of the blob (pixel area)
    pub mass: f64,
}

impl Detection {
    pub fn new(bounding_box: Rect, centroid: Point, mass: f64) -> Self {
        Self {
            bounding_box,
            centroid,
            mass,
        }
    }

    /// Detection of a solid rectangular blob
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            bounding_box: rect,
            centroid: rect.center(),
            mass: rect.area(),
        }
    }

    /// Combine two blobs into one.
    ///
    /// Moments are additive, so the merged centroid is the mass-weighted mean
    /// of the member centroids.
    pub fn merge(&self, other: &Detection) -> Detection {
        let mass = self.mass + other.mass;
        let centroid = if mass > 0.0 {
            Point::new(
                (self.centroid.x * self.mass + other.centroid.x * other.mass) / mass,
                (self.centroid.y * self.mass + other.centroid.y * other.mass) / mass,
            )
        } else {
            Point::new(
                (self.centroid.x + other.centroid.x) / 2.0,
                (self.centroid.y + other.centroid.y) / 2.0,
            )
        };
        Detection {
            bounding_box: self.bounding_box.union(&other.bounding_box),
            centroid,
            mass,
        }
    }
}

/// Display colour attached to a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Stable colour for a track id; the same id always maps to the same colour
    pub fn for_track(id: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(u64::from(id));
        Self {
            r: rng.gen(),
            g: rng.gen(),
            b: rng.gen(),
        }
    }
}
