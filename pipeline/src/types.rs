//! Frame-level data exchanged with the detection source

use blobtrack::{Detection, Point, Rect};
use serde::{Deserialize, Serialize};

/// One foreground blob as reported by the segmentation stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Pixel area of the blob contour; the box area is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
}

impl RawBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            area: None,
        }
    }

    /// Why the box cannot be tracked, if it cannot
    pub fn defect(&self) -> Option<&'static str> {
        let coords = [self.x, self.y, self.width, self.height];
        if coords.iter().any(|v| !v.is_finite()) {
            return Some("non-finite coordinate");
        }
        if self.x < 0.0 || self.y < 0.0 {
            return Some("negative origin");
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Some("empty extent");
        }
        let rect = Rect::new(self.x, self.y, self.width, self.height);
        let center = rect.center();
        let derived = [rect.right(), rect.bottom(), center.x, center.y];
        if derived.iter().any(|v| !v.is_finite()) {
            return Some("extent overflows");
        }
        match self.area {
            Some(a) if !a.is_finite() || a < 0.0 => Some("invalid area"),
            _ => None,
        }
    }

    pub fn to_detection(&self) -> Detection {
        let rect = Rect::new(self.x, self.y, self.width, self.height);
        match self.area {
            Some(area) => Detection::new(rect, rect.center(), area),
            None => Detection::from_rect(rect),
        }
    }
}

/// Everything the detection source produced for one video frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    pub frame_number: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub boxes: Vec<RawBox>,
}

impl FrameDetections {
    pub fn new(frame_number: u64, width: u32, height: u32, boxes: Vec<RawBox>) -> Self {
        Self {
            frame_number,
            width,
            height,
            boxes,
        }
    }
}

/// A reported track position, rounded to whole pixels for logging
pub(crate) fn pixel(point: Point) -> (i64, i64) {
    (point.x.round() as i64, point.y.round() as i64)
}
