use std::collections::BTreeMap;

/// One detected object: named numeric fields such as `x`, `y`, `w`, `h`.
pub type Detection = BTreeMap<String, f64>;

/// Detections reported for a single submitted frame, in service order.
pub type DetectionRecord = Vec<Detection>;

/// Decoded service output for one response batch, keyed by the frame's
/// position inside that batch.
pub type DetectionResult = BTreeMap<usize, DetectionRecord>;

/// Axis-aligned box extracted from a detection's `x`, `y`, `w`, `h` fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    /// Reads the box fields, returning the first missing field name on failure.
    pub fn from_detection(detection: &Detection) -> Result<Self, &'static str> {
        let field = |name: &'static str| detection.get(name).copied().ok_or(name);
        Ok(Self {
            x: field("x")?,
            y: field("y")?,
            w: field("w")?,
            h: field("h")?,
        })
    }

    /// Integer corners `(left, top, right, bottom)`; fractions are truncated
    /// and out-of-range values saturate at the `i64` bounds.
    pub fn corners(&self) -> (i64, i64, i64, i64) {
        let x = self.x as i64;
        let y = self.y as i64;
        (
            x,
            y,
            x.saturating_add(self.w as i64),
            y.saturating_add(self.h as i64),
        )
    }
}

/// Builds a detection from `(name, value)` pairs.
pub fn detection<'a>(fields: impl IntoIterator<Item = (&'a str, f64)>) -> Detection {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
