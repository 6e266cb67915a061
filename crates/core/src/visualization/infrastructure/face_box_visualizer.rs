use crate::shared::constants::FACE_BOX_COLOR;
use crate::shared::detection::{BoundingBox, DetectionResult};
use crate::shared::frame::Frame;
use crate::visualization::domain::visualizer::Visualizer;

/// Outlines each detected face with a one-pixel rectangle.
///
/// Only the first image of a batch is drawn, since the render loop shows
/// one frame at a time. Corners are `(x, y)` and `(x + w, y + h)`, both
/// inclusive; parts outside the frame are clipped.
pub struct FaceBoxVisualizer {
    color: [u8; 3],
}

impl FaceBoxVisualizer {
    pub fn new(color: [u8; 3]) -> Self {
        Self { color }
    }
}

impl Default for FaceBoxVisualizer {
    fn default() -> Self {
        Self::new(FACE_BOX_COLOR)
    }
}

impl Visualizer for FaceBoxVisualizer {
    fn render(
        &self,
        frame: &mut Frame,
        result: &DetectionResult,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let Some(faces) = result.get(&0) else {
            return Ok(());
        };
        for face in faces {
            let bbox = BoundingBox::from_detection(face)
                .map_err(|field| format!("face is missing '{field}'"))?;
            draw_rectangle(frame, bbox.corners(), self.color);
        }
        Ok(())
    }
}

fn draw_rectangle(frame: &mut Frame, corners: (i64, i64, i64, i64), color: [u8; 3]) {
    // Pulling off-frame corners to one pixel past the border keeps them
    // off-frame and bounds the loops by the frame size.
    let (width, height) = (frame.width() as i64, frame.height() as i64);
    let (left, top, right, bottom) = corners;
    let (left, right) = (left.clamp(-1, width), right.clamp(-1, width));
    let (top, bottom) = (top.clamp(-1, height), bottom.clamp(-1, height));
    for x in left..=right {
        put_pixel(frame, x, top, color);
        put_pixel(frame, x, bottom, color);
    }
    for y in top..=bottom {
        put_pixel(frame, left, y, color);
        put_pixel(frame, right, y, color);
    }
}

fn put_pixel(frame: &mut Frame, x: i64, y: i64, color: [u8; 3]) {
    if x < 0 || y < 0 || x >= frame.width() as i64 || y >= frame.height() as i64 {
        return;
    }
    let channels = frame.channels() as usize;
    let mut pixels = frame.as_ndarray_mut();
    for (c, value) in color.iter().enumerate().take(channels) {
        pixels[[y as usize, x as usize, c]] = *value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::detection::detection;
    use std::collections::BTreeMap;

    const MAGENTA: [u8; 3] = [255, 0, 255];

    fn face(x: f64, y: f64, w: f64, h: f64) -> crate::shared::detection::Detection {
        detection([("x", x), ("y", y), ("w", w), ("h", h)])
    }

    fn is_colored(frame: &Frame, x: u32, y: u32) -> bool {
        frame.pixel(x, y) == Some(&MAGENTA[..])
    }

    #[test]
    fn test_draws_rectangle_corners() {
        let mut frame = Frame::blank(32, 32, 0);
        let result = BTreeMap::from([(0, vec![face(10.0, 10.0, 5.0, 5.0)])]);

        FaceBoxVisualizer::default().render(&mut frame, &result).unwrap();

        for (x, y) in [(10, 10), (15, 10), (10, 15), (15, 15), (12, 10), (15, 13)] {
            assert!(is_colored(&frame, x, y), "expected edge pixel at ({x}, {y})");
        }
        assert!(!is_colored(&frame, 12, 12), "interior must stay untouched");
        assert!(!is_colored(&frame, 16, 16));
        assert!(!is_colored(&frame, 9, 9));
    }

    #[test]
    fn test_empty_result_leaves_frame_unchanged() {
        let mut frame = Frame::blank(8, 8, 0);
        FaceBoxVisualizer::default()
            .render(&mut frame, &BTreeMap::new())
            .unwrap();
        assert_eq!(frame, Frame::blank(8, 8, 0));
    }

    #[test]
    fn test_only_first_image_of_batch_is_drawn() {
        let mut frame = Frame::blank(8, 8, 0);
        let result = BTreeMap::from([(1, vec![face(1.0, 1.0, 2.0, 2.0)])]);
        FaceBoxVisualizer::default().render(&mut frame, &result).unwrap();
        assert_eq!(frame, Frame::blank(8, 8, 0));
    }

    #[test]
    fn test_box_partly_outside_frame_is_clipped() {
        let mut frame = Frame::blank(10, 10, 0);
        let result = BTreeMap::from([(0, vec![face(-3.0, 5.0, 20.0, 20.0)])]);

        FaceBoxVisualizer::default().render(&mut frame, &result).unwrap();

        // Top edge runs across the visible width; other edges fall outside.
        assert!(is_colored(&frame, 0, 5));
        assert!(is_colored(&frame, 9, 5));
        assert!(!is_colored(&frame, 0, 6));
    }

    #[test]
    fn test_huge_box_draws_only_visible_edges() {
        let mut frame = Frame::blank(32, 32, 0);
        let result = BTreeMap::from([(0, vec![face(-1e12, 2.0, 2e18, 2e18)])]);

        let started = std::time::Instant::now();
        FaceBoxVisualizer::default().render(&mut frame, &result).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        assert!(is_colored(&frame, 0, 2));
        assert!(is_colored(&frame, 31, 2));
        assert!(!is_colored(&frame, 0, 3));
        assert!(!is_colored(&frame, 31, 31));
    }

    #[test]
    fn test_box_at_i64_limits_does_not_overflow() {
        let mut frame = Frame::blank(8, 8, 0);
        let result = BTreeMap::from([(0, vec![face(9e18, 0.0, 9e18, 1.0)])]);
        FaceBoxVisualizer::default().render(&mut frame, &result).unwrap();
        assert_eq!(frame, Frame::blank(8, 8, 0));
    }

    #[test]
    fn test_custom_color() {
        let mut frame = Frame::blank(4, 4, 0);
        let result = BTreeMap::from([(0, vec![face(0.0, 0.0, 1.0, 1.0)])]);
        FaceBoxVisualizer::new([1, 2, 3]).render(&mut frame, &result).unwrap();
        assert_eq!(frame.pixel(0, 0), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_malformed_face_is_an_error() {
        let mut frame = Frame::blank(4, 4, 0);
        let result = BTreeMap::from([(0, vec![detection([("x", 0.0)])])]);
        assert!(FaceBoxVisualizer::default().render(&mut frame, &result).is_err());
    }
}
