// src/landmarks.rs - Per-frame hand landmark contract
//
// Points are held in pixel space. Detectors that report normalized
// coordinates go through `LandmarkFrame::from_normalized`.
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Number of landmarks in one hand skeleton.
pub const LANDMARK_COUNT: usize = 21;

// MediaPipe hand topology
pub const THUMB_MCP: usize = 2;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    #[default]
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

/// One tracked keypoint. `index` is its slot in the fixed 21-point topology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkPoint {
    pub index: usize,
    pub position: Vector2<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    pub landmarks: Vec<LandmarkPoint>,
    /// Label reported by the detector, if any.
    pub handedness: Option<Handedness>,
}

impl Hand {
    pub fn new(positions: Vec<Vector2<f64>>, handedness: Option<Handedness>) -> Self {
        let landmarks = positions
            .into_iter()
            .enumerate()
            .map(|(index, position)| LandmarkPoint { index, position })
            .collect();

        Self { landmarks, handedness }
    }

    pub fn from_xy(points: &[(f64, f64)], handedness: Option<Handedness>) -> Self {
        Self::new(
            points.iter().map(|&(x, y)| Vector2::new(x, y)).collect(),
            handedness,
        )
    }

    /// A hand is usable only with the complete skeleton.
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() == LANDMARK_COUNT
    }

    pub fn point(&self, index: usize) -> Option<Vector2<f64>> {
        self.landmarks.get(index).map(|lm| lm.position)
    }

    pub fn handedness_or_default(&self) -> Handedness {
        self.handedness.unwrap_or_default()
    }
}

/// Everything the detector saw in one camera frame. Empty means no hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkFrame {
    pub hands: Vec<Hand>,
}

impl LandmarkFrame {
    /// The detector is configured for at most two hands.
    pub const MAX_HANDS: usize = 2;

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(mut hands: Vec<Hand>) -> Self {
        hands.truncate(Self::MAX_HANDS);
        Self { hands }
    }

    pub fn single(hand: Hand) -> Self {
        Self { hands: vec![hand] }
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    pub fn hand(&self, hand_index: usize) -> Option<&Hand> {
        self.hands.get(hand_index)
    }

    /// Scale [0, 1] coordinates into the pixel space of a `width` x `height` image.
    pub fn from_normalized(mut self, width: u32, height: u32) -> Self {
        let scale = Vector2::new(width as f64, height as f64);
        for hand in &mut self.hands {
            for lm in &mut hand.landmarks {
                lm.position = lm.position.component_mul(&scale);
            }
        }
        self
    }
}

// ── Recorded form ──────────────────────────────────────────

/// Serialized hand as written by the landmark recorder: `[x, y]` or `[x, y, z]` per point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandRecord {
    #[serde(default)]
    pub handedness: Option<Handedness>,
    pub landmarks: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameRecord {
    /// True when coordinates are in [0, 1] rather than pixels.
    #[serde(default)]
    pub normalized: bool,
    #[serde(default)]
    pub hands: Vec<HandRecord>,
}

impl FrameRecord {
    pub fn into_frame(self, width: u32, height: u32) -> LandmarkFrame {
        let hands = self
            .hands
            .into_iter()
            .map(|record| {
                // Points with fewer than two coordinates are dropped, which leaves the
                // hand incomplete and therefore unusable downstream.
                let positions = record
                    .landmarks
                    .iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| Vector2::new(p[0], p[1]))
                    .collect();
                Hand::new(positions, record.handedness)
            })
            .collect();

        let frame = LandmarkFrame::new(hands);
        if self.normalized {
            frame.from_normalized(width, height)
        } else {
            frame
        }
    }
}

impl From<&LandmarkFrame> for FrameRecord {
    fn from(frame: &LandmarkFrame) -> Self {
        Self {
            normalized: false,
            hands: frame
                .hands
                .iter()
                .map(|hand| HandRecord {
                    handedness: hand.handedness,
                    landmarks: hand
                        .landmarks
                        .iter()
                        .map(|lm| vec![lm.position.x, lm.position.y])
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_hand(n: usize) -> Vec<(f64, f64)> {
        (0..n).map(|i| (i as f64, i as f64 * 2.0)).collect()
    }

    #[test]
    fn hand_indexes_points_in_order() {
        let hand = Hand::from_xy(&flat_hand(LANDMARK_COUNT), None);
        assert!(hand.is_complete());
        assert_eq!(hand.landmarks[7].index, 7);
        assert_eq!(hand.point(7), Some(Vector2::new(7.0, 14.0)));
        assert_eq!(hand.point(21), None);
        assert_eq!(hand.handedness_or_default(), Handedness::Right);
    }

    #[test]
    fn frame_keeps_at_most_two_hands() {
        let hand = Hand::from_xy(&flat_hand(LANDMARK_COUNT), Some(Handedness::Left));
        let frame = LandmarkFrame::new(vec![hand.clone(), hand.clone(), hand]);
        assert_eq!(frame.hands.len(), 2);
        assert!(frame.hand(2).is_none());
    }

    #[test]
    fn normalized_coordinates_scale_to_pixels() {
        let hand = Hand::from_xy(&[(0.5, 0.25)], None);
        let frame = LandmarkFrame::single(hand).from_normalized(640, 480);
        assert_eq!(frame.hands[0].point(0), Some(Vector2::new(320.0, 120.0)));
    }

    #[test]
    fn record_decodes_normalized_triples() {
        let line = r#"{"normalized":true,"hands":[{"handedness":"Left","landmarks":[[0.5,0.5,0.1],[1.0,0.0]]}]}"#;
        let record: FrameRecord = serde_json::from_str(line).unwrap();
        let frame = record.into_frame(100, 200);
        let hand = &frame.hands[0];
        assert_eq!(hand.handedness, Some(Handedness::Left));
        assert_eq!(hand.point(0), Some(Vector2::new(50.0, 100.0)));
        assert_eq!(hand.point(1), Some(Vector2::new(100.0, 0.0)));
    }

    #[test]
    fn record_drops_short_points() {
        let line = r#"{"hands":[{"landmarks":[[1.0],[2.0,3.0]]}]}"#;
        let record: FrameRecord = serde_json::from_str(line).unwrap();
        let frame = record.into_frame(640, 480);
        assert_eq!(frame.hands[0].landmarks.len(), 1);
        assert_eq!(frame.hands[0].handedness, None);
    }

    #[test]
    fn empty_record_is_empty_frame() {
        let record: FrameRecord = serde_json::from_str("{}").unwrap();
        assert!(record.into_frame(640, 480).is_empty());
    }
}
