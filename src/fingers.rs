// src/fingers.rs - Finger up/down extraction from a hand skeleton
use crate::landmarks::{
    Hand, Handedness, LandmarkFrame, INDEX_MCP, INDEX_PIP, INDEX_TIP, MIDDLE_MCP, MIDDLE_PIP,
    MIDDLE_TIP, PINKY_MCP, PINKY_PIP, PINKY_TIP, RING_MCP, RING_PIP, RING_TIP, THUMB_MCP,
    THUMB_TIP,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// (tip, base, middle joint) landmark indices.
    fn joints(self) -> (usize, usize, usize) {
        match self {
            Finger::Thumb => (THUMB_TIP, THUMB_MCP, THUMB_MCP),
            Finger::Index => (INDEX_TIP, INDEX_MCP, INDEX_PIP),
            Finger::Middle => (MIDDLE_TIP, MIDDLE_MCP, MIDDLE_PIP),
            Finger::Ring => (RING_TIP, RING_MCP, RING_PIP),
            Finger::Pinky => (PINKY_TIP, PINKY_MCP, PINKY_PIP),
        }
    }
}

/// Up/down flag per digit, ordered thumb → pinky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FingerState([bool; 5]);

impl FingerState {
    /// Build from a 0/1 pattern such as `[0, 1, 1, 0, 0]`.
    pub fn from_bits(bits: [u8; 5]) -> Self {
        Self(bits.map(|b| b != 0))
    }

    pub fn is_up(&self, finger: Finger) -> bool {
        self.0[finger as usize]
    }

    pub fn bits(&self) -> [u8; 5] {
        self.0.map(u8::from)
    }
}

impl fmt::Display for FingerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for up in self.0 {
            write!(f, "{}", if up { '1' } else { '0' })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FingerStateExtractor {
    /// Vertical slack (pixels) between middle joint and base that still
    /// counts a partly bent finger as raised.
    mid_joint_tolerance: f64,
}

impl Default for FingerStateExtractor {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl FingerStateExtractor {
    pub fn new(mid_joint_tolerance: f64) -> Self {
        Self { mid_joint_tolerance }
    }

    /// `None` when the requested hand is missing or its skeleton is incomplete.
    pub fn extract(&self, frame: &LandmarkFrame, hand_index: usize) -> Option<FingerState> {
        frame
            .hand(hand_index)
            .and_then(|hand| self.extract_hand(hand))
    }

    pub fn extract_hand(&self, hand: &Hand) -> Option<FingerState> {
        if !hand.is_complete() {
            return None;
        }

        let mut fingers = [false; 5];
        for finger in Finger::ALL {
            fingers[finger as usize] = match finger {
                Finger::Thumb => self.thumb_up(hand, hand.handedness_or_default())?,
                _ => self.finger_up(hand, finger)?,
            };
        }

        Some(FingerState(fingers))
    }

    fn thumb_up(&self, hand: &Hand, handedness: Handedness) -> Option<bool> {
        let (tip, base, _) = Finger::Thumb.joints();
        let tip = hand.point(tip)?;
        let base = hand.point(base)?;

        // Image x grows to the right; a raised right thumb points left of its base.
        Some(match handedness {
            Handedness::Right => tip.x < base.x,
            Handedness::Left => tip.x > base.x,
        })
    }

    fn finger_up(&self, hand: &Hand, finger: Finger) -> Option<bool> {
        let (tip, base, mid) = finger.joints();
        let tip = hand.point(tip)?;
        let base = hand.point(base)?;
        let mid = hand.point(mid)?;

        let tip_above = tip.y < base.y;
        let mid_above = mid.y < base.y;
        let mid_near = (mid.y - base.y).abs() < self.mid_joint_tolerance;

        Some(tip_above && (mid_above || mid_near))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LANDMARK_COUNT;
    use crate::source::synthesize_hand;

    fn hand_with(bits: [u8; 5], handedness: Handedness) -> Hand {
        synthesize_hand(bits, handedness, 0.0, 0.0)
    }

    #[test]
    fn extracts_synthesized_patterns() {
        let extractor = FingerStateExtractor::default();
        for bits in [[0, 0, 0, 0, 0], [1, 1, 1, 1, 1], [0, 1, 1, 0, 0], [1, 0, 0, 0, 1]] {
            let frame = LandmarkFrame::single(hand_with(bits, Handedness::Right));
            assert_eq!(extractor.extract(&frame, 0), Some(FingerState::from_bits(bits)));
        }
    }

    #[test]
    fn thumb_flips_with_handedness() {
        let extractor = FingerStateExtractor::default();
        let mut hand = hand_with([1, 0, 0, 0, 0], Handedness::Right);
        assert!(extractor.extract_hand(&hand).unwrap().is_up(Finger::Thumb));

        // Same raw coordinates, opposite label.
        hand.handedness = Some(Handedness::Left);
        assert!(!extractor.extract_hand(&hand).unwrap().is_up(Finger::Thumb));
    }

    #[test]
    fn missing_handedness_defaults_to_right() {
        let extractor = FingerStateExtractor::default();
        let mut hand = hand_with([1, 0, 0, 0, 0], Handedness::Right);
        hand.handedness = None;
        assert!(extractor.extract_hand(&hand).unwrap().is_up(Finger::Thumb));
    }

    #[test]
    fn bent_finger_within_tolerance_counts_as_up() {
        let extractor = FingerStateExtractor::new(20.0);
        let mut hand = hand_with([0, 0, 0, 0, 0], Handedness::Right);
        // Index tip above base, middle joint 10px below base.
        hand.landmarks[INDEX_TIP].position.y = 280.0;
        hand.landmarks[INDEX_PIP].position.y = 310.0;
        assert!(extractor.extract_hand(&hand).unwrap().is_up(Finger::Index));

        // Middle joint 30px below base is outside the tolerance.
        hand.landmarks[INDEX_PIP].position.y = 330.0;
        assert!(!extractor.extract_hand(&hand).unwrap().is_up(Finger::Index));
    }

    #[test]
    fn tip_below_base_is_down_even_with_raised_joint() {
        let extractor = FingerStateExtractor::default();
        let mut hand = hand_with([0, 1, 0, 0, 0], Handedness::Right);
        hand.landmarks[INDEX_TIP].position.y = 305.0;
        assert!(!extractor.extract_hand(&hand).unwrap().is_up(Finger::Index));
    }

    #[test]
    fn out_of_range_hand_index_is_none() {
        let extractor = FingerStateExtractor::default();
        let frame = LandmarkFrame::single(hand_with([1, 1, 1, 1, 1], Handedness::Right));
        assert!(extractor.extract(&frame, 1).is_none());
        assert!(extractor.extract(&LandmarkFrame::empty(), 0).is_none());
    }

    #[test]
    fn incomplete_skeleton_is_none() {
        let extractor = FingerStateExtractor::default();
        let points = vec![(0.0, 0.0); LANDMARK_COUNT - 1];
        let frame = LandmarkFrame::single(Hand::from_xy(&points, None));
        assert!(extractor.extract(&frame, 0).is_none());
    }

    #[test]
    fn display_renders_bits() {
        assert_eq!(FingerState::from_bits([1, 0, 1, 0, 1]).to_string(), "10101");
    }
}
