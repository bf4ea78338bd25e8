// src/gesture.rs - Rule-based gesture classification
use crate::fingers::FingerState;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GestureLabel {
    #[default]
    NoHand,
    Unknown,
    Fist,
    OpenHand,
    Point,
    PlayPause,
    NextTrack,
    PreviousTrack,
    VolumeUp,
    VolumeDown,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoHand => "No Hand",
            Self::Unknown => "Unknown Gesture",
            Self::Fist => "Fist",
            Self::OpenHand => "Open Hand",
            Self::Point => "Point",
            Self::PlayPause => "Play/Pause",
            Self::NextTrack => "Next Track",
            Self::PreviousTrack => "Previous Track",
            Self::VolumeUp => "Volume Up",
            Self::VolumeDown => "Volume Down",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Patterns in precedence order; the first match wins.
const PATTERNS: [([u8; 5], GestureLabel); 8] = [
    ([0, 0, 0, 0, 0], GestureLabel::Fist),
    ([1, 1, 1, 1, 1], GestureLabel::OpenHand),
    ([0, 1, 0, 0, 0], GestureLabel::Point),
    ([0, 1, 1, 0, 0], GestureLabel::PlayPause),
    ([1, 1, 0, 0, 0], GestureLabel::NextTrack),
    ([1, 0, 0, 0, 1], GestureLabel::PreviousTrack),
    ([0, 1, 1, 1, 1], GestureLabel::VolumeUp),
    ([1, 0, 0, 0, 0], GestureLabel::VolumeDown),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct GestureClassifier;

impl GestureClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, state: Option<FingerState>) -> GestureLabel {
        let Some(state) = state else {
            return GestureLabel::NoHand;
        };

        let bits = state.bits();
        PATTERNS
            .iter()
            .find(|(pattern, _)| *pattern == bits)
            .map(|(_, label)| *label)
            .unwrap_or(GestureLabel::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_states() -> impl Iterator<Item = [u8; 5]> {
        (0u8..32).map(|n| [(n >> 4) & 1, (n >> 3) & 1, (n >> 2) & 1, (n >> 1) & 1, n & 1])
    }

    #[test]
    fn none_is_no_hand() {
        assert_eq!(GestureClassifier::new().classify(None), GestureLabel::NoHand);
    }

    #[test]
    fn table_rows_map_to_their_labels() {
        let classifier = GestureClassifier::new();
        let cases = [
            ([0, 0, 0, 0, 0], GestureLabel::Fist),
            ([1, 1, 1, 1, 1], GestureLabel::OpenHand),
            ([0, 1, 0, 0, 0], GestureLabel::Point),
            ([0, 1, 1, 0, 0], GestureLabel::PlayPause),
            ([1, 1, 0, 0, 0], GestureLabel::NextTrack),
            ([1, 0, 0, 0, 1], GestureLabel::PreviousTrack),
            ([0, 1, 1, 1, 1], GestureLabel::VolumeUp),
            ([1, 0, 0, 0, 0], GestureLabel::VolumeDown),
        ];
        for (bits, expected) in cases {
            assert_eq!(
                classifier.classify(Some(FingerState::from_bits(bits))),
                expected,
                "pattern {:?}",
                bits
            );
        }
    }

    #[test]
    fn every_other_combination_is_unknown() {
        let classifier = GestureClassifier::new();
        let known: Vec<[u8; 5]> = PATTERNS.iter().map(|(p, _)| *p).collect();

        let mut unknown = 0;
        for bits in all_states() {
            let label = classifier.classify(Some(FingerState::from_bits(bits)));
            if known.contains(&bits) {
                assert_ne!(label, GestureLabel::Unknown);
            } else {
                assert_eq!(label, GestureLabel::Unknown, "pattern {:?}", bits);
                unknown += 1;
            }
        }
        assert_eq!(unknown, 32 - PATTERNS.len());
    }
}
