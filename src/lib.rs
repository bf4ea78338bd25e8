//! Hand-landmark gesture recognition driving a media player.
//!
//! Frames of 21-point hand skeletons flow through finger extraction,
//! gesture classification and temporal smoothing; stable gestures are turned
//! into cooldown-gated media commands.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod fingers;
pub mod gesture;
pub mod landmarks;
pub mod media;
pub mod pipeline;
pub mod session;
pub mod smoothing;
pub mod source;
pub mod status;
pub mod timer;
