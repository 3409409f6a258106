//! Frame arithmetic shared by every layer of the editor.
//!
//! Screen conversions use a `zoom` factor expressed in pixels per frame.
//! Pixel positions are floored and frame positions are ceiled so a
//! frame -> pixel -> frame round trip never produces a negative frame.

use crate::types::{Frame, Rational};

/// Convert a frame position to a horizontal pixel offset.
pub fn frame_to_screen_point(zoom: f64, frame: Frame) -> i64 {
    (frame as f64 * zoom).floor() as i64
}

/// Convert a horizontal pixel offset back to a frame position.
///
/// Negative pixels (and a non-positive zoom) map to frame 0.
pub fn screen_point_to_frame(zoom: f64, x: i64) -> Frame {
    if zoom <= 0.0 {
        return 0;
    }
    let frame = (x as f64 / zoom).ceil() as Frame;
    frame.max(0)
}

/// Rescale a frame count from one frame rate to another.
///
/// `frame' = round(frame * dst / src)`. A non-positive source rate leaves the
/// frame untouched rather than dividing by zero.
pub fn refactor_frame_number(frame: Frame, src_rate: f64, dst_rate: f64) -> Frame {
    if src_rate <= 0.0 || (src_rate - dst_rate).abs() < f64::EPSILON {
        return frame;
    }
    ((frame as f64 / src_rate) * dst_rate).round() as Frame
}

/// [`refactor_frame_number`] for [`Rational`] rates.
pub fn refactor_frame_number_rational(frame: Frame, src: Rational, dst: Rational) -> Frame {
    if src == dst {
        return frame;
    }
    refactor_frame_number(frame, src.as_f64(), dst.as_f64())
}

/// Number of frames in `secs` seconds at `rate`, rounded down.
pub fn seconds_to_frames(secs: f64, rate: f64) -> Frame {
    (secs * rate).floor() as Frame
}
