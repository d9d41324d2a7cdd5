//! Voice-event narration.
//!
//! - `sanitize`: name cleanup before speaking
//! - `template`: placeholder substitution
//! - `transition`: join/leave/move classification and local channel tracking
//! - `pipeline`: host signal handling, synthesis and playback dispatch

pub mod pipeline;
pub mod sanitize;
pub mod template;
pub mod transition;
