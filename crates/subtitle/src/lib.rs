pub mod cue;
pub mod error;
pub mod stitch;

pub use cue::{compose, parse, Cue};
pub use error::SubtitleError;
pub use stitch::stitch;
