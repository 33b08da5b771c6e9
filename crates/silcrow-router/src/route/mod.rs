/// Route pattern compilation
///
/// Turns path strings (`/users/:id`) and file-tree names (`[id]`) into
/// [`PathPattern`] matchers.
pub mod pattern;

pub use pattern::{file_segment, is_identifier, PathPattern, Segment};
