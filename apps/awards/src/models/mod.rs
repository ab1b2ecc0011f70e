pub mod mention;
pub mod teacher;

pub use mention::{RawMention, SourceKind, StyleExample};
pub use teacher::CanonicalTeacher;
