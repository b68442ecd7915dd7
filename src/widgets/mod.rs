pub mod tag_field;
pub mod text;

pub use tag_field::{Segment, TagField, TagFieldTheme};
pub use text::{Text, TextBgFn};
