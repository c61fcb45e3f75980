pub mod bg;

pub use bg::{AttachedObject, BackgroundTable, BgInfo};
