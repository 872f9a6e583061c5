pub mod inspector;
pub mod store;

pub use inspector::{FfprobeProbe, MediaProbe};
pub use store::{MediaStore, StagedMedia};
