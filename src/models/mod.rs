pub mod common;
pub mod image;
pub mod keypoints;
pub mod report;

pub use self::common::*;
pub use self::image::*;
pub use self::keypoints::*;
pub use self::report::*;
