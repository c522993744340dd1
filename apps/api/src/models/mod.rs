pub mod report;
pub mod video;
