pub mod analysis;
pub mod detection;
pub mod pipeline;
pub mod report;
pub mod shared;
pub mod video;
