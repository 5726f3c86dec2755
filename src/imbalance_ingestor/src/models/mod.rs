pub mod dataset;
pub mod report;
pub mod settlement;
pub mod summary;
