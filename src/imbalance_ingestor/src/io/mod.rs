//! Export destinations for resolved datasets.

pub mod sink;
