//! Page model and the field discovery / injection pipeline.

pub mod classifier;
pub mod dom;
pub mod inject;
pub mod label;
pub mod page_source;
pub mod screen_model;
pub mod snapshot;
