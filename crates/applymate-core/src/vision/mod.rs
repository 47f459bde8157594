//! Image-to-text extraction for job posting screenshots.

pub mod extractor;
pub mod model;
