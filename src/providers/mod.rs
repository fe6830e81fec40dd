pub mod extraction;

pub use extraction::ExtractionClient;
