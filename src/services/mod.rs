pub mod derive_service;

pub use derive_service::{export_json, import_json, DeriveService, DerivedBundle};
