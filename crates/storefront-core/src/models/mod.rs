//! Data models for the storefront
//!
//! Catalog entities and their media references, plus the supporting
//! inquiry, visitor and website settings documents and dashboard figures.

mod catalog;
mod dashboard;
mod inquiry;
mod media;
mod settings;
mod visitor;

pub use catalog::*;
pub use dashboard::*;
pub use inquiry::*;
pub use media::*;
pub use settings::*;
pub use visitor::*;
