mod bookkeeping;
mod discovery;
mod extraction;

pub use bookkeeping::BookkeepingSystem;
pub use discovery::DiscoverySystem;
pub use extraction::ExtractionSystem;
