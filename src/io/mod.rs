/// Diagnostic side-channel outputs.
pub mod diagnostics;
pub mod export;
/// Weather and load-curve file ingestion.
pub mod weather;
