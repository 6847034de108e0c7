/// Probe engine: request construction, the network capability, and the
/// sweep executor that ties them to the store.
pub mod client;
pub mod executor;
pub mod request;
pub mod types;

pub use client::{HttpProbeClient, ProbeClient};
pub use executor::ProbeExecutor;
pub use types::{ProbeOutcome, SweepReport};
