/// Upstream data ingestion.
///
/// - `fetch`  - the `Fetch` seam and its reqwest implementation
/// - `hydapi` - NVE HydAPI URL construction + JSON parsing
/// - `fixtures` (test only) - representative HydAPI payloads

pub mod fetch;
pub mod hydapi;

#[cfg(test)]
pub(crate) mod fixtures;
