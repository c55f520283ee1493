pub mod probe;

pub use probe::{ApiProbe, ProbeResult};
