pub mod error;
pub mod probe;
pub mod resolver;
pub mod result;

pub mod prelude {
    pub use super::error::{LookupError, ProbeFailure, report};
    pub use super::probe::{EndpointProber, TcpProber, probe_endpoint};
    pub use super::resolver::{DnsResolver, HostResolver, SystemResolver, resolve};
    pub use super::result::{OverallStatus, ProbeResult, ProbeSummary, StatusOverview};
}
