pub mod access_control;
pub mod check_quota;
pub mod egress;
pub mod enforcement;
mod flow_app;
pub mod ipfix;
pub mod ipv6_solicitation;

pub use access_control::AccessControl;
pub use check_quota::CheckQuota;
pub use egress::Egress;
pub use enforcement::Enforcement;
pub use flow_app::{FlowApp, install_flows};
pub use ipfix::Ipfix;
pub use ipv6_solicitation::Ipv6Solicitation;
