mod apps;
mod data;
mod pipelined;
mod tables;

pub use apps::{
    AccessControl, CheckQuota, Egress, Enforcement, FlowApp, Ipfix, Ipv6Solicitation,
    install_flows,
};
pub use data::{Config, load_config_file};
pub use pipelined::Pipelined;
pub use tables::{MAX_TABLE_NUM, TableAllocator, TableAssignment, TableError};
