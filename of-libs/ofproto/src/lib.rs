//! ofproto - in-memory model of the OpenFlow control messages exchanged with a datapath

mod actions;
mod diff;
mod flow;
mod match_fields;

pub use actions::*;
pub use diff::{flows_equivalent, reconcile};
pub use flow::*;
pub use match_fields::{FlowMatch, MatchValue};
