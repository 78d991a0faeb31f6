//! flow - flow modification messages and the control-channel message unit

use crate::actions::{Action, Instruction};
use crate::match_fields::FlowMatch;
use std::fmt;

/// Stable identifier of one controlled datapath, for the life of its
/// connection.  A reconnect shows up as a new id.
pub type DatapathId = u64;

/// Correlation id assigned to every outgoing message and barrier,
/// unique among outstanding messages on one switch connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Xid(pub u32);

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

pub const MINIMUM_PRIORITY: u16 = 0;
pub const DEFAULT_PRIORITY: u16 = 10;
pub const MAXIMUM_PRIORITY: u16 = 65535;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowModCommand {
    Add,
    Delete,
    DeleteStrict,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowMod {
    pub table_id: u8,
    pub command: FlowModCommand,
    pub priority: u16,
    pub cookie: u64,
    pub match_fields: FlowMatch,
    pub instructions: Vec<Instruction>,
}

impl FlowMod {
    pub fn add(table_id: u8) -> Self {
        Self::new(table_id, FlowModCommand::Add)
    }

    /// Delete every flow in `table_id` whose match is a superset of the
    /// match set on this message.
    pub fn delete(table_id: u8) -> Self {
        Self::new(table_id, FlowModCommand::Delete)
    }

    pub fn delete_strict(table_id: u8) -> Self {
        Self::new(table_id, FlowModCommand::DeleteStrict)
    }

    fn new(table_id: u8, command: FlowModCommand) -> Self {
        FlowMod {
            table_id,
            command,
            priority: MINIMUM_PRIORITY,
            cookie: 0,
            match_fields: FlowMatch::new(),
            instructions: Vec::new(),
        }
    }

    pub fn priority(mut self, priority: u16) -> Self {
        self.priority = priority;
        self
    }

    pub fn cookie(mut self, cookie: u64) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn matching(mut self, match_fields: FlowMatch) -> Self {
        self.match_fields = match_fields;
        self
    }

    pub fn apply_actions(mut self, actions: Vec<Action>) -> Self {
        self.instructions.push(Instruction::ApplyActions(actions));
        self
    }

    pub fn goto_table(mut self, table: u8) -> Self {
        self.instructions.push(Instruction::GotoTable(table));
        self
    }

    /// Shorthand for the common "pass the packet on to another app's
    /// table" instruction.
    pub fn resubmit_to(self, table: u8) -> Self {
        self.apply_actions(vec![Action::ResubmitTable { table }])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OfPayload {
    FlowMod(FlowMod),
    BarrierRequest,
}

/// The unit handed to the switch transport.  Wire encoding is the
/// transport's business.
#[derive(Clone, Debug, PartialEq)]
pub struct OfMessage {
    pub xid: Xid,
    pub payload: OfPayload,
}

impl OfMessage {
    pub fn flow_mod(xid: Xid, flow: FlowMod) -> Self {
        OfMessage {
            xid,
            payload: OfPayload::FlowMod(flow),
        }
    }

    pub fn barrier_request(xid: Xid) -> Self {
        OfMessage {
            xid,
            payload: OfPayload::BarrierRequest,
        }
    }

    pub fn is_barrier(&self) -> bool {
        matches!(self.payload, OfPayload::BarrierRequest)
    }
}

// OpenFlow 1.3 error type constants (section 7.4.4 of the protocol).
pub const OFPET_BAD_REQUEST: u16 = 1;
pub const OFPET_BAD_ACTION: u16 = 2;
pub const OFPET_BAD_INSTRUCTION: u16 = 3;
pub const OFPET_BAD_MATCH: u16 = 4;
pub const OFPET_FLOW_MOD_FAILED: u16 = 5;

/// Content of an asynchronous OFPT_ERROR notification for one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfpErrorMsg {
    pub err_type: u16,
    pub err_code: u16,
}

impl OfpErrorMsg {
    pub fn new(err_type: u16, err_code: u16) -> Self {
        OfpErrorMsg { err_type, err_code }
    }
}

impl fmt::Display for OfpErrorMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type={} code={}", self.err_type, self.err_code)
    }
}
