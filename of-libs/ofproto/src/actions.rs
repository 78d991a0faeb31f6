//! actions - the closed set of flow actions and instructions the pipeline manipulates

/// OpenFlow reserved port: punt the packet to the controller.
pub const OFPP_CONTROLLER: u32 = 0xfffffffd;
/// OpenFlow reserved port: the switch's local networking stack.
pub const OFPP_LOCAL: u32 = 0xfffffffe;

// Registers shared by the pipeline apps.  The IMSI travels in the
// metadata field; the rest are Nicira extension registers.
pub const IMSI_REG: &str = "metadata";
pub const SCRATCH_REG: &str = "reg0";
pub const DIRECTION_REG: &str = "reg1";
pub const RULE_NUM_REG: &str = "reg2";
pub const RULE_VERSION_REG: &str = "reg3";
pub const PASSTHROUGH_REG: &str = "reg4";

/// Direction of a subscriber packet relative to the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Direction {
    Out = 0x1,
    In = 0x10,
}

impl From<Direction> for u64 {
    fn from(d: Direction) -> u64 {
        d as u64
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Load an immediate value into a register.
    RegisterLoad { dst: &'static str, value: u64 },
    /// Re-inject the packet into another flow table.
    ResubmitTable { table: u8 },
    /// Output the packet on a port.
    Output { port: u32 },
    /// Any other action kind (sampling, header rewrites, ...), carried
    /// opaquely.  The diff engine ignores these.
    Other(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    ApplyActions(Vec<Action>),
    GotoTable(u8),
}
