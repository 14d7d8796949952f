//! Host-side vocabulary: collective kinds, algorithms, protocols, log levels.
//!
//! Discriminants match the host runtime's C enums so values cross the ABI
//! unchanged.

use bitflags::bitflags;

/// Collective operation kinds, as numbered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CollType {
    Broadcast = 0,
    Reduce = 1,
    AllGather = 2,
    ReduceScatter = 3,
    AllReduce = 4,
    SendRecv = 5,
    Send = 6,
    Recv = 7,
}

impl CollType {
    /// Map a raw host value. Values this build does not know about map to `None`.
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(CollType::Broadcast),
            1 => Some(CollType::Reduce),
            2 => Some(CollType::AllGather),
            3 => Some(CollType::ReduceScatter),
            4 => Some(CollType::AllReduce),
            5 => Some(CollType::SendRecv),
            6 => Some(CollType::Send),
            7 => Some(CollType::Recv),
            _ => None,
        }
    }

    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub const fn name(self) -> &'static str {
        match self {
            CollType::Broadcast => "Broadcast",
            CollType::Reduce => "Reduce",
            CollType::AllGather => "AllGather",
            CollType::ReduceScatter => "ReduceScatter",
            CollType::AllReduce => "AllReduce",
            CollType::SendRecv => "SendRecv",
            CollType::Send => "Send",
            CollType::Recv => "Recv",
        }
    }
}

impl std::fmt::Display for CollType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Communication topology pattern used to run a collective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Algorithm {
    Tree = 0,
    Ring = 1,
    CollNetDirect = 2,
    CollNetChain = 3,
    Nvls = 4,
    NvlsTree = 5,
}

impl Algorithm {
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Algorithm::Tree),
            1 => Some(Algorithm::Ring),
            2 => Some(Algorithm::CollNetDirect),
            3 => Some(Algorithm::CollNetChain),
            4 => Some(Algorithm::Nvls),
            5 => Some(Algorithm::NvlsTree),
            _ => None,
        }
    }

    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::Tree => "Tree",
            Algorithm::Ring => "Ring",
            Algorithm::CollNetDirect => "CollNetDirect",
            Algorithm::CollNetChain => "CollNetChain",
            Algorithm::Nvls => "NVLS",
            Algorithm::NvlsTree => "NVLSTree",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Wire-level transport mode.
///
/// - `LL`: very small messages (low latency)
/// - `LL128`: small to medium messages (128-byte segments)
/// - `Simple`: large messages (high bandwidth)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Protocol {
    LL = 0,
    LL128 = 1,
    Simple = 2,
}

impl Protocol {
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Protocol::LL),
            1 => Some(Protocol::LL128),
            2 => Some(Protocol::Simple),
            _ => None,
        }
    }

    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Protocol::LL => "LL",
            Protocol::LL128 => "LL128",
            Protocol::Simple => "SIMPLE",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw value the host uses for "no algorithm / protocol chosen yet".
pub const UNDEF: i32 = -1;

/// Severity levels understood by the host logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum LogLevel {
    None = 0,
    Version = 1,
    Warn = 2,
    Info = 3,
    Abort = 4,
    Trace = 5,
}

bitflags! {
    /// Host logging subsystems. Bit assignments follow the host's debug flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Subsys: u64 {
        const INIT = 0x1;
        const COLL = 0x2;
        const P2P = 0x4;
        const SHM = 0x8;
        const NET = 0x10;
        const GRAPH = 0x20;
        const TUNING = 0x40;
        const ENV = 0x80;
        const ALLOC = 0x100;
        const CALL = 0x200;
        const PROXY = 0x400;
        const NVLS = 0x800;
        const BOOTSTRAP = 0x1000;
        const REG = 0x2000;
    }
}
