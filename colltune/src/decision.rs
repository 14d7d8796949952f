//! Per-call algorithm/protocol selection.
//!
//! The policy is a single threshold triple: small all-reduce on a large
//! cluster gets Tree + LL. Everything else keeps the host's own choice.

use crate::config::TunerConfig;
use crate::pool::Context;
use crate::types::{Algorithm, CollType, Protocol, UNDEF};

/// What the host is about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollRequest {
    /// Raw collective kind as passed by the host.
    pub coll_type: i32,
    pub n_bytes: usize,
    /// Accepted for calling-convention compatibility; not consulted.
    pub collnet_support: bool,
    /// Accepted for calling-convention compatibility; not consulted.
    pub nvls_support: bool,
    /// Accepted for calling-convention compatibility; not consulted.
    pub num_pipe_ops: i32,
}

impl CollRequest {
    pub fn new(coll: CollType, n_bytes: usize) -> Self {
        Self {
            coll_type: coll.as_raw(),
            n_bytes,
            collnet_support: false,
            nvls_support: false,
            num_pipe_ops: 1,
        }
    }

    pub fn coll(&self) -> Option<CollType> {
        CollType::from_raw(self.coll_type)
    }
}

/// Host's in/out selection slots. Pre-set by the host; the tuner may
/// overwrite `algorithm` and `protocol` and never writes `n_channels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollChoice {
    pub algorithm: i32,
    pub protocol: i32,
    pub n_channels: i32,
}

impl Default for CollChoice {
    fn default() -> Self {
        Self {
            algorithm: UNDEF,
            protocol: UNDEF,
            n_channels: 0,
        }
    }
}

impl CollChoice {
    pub fn apply(&mut self, sel: Selection) {
        self.algorithm = sel.algorithm.as_raw();
        self.protocol = sel.protocol.as_raw();
    }
}

/// An override chosen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub algorithm: Algorithm,
    pub protocol: Protocol,
}

/// Force Tree + LL for all-reduce of at most `max_bytes` on at least
/// `min_nodes` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmallAllReducePolicy {
    pub max_bytes: usize,
    pub min_nodes: usize,
}

impl Default for SmallAllReducePolicy {
    fn default() -> Self {
        Self::from_config(&TunerConfig::default())
    }
}

impl SmallAllReducePolicy {
    pub fn from_config(cfg: &TunerConfig) -> Self {
        Self {
            max_bytes: cfg.small_msg_bytes,
            min_nodes: cfg.min_nodes,
        }
    }

    /// `None` means "leave the host's choice alone".
    pub fn decide(&self, ctx: &Context, req: &CollRequest) -> Option<Selection> {
        let small_allreduce = req.coll() == Some(CollType::AllReduce)
            && req.n_bytes <= self.max_bytes
            && ctx.n_nodes >= self.min_nodes;

        small_allreduce.then_some(Selection {
            algorithm: Algorithm::Tree,
            protocol: Protocol::LL,
        })
    }
}
