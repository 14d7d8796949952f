use std::sync::RwLock;

use once_cell::sync::OnceCell;

use crate::error::{Result, TunerError};
use crate::log::{LogSink, SharedSink};

/// Bits of a raw handle holding `index + 1`; the rest hold the generation.
const INDEX_BITS: u32 = usize::BITS / 2;
const INDEX_MASK: usize = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: usize = (1 << (usize::BITS - INDEX_BITS)) - 1;

/// Largest pool capacity whose handles still fit in a pointer-sized integer.
pub const MAX_ENCODABLE_CONTEXTS: usize = INDEX_MASK;

/// Generation-checked index of an allocated context.
///
/// Handed to the host in place of a raw pointer. A handle stops resolving as
/// soon as its slot is released, even if the slot is later reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle {
    index: u32,
    generation: u32,
}

impl ContextHandle {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a non-zero pointer-sized integer, so `0` always means
    /// "no handle".
    pub fn to_raw(self) -> usize {
        let generation = self.generation as usize & GENERATION_MASK;
        (generation << INDEX_BITS) | (self.index as usize + 1)
    }

    /// Inverse of [`to_raw`](Self::to_raw). Returns `None` for `0` and for
    /// values with an empty index field.
    pub fn from_raw(raw: usize) -> Option<Self> {
        let index_plus_one = raw & INDEX_MASK;
        if index_plus_one == 0 {
            return None;
        }
        Some(Self {
            index: (index_plus_one - 1) as u32,
            generation: (raw >> INDEX_BITS) as u32,
        })
    }
}

impl std::fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.to_raw())
    }
}

/// Read-only view of an allocated context.
#[derive(Clone)]
pub struct Context {
    pub n_ranks: usize,
    pub n_nodes: usize,
    sink: Option<SharedSink>,
}

impl Context {
    pub fn sink(&self) -> Option<&dyn LogSink> {
        self.sink.as_deref()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("n_ranks", &self.n_ranks)
            .field("n_nodes", &self.n_nodes)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

/// One table entry. `n_ranks == 0` marks the slot free.
#[derive(Default)]
struct Slot {
    n_ranks: usize,
    n_nodes: usize,
    sink: Option<SharedSink>,
    generation: u32,
}

impl Slot {
    fn is_free(&self) -> bool {
        self.n_ranks == 0
    }

    fn matches(&self, handle: ContextHandle) -> bool {
        !self.is_free() && self.generation == handle.generation
    }

    fn snapshot(&self) -> Context {
        Context {
            n_ranks: self.n_ranks,
            n_nodes: self.n_nodes,
            sink: self.sink.clone(),
        }
    }
}

/// Fixed-capacity table of reusable per-communicator contexts.
///
/// The table is zeroed lazily on the first allocation attempt and never again.
/// Allocation is first-fit in index order. Allocate and release hold the write
/// lock for the whole scan-and-claim / reset, so they are atomic with respect
/// to each other; lookups share the read lock.
pub struct ContextPool {
    capacity: usize,
    slots: OnceCell<RwLock<Box<[Slot]>>>,
}

impl ContextPool {
    /// Create a pool with room for `capacity` concurrent contexts.
    ///
    /// No memory is touched until the first [`allocate`](Self::allocate).
    /// Fails if `capacity` slots could not all be addressed by a handle.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity > MAX_ENCODABLE_CONTEXTS {
            return Err(TunerError::InvalidConfig {
                reason: format!(
                    "pool capacity {capacity} exceeds handle encoding limit {MAX_ENCODABLE_CONTEXTS}"
                ),
            });
        }
        Ok(Self {
            capacity,
            slots: OnceCell::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once the one-time zeroing has happened.
    pub fn is_initialized(&self) -> bool {
        self.slots.get().is_some()
    }

    fn table(&self) -> &RwLock<Box<[Slot]>> {
        self.slots.get_or_init(|| {
            tracing::debug!(capacity = self.capacity, "zeroing context table");
            RwLock::new((0..self.capacity).map(|_| Slot::default()).collect())
        })
    }

    /// Claim the first free slot for a communicator with `n_ranks` ranks on
    /// `n_nodes` nodes.
    ///
    /// On failure the table is left untouched.
    pub fn allocate(
        &self,
        n_ranks: usize,
        n_nodes: usize,
        sink: Option<SharedSink>,
    ) -> Result<ContextHandle> {
        if n_ranks == 0 {
            return Err(TunerError::ZeroRanks);
        }

        let mut slots = self
            .table()
            .write()
            .map_err(|_| TunerError::LockPoisoned("context table"))?;

        let Some(index) = slots.iter().position(Slot::is_free) else {
            tracing::warn!(capacity = self.capacity, "context pool exhausted");
            return Err(TunerError::PoolExhausted {
                capacity: self.capacity,
            });
        };

        let slot = &mut slots[index];
        slot.n_ranks = n_ranks;
        slot.n_nodes = n_nodes;
        slot.sink = sink;

        let handle = ContextHandle {
            index: index as u32,
            generation: slot.generation,
        };
        tracing::debug!(slot = index, n_ranks, n_nodes, %handle, "context allocated");
        Ok(handle)
    }

    /// Return a slot to the free set.
    ///
    /// Hands back the context as it was just before the reset so the caller
    /// can still log through its sink.
    pub fn release(&self, handle: ContextHandle) -> Result<Context> {
        let invalid = || TunerError::InvalidHandle {
            handle: handle.to_raw(),
        };
        let table = self.slots.get().ok_or_else(invalid)?;
        let mut slots = table
            .write()
            .map_err(|_| TunerError::LockPoisoned("context table"))?;

        let slot = slots
            .get_mut(handle.index())
            .filter(|s| s.matches(handle))
            .ok_or_else(invalid)?;

        let previous = Context {
            n_ranks: slot.n_ranks,
            n_nodes: slot.n_nodes,
            sink: slot.sink.take(),
        };
        slot.n_ranks = 0;
        slot.n_nodes = 0;
        slot.generation = ((slot.generation as usize + 1) & GENERATION_MASK) as u32;

        tracing::debug!(slot = handle.index(), %handle, "context released");
        Ok(previous)
    }

    /// Resolve a handle to a snapshot of its context.
    pub fn lookup(&self, handle: ContextHandle) -> Result<Context> {
        let invalid = || TunerError::InvalidHandle {
            handle: handle.to_raw(),
        };
        let table = self.slots.get().ok_or_else(invalid)?;
        let slots = table
            .read()
            .map_err(|_| TunerError::LockPoisoned("context table"))?;

        slots
            .get(handle.index())
            .filter(|s| s.matches(handle))
            .map(Slot::snapshot)
            .ok_or_else(invalid)
    }

    /// Number of slots currently allocated.
    pub fn in_use(&self) -> Result<usize> {
        let Some(table) = self.slots.get() else {
            return Ok(0);
        };
        let slots = table
            .read()
            .map_err(|_| TunerError::LockPoisoned("context table"))?;
        Ok(slots.iter().filter(|s| !s.is_free()).count())
    }
}
