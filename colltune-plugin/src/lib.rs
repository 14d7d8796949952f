//! Tuner plugin exposing [`colltune`] through the host's C tuner interface.
//!
//! The host `dlopen`s the built `cdylib`, calls [`ncclTunerGetInterface`] with
//! the interface version it speaks, and drives the returned function table.
//! Context handles cross the ABI as opaque non-null pointers that encode a
//! generation-checked slot index; they are never dereferenced.
//!
//! # Usage
//!
//! ```text
//! cargo build --release -p colltune-plugin
//! NCCL_TUNER_PLUGIN=$PWD/target/release/libcolltune_plugin.so <launcher> ...
//! ```

pub mod logger;
pub mod sys;

use std::ffi::CStr;
use std::ptr;
use std::sync::Arc;

use colltune::{
    CollChoice, CollRequest, ContextHandle, SharedSink, Tuner, TunerConfig, TunerError,
};
use libc::{c_int, c_void};
use once_cell::sync::OnceCell;

pub use logger::HostLogger;
use sys::{ncclDebugLogger_t, ncclResult_t, ncclTuner_v2_t};

/// The only tuner interface version this plugin implements.
pub const TUNER_INTERFACE_VERSION: c_int = 2;

const PLUGIN_NAME_C: &CStr = c"colltune";

/// Process-wide tuner. The host owns the process, so the plugin owns the pool.
static TUNER: OnceCell<Tuner> = OnceCell::new();

fn tuner() -> colltune::Result<&'static Tuner> {
    TUNER.get_or_try_init(|| Tuner::new(TunerConfig::default()))
}

/// Map a tuner error onto the host's result codes.
///
/// Zero ranks, exhaustion and bad handles all report `ncclInternalError`, which
/// is what hosts built against the original plugin contract expect.
pub fn result_code(err: &TunerError) -> ncclResult_t {
    match err {
        TunerError::UnsupportedVersion { .. } => ncclResult_t::ncclInvalidArgument,
        TunerError::ZeroRanks
        | TunerError::PoolExhausted { .. }
        | TunerError::InvalidHandle { .. }
        | TunerError::InvalidConfig { .. }
        | TunerError::LockPoisoned(_) => ncclResult_t::ncclInternalError,
    }
}

fn fail(op: &'static str, err: TunerError) -> ncclResult_t {
    tracing::debug!(op, kind = ?err.kind(), "tuner call failed: {err}");
    result_code(&err)
}

/// Accept only [`TUNER_INTERFACE_VERSION`].
pub fn negotiate_version(requested: c_int) -> colltune::Result<()> {
    if requested != TUNER_INTERFACE_VERSION {
        return Err(TunerError::UnsupportedVersion {
            requested,
            supported: TUNER_INTERFACE_VERSION,
        });
    }
    Ok(())
}

fn handle_from_ptr(context: *mut c_void) -> colltune::Result<ContextHandle> {
    ContextHandle::from_raw(context.addr()).ok_or(TunerError::InvalidHandle {
        handle: context.addr(),
    })
}

unsafe extern "C" fn tuner_init(
    n_ranks: usize,
    n_nodes: usize,
    log_function: ncclDebugLogger_t,
    context: *mut *mut c_void,
) -> ncclResult_t {
    if context.is_null() {
        tracing::warn!("tuner init called with null context out-pointer");
        return ncclResult_t::ncclInternalError;
    }

    let sink: Option<SharedSink> =
        log_function.map(|f| Arc::new(HostLogger::new(f)) as SharedSink);

    match tuner().and_then(|t| t.init(n_ranks, n_nodes, sink)) {
        Ok(handle) => {
            unsafe { *context = ptr::without_provenance_mut(handle.to_raw()) };
            ncclResult_t::ncclSuccess
        }
        Err(e) => {
            unsafe { *context = ptr::null_mut() };
            fail("init", e)
        }
    }
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn tuner_get_coll_info(
    context: *mut c_void,
    coll_type: c_int,
    n_bytes: usize,
    coll_net_support: c_int,
    nvls_support: c_int,
    num_pipe_ops: c_int,
    algorithm: *mut c_int,
    protocol: *mut c_int,
    n_channels: *mut c_int,
) -> ncclResult_t {
    let handle = match handle_from_ptr(context) {
        Ok(h) => h,
        Err(e) => return fail("getCollInfo", e),
    };
    if algorithm.is_null() || protocol.is_null() {
        tracing::warn!("tuner getCollInfo called with null algorithm/protocol slot");
        return ncclResult_t::ncclInternalError;
    }

    let mut choice = unsafe {
        CollChoice {
            algorithm: *algorithm,
            protocol: *protocol,
            n_channels: if n_channels.is_null() { 0 } else { *n_channels },
        }
    };
    let req = CollRequest {
        coll_type,
        n_bytes,
        collnet_support: coll_net_support != 0,
        nvls_support: nvls_support != 0,
        num_pipe_ops,
    };

    match tuner().and_then(|t| t.get_coll_info(handle, &req, &mut choice)) {
        Ok(()) => {
            unsafe {
                *algorithm = choice.algorithm;
                *protocol = choice.protocol;
            }
            ncclResult_t::ncclSuccess
        }
        Err(e) => fail("getCollInfo", e),
    }
}

unsafe extern "C" fn tuner_destroy(context: *mut c_void) -> ncclResult_t {
    match handle_from_ptr(context).and_then(|h| tuner()?.destroy(h)) {
        Ok(()) => ncclResult_t::ncclSuccess,
        Err(e) => fail("destroy", e),
    }
}

/// Version 2 function table, also exported by name for hosts that look the
/// symbol up directly.
#[allow(non_upper_case_globals)]
#[unsafe(no_mangle)]
pub static ncclTunerPlugin_v2: ncclTuner_v2_t = ncclTuner_v2_t {
    name: PLUGIN_NAME_C.as_ptr(),
    init: tuner_init,
    getCollInfo: tuner_get_coll_info,
    destroy: tuner_destroy,
};

/// Hand the host the function table for `version`.
///
/// # Safety
/// `tuner_interface` must be null or valid for a pointer-sized write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ncclTunerGetInterface(
    version: c_int,
    tuner_interface: *mut *const ncclTuner_v2_t,
) -> ncclResult_t {
    if let Err(e) = negotiate_version(version) {
        return fail("getInterface", e);
    }
    if tuner_interface.is_null() {
        return ncclResult_t::ncclInvalidArgument;
    }
    unsafe { *tuner_interface = &raw const ncclTunerPlugin_v2 };
    ncclResult_t::ncclSuccess
}
