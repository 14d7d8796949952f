//! C declarations shared with the host runtime's tuner plugin header.

#![allow(non_camel_case_types, non_snake_case)]

use libc::{c_char, c_int, c_ulong, c_void};

/// Host result codes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ncclResult_t {
    ncclSuccess = 0,
    ncclUnhandledCudaError = 1,
    ncclSystemError = 2,
    ncclInternalError = 3,
    ncclInvalidArgument = 4,
    ncclInvalidUsage = 5,
    ncclRemoteError = 6,
    ncclInProgress = 7,
}

/// Host logging callback: `(level, subsys flags, file, line, fmt, ...)`.
pub type ncclDebugLogger_t = Option<
    unsafe extern "C" fn(
        level: c_int,
        flags: c_ulong,
        file: *const c_char,
        line: c_int,
        fmt: *const c_char,
        ...
    ),
>;

pub type TunerInitFn = unsafe extern "C" fn(
    nRanks: usize,
    nNodes: usize,
    logFunction: ncclDebugLogger_t,
    context: *mut *mut c_void,
) -> ncclResult_t;

pub type TunerGetCollInfoFn = unsafe extern "C" fn(
    context: *mut c_void,
    collType: c_int,
    nBytes: usize,
    collNetSupport: c_int,
    nvlsSupport: c_int,
    numPipeOps: c_int,
    algorithm: *mut c_int,
    protocol: *mut c_int,
    nChannels: *mut c_int,
) -> ncclResult_t;

pub type TunerDestroyFn = unsafe extern "C" fn(context: *mut c_void) -> ncclResult_t;

/// Version 2 tuner function table.
#[repr(C)]
pub struct ncclTuner_v2_t {
    pub name: *const c_char,
    pub init: TunerInitFn,
    pub getCollInfo: TunerGetCollInfoFn,
    pub destroy: TunerDestroyFn,
}

// SAFETY: the table is immutable and `name` points at a 'static C string.
unsafe impl Sync for ncclTuner_v2_t {}
