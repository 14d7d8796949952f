//! A recording host logger for exercising the plugin's C logging path.
//!
//! [`colltune_stub_logger`] has the host's variadic debug-logger signature and
//! is implemented in C, so the plugin calls it exactly as it would call the
//! real runtime. Recorded lines are read back with [`records`].

use std::ffi::CStr;

use libc::{c_char, c_int, c_ulong, size_t};

const FMT_LEN: usize = 64;
const MSG_LEN: usize = 512;

unsafe extern "C" {
    /// Host-style logger: formats `fmt` with the variadic arguments and records
    /// the result.
    pub fn colltune_stub_logger(
        level: c_int,
        flags: c_ulong,
        file: *const c_char,
        line: c_int,
        fmt: *const c_char,
        ...
    );

    fn colltune_stub_count() -> size_t;

    fn colltune_stub_get(
        idx: size_t,
        level: *mut c_int,
        flags: *mut c_ulong,
        line: *mut c_int,
        fmt: *mut c_char,
        fmt_len: size_t,
        msg: *mut c_char,
        msg_len: size_t,
    ) -> c_int;

    fn colltune_stub_reset();
}

/// One line as the host received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLogLine {
    pub level: i32,
    pub flags: u64,
    pub line: i32,
    /// The format string the plugin passed.
    pub fmt: String,
    /// The line after the host applied `fmt` to the arguments.
    pub msg: String,
}

/// Everything logged since the last [`reset`], in call order.
pub fn records() -> Vec<HostLogLine> {
    let count = unsafe { colltune_stub_count() };
    let mut out = Vec::with_capacity(count);
    for idx in 0..count {
        let mut level: c_int = 0;
        let mut flags: c_ulong = 0;
        let mut line: c_int = 0;
        let mut fmt = [0 as c_char; FMT_LEN];
        let mut msg = [0 as c_char; MSG_LEN];
        let rc = unsafe {
            colltune_stub_get(
                idx,
                &mut level,
                &mut flags,
                &mut line,
                fmt.as_mut_ptr(),
                FMT_LEN,
                msg.as_mut_ptr(),
                MSG_LEN,
            )
        };
        if rc != 0 {
            break;
        }
        let fmt = unsafe { CStr::from_ptr(fmt.as_ptr()) };
        let msg = unsafe { CStr::from_ptr(msg.as_ptr()) };
        out.push(HostLogLine {
            level,
            flags: flags as u64,
            line,
            fmt: fmt.to_string_lossy().into_owned(),
            msg: msg.to_string_lossy().into_owned(),
        });
    }
    out
}

pub fn reset() {
    unsafe { colltune_stub_reset() }
}
