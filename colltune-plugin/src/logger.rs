use std::ffi::CString;

use colltune::{LogLevel, LogSink, Subsys};
use libc::{c_char, c_int, c_ulong};

/// The host's variadic logging callback, as a [`LogSink`].
///
/// Every line is passed through a `"%s"` format so message text is never
/// interpreted by the host's printf.
#[derive(Clone, Copy)]
pub struct HostLogger {
    func: unsafe extern "C" fn(c_int, c_ulong, *const c_char, c_int, *const c_char, ...),
}

impl HostLogger {
    pub fn new(
        func: unsafe extern "C" fn(c_int, c_ulong, *const c_char, c_int, *const c_char, ...),
    ) -> Self {
        Self { func }
    }
}

impl LogSink for HostLogger {
    fn log(&self, level: LogLevel, subsys: Subsys, file: &str, line: u32, msg: &str) {
        let file = to_cstring(file);
        let msg = to_cstring(msg);
        unsafe {
            (self.func)(
                level as c_int,
                subsys.bits() as c_ulong,
                file.as_ptr(),
                line as c_int,
                c"%s".as_ptr(),
                msg.as_ptr(),
            );
        }
    }
}

/// Lossy `CString` conversion: interior NULs are dropped.
pub(crate) fn to_cstring(s: &str) -> CString {
    CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|&b| b != 0);
        CString::new(bytes).unwrap_or_default()
    })
}
