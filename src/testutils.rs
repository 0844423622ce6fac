//! Module of helper functions for integration tests.
//!
//! Those tests should only test public API surface in general, with some exceptions as provided by
//! this module.
use std::cell::Cell;

thread_local! {
    /// Buffer of all debugging output logged internally by htmlement.
    pub static OUTPUT: Cell<String> = Cell::default();
}

/// Simple debug logger for tests.
///
/// The fixture harness used by `tests/tree_construction.rs` cannot capture stdout, see
/// [libtest-mimic issue #9](https://github.com/LukasKalbertodt/libtest-mimic/issues/9) -- this is
/// much cheaper than println anyway though.
///
/// Calls are compiled out of release builds by the `trace_log!` macro.
pub fn trace_log(msg: &str) {
    OUTPUT.with(|cell| {
        let mut buf = cell.take();
        buf.push_str(msg);
        buf.push('\n');

        if buf.len() > 20 * 1024 * 1024 {
            buf.clear();
            buf.push_str("[truncated output]\n");
        }

        cell.set(buf);
    });
}

/// Drain the log buffer of the current thread.
pub fn take_output() -> String {
    OUTPUT.with(Cell::take)
}
