/// ASCII-case-insensitive search for `needle` in `haystack`. `needle` must be lowercase.
#[cfg(feature = "encoding")]
pub(crate) fn find_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    debug_assert!(!needle.iter().any(u8::is_ascii_uppercase));
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }

    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

// having this be a macro matters in release builds. rustc is unable to optimize away the
// allocation in code like this:
//
// ```rust
// fn noop(s: &str) {}
//
// noop(&format!("foo"));
// ```
macro_rules! trace_log {
    ($($tt:tt)*) => {{
        #[cfg(debug_assertions)]
        crate::testutils::trace_log(&format!($($tt)*));
    }};
}

pub(crate) use trace_log;
