use std::backtrace::BacktraceStatus;
use std::ops::Deref;
use std::panic::{self, UnwindSafe};
use std::sync::Once;

use libtest_mimic::Failed;

use htmlement::testutils::{take_output, trace_log};
use htmlement::{Element, Node};

/// Improved panic messages for the fixture test suite.
///
/// This function catches panics, prepends the log message to the panic message, and captures
/// stacktraces.
///
/// libtest_mimic already catches panics but doesn't provide stacktraces for some reason.
///
/// Because custom test harnesses in Rust do not support capturing of stdout, we have to implement
/// our own "log buffer", and append it to the error message in case of test failure. OUTPUT is the
/// log buffer -- it is bound in size and compiled out in release mode.
pub fn catch_unwind_and_report(f: impl FnOnce() + UnwindSafe) -> Result<(), Failed> {
    static PANIC_HOOK: Once = Once::new();
    PANIC_HOOK.call_once(|| {
        panic::set_hook(Box::new(|_info| {
            let backtrace = std::backtrace::Backtrace::capture();
            if backtrace.status() != BacktraceStatus::Captured {
                trace_log("PANIC BACKTRACE: did not capture, use RUST_BACKTRACE=1");
            } else {
                trace_log(&format!("\nPANIC BACKTRACE:\n{:#?}", backtrace));
            }
        }));
    });

    let result = std::panic::catch_unwind(f);
    let mut msg = take_output();

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            msg.push('\n');
            if let Some(s) = e
                // Try to convert it to a String, then turn that into a str
                .downcast_ref::<String>()
                .map(String::as_str)
                // If that fails, try to turn it into a &'static str
                .or_else(|| e.downcast_ref::<&'static str>().map(Deref::deref))
            {
                msg.push_str("PANIC: ");
                msg.push_str(s);
            }

            Err(msg.into())
        }
    }
}

/// Render a tree in the indented format of the html5lib tree-construction tests. Tails are
/// rendered as text siblings following the element they belong to.
pub fn serialize(root: &Element) -> String {
    let mut buf = String::new();
    serialize_element(&mut buf, 1, root);
    buf
}

fn line(buf: &mut String, indent: usize, content: &str) {
    buf.push('|');
    buf.push_str(&" ".repeat(indent));
    buf.push_str(content);
    buf.push('\n');
}

fn serialize_element(buf: &mut String, indent: usize, element: &Element) {
    line(buf, indent, &format!("<{}>", element.name));

    for (name, value) in &element.attributes {
        line(buf, indent + 2, &format!("{}=\"{}\"", name, value));
    }

    if let Some(ref text) = element.text {
        line(buf, indent + 2, &format!("\"{}\"", text));
    }

    for child in &element.children {
        match child {
            Node::Element(child) => serialize_element(buf, indent + 2, child),
            Node::Comment(comment) => line(buf, indent + 2, &format!("<!-- {} -->", comment.text)),
        }

        if let Some(tail) = child.tail() {
            line(buf, indent + 2, &format!("\"{}\"", tail));
        }
    }
}
