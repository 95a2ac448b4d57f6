//! External command construction.
//!
//! A [`Cmd`] is an ordered list of argument strings describing one
//! compiler/linker invocation. The buffer is meant to be reused: the pool
//! clears it (keeping capacity) after every submission, so a build loop can
//! keep appending into the same allocation.

use std::fmt::Write as _;

#[derive(Debug, Default, Clone)]
pub struct Cmd {
    args: Vec<String>,
}

impl Cmd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The executable name, if any argument has been appended yet.
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Empties the argument list, retaining capacity for reuse.
    pub fn clear(&mut self) {
        self.args.clear();
    }

    /// Shell-like rendering for log output. Arguments containing whitespace
    /// are wrapped in single quotes; the result is for humans, not for
    /// re-parsing.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            if arg.contains(char::is_whitespace) {
                let _ = write!(out, "'{}'", arg);
            } else {
                out.push_str(arg);
            }
        }
        out
    }
}

/// Joins arguments into a single command-line string following the MSVC
/// C-runtime argv conventions, so the child's `argv` recovers each argument
/// byte for byte.
///
/// An argument is emitted bare when it is non-empty and free of space, tab,
/// newline, vertical tab and double quotes. Otherwise it is wrapped in
/// double quotes; a run of backslashes directly before a double quote (or
/// before the closing quote) is doubled, and a literal double quote gets one
/// extra escaping backslash.
pub fn quote_cmdline(args: &[String]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if !arg.is_empty() && !arg.contains([' ', '\t', '\n', '\x0b', '"']) {
            out.push_str(arg);
            continue;
        }
        out.push('"');
        let mut backslashes = 0;
        for ch in arg.chars() {
            if ch == '\\' {
                backslashes += 1;
            } else {
                if ch == '"' {
                    // escape the pending backslashes and the quote itself
                    for _ in 0..=backslashes {
                        out.push('\\');
                    }
                }
                backslashes = 0;
            }
            out.push(ch);
        }
        // a trailing backslash run would otherwise escape the closing quote
        for _ in 0..backslashes {
            out.push('\\');
        }
        out.push('"');
    }
    out
}
