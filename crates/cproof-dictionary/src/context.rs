//! Program contexts: where in a function an obligation lives.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source position within the file the context's dictionary belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLoc {
    pub line: u32,
    pub byte: u32,
}

impl SourceLoc {
    pub fn new(line: u32, byte: u32) -> Self {
        SourceLoc { line, byte }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} (byte {})", self.line, self.byte)
    }
}

/// A source location plus the CFG/call path leading to it. Two
/// obligations at the same statement but on different paths intern to
/// different contexts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    pub loc: SourceLoc,
    pub path: Vec<String>,
}

impl Context {
    pub fn at(loc: SourceLoc) -> Self {
        Context {
            loc,
            path: Vec::new(),
        }
    }

    /// A new context one path step deeper.
    pub fn extend(&self, step: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(step.into());
        Context { loc: self.loc, path }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.loc)
        } else {
            write!(f, "{} [{}]", self.loc, self.path.join(":"))
        }
    }
}
