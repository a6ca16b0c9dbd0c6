//! User contracts and library summaries.
//!
//! Both carry the same payload: interface predicates a function
//! requires of its callers and offers in return. Contracts are keyed by
//! function name; library summaries additionally carry the header the
//! function is declared in. During propagation both take per-slot
//! precedence over analyzer-derived entries.

use std::collections::HashMap;

use cproof_dictionary::XPredicate;
use serde::{Deserialize, Serialize};

/// A user contract for one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionContract {
    pub name: String,
    /// Preconditions the function requires of every caller.
    #[serde(default)]
    pub assumptions: Vec<XPredicate>,
    /// Postconditions the function establishes.
    #[serde(default)]
    pub guarantees: Vec<XPredicate>,
}

/// A behavioral summary of a library function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySummary {
    pub header: String,
    pub name: String,
    #[serde(default)]
    pub assumptions: Vec<XPredicate>,
    #[serde(default)]
    pub guarantees: Vec<XPredicate>,
}

/// Lookup index over loaded library summaries.
#[derive(Debug, Clone, Default)]
pub struct SummaryIndex {
    by_name: HashMap<String, LibrarySummary>,
}

impl SummaryIndex {
    pub fn new(summaries: Vec<LibrarySummary>) -> Self {
        let mut by_name = HashMap::new();
        for summary in summaries {
            by_name.insert(summary.name.clone(), summary);
        }
        SummaryIndex { by_name }
    }

    pub fn lookup(&self, name: &str) -> Option<&LibrarySummary> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
