//! The categorization engine: matching descriptions to categories, finding descriptions no rule
//! covers, editing rules in batches and changing the category registry.
//!
//! Nothing in here does I/O. Mutating operations take the current state by reference and return
//! the new state, which the caller publishes in one step.

mod coverage;
mod editor;
mod matcher;
mod registry;

pub use coverage::{find_uncovered, Uncovered};
pub use editor::{apply_edits, EditSummary, RuleEdit};
pub use matcher::{categorize, recategorize, rule_applies, Match, Matcher};
pub use registry::{
    add_categories, dangling_references, delete_categories, rename_category, CascadeReport,
    DanglingReference,
};
