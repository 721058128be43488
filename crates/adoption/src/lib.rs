//! Adoption - AI Tool Adoption Dashboard Core
//!
//! Filtering, sorting and natural-language search over a static dataset of
//! companies and how far each one has adopted a fixed set of AI coding tools.
//! The terminal front end in `main.rs` is a thin layer over these modules.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod history;
pub mod model;
pub mod normalize;
pub mod query;
pub mod sort;
pub mod source;
pub mod view;

pub use filter::{matches, FilterAction, FilterFragment, FilterOperator, FilterState, Selection};
pub use model::{AdoptionStatus, Company, ToolName, ToolStatuses, EXCLUDED_COMPANY};
pub use sort::{SortDirection, SortField, SortState, Sorter};
