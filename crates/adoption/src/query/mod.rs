//! Natural-language search.
//!
//! A free-text query is wrapped in a fixed instruction template, sent to an
//! optional text-completion capability, and the reply is mined line by line
//! for the same structured filter the manual controls produce.

pub mod capability;
pub mod http;
pub mod prompt;
pub mod reply;
pub mod service;

pub use capability::{Availability, AvailabilityMonitor, LanguageModel, ModelSession, SessionOptions};
pub use prompt::render_prompt;
pub use reply::{parse_reply, ParsedReply};
pub use service::{QueryOutcome, QueryService};
