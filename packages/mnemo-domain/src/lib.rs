pub mod context;
pub mod document;
pub mod planner;
pub mod scoring;

pub use document::{CHAT_TYPE, ContextDocument, DocumentKind, Metadata, chunk_id};
pub use planner::{QueryPlan, plan_query};
