//! Intent Router (C13), Conversation Memory (C14), and Answer Composer
//! (C15).

pub mod composer;
pub mod intent;
pub mod memory;

pub use composer::{
    compose_aggregate, compose_casual, compose_document, compose_invoice_count,
    compose_invoice_list, compose_meta_count, compose_meta_list, compose_summarize,
};
pub use intent::route_intent;
pub use memory::ConversationMemory;
