pub mod attributes;
pub mod candidate;
pub mod catalog;
pub mod code;
pub mod dedupe;
pub mod lexical;
pub mod line_item;
pub mod output;
pub mod projector;
pub mod quantity;
pub mod rerank;
