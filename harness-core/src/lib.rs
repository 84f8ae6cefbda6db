#![allow(clippy::too_long_first_doc_paragraph)]
#![allow(clippy::len_without_is_empty)]

pub mod backend;
pub mod circuits;
pub mod curves;
pub mod gadgets;
pub mod input;
pub mod pipeline;
pub mod primitives;
pub mod utils;
