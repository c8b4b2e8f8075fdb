//! Page-level semantic index: a hashing bag-of-words embedding plus an
//! on-disk JSON store, with an in-memory cache shared across invocations.

pub mod embed;
pub mod index;

pub use embed::{cosine_similarity, embed_text, EMBEDDING_DIM};
pub use index::{IndexCache, PrepareStats, Record};
