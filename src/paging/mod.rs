//! Paged collection retrieval: page queries and the entity iterator.

mod iterator;
mod page;

pub use iterator::EntityListIterator;
pub use page::{EntityExtractor, Page, PageQuery};
