//! Lazy, forward-only iteration over paged collections.

use std::collections::VecDeque;

use anyhow::Result;
use futures_util::stream::{self, Stream};

use super::page::PageQuery;

/// Cursor over a paged collection, created per list-operation call.
///
/// Two views share one cursor: [`next_page`](Self::next_page) advances page
/// by page and is the source of truth; [`next_entity`](Self::next_entity)
/// buffers the current page and drains it in server order before pulling the
/// next one. Once a page with no continuation has been consumed the iterator
/// is exhausted for good — further advances report completion without issuing
/// requests. Iterate again by calling the originating list operation again.
///
/// `&mut self` on the advance methods keeps at most one fetch in flight per
/// iterator. Abandoning iteration at any point is safe; no cleanup is needed.
pub struct EntityListIterator<T> {
    buffered: VecDeque<T>,
    next_query: Option<PageQuery<T>>,
}

impl<T> EntityListIterator<T> {
    /// Create an iterator that starts at the given first-page query.
    pub fn new(first_page: PageQuery<T>) -> Self {
        Self {
            buffered: VecDeque::new(),
            next_query: Some(first_page),
        }
    }

    /// Advance by one page, fetching it on demand.
    ///
    /// Returns `Ok(None)` permanently once the last page has been consumed.
    /// A fetch error consumes the continuation; the iterator reports
    /// completion afterwards.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        let Some(query) = self.next_query.take() else {
            return Ok(None);
        };

        let page = query.fetch().await?;
        self.next_query = page.next;
        Ok(Some(page.entities))
    }

    /// Advance by one entity, fetching pages on demand.
    ///
    /// Entities come in page order, pages in server link order. Returns
    /// `Ok(None)` permanently once the collection is exhausted.
    pub async fn next_entity(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(entity) = self.buffered.pop_front() {
                return Ok(Some(entity));
            }
            match self.next_page().await? {
                Some(entities) => self.buffered.extend(entities),
                None => return Ok(None),
            }
        }
    }

    /// Consume the iterator into a `Stream` of entities.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> {
        stream::try_unfold(self, |mut iterator| async move {
            let entity = iterator.next_entity().await?;
            Ok(entity.map(|entity| (entity, iterator)))
        })
    }

    /// Drain all remaining entities into a vector.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut entities = Vec::new();
        while let Some(entity) = self.next_entity().await? {
            entities.push(entity);
        }
        Ok(entities)
    }
}
