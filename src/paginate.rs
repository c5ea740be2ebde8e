//! Cursor-following pagination.
//!
//! Every paged helper in this crate is built on [`Paginator`]: a fetch
//! closure receives the previous page's cursor verbatim and returns the next
//! [`Page`]. Pages are requested one at a time, only when the caller has
//! drained the items of the previous one.

use std::collections::VecDeque;

use crate::error::Result;

/// One page of results plus the cursor for the page after it.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T, C> {
    /// Items carried by this page, in service order.
    pub items: Vec<T>,
    /// Cursor for the next page. `None` ends pagination.
    pub next: Option<C>,
}

impl<T, C> Page<T, C> {
    pub fn new(items: Vec<T>, next: Option<C>) -> Self {
        Self { items, next }
    }

    /// A page that ends pagination.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Whether a cursor value carries anything.
///
/// Services sometimes send an empty token or an empty key map instead of
/// omitting the field; both end pagination.
pub trait Cursor {
    fn is_exhausted(&self) -> bool;
}

impl Cursor for String {
    fn is_exhausted(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> Cursor for std::collections::HashMap<K, V, S> {
    fn is_exhausted(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Cursor for std::collections::BTreeMap<K, V> {
    fn is_exhausted(&self) -> bool {
        self.is_empty()
    }
}

/// Lazy iterator over the items of every page.
///
/// Yields `Err` once if a fetch fails and is fused afterwards.
pub struct Paginator<T, C, F> {
    fetch: F,
    cursor: Option<C>,
    buffer: VecDeque<T>,
    pages: usize,
    done: bool,
}

impl<T, C, F> Paginator<T, C, F>
where
    C: Cursor,
    F: FnMut(Option<C>) -> Result<Page<T, C>>,
{
    /// Starts from the first page.
    pub fn new(fetch: F) -> Self {
        Self::starting_at(None, fetch)
    }

    /// Starts from a caller-supplied cursor.
    pub fn starting_at(cursor: Option<C>, fetch: F) -> Self {
        Self {
            fetch,
            cursor: cursor.filter(|c| !c.is_exhausted()),
            buffer: VecDeque::new(),
            pages: 0,
            done: false,
        }
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    fn fetch_next(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _guard = tracing::debug_span!("aws_helpers.page", page = self.pages + 1).entered();

        let page = (self.fetch)(self.cursor.take())?;
        self.pages += 1;
        self.buffer.extend(page.items);
        self.cursor = page.next.filter(|c| !c.is_exhausted());
        if self.cursor.is_none() {
            self.done = true;
        }
        Ok(())
    }
}

impl<T, C, F> Iterator for Paginator<T, C, F>
where
    C: Cursor,
    F: FnMut(Option<C>) -> Result<Page<T, C>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.fetch_next() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

impl<T, C, F> std::iter::FusedIterator for Paginator<T, C, F>
where
    C: Cursor,
    F: FnMut(Option<C>) -> Result<Page<T, C>>,
{
}

/// Shorthand for [`Paginator::new`].
pub fn paginate<T, C, F>(fetch: F) -> Paginator<T, C, F>
where
    C: Cursor,
    F: FnMut(Option<C>) -> Result<Page<T, C>>,
{
    Paginator::new(fetch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn three_pages() -> Vec<Page<u32, String>> {
        vec![
            Page::new(vec![1, 2], Some("a".to_string())),
            Page::new(vec![3], Some("b".to_string())),
            Page::last(vec![4, 5]),
        ]
    }

    #[test]
    fn yields_every_page_then_stops() {
        let mut pages = three_pages().into_iter();
        let mut seen = Vec::new();

        let mut pager = paginate(|cursor: Option<String>| {
            seen.push(cursor);
            Ok(pages.next().expect("no more pages scripted"))
        });
        let items = pager.by_ref().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(pager.pages_fetched(), 3);
        assert!(pager.next().is_none());
        drop(pager);

        assert_eq!(
            seen,
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[test]
    fn fetches_lazily() {
        let mut calls = 0;
        let mut pager = paginate(|cursor: Option<String>| {
            calls += 1;
            Ok(match cursor {
                None => Page::new(vec![1], Some("next".to_string())),
                Some(_) => Page::last(vec![2]),
            })
        });
        assert_eq!(pager.next().unwrap().unwrap(), 1);
        assert_eq!(pager.pages_fetched(), 1);
        assert_eq!(pager.next().unwrap().unwrap(), 2);
        assert_eq!(pager.pages_fetched(), 2);
        assert!(pager.next().is_none());
        drop(pager);
        assert_eq!(calls, 2);
    }

    #[test]
    fn empty_cursor_ends_pagination() {
        let mut calls = 0;
        let items = paginate(|_: Option<String>| {
            calls += 1;
            Ok(Page::new(vec!["x"], Some(String::new())))
        })
        .collect::<Result<Vec<_>>>()
        .unwrap();
        assert_eq!(items, vec!["x"]);
        assert_eq!(calls, 1);
    }

    #[test]
    fn skips_empty_pages_with_cursor() {
        let mut pages = vec![
            Page::new(vec![], Some("a".to_string())),
            Page::new(vec![], Some("b".to_string())),
            Page::last(vec![7]),
        ]
        .into_iter();
        let items = paginate(|_: Option<String>| Ok(pages.next().unwrap()))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(items, vec![7]);
    }

    #[test]
    fn error_is_yielded_once_then_fused() {
        let mut calls = 0;
        let mut pager = paginate(|cursor: Option<String>| {
            calls += 1;
            match cursor {
                None => Ok(Page::new(vec![1], Some("a".to_string()))),
                Some(_) => Err(Error::transport("connection reset", None)),
            }
        });
        assert_eq!(pager.next().unwrap().unwrap(), 1);
        assert!(matches!(pager.next(), Some(Err(Error::Transport { .. }))));
        assert!(pager.next().is_none());
        drop(pager);
        assert_eq!(calls, 2);
    }

    #[test]
    fn starting_cursor_is_forwarded() {
        let mut seen = None;
        let items = Paginator::starting_at(Some("resume".to_string()), |cursor| {
            seen = cursor.clone();
            Ok(Page::<u8, String>::last(vec![9]))
        })
        .collect::<Result<Vec<_>>>()
        .unwrap();
        assert_eq!(items, vec![9]);
        assert_eq!(seen.as_deref(), Some("resume"));
    }
}
