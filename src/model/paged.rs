use serde::{Deserialize, Serialize};

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_QUANTITY: i64 = 50;
pub const DEFAULT_PAGE_QUANTITY: i64 = 10;

/// A bounded page request. Only constructible through `clamped`, so every
/// listing query sees a page >= 1 and a quantity within [1, 50].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: i64,
    quantity: i64,
}

impl PageRequest {
    pub fn clamped(page: i64, quantity: i64) -> Self {
        Self {
            page: page.max(1),
            quantity: quantity.clamp(1, MAX_PAGE_QUANTITY),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.quantity)
    }

    /// Slice an already ordered collection
    pub fn slice<T: Clone>(&self, ordered: &[T]) -> Paged<T> {
        let total = ordered.len() as i64;
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(ordered.len());
        let end = start.saturating_add(self.quantity as usize).min(ordered.len());
        Paged::new(ordered[start..end].to_vec(), *self, total)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::clamped(1, DEFAULT_PAGE_QUANTITY)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub quantity: i64,
    /// Total rows matching the filter, independent of paging
    pub total: i64,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            items,
            page: request.page(),
            quantity: request.quantity(),
            total,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            quantity: self.quantity,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_below_one_is_one() {
        assert_eq!(PageRequest::clamped(0, 10), PageRequest::clamped(1, 10));
        assert_eq!(PageRequest::clamped(-7, 10).page(), 1);
    }

    #[test]
    fn quantity_is_bounded() {
        assert_eq!(PageRequest::clamped(1, 0).quantity(), 1);
        assert_eq!(PageRequest::clamped(1, -3).quantity(), 1);
        assert_eq!(PageRequest::clamped(1, 51).quantity(), 50);
        assert_eq!(PageRequest::clamped(1, 50).quantity(), 50);
        assert_eq!(PageRequest::clamped(1, 12).quantity(), 12);
    }

    #[test]
    fn slice_reports_unclamped_total() {
        let rows: Vec<i32> = (0..120).collect();
        let paged = PageRequest::clamped(2, 500).slice(&rows);
        assert_eq!(paged.items.len(), 50);
        assert_eq!(paged.items[0], 50);
        assert_eq!(paged.total, 120);
        assert_eq!(paged.quantity, 50);
    }

    #[test]
    fn slice_past_the_end_is_empty() {
        let rows = vec![1, 2, 3];
        let paged = PageRequest::clamped(9, 10).slice(&rows);
        assert!(paged.items.is_empty());
        assert_eq!(paged.total, 3);
    }
}
