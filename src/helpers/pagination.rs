//! Fixed-size pagination over a list

use serde::Serialize;

/// Page window over `total_items` entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginator {
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub current: usize,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    /// Page numbers 1..=total_pages for the pager links
    pub pages: Vec<usize>,
}

impl Paginator {
    /// Build the window for a requested page; zero or absent means page 1
    pub fn new(total_items: usize, per_page: usize, requested: Option<usize>) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_items.div_ceil(per_page);
        let current = requested.filter(|&p| p > 0).unwrap_or(1);

        Self {
            per_page,
            total_items,
            total_pages,
            current,
            prev: (current > 1).then(|| current - 1),
            next: (current < total_pages).then(|| current + 1),
            pages: (1..=total_pages).collect(),
        }
    }

    /// Index of the first item on the current page
    pub fn offset(&self) -> usize {
        (self.current - 1).saturating_mul(self.per_page)
    }

    /// The items of the current page; empty past the last page
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.per_page).min(items.len());
        &items[start..end]
    }

    /// Whether the pager should be rendered
    pub fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }
}

/// Parse a `page` query value leniently: anything but a positive integer is page 1
pub fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|&p| p > 0)
        .unwrap_or(1)
}
