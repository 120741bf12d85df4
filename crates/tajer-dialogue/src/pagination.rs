// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-size, 1-indexed pages over ordered result sets.

/// One page of a larger list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number, clamped into range.
    pub number: usize,
    /// `ceil(total / page_size)`. Zero for an empty list.
    pub page_count: usize,
    /// Index of the first item within the full list.
    pub offset: usize,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.number >= self.page_count
    }

    pub fn is_first(&self) -> bool {
        self.number <= 1
    }
}

/// Number of pages needed for `total` items.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Clamps a requested page into `1..=page_count` (page 1 when empty).
pub fn clamp_page(requested: usize, page_count: usize) -> usize {
    requested.clamp(1, page_count.max(1))
}

/// Slices `items` into the requested page. Page 1 of an empty list is an
/// empty page; out-of-range requests clamp to the nearest page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let page_count = page_count(items.len(), page_size);
    let number = clamp_page(page, page_count);
    let offset = (number - 1) * page_size;
    let items = items.iter().skip(offset).take(page_size).cloned().collect();
    Page {
        items,
        number,
        page_count,
        offset,
    }
}

/// The page after `current`, staying on the last one.
pub fn next_page(current: usize, page_count: usize) -> usize {
    clamp_page(current.saturating_add(1), page_count)
}

/// The page before `current`, staying on the first one.
pub fn previous_page(current: usize, page_count: usize) -> usize {
    clamp_page(current.saturating_sub(1), page_count)
}
