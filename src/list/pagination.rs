//! Bounded window of page buttons.

/// Most page numbers shown at once.
pub const MAX_VISIBLE_PAGES: u32 = 5;

/// One element of the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page { number: u32, current: bool },
    Ellipsis,
}

/// The page numbers to show for a position, plus Previous/Next state.
///
/// The window holds at most [`MAX_VISIBLE_PAGES`] consecutive pages and
/// keeps the current page centered where it can, pinned to the first or
/// last page near either end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub current: u32,
    pub total_pages: u32,
    pub pages: Vec<u32>,
    pub leading_ellipsis: bool,
    pub trailing_ellipsis: bool,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

impl PageWindow {
    pub fn compute(current: u32, total_pages: u32) -> Self {
        let span = MAX_VISIBLE_PAGES;
        let (first, last) = if total_pages <= span {
            (1, total_pages)
        } else if current <= span / 2 + 1 {
            (1, span)
        } else if current >= total_pages - span / 2 {
            (total_pages - span + 1, total_pages)
        } else {
            (current - span / 2, current + span / 2)
        };

        let pages: Vec<u32> = (first..=last).collect();
        Self {
            current,
            total_pages,
            leading_ellipsis: !pages.is_empty() && first > 1,
            trailing_ellipsis: !pages.is_empty() && last < total_pages,
            pages,
            previous_enabled: current > 1,
            next_enabled: current < total_pages,
        }
    }

    /// Pagination is only drawn when there is more than one page.
    pub fn is_needed(&self) -> bool {
        self.total_pages > 1
    }

    /// Page buttons and ellipses in display order.
    pub fn items(&self) -> Vec<PageItem> {
        let mut items = Vec::with_capacity(self.pages.len() + 2);
        if self.leading_ellipsis {
            items.push(PageItem::Ellipsis);
        }
        items.extend(self.pages.iter().map(|&number| PageItem::Page {
            number,
            current: number == self.current,
        }));
        if self.trailing_ellipsis {
            items.push(PageItem::Ellipsis);
        }
        items
    }
}
