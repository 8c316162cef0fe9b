use std::ops::Range;

/// Rows one feed entry occupies on screen
pub const POST_HEIGHT: usize = 2;

/// Cursor and scroll state of the interactive feed browser
///
/// The posts themselves live in the library's feed session; this only tracks
/// where the user is looking.
#[derive(Debug, Default)]
pub struct FeedView {
    cursor: usize,
    row_offset: usize,
}

impl FeedView {
    pub fn new() -> Self {
        FeedView::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    /// Jump back to the top, e.g. after a sort change replaced the list
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.row_offset = 0;
    }

    /// Move the cursor down; `false` when already on the last post
    pub fn next(&mut self, post_count: usize) -> bool {
        if self.cursor + 1 < post_count {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Move the cursor up; `false` when already on the first post
    pub fn prev(&mut self) -> bool {
        if let Some(cursor) = self.cursor.checked_sub(1) {
            self.cursor = cursor;
            true
        } else {
            false
        }
    }

    /// Rows occupied by the post under the cursor
    pub fn cursor_rows(&self) -> Range<usize> {
        let start = self.cursor * POST_HEIGHT;
        start..start + POST_HEIGHT
    }

    /// Adjust the scroll offset so the cursor's rows fit in a viewport of
    /// `height` rows
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }

        let rows = self.cursor_rows();
        if rows.start < self.row_offset {
            self.row_offset = rows.start;
        } else if rows.end > self.row_offset + height {
            self.row_offset = rows.end - height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_stays_in_bounds() {
        let mut view = FeedView::new();
        assert!(!view.prev());
        assert!(view.next(3));
        assert!(view.next(3));
        assert!(!view.next(3));
        assert_eq!(view.cursor(), 2);
    }

    #[test]
    fn scrolling_follows_the_cursor() {
        let mut view = FeedView::new();
        for _ in 0..9 {
            view.next(10);
        }

        // Cursor on post 9 occupies rows 18..20; with 6 visible rows the
        // offset must move down to 14
        view.ensure_visible(6);
        assert_eq!(view.row_offset(), 14);

        view.reset();
        view.ensure_visible(6);
        assert_eq!(view.row_offset(), 0);
    }
}
