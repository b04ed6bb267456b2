/// Log pane scroll position, kept as a distance from the newest line so
/// that zero means "follow the tail".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogScroll {
    from_bottom: usize,
}

impl LogScroll {
    pub fn is_following(&self) -> bool {
        self.from_bottom == 0
    }

    pub fn scroll_up(&mut self, lines: usize, total: usize) {
        self.from_bottom = (self.from_bottom + lines).min(total.saturating_sub(1));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.from_bottom = self.from_bottom.saturating_sub(lines);
    }

    pub fn follow(&mut self) {
        self.from_bottom = 0;
    }

    /// Keep the visible lines still while output keeps arriving
    pub fn line_added(&mut self) {
        if !self.is_following() {
            self.from_bottom += 1;
        }
    }

    /// First visible line for a pane `height` lines tall
    pub fn offset(&self, total: usize, height: usize) -> usize {
        total.saturating_sub(height).saturating_sub(self.from_bottom)
    }
}
