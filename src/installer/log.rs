/// Append-only record of every line the installer has produced
#[derive(Debug, Clone, Default)]
pub struct LogStream {
    lines: Vec<String>,
}

impl LogStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Up to `height` lines starting at `offset`, clamped to what exists
    pub fn window(&self, offset: usize, height: usize) -> &[String] {
        let start = offset.min(self.lines.len());
        let end = start.saturating_add(height).min(self.lines.len());
        &self.lines[start..end]
    }
}
