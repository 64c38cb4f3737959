//! Line assembly over a chunked byte stream
//!
//! Transport chunk boundaries do not line up with line boundaries: one line
//! may span several chunks, and one chunk may carry several lines plus the
//! start of the next. `LineBuffer` holds the single pending tail and hands
//! back complete lines as they close, so the same ordered line sequence comes
//! out no matter where the transport decided to split.

/// Reassembles newline-delimited text from arbitrarily split chunks.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one transport chunk and drain every line it completed.
    ///
    /// The trailing segment after the last newline stays buffered until a
    /// later chunk (or [`finish`](Self::finish)) closes it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.push_str(&String::from_utf8_lossy(chunk));

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let mut line: String = self.pending.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    /// Take the residual partial line at end-of-input, if it is non-blank.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_lines(chunks: &[&str]) -> (Vec<String>, Option<String>) {
        let mut buffer = LineBuffer::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(buffer.push(chunk.as_bytes()));
        }
        let rest = buffer.finish();
        (lines, rest)
    }

    #[test]
    fn single_chunk_with_multiple_lines() {
        let (lines, rest) = collect_lines(&["a\nb\nc\n"]);
        assert_eq!(lines, vec!["a", "b", "c"]);
        assert_eq!(rest, None);
    }

    #[test]
    fn line_spanning_chunks() {
        let (lines, rest) = collect_lines(&["{\"resp", "onse\":\"x\"}\n"]);
        assert_eq!(lines, vec!["{\"response\":\"x\"}"]);
        assert_eq!(rest, None);
    }

    #[test]
    fn chunk_split_position_does_not_change_output() {
        let text = "{\"response\":\"a\",\"done\":false}\n{\"response\":\"b\",\"done\":false}\n{\"done\":true}\n";
        let whole = collect_lines(&[text]);
        for split in 1..text.len() {
            let (head, tail) = text.split_at(split);
            assert_eq!(collect_lines(&[head, tail]), whole, "split at {split}");
        }
    }

    #[test]
    fn trailing_partial_is_retained_until_finished() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.push(b"complete\npart"), vec!["complete"]);
        assert_eq!(buffer.push(b"ial"), Vec::<String>::new());
        assert_eq!(buffer.finish(), Some("partial".to_string()));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn blank_residual_is_discarded() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"line\n  ");
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        let (lines, _) = collect_lines(&["data: x\r\n\r\n"]);
        assert_eq!(lines, vec!["data: x", ""]);
    }
}
