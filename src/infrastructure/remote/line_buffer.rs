/// Reassembles output chunks into lines
///
/// Interactive prompts are written without a trailing newline, so a pending
/// fragment that ends like a question (`:` or `?`) is released as a line too.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode(&line[..line.len() - 1]));
        }

        if looks_like_prompt(&self.pending) {
            lines.push(decode(&self.pending));
            self.pending.clear();
        }

        lines
    }

    /// Whatever is left once the stream has closed
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = decode(&self.pending);
        self.pending.clear();
        Some(line)
    }
}

fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn looks_like_prompt(bytes: &[u8]) -> bool {
    let text = String::from_utf8_lossy(bytes);
    matches!(text.trim_end().chars().last(), Some(':') | Some('?'))
}
