// SubRip block model
//
// Blocks are kept as raw lines so that index and timing lines survive a
// parse/render cycle untouched; only text lines are ever replaced.

/// One blank-line separated block of a SubRip file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtBlock {
    lines: Vec<String>,
}

impl SrtBlock {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// A cue has an index line, a timing line and at least one text line.
    pub fn is_cue(&self) -> bool {
        self.lines.len() >= 3
    }

    /// Index and timing lines of a cue, or every line of a non-cue block.
    pub fn header(&self) -> &[String] {
        if self.is_cue() {
            &self.lines[..2]
        } else {
            &self.lines
        }
    }

    pub fn text_lines(&self) -> &[String] {
        if self.is_cue() {
            &self.lines[2..]
        } else {
            &[]
        }
    }

    /// Copy of this block with its text lines replaced.
    ///
    /// Non-cue blocks are returned unchanged.
    pub fn with_text_lines(&self, text: Vec<String>) -> SrtBlock {
        if !self.is_cue() || text.is_empty() {
            return self.clone();
        }
        let mut lines = self.header().to_vec();
        lines.extend(text);
        SrtBlock { lines }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SrtDocument {
    pub blocks: Vec<SrtBlock>,
}

impl SrtDocument {
    pub fn parse(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut blocks = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for line in content.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    blocks.push(SrtBlock::new(std::mem::take(&mut current)));
                }
            } else {
                current.push(line.to_string());
            }
        }
        if !current.is_empty() {
            blocks.push(SrtBlock::new(current));
        }

        Self { blocks }
    }

    pub fn render(&self) -> String {
        if self.blocks.is_empty() {
            return String::new();
        }
        let mut out = self
            .blocks
            .iter()
            .map(|b| b.lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n");
        out.push('\n');
        out
    }

    pub fn cue_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_cue()).count()
    }

    pub fn text_line_count(&self) -> usize {
        self.blocks.iter().map(|b| b.text_lines().len()).sum()
    }

    /// Text lines only, in file order.
    pub fn text(&self) -> impl Iterator<Item = &str> {
        self.blocks
            .iter()
            .flat_map(|b| b.text_lines().iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,500 --> 00:00:04,000\nHello, world!\n\n2\n00:00:04,500 --> 00:00:07,000\nThis is a test.\nSecond line.\n";

    #[test]
    fn test_parse_blocks() {
        let doc = SrtDocument::parse(SAMPLE);
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.cue_count(), 2);
        assert_eq!(doc.text_line_count(), 3);
        assert_eq!(doc.blocks[1].header()[1], "00:00:04,500 --> 00:00:07,000");
        assert_eq!(doc.blocks[1].text_lines(), ["This is a test.", "Second line."]);
    }

    #[test]
    fn test_render_is_lossless() {
        let doc = SrtDocument::parse(SAMPLE);
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn test_parse_crlf_bom_and_extra_blank_lines() {
        let content = "\u{feff}1\r\n00:00:00,000 --> 00:00:01,000\r\nHi\r\n\r\n\r\n\r\n2\r\n00:00:01,000 --> 00:00:02,000\r\nBye\r\n";
        let doc = SrtDocument::parse(content);
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[0].lines()[0], "1");
        assert_eq!(doc.blocks[1].text_lines(), ["Bye"]);
    }

    #[test]
    fn test_short_block_is_not_a_cue() {
        let doc = SrtDocument::parse("1\n00:00:00,000 --> 00:00:01,000\n\n2\n00:00:01,000 --> 00:00:02,000\nText\n");
        assert_eq!(doc.blocks.len(), 2);
        assert!(!doc.blocks[0].is_cue());
        assert!(doc.blocks[0].text_lines().is_empty());
        assert_eq!(doc.blocks[0].header().len(), 2);
        assert_eq!(doc.cue_count(), 1);
    }

    #[test]
    fn test_with_text_lines_keeps_header() {
        let doc = SrtDocument::parse(SAMPLE);
        let replaced = doc.blocks[0].with_text_lines(vec!["¡Hola, mundo!".to_string()]);
        assert_eq!(replaced.header(), doc.blocks[0].header());
        assert_eq!(replaced.text_lines(), ["¡Hola, mundo!"]);
    }

    #[test]
    fn test_empty_document() {
        let doc = SrtDocument::parse("");
        assert!(doc.blocks.is_empty());
        assert_eq!(doc.render(), "");
    }
}
