//! Token-aware chunking of sections.

use super::options::ChunkOptions;
use super::sentence::{pack_sentences, split_sentences};
use super::tokenizer::{TiktokenCounter, TokenCounter};
use crate::error::Result;
use crate::model::{
    breadcrumb, Chunk, ContentType, Element, KeyValuePair, Section, TableBlock,
};

/// Heading of the chunk that collects key/value pairs.
pub const KEY_INFORMATION_HEADING: &str = "Key Information";

/// Slices sections into chunks using a [`TokenCounter`].
#[derive(Debug, Clone)]
pub struct Chunker<T> {
    counter: T,
    options: ChunkOptions,
}

impl Chunker<TiktokenCounter> {
    /// Chunker counting with the tokenizer named in `options`.
    pub fn from_options(options: ChunkOptions) -> Result<Self> {
        options.validate()?;
        let counter = TiktokenCounter::for_model(&options.tokenizer_model)?;
        Ok(Self { counter, options })
    }
}

impl<T: TokenCounter> Chunker<T> {
    /// Chunker counting with a custom counter.
    ///
    /// `options.tokenizer_model` is ignored.
    pub fn with_counter(counter: T, options: ChunkOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { counter, options })
    }

    /// The options in effect.
    pub fn options(&self) -> &ChunkOptions {
        &self.options
    }

    /// Count tokens with the configured counter.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    /// Chunk every section in order, then append the key/value chunk.
    pub fn chunk(&self, sections: &[Section], key_value_pairs: &[KeyValuePair]) -> Vec<Chunk> {
        let mut sink = ChunkSink::default();
        let mut current_l1 = String::new();

        for section in sections {
            if section.level == 1 {
                current_l1 = section.heading.clone();
            }
            let parent = if section.level == 2 {
                current_l1.as_str()
            } else {
                ""
            };
            let ctx = SectionContext { section, parent };
            self.chunk_section(&ctx, &mut sink);
        }

        if let Some(chunk) = self.key_value_chunk(key_value_pairs) {
            sink.push(chunk);
        }

        log::debug!(
            "Chunked {} sections into {} chunks",
            sections.len(),
            sink.chunks.len()
        );
        sink.chunks
    }

    fn chunk_section(&self, ctx: &SectionContext<'_>, sink: &mut ChunkSink) {
        let mut parts: Vec<(String, u32)> = Vec::new();

        for element in &ctx.section.elements {
            match element {
                Element::Table(table) => {
                    // Running text before a table is emitted before it.
                    self.flush_text(ctx, std::mem::take(&mut parts), sink);
                    sink.push(self.table_chunk(ctx, table));
                }
                Element::Paragraph(paragraph) => {
                    parts.push((paragraph.chunk_text(), paragraph.page));
                }
            }
        }

        self.flush_text(ctx, parts, sink);
    }

    fn table_chunk(&self, ctx: &SectionContext<'_>, table: &TableBlock) -> Chunk {
        let text = table.chunk_text();
        let crumb = breadcrumb(ctx.parent, &ctx.section.heading);
        let embedding_text = if crumb.is_empty() {
            text.clone()
        } else {
            format!("{}\n\n{}", crumb, text)
        };

        let mut chunk = ctx.chunk(text, ContentType::Table, table.page_start, table.page_end);
        chunk.token_count = self.counter.count(&chunk.text);
        chunk.embedding_text = embedding_text;
        chunk
    }

    /// Emit accumulated running text as one chunk, or as sentence-packed
    /// sub-chunks when it exceeds the budget.
    fn flush_text(&self, ctx: &SectionContext<'_>, parts: Vec<(String, u32)>, sink: &mut ChunkSink) {
        if parts.is_empty() {
            return;
        }

        let page_start = parts.iter().map(|(_, p)| *p).min().unwrap_or(ctx.section.page_start);
        let page_end = parts.iter().map(|(_, p)| *p).max().unwrap_or(ctx.section.page_end);
        let full_text = parts
            .into_iter()
            .map(|(text, _)| text)
            .collect::<Vec<_>>()
            .join("\n\n");
        let total_tokens = self.counter.count(&full_text);

        if total_tokens <= self.options.max_tokens {
            if full_text.trim().is_empty() {
                return;
            }
            let mut chunk = ctx.chunk(full_text, ContentType::Text, page_start, page_end);
            chunk.token_count = total_tokens;
            sink.push(chunk);
            return;
        }

        let pieces = pack_sentences(
            split_sentences(&full_text),
            self.options.max_tokens,
            self.options.overlap_tokens,
            &self.counter,
        );
        log::debug!(
            "Section '{}': {} tokens split into {} chunks",
            ctx.section.heading,
            total_tokens,
            pieces.len()
        );

        let ranges = sub_chunk_pages(page_start, page_end, pieces.len());
        for (text, (start, end)) in pieces.into_iter().zip(ranges) {
            let mut chunk = ctx.chunk(text, ContentType::Text, start, end);
            chunk.token_count = self.counter.count(&chunk.text);
            sink.push(chunk);
        }
    }

    fn key_value_chunk(&self, pairs: &[KeyValuePair]) -> Option<Chunk> {
        let page_start = pairs.iter().map(|kv| kv.page).min()?;
        let page_end = pairs.iter().map(|kv| kv.page).max().unwrap_or(page_start);

        let mut text = format!("{}:", KEY_INFORMATION_HEADING);
        for kv in pairs {
            text.push_str(&format!("\n- {}: {}", kv.key, kv.value));
        }
        let token_count = self.counter.count(&text);

        Some(Chunk {
            text,
            index: 0,
            section_heading: KEY_INFORMATION_HEADING.to_string(),
            section_level: 1,
            parent_section: String::new(),
            content_type: ContentType::Text,
            page_start,
            page_end,
            token_count,
            embedding_text: String::new(),
        })
    }
}

/// Spread `[start, end]` evenly over `count` sub-chunks.
///
/// Each range starts `pages_per_chunk` after the previous one and ends
/// `pages_per_chunk` later, both capped at `end`.
pub fn sub_chunk_pages(start: u32, end: u32, count: usize) -> Vec<(u32, u32)> {
    let span = end.saturating_sub(start) as usize + 1;
    let per_chunk = (span / count.max(1)).max(1);

    (0..count)
        .map(|i| {
            let offset = u32::try_from(i * per_chunk).unwrap_or(u32::MAX);
            let p_start = start.saturating_add(offset).min(end);
            let p_end = p_start.saturating_add(per_chunk as u32).min(end);
            (p_start, p_end)
        })
        .collect()
}

/// The section a chunk belongs to, with its resolved parent heading.
struct SectionContext<'a> {
    section: &'a Section,
    parent: &'a str,
}

impl SectionContext<'_> {
    fn chunk(&self, text: String, content_type: ContentType, page_start: u32, page_end: u32) -> Chunk {
        Chunk {
            text,
            index: 0,
            section_heading: self.section.heading.clone(),
            section_level: self.section.level,
            parent_section: self.parent.to_string(),
            content_type,
            page_start,
            page_end: page_end.max(page_start),
            token_count: 0,
            embedding_text: String::new(),
        }
    }
}

/// Assigns contiguous indices in emission order.
#[derive(Default)]
struct ChunkSink {
    chunks: Vec<Chunk>,
}

impl ChunkSink {
    fn push(&mut self, mut chunk: Chunk) {
        chunk.index = self.chunks.len();
        self.chunks.push(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paragraph;

    fn words(text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn chunker(max: usize, overlap: usize) -> Chunker<fn(&str) -> usize> {
        let options = ChunkOptions::new()
            .with_max_tokens(max)
            .with_overlap_tokens(overlap);
        Chunker::with_counter(words as fn(&str) -> usize, options).unwrap()
    }

    fn section(heading: &str, level: u8, elements: Vec<Element>) -> Section {
        let mut s = Section::new(heading, level, 1);
        for e in elements {
            s.push(e);
        }
        s
    }

    #[test]
    fn test_single_text_chunk() {
        let sections = vec![section(
            "Annual Report",
            1,
            vec![Paragraph::body("Revenue grew 5%.", 1).into()],
        )];
        let chunks = chunker(512, 64).chunk(&sections, &[]);
        assert_eq!(chunks.len(), 1);
        let c = &chunks[0];
        assert_eq!(c.text, "Revenue grew 5%.");
        assert_eq!(c.content_type, ContentType::Text);
        assert_eq!(c.section_heading, "Annual Report");
        assert_eq!((c.page_start, c.page_end), (1, 1));
        assert_eq!(c.token_count, 3);
        assert!(c.embedding_text.is_empty());
    }

    #[test]
    fn test_paragraphs_joined_and_footnotes_framed() {
        let sections = vec![section(
            "Notes",
            1,
            vec![
                Paragraph::body("First.", 2).into(),
                Paragraph::footnote("Unaudited.", 3).into(),
            ],
        )];
        let chunks = chunker(512, 64).chunk(&sections, &[]);
        assert_eq!(chunks[0].text, "First.\n\n[Footnote: Unaudited.]");
        assert_eq!((chunks[0].page_start, chunks[0].page_end), (2, 3));
    }

    #[test]
    fn test_table_flushes_preceding_text() {
        let table = TableBlock::new("| A | B |\n| --- | --- |", 2, 2).with_caption("Table 1");
        let sections = vec![
            section("MD&A", 1, vec![Paragraph::body("Overview.", 1).into()]),
            section(
                "Liquidity",
                2,
                vec![
                    Paragraph::body("Before table.", 2).into(),
                    table.into(),
                    Paragraph::body("After table.", 2).into(),
                ],
            ),
        ];
        let chunks = chunker(512, 64).chunk(&sections, &[]);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Overview.",
                "Before table.",
                "Table 1\n\n| A | B |\n| --- | --- |",
                "After table."
            ]
        );

        let t = &chunks[2];
        assert_eq!(t.content_type, ContentType::Table);
        assert_eq!(t.parent_section, "MD&A");
        assert_eq!(
            t.embedding_text,
            "MD&A > Liquidity\n\nTable 1\n\n| A | B |\n| --- | --- |"
        );
        assert_eq!(t.embedding_input(), t.embedding_text);
        assert_eq!(chunks[3].embedding_input(), "After table.");
    }

    #[test]
    fn test_parent_section_tracking() {
        let body = |t: &str| -> Element { Paragraph::body(t, 1).into() };
        let sections = vec![
            section("Sub before any title", 2, vec![body("a.")]),
            section("Part I", 1, vec![body("b.")]),
            section("Item 1", 2, vec![body("c.")]),
            section("Part II", 1, vec![body("d.")]),
            section("Item 5", 2, vec![body("e.")]),
        ];
        let chunks = chunker(512, 64).chunk(&sections, &[]);
        let parents: Vec<&str> = chunks.iter().map(|c| c.parent_section.as_str()).collect();
        assert_eq!(parents, vec!["", "", "Part I", "", "Part II"]);
    }

    #[test]
    fn test_blank_text_not_emitted() {
        let sections = vec![section("Empty", 1, vec![Paragraph::body("   ", 1).into()])];
        assert!(chunker(512, 64).chunk(&sections, &[]).is_empty());
    }

    #[test]
    fn test_no_sections_no_chunks() {
        assert!(chunker(512, 64).chunk(&[], &[]).is_empty());
    }

    #[test]
    fn test_split_section_pages_and_indices() {
        // 12 sentences of 10 words over pages 1..=6.
        let paragraphs: Vec<Element> = (0..12)
            .map(|i| {
                let sentence = format!("{} w w w w w w w w w.", i);
                Paragraph::body(sentence, 1 + i / 2).into()
            })
            .collect();
        let sections = vec![section("Risk Factors", 1, paragraphs)];
        let chunks = chunker(40, 10).chunk(&sections, &[]);

        assert!(chunks.len() >= 3);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert!(c.token_count <= 40);
            assert!(c.page_start <= c.page_end);
            assert!(c.page_start >= 1 && c.page_end <= 6);
        }
        // The last sentence of a chunk opens the next one.
        for pair in chunks.windows(2) {
            let tail = pair[0].text.rsplit(". ").next().unwrap_or("");
            assert!(pair[1].text.starts_with(tail.trim_end_matches('.')));
        }
    }

    #[test]
    fn test_key_value_chunk_last() {
        let sections = vec![section("Cover", 1, vec![Paragraph::body("Hello.", 1).into()])];
        let pairs = vec![
            KeyValuePair::new("Ticker", "ACME", 1),
            KeyValuePair::new("Fiscal year end", "Dec 31", 3),
        ];
        let chunks = chunker(512, 64).chunk(&sections, &pairs);
        assert_eq!(chunks.len(), 2);
        let kv = &chunks[1];
        assert_eq!(kv.index, 1);
        assert_eq!(kv.text, "Key Information:\n- Ticker: ACME\n- Fiscal year end: Dec 31");
        assert_eq!(kv.section_heading, "Key Information");
        assert_eq!(kv.section_level, 1);
        assert_eq!(kv.content_type, ContentType::Text);
        assert_eq!((kv.page_start, kv.page_end), (1, 3));
    }

    #[test]
    fn test_sub_chunk_pages() {
        assert_eq!(sub_chunk_pages(1, 6, 3), vec![(1, 3), (3, 5), (5, 6)]);
        assert_eq!(sub_chunk_pages(4, 4, 2), vec![(4, 4), (4, 4)]);
        // More chunks than pages: starts are capped so ranges stay ordered.
        assert_eq!(sub_chunk_pages(1, 2, 4), vec![(1, 2), (2, 2), (2, 2), (2, 2)]);
        assert!(sub_chunk_pages(1, 5, 0).is_empty());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = ChunkOptions::new().with_max_tokens(10).with_overlap_tokens(10);
        assert!(Chunker::with_counter(words as fn(&str) -> usize, options).is_err());
    }
}
