// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markdown format handler for the block dialect
//!
//! Every block renders as one markdown unit and units are separated by a
//! blank line. The two paired layouts use a single two-column table row
//! followed by a `|---|---|` separator. Code fences, `<video>` tags and
//! `![](url)` images are the only non-text constructs.
//!
//! Parsing is a forward line scanner with three states (scanning, inside a
//! code fence, accumulating a list) and one line of lookahead for the table
//! separator.

use crate::block::{Block, BlockBody, HeadingLevel, PairContent};
use crate::id::{IdGenerator, SequentialIds};
use crate::traits::{Parser, Renderer, TextFormat};
use regex::Regex;
use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

/// Markdown format handler
pub struct MarkdownHandler {
    ids: Arc<dyn IdGenerator>,
}

impl MarkdownHandler {
    pub fn new() -> Self {
        Self::with_ids(Arc::new(SequentialIds::new()))
    }

    /// Handler that draws block ids from `ids`
    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }
}

impl Default for MarkdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for MarkdownHandler {
    fn format(&self) -> TextFormat {
        TextFormat::Markdown
    }

    fn parse(&self, input: &str) -> Vec<Block> {
        parse_markdown(input, self.ids.as_ref())
    }
}

impl Renderer for MarkdownHandler {
    fn format(&self) -> TextFormat {
        TextFormat::Markdown
    }

    fn render(&self, blocks: &[Block]) -> String {
        render_markdown(blocks)
    }
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-*•]\s+").expect("Invalid bullet regex"))
}

fn list_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-*•]\s*").expect("Invalid list marker regex"))
}

fn table_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\|\s*-+\s*\|\s*-+\s*\|$").expect("Invalid table separator regex")
    })
}

fn image_cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^!\[\]\((.*)\)$").expect("Invalid image cell regex"))
}

fn image_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[\]\((.*?)\)").expect("Invalid image marker regex"))
}

fn line_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<br\s*/?>").expect("Invalid line break regex"))
}

fn video_src_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"src="([^"]*)""#).expect("Invalid video src regex"))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render blocks as markdown, one unit per block, blank-line separated
pub fn render_markdown(blocks: &[Block]) -> String {
    let mut output = String::new();

    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            output.push_str("\n\n");
        }
        render_block(&mut output, &block.body);
    }

    output
}

fn render_block(output: &mut String, body: &BlockBody) {
    match body {
        BlockBody::Heading { level, text } => {
            output.push_str(&"#".repeat(level.level() as usize));
            output.push(' ');
            output.push_str(text);
        }

        BlockBody::Paragraph(text) => output.push_str(text),

        BlockBody::List(items) => {
            let bullets: Vec<String> = items
                .split('\n')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| format!("- {}", strip_list_marker(item)))
                .collect();
            output.push_str(&bullets.join("\n"));
        }

        BlockBody::Quote(text) => {
            output.push_str("> ");
            output.push_str(text);
        }

        BlockBody::Code(code) => {
            output.push_str("```\n");
            output.push_str(code);
            output.push_str("\n```");
        }

        BlockBody::Image { url } => {
            output.push_str("![](");
            output.push_str(url);
            output.push(')');
        }

        BlockBody::Video { url } => {
            output.push_str(&format!("<video controls src=\"{url}\"></video>"));
        }

        BlockBody::TextImage(pair) => {
            render_pair_row(output, &text_cell(&pair.text), &image_cell(&pair.image));
        }

        BlockBody::ImageText(pair) => {
            render_pair_row(output, &image_cell(&pair.image), &text_cell(&pair.text));
        }

        BlockBody::Raw { content, .. } => output.push_str(content),
    }
}

/// List item text without its leading `-`, `*` or `•` marker
pub(crate) fn strip_list_marker(item: &str) -> Cow<'_, str> {
    list_marker_re().replace(item, "")
}

fn render_pair_row(output: &mut String, left: &str, right: &str) {
    output.push_str(&format!("| {left} | {right} |\n|---|---|"));
}

fn text_cell(text: &str) -> String {
    text.replace('\n', "<br>")
}

fn image_cell(url: &str) -> String {
    format!("![]({url})")
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse markdown into blocks, drawing ids from `ids`
pub fn parse_markdown(input: &str, ids: &dyn IdGenerator) -> Vec<Block> {
    if input.is_empty() {
        return Vec::new();
    }

    let mut cursor = LineCursor::new(input);
    let blocks = Scanner::new(ids).run(&mut cursor);
    tracing::trace!(lines = cursor.len(), blocks = blocks.len(), "parsed markdown");
    blocks
}

/// Forward-only view over the input lines
struct LineCursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(input: &'a str) -> Self {
        let lines = input
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        Self { lines, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<&'a str> {
        self.lines.get(self.pos + 1).copied()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn len(&self) -> usize {
        self.lines.len()
    }
}

enum ScanState<'a> {
    Scanning,
    /// Raw (untrimmed) lines since the opening fence
    InCode(Vec<&'a str>),
    /// Item text of consecutive bullet lines, markers stripped
    InList(Vec<&'a str>),
}

/// Outcome of feeding one line to the scanner
enum Step {
    /// Move past this many lines
    Consume(usize),
    /// Feed the same line again in the new state
    Reprocess,
}

struct Scanner<'a> {
    ids: &'a dyn IdGenerator,
    state: ScanState<'a>,
    blocks: Vec<Block>,
}

impl<'a> Scanner<'a> {
    fn new(ids: &'a dyn IdGenerator) -> Self {
        Self {
            ids,
            state: ScanState::Scanning,
            blocks: Vec::new(),
        }
    }

    fn run(mut self, cursor: &mut LineCursor<'a>) -> Vec<Block> {
        while let Some(raw) = cursor.peek() {
            match self.step(raw, cursor.peek_next()) {
                Step::Consume(n) => cursor.advance(n),
                Step::Reprocess => {}
            }
        }
        self.finish()
    }

    fn step(&mut self, raw: &'a str, next: Option<&'a str>) -> Step {
        let line = raw.trim();

        match std::mem::replace(&mut self.state, ScanState::Scanning) {
            ScanState::InCode(mut buffer) => {
                if is_fence(line) {
                    self.emit(BlockBody::Code(buffer.join("\n")));
                } else {
                    buffer.push(raw);
                    self.state = ScanState::InCode(buffer);
                }
                Step::Consume(1)
            }

            ScanState::InList(mut items) => match bullet_item(line) {
                Some(item) => {
                    items.push(item);
                    self.state = ScanState::InList(items);
                    Step::Consume(1)
                }
                None => {
                    self.emit(BlockBody::List(items.join("\n")));
                    Step::Reprocess
                }
            },

            ScanState::Scanning => self.scan(line, next),
        }
    }

    /// Match one trimmed line against the block rules, first match wins
    fn scan(&mut self, line: &'a str, next: Option<&'a str>) -> Step {
        if is_fence(line) {
            self.state = ScanState::InCode(Vec::new());
            return Step::Consume(1);
        }

        match pair_row(line) {
            Some(PairRow::Layout(body)) => {
                self.emit(body);
                let separator_follows = next.is_some_and(|n| is_table_separator(n.trim()));
                return Step::Consume(if separator_follows { 2 } else { 1 });
            }
            Some(PairRow::Ambiguous) if !is_table_separator(line) => {
                tracing::debug!(
                    line,
                    "two-column row without exactly one image kept as paragraph"
                );
            }
            _ => {}
        }

        if is_table_separator(line) {
            return Step::Consume(1);
        }

        if let Some(url) = video_src(line) {
            self.emit(BlockBody::Video {
                url: url.to_string(),
            });
        } else if let Some(url) = image_url(line) {
            self.emit(BlockBody::Image {
                url: url.to_string(),
            });
        } else if let Some((level, text)) = heading(line) {
            self.emit(BlockBody::Heading {
                level,
                text: text.to_string(),
            });
        } else if let Some(text) = quote(line) {
            self.emit(BlockBody::Quote(text.to_string()));
        } else if let Some(item) = bullet_item(line) {
            self.state = ScanState::InList(vec![item]);
        } else if !line.is_empty() {
            self.emit(BlockBody::Paragraph(line.to_string()));
        }

        Step::Consume(1)
    }

    fn finish(mut self) -> Vec<Block> {
        match std::mem::replace(&mut self.state, ScanState::Scanning) {
            ScanState::InList(items) => self.emit(BlockBody::List(items.join("\n"))),
            ScanState::InCode(buffer) => {
                tracing::debug!(lines = buffer.len(), "unterminated code fence at end of input");
                self.emit(BlockBody::Code(buffer.join("\n")));
            }
            ScanState::Scanning => {}
        }
        self.blocks
    }

    fn emit(&mut self, body: BlockBody) {
        self.blocks.push(Block::new(self.ids.generate(), body));
    }
}

fn is_fence(line: &str) -> bool {
    line.starts_with("```")
}

fn is_table_separator(line: &str) -> bool {
    table_separator_re().is_match(line)
}

enum PairRow {
    Layout(BlockBody),
    /// Two cells, but not exactly one of them holds an image
    Ambiguous,
}

/// `| left | right |` with exactly two cells between the outer pipes
fn pair_row(line: &str) -> Option<PairRow> {
    let inner = line.strip_prefix('|')?.strip_suffix('|')?;
    let (left, right) = inner.split_once('|')?;
    if right.contains('|') {
        return None;
    }

    let row = match (cell_image(left), cell_image(right)) {
        (Some(image), None) => PairRow::Layout(BlockBody::ImageText(PairContent::new(
            cell_text(right),
            image,
        ))),
        (None, Some(image)) => PairRow::Layout(BlockBody::TextImage(PairContent::new(
            cell_text(left),
            image,
        ))),
        _ => PairRow::Ambiguous,
    };
    Some(row)
}

/// URL of a cell that is exactly one image marker
fn cell_image(cell: &str) -> Option<&str> {
    image_cell_re()
        .captures(cell.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn cell_text(cell: &str) -> String {
    let without_images = image_marker_re().replace_all(cell, "");
    line_break_re()
        .replace_all(&without_images, "\n")
        .trim()
        .to_string()
}

fn video_src(line: &str) -> Option<&str> {
    if !line.starts_with("<video") || !line.contains("src=") {
        return None;
    }
    let src = video_src_re()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str());
    Some(src)
}

fn image_url(line: &str) -> Option<&str> {
    line.strip_prefix("![](")?.strip_suffix(')')
}

/// Longest prefix first; a bare run of hashes is an empty heading
fn heading(line: &str) -> Option<(HeadingLevel, &str)> {
    const HASHES: &str = "####";

    for level in [
        HeadingLevel::H4,
        HeadingLevel::H3,
        HeadingLevel::H2,
        HeadingLevel::H1,
    ] {
        let Some(rest) = line.strip_prefix(&HASHES[..level.level() as usize]) else {
            continue;
        };
        if let Some(text) = rest.strip_prefix(' ') {
            return Some((level, text));
        }
        if rest.is_empty() {
            return Some((level, ""));
        }
    }
    None
}

fn quote(line: &str) -> Option<&str> {
    if line == ">" {
        return Some("");
    }
    line.strip_prefix("> ")
}

fn bullet_item(line: &str) -> Option<&str> {
    bullet_re().find(line).map(|m| &line[m.end()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SequentialIds;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Vec<BlockBody> {
        parse_markdown(input, &SequentialIds::starting_at(0))
            .into_iter()
            .map(|b| b.body)
            .collect()
    }

    fn render(bodies: Vec<BlockBody>) -> String {
        let ids = SequentialIds::starting_at(0);
        let blocks: Vec<Block> = bodies
            .into_iter()
            .map(|body| Block::new(ids.generate(), body))
            .collect();
        render_markdown(&blocks)
    }

    fn heading1(text: &str) -> BlockBody {
        BlockBody::Heading {
            level: HeadingLevel::H1,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), vec![]);
        assert_eq!(render(vec![]), "");
        assert_eq!(parse("\n\n  \n"), vec![]);
    }

    #[test]
    fn test_render_each_type() {
        let output = render(vec![
            heading1("Title"),
            BlockBody::Heading {
                level: HeadingLevel::H4,
                text: "Deep".to_string(),
            },
            BlockBody::Paragraph("Some text".to_string()),
            BlockBody::Quote("Wise words".to_string()),
            BlockBody::Code("let x = 1;\nlet y = 2;".to_string()),
            BlockBody::Image {
                url: String::new(),
            },
            BlockBody::Video {
                url: "http://x/v.mp4".to_string(),
            },
        ]);

        assert_eq!(
            output,
            concat!(
                "# Title\n\n#### Deep\n\nSome text\n\n> Wise words\n\n",
                "```\nlet x = 1;\nlet y = 2;\n```\n\n![]()\n\n",
                "<video controls src=\"http://x/v.mp4\"></video>"
            )
        );
    }

    #[test]
    fn test_render_list_strips_existing_markers() {
        let output = render(vec![BlockBody::List(
            "- first\n* second\n•third\n\n   \n  fourth  ".to_string(),
        )]);
        assert_eq!(output, "- first\n- second\n- third\n- fourth");
    }

    #[test]
    fn test_render_paired_layouts() {
        let pair = PairContent::new("Hello\nWorld", "http://x/y.png");
        assert_eq!(
            render(vec![BlockBody::TextImage(pair.clone())]),
            "| Hello<br>World | ![](http://x/y.png) |\n|---|---|"
        );
        assert_eq!(
            render(vec![BlockBody::ImageText(pair)]),
            "| ![](http://x/y.png) | Hello<br>World |\n|---|---|"
        );
    }

    #[test]
    fn test_render_raw_verbatim() {
        let output = render(vec![BlockBody::Raw {
            kind: "callout".to_string(),
            content: "**note**".to_string(),
        }]);
        assert_eq!(output, "**note**");
    }

    #[test]
    fn test_parse_headings_longest_prefix_first() {
        assert_eq!(
            parse("#### four\n### three\n## two\n# one"),
            vec![
                BlockBody::Heading {
                    level: HeadingLevel::H4,
                    text: "four".to_string()
                },
                BlockBody::Heading {
                    level: HeadingLevel::H3,
                    text: "three".to_string()
                },
                BlockBody::Heading {
                    level: HeadingLevel::H2,
                    text: "two".to_string()
                },
                heading1("one"),
            ]
        );
    }

    #[test]
    fn test_parse_heading_keeps_inner_spacing() {
        assert_eq!(parse("#  spaced"), vec![heading1(" spaced")]);
    }

    #[test]
    fn test_parse_not_a_heading() {
        assert_eq!(
            parse("#hashtag\n\n##### five"),
            vec![
                BlockBody::Paragraph("#hashtag".to_string()),
                BlockBody::Paragraph("##### five".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_heading_and_quote_round_trip() {
        let bodies = vec![heading1(""), BlockBody::Quote(String::new())];
        assert_eq!(parse(&render(bodies.clone())), bodies);
    }

    #[test]
    fn test_list_coalescing() {
        let markdown = render(vec![BlockBody::List("a\nb".to_string())]);
        assert!(markdown.contains("- a"));
        assert!(markdown.contains("- b"));
        assert_eq!(parse(&markdown), vec![BlockBody::List("a\nb".to_string())]);
    }

    #[test]
    fn test_list_accepts_all_markers() {
        assert_eq!(
            parse("- one\n* two\n• three"),
            vec![BlockBody::List("one\ntwo\nthree".to_string())]
        );
    }

    #[test]
    fn test_list_closes_on_non_bullet_line() {
        assert_eq!(
            parse("- a\n- b\n# After"),
            vec![BlockBody::List("a\nb".to_string()), heading1("After")]
        );
    }

    #[test]
    fn test_blank_line_splits_lists() {
        assert_eq!(
            parse("- a\n\n- b"),
            vec![
                BlockBody::List("a".to_string()),
                BlockBody::List("b".to_string())
            ]
        );
    }

    #[test]
    fn test_list_flushed_before_following_code() {
        assert_eq!(
            parse("- a\n```\nx\n```"),
            vec![
                BlockBody::List("a".to_string()),
                BlockBody::Code("x".to_string())
            ]
        );
    }

    #[test]
    fn test_code_fence_opacity() {
        let code =
            "# not a heading\n- not a list item\n> not a quote\n| a | ![](b) |\n\n  indented";
        let markdown = render(vec![BlockBody::Code(code.to_string())]);
        assert_eq!(parse(&markdown), vec![BlockBody::Code(code.to_string())]);
    }

    #[test]
    fn test_code_fence_ignores_info_string() {
        assert_eq!(
            parse("```rust\nfn main() {}\n```"),
            vec![BlockBody::Code("fn main() {}".to_string())]
        );
    }

    #[test]
    fn test_unterminated_code_fence_is_kept() {
        assert_eq!(
            parse("```\nlet a = 1;\n\nlet b = 2;"),
            vec![BlockBody::Code("let a = 1;\n\nlet b = 2;".to_string())]
        );
    }

    #[test]
    fn test_paired_layout_round_trip() {
        let markdown = render(vec![BlockBody::TextImage(PairContent::new(
            "Hello\nWorld",
            "http://x/y.png",
        ))]);
        assert_eq!(
            parse(&markdown),
            vec![BlockBody::TextImage(PairContent::new(
                "Hello\nWorld",
                "http://x/y.png"
            ))]
        );
    }

    #[test]
    fn test_pair_image_url_with_parentheses() {
        let bodies = vec![
            BlockBody::TextImage(PairContent::new("Hi", "https://x/Foo_(bar).png")),
            BlockBody::ImageText(PairContent::new("Map", "https://x/a_(b)_(c).svg")),
        ];
        assert_eq!(parse(&render(bodies.clone())), bodies);
    }

    #[test]
    fn test_image_text_row_without_separator() {
        assert_eq!(
            parse("| ![](http://x/a.png) | Caption |\nNext"),
            vec![
                BlockBody::ImageText(PairContent::new("Caption", "http://x/a.png")),
                BlockBody::Paragraph("Next".to_string()),
            ]
        );
    }

    #[test]
    fn test_paired_layout_with_empty_fields() {
        let bodies = vec![
            BlockBody::TextImage(PairContent::default()),
            BlockBody::ImageText(PairContent::new("", "http://x/a.png")),
        ];
        assert_eq!(parse(&render(bodies.clone())), bodies);
    }

    #[test]
    fn test_line_break_variants() {
        assert_eq!(
            parse("| a<br/>b<br />c | ![](u) |"),
            vec![BlockBody::TextImage(PairContent::new("a\nb\nc", "u"))]
        );
    }

    #[test]
    fn test_ambiguous_rows_become_paragraphs() {
        assert_eq!(
            parse("| left | right |\n|---|---|\n\n| ![](a) | ![](b) |"),
            vec![
                BlockBody::Paragraph("| left | right |".to_string()),
                BlockBody::Paragraph("| ![](a) | ![](b) |".to_string()),
            ]
        );
    }

    #[test]
    fn test_lone_separator_skipped() {
        assert_eq!(
            parse("| --- | --- |\nText"),
            vec![BlockBody::Paragraph("Text".to_string())]
        );
    }

    #[test]
    fn test_three_column_row_is_paragraph() {
        assert_eq!(
            parse("| a | ![](b) | c |"),
            vec![BlockBody::Paragraph("| a | ![](b) | c |".to_string())]
        );
    }

    #[test]
    fn test_video_src_extraction() {
        assert_eq!(
            parse("<video controls src=\"http://x/v.mp4\"></video>\n<video src=x>"),
            vec![
                BlockBody::Video {
                    url: "http://x/v.mp4".to_string()
                },
                BlockBody::Video { url: String::new() },
            ]
        );
    }

    #[test]
    fn test_image_line() {
        assert_eq!(
            parse("  ![](http://x/y.png)  \n![alt](z.png)"),
            vec![
                BlockBody::Image {
                    url: "http://x/y.png".to_string()
                },
                BlockBody::Paragraph("![alt](z.png)".to_string()),
            ]
        );
    }

    #[test]
    fn test_paragraph_is_trimmed_line() {
        assert_eq!(
            parse("   padded text   \nnext line"),
            vec![
                BlockBody::Paragraph("padded text".to_string()),
                BlockBody::Paragraph("next line".to_string()),
            ]
        );
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(
            parse("# Title\r\n\r\n```\r\ncode\r\n```\r\n"),
            vec![heading1("Title"), BlockBody::Code("code".to_string())]
        );
    }

    #[test]
    fn test_fresh_unique_ids() {
        let blocks = MarkdownHandler::new().parse("# a\n\nb\n\n- c\n\n> d");
        let mut ids: Vec<_> = blocks.iter().map(|b| b.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_handler_with_injected_ids() {
        let handler = MarkdownHandler::with_ids(Arc::new(SequentialIds::starting_at(7)));
        let blocks = handler.parse("one\n\ntwo");
        assert_eq!(blocks[0].id.as_str(), "7-0");
        assert_eq!(blocks[1].id.as_str(), "7-1");
    }
}
