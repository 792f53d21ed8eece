// SPDX-License-Identifier: AGPL-3.0-or-later
//! Blockmark Core - Block document model with a lossless Markdown round trip
//!
//! This crate provides:
//! - A typed block model (headings, prose, media and paired layouts)
//! - A Markdown serializer and a line-scanning parser that reads it back
//! - Copy-on-write editing operations over a block document
//! - A plain-text handler and a registry for converting between formats

pub mod block;
pub mod config;
pub mod editor;
pub mod formats;
pub mod id;
pub mod traits;

pub use block::{
    Block, BlockBody, BlockGroup, BlockId, BlockKind, HeadingLevel, PairContent, PairPatch,
};
pub use config::{BlockDefaults, EditorConfig};
pub use editor::{ContentUpdate, Document};
pub use id::{IdGenerator, SequentialIds, UuidIds};
pub use traits::{
    BlockError, ContentShape, FormatHandler, FormatRegistry, Parser, Renderer, Result, TextFormat,
};

/// Serialize blocks to Markdown
pub fn serialize(blocks: &[Block]) -> String {
    formats::markdown::render_markdown(blocks)
}

/// Parse Markdown into blocks, generating a fresh id for each one
pub fn parse(markdown: &str) -> Vec<Block> {
    formats::markdown::parse_markdown(markdown, &SequentialIds::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_then_parse() {
        let blocks = vec![
            Block::new("a", BlockBody::with_text(BlockKind::Heading2, "Notes".to_string())),
            Block::new("b", BlockBody::Paragraph("Hello world".to_string())),
        ];

        let markdown = serialize(&blocks);
        assert_eq!(markdown, "## Notes\n\nHello world");

        let parsed = parse(&markdown);
        let bodies: Vec<_> = parsed.into_iter().map(|b| b.body).collect();
        let expected: Vec<_> = blocks.into_iter().map(|b| b.body).collect();
        assert_eq!(bodies, expected);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").is_empty());
    }
}
