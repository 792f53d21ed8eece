// SPDX-License-Identifier: AGPL-3.0-or-later
//! Plain text format handler

use super::markdown::strip_list_marker;
use crate::block::{Block, BlockBody};
use crate::id::{IdGenerator, SequentialIds};
use crate::traits::{Parser, Renderer, TextFormat};
use std::sync::Arc;

/// Plain text format handler
pub struct PlainTextHandler {
    ids: Arc<dyn IdGenerator>,
}

impl PlainTextHandler {
    pub fn new() -> Self {
        Self::with_ids(Arc::new(SequentialIds::new()))
    }

    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }
}

impl Default for PlainTextHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for PlainTextHandler {
    fn format(&self) -> TextFormat {
        TextFormat::PlainText
    }

    fn parse(&self, input: &str) -> Vec<Block> {
        // Split into paragraphs on blank lines
        input
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .map(|p| Block::new(self.ids.generate(), BlockBody::Paragraph(p.trim().to_string())))
            .collect()
    }
}

impl Renderer for PlainTextHandler {
    fn format(&self) -> TextFormat {
        TextFormat::PlainText
    }

    fn render(&self, blocks: &[Block]) -> String {
        let mut output = String::new();

        for text in blocks.iter().filter_map(|b| block_text(&b.body)) {
            if !output.is_empty() {
                output.push_str("\n\n");
            }
            output.push_str(&text);
        }

        output
    }
}

/// Text of a block without markup; media-only blocks have none
fn block_text(body: &BlockBody) -> Option<String> {
    let text = match body {
        BlockBody::Heading { text, .. }
        | BlockBody::Paragraph(text)
        | BlockBody::Quote(text)
        | BlockBody::Code(text) => text.clone(),
        BlockBody::List(items) => items
            .lines()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(strip_list_marker)
            .collect::<Vec<_>>()
            .join("\n"),
        BlockBody::TextImage(pair) | BlockBody::ImageText(pair) => pair.text.clone(),
        BlockBody::Raw { content, .. } => content.clone(),
        BlockBody::Image { .. } | BlockBody::Video { .. } => return None,
    };

    (!text.trim().is_empty()).then_some(text)
}
