// SPDX-License-Identifier: AGPL-3.0-or-later
//! Parser and Renderer traits for block formats

use crate::block::{Block, BlockId, BlockKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};

/// Error type for block conversion and editing
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error("Block not found: {id}")]
    BlockNotFound { id: BlockId },

    #[error("Duplicate block id: {id}")]
    DuplicateId { id: BlockId },

    #[error("Block {id} ({kind}) expects {expected} content")]
    ContentShape {
        id: BlockId,
        kind: String,
        expected: ContentShape,
    },

    #[error("Unknown block type: {0}")]
    UnknownKind(String),

    #[error("Invalid content for {kind} block: expected {expected}")]
    InvalidContent {
        kind: BlockKind,
        expected: ContentShape,
    },

    #[error("Unsupported operation: {operation} for format {format:?}")]
    UnsupportedFormat { format: TextFormat, operation: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, BlockError>;

/// The two content shapes a block can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentShape {
    /// A single string (text or URL)
    Text,
    /// A `{ text, image }` pair
    Pair,
}

impl std::fmt::Display for ContentShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("string"),
            Self::Pair => f.write_str("{text, image}"),
        }
    }
}

/// Text formats a block sequence can be converted to or from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    Markdown,
    PlainText,
}

impl TextFormat {
    /// File extension for this format
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::PlainText => "txt",
        }
    }

    /// Short display name
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Markdown => "MD",
            Self::PlainText => "TXT",
        }
    }

    pub const ALL: [Self; 2] = [Self::Markdown, Self::PlainText];
}

/// Parser trait: convert text into a block sequence.
///
/// Parsing is total: every input yields a (possibly empty) sequence.
pub trait Parser: Send + Sync {
    /// The format this parser reads
    fn format(&self) -> TextFormat;

    /// Parse a string into blocks with freshly generated ids
    fn parse(&self, input: &str) -> Vec<Block>;
}

/// Renderer trait: convert a block sequence into text.
///
/// Rendering is total and deterministic.
pub trait Renderer: Send + Sync {
    /// The format this renderer produces
    fn format(&self) -> TextFormat;

    /// Render blocks to a string
    fn render(&self, blocks: &[Block]) -> String;
}

/// Extension trait for streaming operations (not dyn-compatible)
pub trait ParserExt: Parser {
    /// Parse from a reader
    fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<Block>> {
        let mut input = String::new();
        let mut reader = reader;
        reader.read_to_string(&mut input)?;
        Ok(self.parse(&input))
    }
}

/// Extension trait for streaming operations (not dyn-compatible)
pub trait RendererExt: Renderer {
    /// Render to a writer
    fn render_writer<W: Write>(&self, blocks: &[Block], writer: &mut W) -> Result<()> {
        let output = self.render(blocks);
        writer.write_all(output.as_bytes())?;
        Ok(())
    }
}

// Blanket implementations
impl<T: Parser> ParserExt for T {}
impl<T: Renderer> RendererExt for T {}

/// Combined parser + renderer for a format
pub trait FormatHandler: Parser + Renderer {}

impl<T: Parser + Renderer> FormatHandler for T {}

/// Registry of format handlers
pub struct FormatRegistry {
    handlers: HashMap<TextFormat, Box<dyn FormatHandler>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the markdown and plain-text handlers
    pub fn with_defaults() -> Self {
        use crate::formats::{MarkdownHandler, PlainTextHandler};

        let mut registry = Self::new();
        registry.register(Box::new(MarkdownHandler::new()));
        registry.register(Box::new(PlainTextHandler::new()));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn FormatHandler>) {
        let format = Parser::format(handler.as_ref());
        self.handlers.insert(format, handler);
    }

    pub fn get(&self, format: TextFormat) -> Option<&dyn FormatHandler> {
        self.handlers.get(&format).map(|h| h.as_ref())
    }

    /// Convert between formats by way of the block sequence
    pub fn convert(&self, input: &str, from: TextFormat, to: TextFormat) -> Result<String> {
        if from == to {
            return Ok(input.to_string());
        }

        let from_handler = self.get(from).ok_or_else(|| BlockError::UnsupportedFormat {
            format: from,
            operation: "parsing".to_string(),
        })?;

        let to_handler = self.get(to).ok_or_else(|| BlockError::UnsupportedFormat {
            format: to,
            operation: "rendering".to_string(),
        })?;

        let blocks = from_handler.parse(input);
        Ok(to_handler.render(&blocks))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
