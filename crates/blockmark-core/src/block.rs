// SPDX-License-Identifier: AGPL-3.0-or-later
//! Block document model shared by the editor and the converters
//!
//! A document is an ordered sequence of [`Block`]s. Each block's content shape
//! is fixed by its type: paired layouts carry a `{ text, image }` pair,
//! everything else carries a single string.

use crate::traits::{BlockError, ContentShape};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_segmentation::UnicodeSegmentation;

/// Opaque block identifier, unique within a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Block type identifier, as used in drafts and the insert menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Paragraph,
    List,
    Quote,
    Code,
    Image,
    Video,
    TextImage,
    ImageText,
}

impl BlockKind {
    /// Wire name of this block type
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Heading1 => "heading1",
            Self::Heading2 => "heading2",
            Self::Heading3 => "heading3",
            Self::Heading4 => "heading4",
            Self::Paragraph => "paragraph",
            Self::List => "list",
            Self::Quote => "quote",
            Self::Code => "code",
            Self::Image => "image",
            Self::Video => "video",
            Self::TextImage => "text-image",
            Self::ImageText => "image-text",
        }
    }

    /// Menu label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Heading1 => "Heading 1",
            Self::Heading2 => "Heading 2",
            Self::Heading3 => "Heading 3",
            Self::Heading4 => "Heading 4",
            Self::Paragraph => "Paragraph",
            Self::List => "List",
            Self::Quote => "Quote",
            Self::Code => "Code",
            Self::Image => "Image",
            Self::Video => "Video",
            Self::TextImage => "Text + Image",
            Self::ImageText => "Image + Text",
        }
    }

    /// Menu group this type is listed under
    pub const fn group(&self) -> BlockGroup {
        match self {
            Self::Heading1 | Self::Heading2 | Self::Heading3 | Self::Heading4 => {
                BlockGroup::Headings
            }
            Self::Paragraph | Self::List | Self::Quote | Self::Code => BlockGroup::Text,
            Self::Image | Self::Video | Self::TextImage | Self::ImageText => BlockGroup::Media,
        }
    }

    /// Whether this type carries `{ text, image }` content
    pub const fn is_paired(&self) -> bool {
        matches!(self, Self::TextImage | Self::ImageText)
    }

    pub const fn shape(&self) -> ContentShape {
        if self.is_paired() {
            ContentShape::Pair
        } else {
            ContentShape::Text
        }
    }

    /// All types in menu order
    pub const ALL: [Self; 12] = [
        Self::Heading1,
        Self::Heading2,
        Self::Heading3,
        Self::Heading4,
        Self::Paragraph,
        Self::List,
        Self::Quote,
        Self::Code,
        Self::Image,
        Self::Video,
        Self::TextImage,
        Self::ImageText,
    ];
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BlockError::UnknownKind(s.to_string()))
    }
}

/// Insert-menu grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockGroup {
    Headings,
    Text,
    Media,
}

impl BlockGroup {
    /// Block types in this group, in menu order
    pub fn kinds(&self) -> impl Iterator<Item = BlockKind> + '_ {
        BlockKind::ALL.into_iter().filter(move |k| k.group() == *self)
    }

    pub const ALL: [Self; 3] = [Self::Headings, Self::Text, Self::Media];
}

/// Heading depth supported by the block model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    pub const fn level(&self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
            Self::H4 => 4,
        }
    }

    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            4 => Some(Self::H4),
            _ => None,
        }
    }

    pub const fn kind(&self) -> BlockKind {
        match self {
            Self::H1 => BlockKind::Heading1,
            Self::H2 => BlockKind::Heading2,
            Self::H3 => BlockKind::Heading3,
            Self::H4 => BlockKind::Heading4,
        }
    }
}

/// Composite content of the paired text/image layouts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairContent {
    pub text: String,
    pub image: String,
}

impl PairContent {
    pub fn new(text: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: image.into(),
        }
    }

    /// Overwrite only the fields present in `patch`
    pub fn merge(&mut self, patch: PairPatch) {
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
    }
}

/// Partial update for [`PairContent`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl PairPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn image(image: impl Into<String>) -> Self {
        Self {
            text: None,
            image: Some(image.into()),
        }
    }
}

/// Typed content of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockBody {
    Heading { level: HeadingLevel, text: String },
    Paragraph(String),
    /// Newline-separated items, one per rendered bullet
    List(String),
    Quote(String),
    Code(String),
    Image { url: String },
    Video { url: String },
    TextImage(PairContent),
    ImageText(PairContent),
    /// Block of a type this version does not know, kept verbatim
    Raw { kind: String, content: String },
}

impl BlockBody {
    /// Type-appropriate empty content
    pub fn empty(kind: BlockKind) -> Self {
        Self::with_text(kind, String::new())
    }

    /// Content for `kind` built from a single string.
    ///
    /// Paired kinds put the string in `text` and leave `image` empty.
    pub fn with_text(kind: BlockKind, text: String) -> Self {
        match kind {
            BlockKind::Heading1 => Self::Heading {
                level: HeadingLevel::H1,
                text,
            },
            BlockKind::Heading2 => Self::Heading {
                level: HeadingLevel::H2,
                text,
            },
            BlockKind::Heading3 => Self::Heading {
                level: HeadingLevel::H3,
                text,
            },
            BlockKind::Heading4 => Self::Heading {
                level: HeadingLevel::H4,
                text,
            },
            BlockKind::Paragraph => Self::Paragraph(text),
            BlockKind::List => Self::List(text),
            BlockKind::Quote => Self::Quote(text),
            BlockKind::Code => Self::Code(text),
            BlockKind::Image => Self::Image { url: text },
            BlockKind::Video => Self::Video { url: text },
            BlockKind::TextImage => Self::TextImage(PairContent::new(text, "")),
            BlockKind::ImageText => Self::ImageText(PairContent::new(text, "")),
        }
    }

    /// Known block type, `None` for [`BlockBody::Raw`]
    pub fn kind(&self) -> Option<BlockKind> {
        match self {
            Self::Heading { level, .. } => Some(level.kind()),
            Self::Paragraph(_) => Some(BlockKind::Paragraph),
            Self::List(_) => Some(BlockKind::List),
            Self::Quote(_) => Some(BlockKind::Quote),
            Self::Code(_) => Some(BlockKind::Code),
            Self::Image { .. } => Some(BlockKind::Image),
            Self::Video { .. } => Some(BlockKind::Video),
            Self::TextImage(_) => Some(BlockKind::TextImage),
            Self::ImageText(_) => Some(BlockKind::ImageText),
            Self::Raw { .. } => None,
        }
    }

    /// Wire name of the block type, including unknown ones
    pub fn type_name(&self) -> &str {
        match self {
            Self::Raw { kind, .. } => kind.as_str(),
            other => other.kind().map_or("", |k| k.as_str()),
        }
    }

    /// String content, `None` for paired layouts
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Heading { text, .. } => Some(text),
            Self::Paragraph(text) | Self::List(text) | Self::Quote(text) | Self::Code(text) => {
                Some(text)
            }
            Self::Image { url } | Self::Video { url } => Some(url),
            Self::Raw { content, .. } => Some(content),
            Self::TextImage(_) | Self::ImageText(_) => None,
        }
    }

    pub(crate) fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::Heading { text, .. } => Some(text),
            Self::Paragraph(text) | Self::List(text) | Self::Quote(text) | Self::Code(text) => {
                Some(text)
            }
            Self::Image { url } | Self::Video { url } => Some(url),
            Self::Raw { content, .. } => Some(content),
            Self::TextImage(_) | Self::ImageText(_) => None,
        }
    }

    /// Paired content, `None` for string-shaped blocks
    pub fn pair(&self) -> Option<&PairContent> {
        match self {
            Self::TextImage(pair) | Self::ImageText(pair) => Some(pair),
            _ => None,
        }
    }

    pub(crate) fn pair_mut(&mut self) -> Option<&mut PairContent> {
        match self {
            Self::TextImage(pair) | Self::ImageText(pair) => Some(pair),
            _ => None,
        }
    }

    /// Human-readable prose carried by the block (no URLs, no code)
    fn prose(&self) -> &str {
        match self {
            Self::Heading { text, .. } => text.as_str(),
            Self::Paragraph(text) | Self::List(text) | Self::Quote(text) => text.as_str(),
            Self::TextImage(pair) | Self::ImageText(pair) => pair.text.as_str(),
            Self::Raw { content, .. } => content.as_str(),
            Self::Code(_) | Self::Image { .. } | Self::Video { .. } => "",
        }
    }
}

/// One discrete content unit of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BlockRecord", into = "BlockRecord")]
pub struct Block {
    pub id: BlockId,
    pub body: BlockBody,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, body: BlockBody) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    pub fn kind(&self) -> Option<BlockKind> {
        self.body.kind()
    }

    /// Count words in this block's prose
    pub fn word_count(&self) -> usize {
        match &self.body {
            BlockBody::Code(code) => code.split_whitespace().count(),
            body => body.prose().unicode_words().count(),
        }
    }

    /// Count characters in this block's prose
    pub fn char_count(&self) -> usize {
        match &self.body {
            BlockBody::Code(code) => code.chars().count(),
            body => body.prose().chars().count(),
        }
    }
}

/// Wire shape of a block: `{ "id", "type", "content" }`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlockRecord {
    id: BlockId,
    #[serde(rename = "type")]
    kind: String,
    content: ContentRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentRecord {
    Text(String),
    Pair(PairContent),
}

impl TryFrom<BlockRecord> for Block {
    type Error = BlockError;

    fn try_from(record: BlockRecord) -> Result<Self, Self::Error> {
        let body = match (record.kind.parse::<BlockKind>(), record.content) {
            (Ok(BlockKind::TextImage), ContentRecord::Pair(pair)) => BlockBody::TextImage(pair),
            (Ok(BlockKind::ImageText), ContentRecord::Pair(pair)) => BlockBody::ImageText(pair),
            (Ok(kind), ContentRecord::Text(text)) if !kind.is_paired() => {
                BlockBody::with_text(kind, text)
            }
            (Ok(kind), _) => {
                return Err(BlockError::InvalidContent {
                    kind,
                    expected: kind.shape(),
                })
            }
            (Err(_), ContentRecord::Text(content)) => BlockBody::Raw {
                kind: record.kind,
                content,
            },
            // Unknown types are only kept when they carry plain text
            (Err(err), ContentRecord::Pair(_)) => return Err(err),
        };

        Ok(Self {
            id: record.id,
            body,
        })
    }
}

impl From<Block> for BlockRecord {
    fn from(block: Block) -> Self {
        let kind = block.body.type_name().to_string();
        let content = match block.body {
            BlockBody::TextImage(pair) | BlockBody::ImageText(pair) => ContentRecord::Pair(pair),
            BlockBody::Heading { text, .. }
            | BlockBody::Paragraph(text)
            | BlockBody::List(text)
            | BlockBody::Quote(text)
            | BlockBody::Code(text)
            | BlockBody::Image { url: text }
            | BlockBody::Video { url: text }
            | BlockBody::Raw { content: text, .. } => ContentRecord::Text(text),
        };

        Self {
            id: block.id,
            kind,
            content,
        }
    }
}
