// SPDX-License-Identifier: AGPL-3.0-or-later
//! Editor configuration: placeholder text per block type

use crate::block::{BlockBody, BlockKind};
use crate::traits::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level editor configuration, usually read from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub placeholders: BlockDefaults,
}

impl EditorConfig {
    /// Parse configuration from TOML; missing keys keep their defaults
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Read configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&input)?;
        tracing::debug!(path = %path.display(), "loaded editor config");
        Ok(config)
    }
}

/// Placeholder text shown for an empty block of each type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BlockDefaults {
    pub heading1: String,
    pub heading2: String,
    pub heading3: String,
    pub heading4: String,
    pub paragraph: String,
    pub list: String,
    pub quote: String,
    pub code: String,
    pub image: String,
    pub video: String,
    pub text_image: String,
    pub image_text: String,
}

impl Default for BlockDefaults {
    fn default() -> Self {
        Self {
            heading1: "New Heading 1".to_string(),
            heading2: "New Heading 2".to_string(),
            heading3: "New Heading 3".to_string(),
            heading4: "New Heading 4".to_string(),
            paragraph: "Start typing...".to_string(),
            list: "List item 1\nList item 2".to_string(),
            quote: "Enter your quote here".to_string(),
            code: "const example = \"code\";".to_string(),
            image: String::new(),
            video: String::new(),
            text_image: String::new(),
            image_text: String::new(),
        }
    }
}

impl BlockDefaults {
    pub fn placeholder(&self, kind: BlockKind) -> &str {
        match kind {
            BlockKind::Heading1 => &self.heading1,
            BlockKind::Heading2 => &self.heading2,
            BlockKind::Heading3 => &self.heading3,
            BlockKind::Heading4 => &self.heading4,
            BlockKind::Paragraph => &self.paragraph,
            BlockKind::List => &self.list,
            BlockKind::Quote => &self.quote,
            BlockKind::Code => &self.code,
            BlockKind::Image => &self.image,
            BlockKind::Video => &self.video,
            BlockKind::TextImage => &self.text_image,
            BlockKind::ImageText => &self.image_text,
        }
    }

    /// Block content pre-filled with the placeholder
    pub fn body(&self, kind: BlockKind) -> BlockBody {
        BlockBody::with_text(kind, self.placeholder(kind).to_string())
    }
}
