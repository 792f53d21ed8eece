// SPDX-License-Identifier: AGPL-3.0-or-later
//! Structural editing of a block document
//!
//! Operations are copy-on-write: each one borrows the current [`Document`]
//! and returns the next one, leaving the receiver untouched. An operation
//! naming an id that is not in the document fails with
//! [`BlockError::BlockNotFound`] and produces nothing.

use crate::block::{Block, BlockBody, BlockId, BlockKind, PairPatch};
use crate::formats::markdown::{parse_markdown, render_markdown};
use crate::id::IdGenerator;
use crate::traits::{BlockError, ContentShape, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// New content for a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentUpdate {
    /// Replaces the string content of a text-shaped block
    Text(String),
    /// Merged into the content of a paired layout block
    Pair(PairPatch),
}

/// An ordered sequence of blocks with unique ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Block>", into = "Vec<Block>")]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing blocks; ids must be unique
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self> {
        if let Some(id) = first_duplicate(&blocks) {
            return Err(BlockError::DuplicateId { id });
        }
        Ok(Self { blocks })
    }

    /// The editor's starting state: an empty heading and an empty paragraph
    pub fn seeded(ids: &dyn IdGenerator) -> Self {
        Self {
            blocks: vec![
                Block::new(ids.generate(), BlockBody::empty(BlockKind::Heading1)),
                Block::new(ids.generate(), BlockBody::empty(BlockKind::Paragraph)),
            ],
        }
    }

    /// Rebuild a document from stored markdown; all ids are fresh
    pub fn from_markdown(markdown: &str, ids: &dyn IdGenerator) -> Self {
        Self {
            blocks: parse_markdown(markdown, ids),
        }
    }

    pub fn to_markdown(&self) -> String {
        render_markdown(&self.blocks)
    }

    /// Load a JSON draft (an array of `{ id, type, content }` blocks)
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// Index of the block with `id`
    pub fn position(&self, id: &BlockId) -> Result<usize> {
        self.blocks
            .iter()
            .position(|b| &b.id == id)
            .ok_or_else(|| BlockError::BlockNotFound { id: id.clone() })
    }

    /// Count words in the document
    pub fn word_count(&self) -> usize {
        self.blocks.iter().map(Block::word_count).sum()
    }

    /// Count characters in the document
    pub fn char_count(&self) -> usize {
        self.blocks.iter().map(Block::char_count).sum()
    }

    /// Insert an empty block of `kind` right after `after`.
    ///
    /// Returns the new document and the id of the inserted block. Fails with
    /// [`BlockError::DuplicateId`] if `ids` hands out an id already in use.
    pub fn insert_after(
        &self,
        kind: BlockKind,
        after: &BlockId,
        ids: &dyn IdGenerator,
    ) -> Result<(Self, BlockId)> {
        let index = self.position(after)?;
        let block = Block::new(self.fresh_id(ids)?, BlockBody::empty(kind));
        let id = block.id.clone();

        let mut blocks = self.blocks.clone();
        blocks.insert(index + 1, block);
        Ok((Self { blocks }, id))
    }

    /// Remove a block. The last remaining block is never removed.
    pub fn delete(&self, id: &BlockId) -> Result<Self> {
        let index = self.position(id)?;
        if self.blocks.len() == 1 {
            tracing::debug!(%id, "refusing to delete the only block");
            return Ok(self.clone());
        }

        let mut blocks = self.blocks.clone();
        blocks.remove(index);
        Ok(Self { blocks })
    }

    /// Copy a block, under a fresh id, directly after the original.
    ///
    /// Returns the new document and the id of the copy.
    pub fn duplicate(&self, id: &BlockId, ids: &dyn IdGenerator) -> Result<(Self, BlockId)> {
        let index = self.position(id)?;
        let copy = Block::new(self.fresh_id(ids)?, self.blocks[index].body.clone());
        let copy_id = copy.id.clone();

        let mut blocks = self.blocks.clone();
        blocks.insert(index + 1, copy);
        Ok((Self { blocks }, copy_id))
    }

    /// Swap a block with its predecessor; no-op for the first block
    pub fn move_up(&self, id: &BlockId) -> Result<Self> {
        let index = self.position(id)?;
        if index == 0 {
            tracing::trace!(%id, "first block cannot move up");
            return Ok(self.clone());
        }

        let mut blocks = self.blocks.clone();
        blocks.swap(index - 1, index);
        Ok(Self { blocks })
    }

    /// Swap a block with its successor; no-op for the last block
    pub fn move_down(&self, id: &BlockId) -> Result<Self> {
        let index = self.position(id)?;
        if index + 1 == self.blocks.len() {
            tracing::trace!(%id, "last block cannot move down");
            return Ok(self.clone());
        }

        let mut blocks = self.blocks.clone();
        blocks.swap(index, index + 1);
        Ok(Self { blocks })
    }

    /// Drag-and-drop: take `dragged` out and reinsert it at the index `target`
    /// occupied before the move.
    pub fn reorder(&self, dragged: &BlockId, target: &BlockId) -> Result<Self> {
        let from = self.position(dragged)?;
        let to = self.position(target)?;
        if from == to {
            return Ok(self.clone());
        }

        let mut blocks = self.blocks.clone();
        let block = blocks.remove(from);
        blocks.insert(to, block);
        Ok(Self { blocks })
    }

    /// Replace text content, or merge into paired content.
    ///
    /// Id and type never change. A text update on a paired block (or a pair
    /// patch on a text block) fails with [`BlockError::ContentShape`].
    pub fn update_content(&self, id: &BlockId, update: ContentUpdate) -> Result<Self> {
        let index = self.position(id)?;
        let mut blocks = self.blocks.clone();
        let block = &mut blocks[index];

        match update {
            ContentUpdate::Text(text) => match block.body.text_mut() {
                Some(slot) => *slot = text,
                None => return Err(shape_mismatch(block, ContentShape::Pair)),
            },
            ContentUpdate::Pair(patch) => match block.body.pair_mut() {
                Some(pair) => pair.merge(patch),
                None => return Err(shape_mismatch(block, ContentShape::Text)),
            },
        }

        Ok(Self { blocks })
    }

    /// Next id from `ids`, rejected if the document already holds it
    fn fresh_id(&self, ids: &dyn IdGenerator) -> Result<BlockId> {
        let id = ids.generate();
        if self.get(&id).is_some() {
            return Err(BlockError::DuplicateId { id });
        }
        Ok(id)
    }
}

fn first_duplicate(blocks: &[Block]) -> Option<BlockId> {
    let mut seen = HashSet::with_capacity(blocks.len());
    blocks
        .iter()
        .find(|b| !seen.insert(&b.id))
        .map(|b| b.id.clone())
}

fn shape_mismatch(block: &Block, expected: ContentShape) -> BlockError {
    BlockError::ContentShape {
        id: block.id.clone(),
        kind: block.body.type_name().to_string(),
        expected,
    }
}

impl TryFrom<Vec<Block>> for Document {
    type Error = BlockError;

    fn try_from(blocks: Vec<Block>) -> Result<Self> {
        Self::from_blocks(blocks)
    }
}

impl From<Document> for Vec<Block> {
    fn from(doc: Document) -> Self {
        doc.blocks
    }
}
