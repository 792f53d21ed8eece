// SPDX-License-Identifier: AGPL-3.0-or-later
//! Format handlers for each supported format

pub mod markdown;
pub mod plaintext;

pub use markdown::MarkdownHandler;
pub use plaintext::PlainTextHandler;
