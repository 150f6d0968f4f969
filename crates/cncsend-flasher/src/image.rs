//! Firmware image interface
//!
//! The Intel-HEX text parser lives outside this crate; it hands the
//! engine an ordered, address-ascending map of data blocks. The engine
//! trusts that ordering and does not re-validate it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed firmware input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Record checksum did not match
    #[error("invalid checksum in record at line {line}")]
    Checksum {
        /// 1-based line number of the bad record
        line: usize,
    },
    /// Record structure was not valid Intel HEX
    #[error("malformed record at line {line}: {reason}")]
    Malformed {
        /// 1-based line number of the bad record
        line: usize,
        /// What was wrong with the record
        reason: String,
    },
}

/// Ordered firmware data blocks keyed by start address
///
/// Immutable once loaded; blocks are address-ascending and their address
/// ranges do not overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareImage {
    blocks: Vec<(u32, Vec<u8>)>,
}

impl FirmwareImage {
    /// Build an image from address-ascending, non-overlapping blocks
    pub fn from_blocks(blocks: Vec<(u32, Vec<u8>)>) -> Self {
        debug_assert!(
            blocks.windows(2).all(|pair| {
                let (addr, data) = (&pair[0].0, &pair[0].1);
                addr + data.len() as u32 <= pair[1].0
            }),
            "firmware image blocks must be address-ascending and disjoint"
        );
        Self { blocks }
    }

    /// Iterate blocks in address order
    pub fn blocks(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.blocks.iter().map(|(addr, data)| (*addr, data.as_slice()))
    }

    /// Address of the first block (the image entry point)
    pub fn first_address(&self) -> Option<u32> {
        self.blocks.first().map(|(addr, _)| *addr)
    }

    /// Total data length across all blocks
    pub fn total_len(&self) -> usize {
        self.blocks.iter().map(|(_, data)| data.len()).sum()
    }

    /// Whether the image carries no data
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|(_, data)| data.is_empty())
    }
}

/// Contract of the external Intel-HEX loader
///
/// Fails with a [`FormatError`] when a record's checksum is invalid or
/// its structure is malformed; a successful load yields address-ascending
/// non-overlapping blocks.
pub trait ImageLoader {
    /// Parse Intel-HEX text into a firmware image
    fn load(&self, hex_text: &str) -> Result<FirmwareImage, FormatError>;
}
