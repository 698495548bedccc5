//! Codec errors

use thiserror::Error;

/// Why a page could not be imported. Raised before anything is staged,
/// except for [`ImportError::Core`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("page is {0} bytes, expected 65536")]
    BadSize(usize),

    #[error("bad magic number {0:#06x}")]
    BadMagic(u16),

    #[error("offset table for {count} pagelets does not fit in the page")]
    TableOverrun { count: u32 },

    #[error("pagelet {index} starts at {start}, inside the header (first free byte is {min})")]
    PageletOutOfBounds { index: usize, start: u32, min: u32 },

    #[error("pagelet {index} ends at {end}, past the end of the page")]
    PageletTooLong { index: usize, end: u32 },

    #[error("pagelet {index} ends at {end} before it starts at {start}")]
    NegativePageletSize { index: usize, start: u32, end: u32 },

    #[error("unexpected end of page at byte {0}")]
    Truncated(usize),

    #[error(transparent)]
    Core(#[from] arbor_core::Error),
}

/// Why a page could not be exported
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("page {0} is not live")]
    AssetGone(String),

    #[error("pagelet {index} ({path}) does not resolve")]
    UnresolvedPagelet { index: usize, path: String },

    #[error("pagelet {index} ({path}) has an incompatible type")]
    IncompatiblePagelet { index: usize, path: String },

    #[error("page content is {0} bytes, over the 65536 byte page size")]
    Oversize(usize),
}
