//! Review items shown to the device owner.
//!
//! A display driver asks a [`ReviewSource`] for its item count, then for
//! one item and one page at a time. Items are formatted on request, so only
//! the item on screen is ever held in memory.
//!
//! # Security
//!
//! What is signed is exactly what was shown: the transaction review reads
//! the same validated model the signer is handed.

pub mod address;
pub mod format;
pub mod paging;
pub mod transaction;

pub use address::AddressReview;
pub use transaction::TransactionReview;

use icp_common::ParserError;

use crate::config::Mode;

/// One page of one review item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub key: String,
    pub value: String,
    pub page_index: u8,
    pub page_count: u8,
}

impl ReviewItem {
    /// Cuts page `page` out of a formatted value.
    pub fn paged(key: &str, value: &str, width: usize, page: u8) -> Result<Self, ParserError> {
        let (value, page_count) = paging::page_string(value, width, page)?;
        Ok(Self {
            key: key.to_string(),
            value,
            page_index: page,
            page_count,
        })
    }
}

/// Index-addressed, paged list of review items.
pub trait ReviewSource {
    /// Number of items in `mode`.
    fn num_items(&self, mode: Mode) -> Result<u8, ParserError>;

    /// Page `page` of item `index`; [`ParserError::NoData`] past the last item.
    fn get_item(&self, mode: Mode, index: u8, page: u8) -> Result<ReviewItem, ParserError>;
}

/// Pulls every page of every item, joining pages back into full values.
///
/// This is what a display driver does while the owner scrolls through the
/// review.
pub fn collect_items(
    source: &dyn ReviewSource,
    mode: Mode,
) -> Result<Vec<(String, String)>, ParserError> {
    let count = source.num_items(mode)?;
    let mut items = Vec::with_capacity(count as usize);
    for index in 0..count {
        let first = source.get_item(mode, index, 0)?;
        let mut value = first.value;
        for page in 1..first.page_count {
            value.push_str(&source.get_item(mode, index, page)?.value);
        }
        items.push((first.key, value));
    }
    Ok(items)
}
