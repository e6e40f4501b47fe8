//! Review of the device's own identity.

use icp_common::types::{ACCOUNT_ID_LEN, PRINCIPAL_LEN};
use icp_common::{DerivationPath, ParserError};

use super::{ReviewItem, ReviewSource};
use crate::config::Mode;
use crate::crypto;

/// Principal, account and (expert only) path of one derived key.
pub struct AddressReview {
    principal: [u8; PRINCIPAL_LEN],
    account_id: [u8; ACCOUNT_ID_LEN],
    path: DerivationPath,
    width: usize,
}

impl AddressReview {
    pub fn new(
        principal: [u8; PRINCIPAL_LEN],
        account_id: [u8; ACCOUNT_ID_LEN],
        path: DerivationPath,
        width: usize,
    ) -> Self {
        Self {
            principal,
            account_id,
            path,
            width,
        }
    }
}

impl ReviewSource for AddressReview {
    fn num_items(&self, mode: Mode) -> Result<u8, ParserError> {
        Ok(if mode.is_expert() { 3 } else { 2 })
    }

    fn get_item(&self, mode: Mode, index: u8, page: u8) -> Result<ReviewItem, ParserError> {
        match index {
            0 => ReviewItem::paged(
                "Principal",
                &crypto::principal_to_text(&self.principal),
                self.width,
                page,
            ),
            1 => ReviewItem::paged("Address", &hex::encode(self.account_id), self.width, page),
            2 if mode.is_expert() => {
                ReviewItem::paged("Path", &self.path.to_path_string(), self.width, page)
            }
            _ => Err(ParserError::NoData),
        }
    }
}
