//! Purchase primitives.
//!
//! A `Purchase` records `quantity` units of a `Product` bought at `price` on a
//! given date. It can carry any number of `Tag`s.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Amount, Product, Tag};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub product: Product,
    pub date: NaiveDate,
    pub quantity: Amount,
    pub price: Amount,
    pub tags: Vec<Tag>,
}

impl Purchase {
    /// `quantity * price`, always derived from the stored values.
    pub fn total_price(&self) -> Amount {
        &self.quantity * &self.price
    }
}

/// Values for a new purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub product_id: i64,
    pub date: NaiveDate,
    pub quantity: Amount,
    pub price: Amount,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

/// Partial update of a purchase. `None` leaves the field untouched.
///
/// A non-empty `tag_ids` replaces the whole tag set; an empty list is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseUpdate {
    pub product_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub quantity: Option<Amount>,
    pub price: Option<Amount>,
    pub tag_ids: Option<Vec<i64>>,
}

impl PurchaseUpdate {
    pub(crate) fn replacement_tags(&self) -> Option<&[i64]> {
        self.tag_ids
            .as_deref()
            .filter(|tag_ids| !tag_ids.is_empty())
    }
}

/// Product and tags a live purchase points at, captured before deleting it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PurchaseRelatedIds {
    /// `None` when the purchase or its product is already deleted.
    pub(crate) product_id: Option<i64>,
    pub(crate) tag_ids: Vec<i64>,
}
