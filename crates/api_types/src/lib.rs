use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    /// The token goes back in `Authorization: Basic base64(token)`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub token: String,
        pub expiry_time: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordChange {
        pub old_password: String,
        pub new_password: String,
    }
}

pub mod product {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductNew {
        pub name: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProductView {
        pub id: i64,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductList {
        pub products: Vec<ProductView>,
    }
}

pub mod tag {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagsNew {
        pub names: Vec<String>,
    }

    /// Ids in the same order as the requested names.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagsCreated {
        pub ids: Vec<i64>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TagView {
        pub id: i64,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagList {
        pub tags: Vec<TagView>,
    }
}

pub mod purchase {
    use super::*;
    use crate::{product::ProductView, tag::TagView};

    /// Decimal values (`quantity`, `price`, `total_price`) are strings, e.g. `"2.53"`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseNew {
        pub product_id: i64,
        pub date: NaiveDate,
        pub quantity: String,
        pub price: String,
        #[serde(default)]
        pub tag_ids: Vec<i64>,
    }

    /// Missing fields are left untouched. A non-empty `tag_ids` replaces the
    /// tag set.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PurchaseUpdate {
        pub product_id: Option<i64>,
        pub date: Option<NaiveDate>,
        pub quantity: Option<String>,
        pub price: Option<String>,
        pub tag_ids: Option<Vec<i64>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseCreated {
        pub id: i64,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PurchaseView {
        pub id: i64,
        pub product: ProductView,
        pub date: NaiveDate,
        pub quantity: String,
        pub price: String,
        pub total_price: String,
        pub tags: Vec<TagView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseList {
        pub purchases: Vec<PurchaseView>,
    }
}
