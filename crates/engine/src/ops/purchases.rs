use std::collections::BTreeSet;

use chrono::NaiveDate;
use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryFilter, QueryResult, Statement, TransactionTrait, Value,
    prelude::*,
};

use crate::{
    Amount, EngineError, NewPurchase, Product, Purchase, PurchaseUpdate, QueryBuilder,
    ResultEngine, Tag, products, purchases::PurchaseRelatedIds, tags,
};

use super::{Engine, tags::tags_by_purchase, with_tx};

impl Engine {
    /// Record a purchase with its tags and return the new purchase id.
    ///
    /// The product and every tag must be visible and owned by the account.
    /// Non-positive quantity or price is a
    /// [`EngineError::ConstraintViolation`].
    pub async fn insert_purchase(
        &self,
        account_id: i64,
        purchase: &NewPurchase,
    ) -> ResultEngine<i64> {
        require_positive("quantity", &purchase.quantity)?;
        require_positive("price", &purchase.price)?;
        let backend = self.database.get_database_backend();
        with_tx!(self, |db_tx| {
            require_product(&db_tx, account_id, purchase.product_id).await?;
            require_tags(&db_tx, account_id, &purchase.tag_ids).await?;

            let mut builder = QueryBuilder::insert(
                backend,
                "purchases",
                &["product_id", "date", "quantity", "price", "account_id"],
            );
            builder
                .add_row([
                    Value::from(purchase.product_id),
                    Value::from(purchase.date),
                    Value::from(&purchase.quantity),
                    Value::from(&purchase.price),
                    Value::from(account_id),
                ])
                .returning(&["id"]);
            let row = db_tx
                .query_one(builder.into_statement())
                .await
                .map_err(EngineError::from_statement)?
                .ok_or(DbErr::RecordNotInserted)?;
            let purchase_id: i64 = row.try_get("", "id")?;

            insert_purchase_tags(&db_tx, purchase_id, &purchase.tag_ids).await?;
            tracing::debug!(purchase_id, account_id, "purchase inserted");
            Ok(purchase_id)
        })
    }

    /// Apply a partial update to a visible purchase of the account.
    ///
    /// Only the supplied scalar fields are written. A non-empty `tag_ids`
    /// replaces the purchase's tag set. An update carrying nothing is a no-op.
    pub async fn update_purchase_by_id(
        &self,
        purchase_id: i64,
        account_id: i64,
        update: &PurchaseUpdate,
    ) -> ResultEngine<()> {
        let backend = self.database.get_database_backend();
        let mut builder = QueryBuilder::update(backend, "purchases");
        if let Some(product_id) = update.product_id {
            builder.set("product_id", product_id);
        }
        if let Some(date) = update.date {
            builder.set("date", date);
        }
        if let Some(quantity) = &update.quantity {
            require_positive("quantity", quantity)?;
            builder.set("quantity", quantity);
        }
        if let Some(price) = &update.price {
            require_positive("price", price)?;
            builder.set("price", price);
        }
        let has_assignments = builder.has_assignments();
        let replacement_tags = update.replacement_tags();

        if !has_assignments && replacement_tags.is_none() {
            tracing::debug!(purchase_id, "empty purchase update skipped");
            return Ok(());
        }

        with_tx!(self, |db_tx| {
            if has_assignments {
                if let Some(product_id) = update.product_id {
                    require_product(&db_tx, account_id, product_id).await?;
                }
                builder
                    .where_clause()
                    .column("id", purchase_id)
                    .and()
                    .column("account_id", account_id)
                    .and()
                    .column("deleted", false);
                let result = db_tx
                    .execute(builder.into_statement())
                    .await
                    .map_err(EngineError::from_statement)?;
                if result.rows_affected() == 0 {
                    return Err(EngineError::NotFound(format!("purchase {purchase_id}")));
                }
            } else {
                require_purchase(&db_tx, purchase_id, account_id).await?;
            }

            if let Some(tag_ids) = replacement_tags {
                require_tags(&db_tx, account_id, tag_ids).await?;
                db_tx
                    .execute(Statement::from_sql_and_values(
                        backend,
                        "DELETE FROM purchase_tag WHERE purchase_id = ?;",
                        vec![purchase_id.into()],
                    ))
                    .await?;
                insert_purchase_tags(&db_tx, purchase_id, tag_ids).await?;
            }
            Ok(())
        })
    }

    /// Soft-delete a purchase of the account.
    ///
    /// Its product and tags are hidden too when this purchase was their last
    /// visible reference.
    pub async fn delete_purchase_by_id(&self, purchase_id: i64, account_id: i64) -> ResultEngine<()> {
        let backend = self.database.get_database_backend();
        with_tx!(self, |db_tx| {
            let related = related_ids(&db_tx, purchase_id, account_id).await?;

            let result = db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "UPDATE purchases SET deleted = TRUE WHERE id = ? AND account_id = ?;",
                    vec![purchase_id.into(), account_id.into()],
                ))
                .await?;
            if result.rows_affected() == 0 {
                return Err(EngineError::NotFound(format!("purchase {purchase_id}")));
            }

            // The purchase is already hidden, so any remaining visible purchase
            // is another reference.
            if let Some(product_id) = related.product_id {
                db_tx
                    .execute(Statement::from_sql_and_values(
                        backend,
                        "UPDATE products SET deleted = TRUE \
                         WHERE id = ? AND account_id = ? \
                         AND NOT EXISTS ( \
                             SELECT 1 FROM purchases \
                             WHERE purchases.product_id = products.id \
                             AND NOT purchases.deleted \
                         );",
                        vec![product_id.into(), account_id.into()],
                    ))
                    .await?;
            }

            // The junction rows are still visible here, so this purchase's own
            // row counts as one reference.
            for tag_id in &related.tag_ids {
                db_tx
                    .execute(Statement::from_sql_and_values(
                        backend,
                        "UPDATE tags SET deleted = TRUE \
                         WHERE id = ? AND account_id = ? \
                         AND ( \
                             SELECT COUNT(*) FROM purchase_tag \
                             WHERE purchase_tag.tag_id = tags.id \
                             AND NOT purchase_tag.deleted \
                         ) <= 1;",
                        vec![(*tag_id).into(), account_id.into()],
                    ))
                    .await?;
            }

            db_tx
                .execute(Statement::from_sql_and_values(
                    backend,
                    "UPDATE purchase_tag SET deleted = TRUE WHERE purchase_id = ?;",
                    vec![purchase_id.into()],
                ))
                .await?;

            tracing::debug!(purchase_id, account_id, "purchase deleted");
            Ok(())
        })
    }

    /// Undo [`Engine::delete_purchase_by_id`] and return the restored purchase.
    pub async fn restore_purchase_by_id(
        &self,
        purchase_id: i64,
        account_id: i64,
    ) -> ResultEngine<Purchase> {
        let backend = self.database.get_database_backend();
        with_tx!(self, |db_tx| {
            let Some(row) = db_tx
                .query_one(Statement::from_sql_and_values(
                    backend,
                    "UPDATE purchases SET deleted = FALSE \
                     WHERE id = ? AND account_id = ? \
                     RETURNING date, product_id, quantity, price;",
                    vec![purchase_id.into(), account_id.into()],
                ))
                .await?
            else {
                return Err(EngineError::NotFound(format!("purchase {purchase_id}")));
            };
            let date: NaiveDate = row.try_get("", "date")?;
            let product_id: i64 = row.try_get("", "product_id")?;
            let quantity = amount_column(&row, "quantity")?;
            let price = amount_column(&row, "price")?;

            let Some(row) = db_tx
                .query_one(Statement::from_sql_and_values(
                    backend,
                    "UPDATE products SET deleted = FALSE \
                     WHERE id = ? AND account_id = ? RETURNING name;",
                    vec![product_id.into(), account_id.into()],
                ))
                .await?
            else {
                return Err(EngineError::NotFound(format!("product {product_id}")));
            };
            let product = Product {
                id: product_id,
                name: row.try_get("", "name")?,
            };

            let rows = db_tx
                .query_all(Statement::from_sql_and_values(
                    backend,
                    "UPDATE purchase_tag SET deleted = FALSE \
                     WHERE purchase_id = ? RETURNING tag_id;",
                    vec![purchase_id.into()],
                ))
                .await?;
            let tag_ids = rows
                .iter()
                .map(|row| row.try_get::<i64>("", "tag_id"))
                .collect::<Result<Vec<_>, _>>()?;
            let tags = restore_tags(&db_tx, account_id, &tag_ids).await?;

            tracing::debug!(purchase_id, account_id, "purchase restored");
            Ok(Purchase {
                id: purchase_id,
                product,
                date,
                quantity,
                price,
                tags,
            })
        })
    }

    /// Visible purchases of the account with their visible tags, newest first,
    /// then by product name.
    pub async fn get_purchases_by_account(&self, account_id: i64) -> ResultEngine<Vec<Purchase>> {
        let backend = self.database.get_database_backend();
        with_tx!(self, |db_tx| {
            let rows = db_tx
                .query_all(Statement::from_sql_and_values(
                    backend,
                    "SELECT purchases.id AS id, purchases.date AS date, \
                     purchases.quantity AS quantity, purchases.price AS price, \
                     products.id AS product_id, products.name AS product_name \
                     FROM purchases \
                     JOIN products ON products.id = purchases.product_id \
                     WHERE purchases.account_id = ? AND products.account_id = ? \
                     AND NOT purchases.deleted AND NOT products.deleted \
                     ORDER BY purchases.date DESC, products.name ASC, purchases.id ASC;",
                    vec![account_id.into(), account_id.into()],
                ))
                .await?;
            let mut tags = tags_by_purchase(&db_tx, account_id).await?;

            rows.iter()
                .map(|row| -> ResultEngine<Purchase> {
                    let id: i64 = row.try_get("", "id")?;
                    Ok(Purchase {
                        id,
                        product: Product {
                            id: row.try_get("", "product_id")?,
                            name: row.try_get("", "product_name")?,
                        },
                        date: row.try_get("", "date")?,
                        quantity: amount_column(row, "quantity")?,
                        price: amount_column(row, "price")?,
                        tags: tags.remove(&id).unwrap_or_default(),
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}

// Same outcome as the storage CHECK, raised before anything is written.
fn require_positive(column: &str, amount: &Amount) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::ConstraintViolation(format!(
            "{column} must be positive, got {amount}"
        )));
    }
    Ok(())
}

fn amount_column(row: &QueryResult, column: &str) -> ResultEngine<Amount> {
    let raw: String = row.try_get("", column)?;
    raw.parse()
}

async fn require_product<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
    product_id: i64,
) -> ResultEngine<()> {
    let found = products::Entity::find_by_id(product_id)
        .filter(products::Column::AccountId.eq(account_id))
        .filter(products::Column::Deleted.eq(false))
        .count(db)
        .await?;
    if found == 0 {
        return Err(EngineError::NotFound(format!("product {product_id}")));
    }
    Ok(())
}

async fn require_tags<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
    tag_ids: &[i64],
) -> ResultEngine<()> {
    let wanted: BTreeSet<i64> = tag_ids.iter().copied().collect();
    if wanted.is_empty() {
        return Ok(());
    }
    let found = tags::Entity::find()
        .filter(tags::Column::Id.is_in(wanted.iter().copied()))
        .filter(tags::Column::AccountId.eq(account_id))
        .filter(tags::Column::Deleted.eq(false))
        .count(db)
        .await?;
    if found != wanted.len() as u64 {
        return Err(EngineError::NotFound(format!("tags {tag_ids:?}")));
    }
    Ok(())
}

async fn require_purchase<C: ConnectionTrait>(
    db: &C,
    purchase_id: i64,
    account_id: i64,
) -> ResultEngine<()> {
    let found = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT id FROM purchases WHERE id = ? AND account_id = ? AND NOT deleted;",
            vec![purchase_id.into(), account_id.into()],
        ))
        .await?;
    if found.is_none() {
        return Err(EngineError::NotFound(format!("purchase {purchase_id}")));
    }
    Ok(())
}

async fn insert_purchase_tags<C: ConnectionTrait>(
    db: &C,
    purchase_id: i64,
    tag_ids: &[i64],
) -> ResultEngine<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::insert(
        db.get_database_backend(),
        "purchase_tag",
        &["purchase_id", "tag_id"],
    );
    for tag_id in tag_ids {
        builder.add_row([purchase_id, *tag_id]);
    }
    db.execute(builder.into_statement())
        .await
        .map_err(EngineError::from_statement)?;
    Ok(())
}

/// Product and tags a visible purchase points at. A hidden purchase, or one
/// whose product is hidden, has none.
async fn related_ids<C: ConnectionTrait>(
    db: &C,
    purchase_id: i64,
    account_id: i64,
) -> ResultEngine<PurchaseRelatedIds> {
    let backend = db.get_database_backend();
    let Some(row) = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT purchases.product_id AS product_id \
             FROM purchases \
             JOIN products ON products.id = purchases.product_id \
             WHERE purchases.id = ? AND purchases.account_id = ? \
             AND NOT purchases.deleted AND NOT products.deleted;",
            vec![purchase_id.into(), account_id.into()],
        ))
        .await?
    else {
        return Ok(PurchaseRelatedIds::default());
    };
    let product_id: i64 = row.try_get("", "product_id")?;

    let rows = db
        .query_all(Statement::from_sql_and_values(
            backend,
            "SELECT tag_id FROM purchase_tag WHERE purchase_id = ? AND NOT deleted;",
            vec![purchase_id.into()],
        ))
        .await?;
    let tag_ids = rows
        .iter()
        .map(|row| row.try_get::<i64>("", "tag_id"))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PurchaseRelatedIds {
        product_id: Some(product_id),
        tag_ids,
    })
}

async fn restore_tags<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
    tag_ids: &[i64],
) -> ResultEngine<Vec<Tag>> {
    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::update(db.get_database_backend(), "tags");
    builder.set("deleted", false);
    builder
        .where_clause()
        .column("account_id", account_id)
        .and()
        .column_in("id", tag_ids.iter().copied())
        .returning(&["id", "name"]);

    let rows = db.query_all(builder.into_statement()).await?;
    let mut tags = rows
        .iter()
        .map(|row| -> ResultEngine<Tag> {
            Ok(Tag {
                id: row.try_get("", "id")?,
                name: row.try_get("", "name")?,
            })
        })
        .collect::<ResultEngine<Vec<_>>>()?;
    tags.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(tags)
}
