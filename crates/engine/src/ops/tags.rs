use std::collections::HashMap;

use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, Statement, Value, prelude::*};

use crate::{EngineError, QueryBuilder, ResultEngine, Tag, tags};

use super::{Engine, normalize_required_name};

impl Engine {
    /// Add tags for the account in one statement and return their ids, in
    /// input order.
    pub async fn insert_tags<I, S>(&self, account_id: i64, names: I) -> ResultEngine<Vec<i64>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| normalize_required_name(name.as_ref(), "tag"))
            .collect::<ResultEngine<Vec<_>>>()?;
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let backend = self.database.get_database_backend();
        let mut builder = QueryBuilder::insert(backend, "tags", &["name", "account_id"]);
        for name in names {
            builder.add_row([Value::from(name), Value::from(account_id)]);
        }
        builder.returning(&["id"]);

        let rows = self
            .database
            .query_all(builder.into_statement())
            .await
            .map_err(EngineError::from_statement)?;
        // RETURNING order is unspecified, but rows get increasing ids in
        // VALUES order.
        let mut ids = rows
            .iter()
            .map(|row| row.try_get::<i64>("", "id"))
            .collect::<Result<Vec<_>, _>>()?;
        ids.sort_unstable();
        Ok(ids)
    }

    /// Visible tags of the account, by name.
    pub async fn get_tags_by_account(&self, account_id: i64) -> ResultEngine<Vec<Tag>> {
        let models = tags::Entity::find()
            .filter(tags::Column::AccountId.eq(account_id))
            .filter(tags::Column::Deleted.eq(false))
            .order_by_asc(tags::Column::Name)
            .order_by_asc(tags::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Tag::from).collect())
    }

    /// Visible tags of every visible purchase of the account, keyed by purchase id.
    pub async fn get_tags_by_purchase_for_account(
        &self,
        account_id: i64,
    ) -> ResultEngine<HashMap<i64, Vec<Tag>>> {
        tags_by_purchase(&self.database, account_id).await
    }
}

pub(super) async fn tags_by_purchase<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
) -> ResultEngine<HashMap<i64, Vec<Tag>>> {
    let rows = db
        .query_all(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT purchase_tag.purchase_id AS purchase_id, tags.id AS id, tags.name AS name \
             FROM purchase_tag \
             JOIN purchases ON purchases.id = purchase_tag.purchase_id \
             JOIN tags ON tags.id = purchase_tag.tag_id \
             WHERE purchases.account_id = ? AND tags.account_id = ? \
             AND NOT purchases.deleted AND NOT tags.deleted AND NOT purchase_tag.deleted \
             ORDER BY tags.name ASC, tags.id ASC;",
            vec![account_id.into(), account_id.into()],
        ))
        .await?;

    let mut by_purchase: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        let purchase_id: i64 = row.try_get("", "purchase_id")?;
        by_purchase.entry(purchase_id).or_default().push(Tag {
            id: row.try_get("", "id")?,
            name: row.try_get("", "name")?,
        });
    }
    Ok(by_purchase)
}
