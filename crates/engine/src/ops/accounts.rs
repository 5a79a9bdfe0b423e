use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use subtle::Choice;

use crate::{AccountRole, EngineError, ResultEngine, accounts};

use super::{Engine, with_tx};

/// Hash `password` with bcrypt on the blocking pool.
pub(crate) async fn hash_password(password: &str, cost: u32) -> ResultEngine<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| EngineError::PasswordHash(err.to_string()))?
        .map_err(EngineError::from)
}

/// Check `password` against a stored bcrypt hash on the blocking pool.
pub(crate) async fn verify_password(password: &str, hash: &str) -> ResultEngine<Choice> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| EngineError::PasswordHash(err.to_string()))??;
    Ok(Choice::from(u8::from(verified)))
}

impl Engine {
    /// Create an account and return its id. The email must be unused.
    pub async fn insert_account(
        &self,
        email: &str,
        password: &str,
        role: AccountRole,
    ) -> ResultEngine<i64> {
        let email = email.trim();
        if email.is_empty() {
            return Err(EngineError::InvalidName("email must not be empty".to_string()));
        }
        let password_hash = hash_password(password, self.config.bcrypt_cost).await?;

        let account = accounts::ActiveModel {
            email: ActiveValue::Set(email.to_string()),
            password_hash: ActiveValue::Set(password_hash),
            role: ActiveValue::Set(role.as_str().to_string()),
            ..Default::default()
        };
        let model = account
            .insert(&self.database)
            .await
            .map_err(EngineError::from_statement)?;
        tracing::info!(account_id = model.id, "account created");
        Ok(model.id)
    }

    /// Replace the password hash after checking the current password.
    ///
    /// Existing sessions of the account stay valid.
    pub async fn change_password(
        &self,
        account_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let Some(account) = accounts::Entity::find_by_id(account_id).one(&db_tx).await? else {
                return Err(EngineError::NotFound(format!("account {account_id}")));
            };
            if !bool::from(verify_password(old_password, &account.password_hash).await?) {
                return Err(EngineError::InvalidCredentials);
            }

            let password_hash = hash_password(new_password, self.config.bcrypt_cost).await?;
            accounts::Entity::update_many()
                .col_expr(accounts::Column::PasswordHash, Expr::value(password_hash))
                .filter(accounts::Column::Id.eq(account_id))
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Resolve an email/password pair to an account id.
    ///
    /// An unknown email still costs one hash verification against a dummy
    /// hash, and both outcomes are combined without branching on either.
    pub(crate) async fn check_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> ResultEngine<i64> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.trim()))
            .one(&self.database)
            .await?;

        let (account_id, hash, found) = match account {
            Some(account) => (account.id, account.password_hash, Choice::from(1)),
            None => (0, self.dummy_hash.clone(), Choice::from(0)),
        };
        let verified = verify_password(password, &hash).await?;

        if bool::from(found & verified) {
            Ok(account_id)
        } else {
            Err(EngineError::InvalidCredentials)
        }
    }
}
