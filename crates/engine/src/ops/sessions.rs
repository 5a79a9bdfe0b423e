use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Session, SessionInfo, SessionState, sessions};

use super::{Engine, with_tx};

/// Push `expiry_time` forward, never backwards.
///
/// Returns whether the row changed. A concurrent refresh that already wrote a
/// later expiry wins.
async fn extend_expiry<C: ConnectionTrait>(
    db: &C,
    session_id: i64,
    expiry_time: DateTime<Utc>,
) -> ResultEngine<bool> {
    let result = sessions::Entity::update_many()
        .col_expr(sessions::Column::ExpiryTime, Expr::value(expiry_time))
        .filter(sessions::Column::Id.eq(session_id))
        .filter(sessions::Column::ExpiryTime.lt(expiry_time))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

impl Engine {
    /// Log in with email and password.
    pub async fn create_session(&self, email: &str, password: &str) -> ResultEngine<Session> {
        self.create_session_at(email, password, Utc::now()).await
    }

    /// [`Engine::create_session`] with an explicit clock reading.
    ///
    /// The account's already expired sessions are purged in the same transaction.
    pub async fn create_session_at(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Session> {
        let account_id = self.check_credentials(email, password).await?;
        let token = Uuid::new_v4().to_string();
        let expiry_time = now + self.config.session_timeout;

        with_tx!(self, |db_tx| {
            let session = sessions::ActiveModel {
                token: ActiveValue::Set(token),
                expiry_time: ActiveValue::Set(expiry_time),
                account_id: ActiveValue::Set(account_id),
                ..Default::default()
            }
            .insert(&db_tx)
            .await
            .map_err(EngineError::from_statement)?;

            let purged = sessions::Entity::delete_many()
                .filter(sessions::Column::AccountId.eq(account_id))
                .filter(sessions::Column::ExpiryTime.lte(now))
                .exec(&db_tx)
                .await?;
            if purged.rows_affected > 0 {
                tracing::debug!(account_id, purged = purged.rows_affected, "expired sessions removed");
            }

            Ok(Session::from(session))
        })
    }

    /// Resolve a bare token to its session.
    pub async fn validate_session(&self, token: &str) -> ResultEngine<SessionInfo> {
        self.validate_session_at(token, Utc::now()).await
    }

    /// [`Engine::validate_session`] with an explicit clock reading.
    ///
    /// A session within the refresh window gets its expiry pushed to
    /// `now + session_timeout` by a detached task. The caller does not wait for
    /// it and never sees its outcome.
    pub async fn validate_session_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<SessionInfo> {
        if token.is_empty() {
            return Err(EngineError::InvalidSession);
        }
        let Some(session) = sessions::Entity::find()
            .filter(sessions::Column::Token.eq(token))
            .one(&self.database)
            .await?
        else {
            return Err(EngineError::InvalidSession);
        };

        match SessionState::at(now, session.expiry_time, self.config.refresh_window) {
            SessionState::Expired => Err(EngineError::SessionExpired),
            SessionState::NearExpiry => {
                self.spawn_refresh(session.id, now + self.config.session_timeout);
                Ok(SessionInfo::from(&session))
            }
            SessionState::Active => Ok(SessionInfo::from(&session)),
        }
    }

    /// Extend a session to `expiry_time` unless it already expires later.
    pub async fn refresh_session(
        &self,
        session_id: i64,
        expiry_time: DateTime<Utc>,
    ) -> ResultEngine<bool> {
        extend_expiry(&self.database, session_id, expiry_time).await
    }

    fn spawn_refresh(&self, session_id: i64, expiry_time: DateTime<Utc>) {
        let database = self.database.clone();
        tokio::spawn(async move {
            match extend_expiry(&database, session_id, expiry_time).await {
                Ok(true) => tracing::debug!(session_id, %expiry_time, "session refreshed"),
                Ok(false) => tracing::debug!(session_id, "session already extended"),
                Err(err) => tracing::warn!(session_id, "session refresh failed: {err}"),
            }
        });
    }

    /// Delete a session by id. Deleting an unknown id is not an error.
    pub async fn delete_session(&self, session_id: i64) -> ResultEngine<()> {
        sessions::Entity::delete_by_id(session_id)
            .exec(&self.database)
            .await?;
        Ok(())
    }
}
