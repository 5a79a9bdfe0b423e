//! Login sessions.
//!
//! A session moves through three states as time passes:
//!
//! - [`SessionState::Active`]: `now + refresh_window < expiry_time`.
//! - [`SessionState::NearExpiry`]: still valid, but close enough to the expiry
//!   that validating it schedules a refresh.
//! - [`SessionState::Expired`]: `now >= expiry_time`. Terminal, treated as
//!   absent.

use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A freshly created session, as handed back to the client after login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub expiry_time: DateTime<Utc>,
    pub account_id: i64,
}

/// What a successful validation tells the caller about the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: i64,
    pub account_id: i64,
    pub expiry_time: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    NearExpiry,
    Expired,
}

impl SessionState {
    pub fn at(now: DateTime<Utc>, expiry_time: DateTime<Utc>, refresh_window: Duration) -> Self {
        if now >= expiry_time {
            Self::Expired
        } else if now + refresh_window >= expiry_time {
            Self::NearExpiry
        } else {
            Self::Active
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub token: String,
    pub expiry_time: DateTimeUtc,
    pub account_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Session {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            token: model.token,
            expiry_time: model.expiry_time,
            account_id: model.account_id,
        }
    }
}

impl From<&Model> for SessionInfo {
    fn from(model: &Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            expiry_time: model.expiry_time,
        }
    }
}
