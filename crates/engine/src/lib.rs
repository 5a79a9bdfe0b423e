pub use accounts::AccountRole;
pub use amount::Amount;
pub use config::EngineConfig;
pub use error::EngineError;
pub use metadata::SCHEMA_VERSION;
pub use ops::{Engine, EngineBuilder};
pub use products::Product;
pub use purchases::{NewPurchase, Purchase, PurchaseUpdate};
pub use query::QueryBuilder;
pub use sessions::{Session, SessionInfo, SessionState};
pub use tags::Tag;

mod accounts;
mod amount;
mod config;
mod error;
mod metadata;
mod ops;
mod products;
mod purchases;
mod query;
mod sessions;
mod tags;

pub type ResultEngine<T> = Result<T, EngineError>;
