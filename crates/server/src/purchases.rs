//! Purchase API endpoints

use api_types::purchase::{
    PurchaseCreated, PurchaseList, PurchaseNew, PurchaseUpdate, PurchaseView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Amount, NewPurchase, Purchase, SessionInfo};

use crate::{ServerError, products::product_view, server::ServerState, tags::tag_view};

fn purchase_view(purchase: Purchase) -> PurchaseView {
    let total_price = purchase.total_price().to_string();
    PurchaseView {
        id: purchase.id,
        product: product_view(purchase.product),
        date: purchase.date,
        quantity: purchase.quantity.to_string(),
        price: purchase.price.to_string(),
        total_price,
        tags: purchase.tags.into_iter().map(tag_view).collect(),
    }
}

fn parse_amount(raw: Option<String>) -> Result<Option<Amount>, ServerError> {
    Ok(raw.map(|raw| raw.parse::<Amount>()).transpose()?)
}

/// Handle requests for listing the account's purchases
pub async fn list(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
) -> Result<Json<PurchaseList>, ServerError> {
    let purchases = state
        .engine
        .get_purchases_by_account(session.account_id)
        .await?;

    Ok(Json(PurchaseList {
        purchases: purchases.into_iter().map(purchase_view).collect(),
    }))
}

/// Handle requests for creating a new purchase
pub async fn create(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
    Json(payload): Json<PurchaseNew>,
) -> Result<(StatusCode, Json<PurchaseCreated>), ServerError> {
    let purchase = NewPurchase {
        product_id: payload.product_id,
        date: payload.date,
        quantity: payload.quantity.parse()?,
        price: payload.price.parse()?,
        tag_ids: payload.tag_ids,
    };
    let id = state
        .engine
        .insert_purchase(session.account_id, &purchase)
        .await?;

    Ok((StatusCode::CREATED, Json(PurchaseCreated { id })))
}

pub async fn update(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
    Path(purchase_id): Path<i64>,
    Json(payload): Json<PurchaseUpdate>,
) -> Result<StatusCode, ServerError> {
    let update = engine::PurchaseUpdate {
        product_id: payload.product_id,
        date: payload.date,
        quantity: parse_amount(payload.quantity)?,
        price: parse_amount(payload.price)?,
        tag_ids: payload.tag_ids,
    };
    state
        .engine
        .update_purchase_by_id(purchase_id, session.account_id, &update)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
    Path(purchase_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_purchase_by_id(purchase_id, session.account_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Undo a delete and hand back the purchase as it is now visible
pub async fn restore(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
    Path(purchase_id): Path<i64>,
) -> Result<Json<PurchaseView>, ServerError> {
    let purchase = state
        .engine
        .restore_purchase_by_id(purchase_id, session.account_id)
        .await?;

    Ok(Json(purchase_view(purchase)))
}
