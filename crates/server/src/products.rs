//! Product API endpoints

use api_types::product::{ProductList, ProductNew, ProductView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{Product, SessionInfo};

use crate::{ServerError, server::ServerState};

pub(crate) fn product_view(product: Product) -> ProductView {
    ProductView {
        id: product.id,
        name: product.name,
    }
}

pub async fn list(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
) -> Result<Json<ProductList>, ServerError> {
    let products = state
        .engine
        .get_products_by_account(session.account_id)
        .await?;

    Ok(Json(ProductList {
        products: products.into_iter().map(product_view).collect(),
    }))
}

pub async fn create(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
    Json(payload): Json<ProductNew>,
) -> Result<(StatusCode, Json<ProductView>), ServerError> {
    let id = state
        .engine
        .insert_product(session.account_id, &payload.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductView {
            id,
            name: payload.name.trim().to_string(),
        }),
    ))
}
