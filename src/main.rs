//! PiNa Bakes storefront service: the HTTP intent surface over the core.

use std::sync::Arc;

use anyhow::Result;
use axum::{extract::{Path, State}, http::StatusCode, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pinabakes::app::CheckoutReceipt;
use pinabakes::domain::aggregates::cart::CartLine;
use pinabakes::domain::aggregates::catalog::Product;
use pinabakes::domain::aggregates::order::{CustomerInfo, Order};
use pinabakes::domain::pricing::{AppliedCoupon, Totals};
use pinabakes::domain::router::RouteState;
use pinabakes::domain::value_objects::Slug;
use pinabakes::storage::FileStore;
use pinabakes::{Intent, StoreConfig, StoreError, Storefront};

type AppState = Arc<Storefront>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StoreConfig::from_env()?;
    let addr = config.socket_addr();
    let store = Arc::new(FileStore::new(config.data_dir.clone()));
    let front = Arc::new(Storefront::boot(config, store));

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "pinabakes"})) }))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:slug", get(get_product))
        .route("/api/v1/catalog/reload", post(reload_catalog))
        .route("/api/v1/cart", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/items", post(add_to_cart))
        .route("/api/v1/cart/items/:slug", axum::routing::put(set_quantity).delete(remove_from_cart))
        .route("/api/v1/cart/coupon", post(apply_coupon))
        .route("/api/v1/wishlist", get(get_wishlist).post(add_to_wishlist))
        .route("/api/v1/wishlist/:slug", axum::routing::delete(remove_from_wishlist))
        .route("/api/v1/wishlist/:slug/move-to-cart", post(move_to_cart))
        .route("/api/v1/intent", post(dispatch_intent))
        .route("/api/v1/route", get(get_route).post(navigate))
        .route("/api/v1/profile", get(get_profile))
        .route("/api/v1/checkout", post(checkout))
        .route("/api/v1/orders", get(order_history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(front);

    tracing::info!("PiNa Bakes storefront listening on {addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

fn http_err(err: StoreError) -> (StatusCode, String) {
    let status = match err {
        StoreError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::CatalogUnavailable(_) => StatusCode::BAD_GATEWAY,
    };
    (status, err.to_string())
}

#[derive(Serialize)]
struct CartView {
    lines: Vec<CartLine>,
    coupon: Option<AppliedCoupon>,
    item_count: u32,
    totals: Totals,
}

fn cart_view(front: &Storefront) -> CartView {
    CartView {
        lines: front.cart_lines(),
        coupon: front.applied_coupon(),
        item_count: front.item_count(),
        totals: front.cart_totals(),
    }
}

async fn list_products(State(front): State<AppState>) -> Result<Json<Vec<Product>>, (StatusCode, String)> {
    front.products().await.map(|list| Json(list.as_ref().clone())).map_err(http_err)
}

async fn get_product(State(front): State<AppState>, Path(slug): Path<String>) -> Result<Json<Product>, (StatusCode, String)> {
    front.product(&slug).await.map(Json).map_err(http_err)
}

async fn reload_catalog(State(front): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    front.reload_catalog().await.map(|()| StatusCode::NO_CONTENT).map_err(http_err)
}

async fn get_cart(State(front): State<AppState>) -> Json<CartView> {
    Json(cart_view(&front))
}

#[derive(Deserialize)]
struct AddToCartRequest {
    slug: String,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

fn default_quantity() -> u32 { 1 }

async fn add_to_cart(State(front): State<AppState>, Json(r): Json<AddToCartRequest>) -> Result<(StatusCode, Json<CartView>), (StatusCode, String)> {
    front.add_to_cart(&r.slug, r.quantity).await.map_err(http_err)?;
    Ok((StatusCode::CREATED, Json(cart_view(&front))))
}

#[derive(Deserialize)]
struct QuantityRequest {
    quantity: i64,
}

async fn set_quantity(State(front): State<AppState>, Path(slug): Path<String>, Json(r): Json<QuantityRequest>) -> Json<CartView> {
    front.set_quantity(&slug, r.quantity);
    Json(cart_view(&front))
}

async fn remove_from_cart(State(front): State<AppState>, Path(slug): Path<String>) -> Json<CartView> {
    front.remove_from_cart(&slug);
    Json(cart_view(&front))
}

async fn clear_cart(State(front): State<AppState>) -> Json<CartView> {
    front.clear_cart();
    Json(cart_view(&front))
}

#[derive(Deserialize)]
struct CouponRequest {
    code: String,
}

async fn apply_coupon(State(front): State<AppState>, Json(r): Json<CouponRequest>) -> Json<CartView> {
    front.apply_coupon(&r.code);
    Json(cart_view(&front))
}

async fn get_wishlist(State(front): State<AppState>) -> Json<Vec<Slug>> {
    Json(front.wishlist_entries())
}

#[derive(Deserialize)]
struct WishlistRequest {
    slug: String,
}

async fn add_to_wishlist(State(front): State<AppState>, Json(r): Json<WishlistRequest>) -> Result<(StatusCode, Json<Vec<Slug>>), (StatusCode, String)> {
    front.add_to_wishlist(&r.slug).await.map_err(http_err)?;
    Ok((StatusCode::CREATED, Json(front.wishlist_entries())))
}

async fn remove_from_wishlist(State(front): State<AppState>, Path(slug): Path<String>) -> Json<Vec<Slug>> {
    front.remove_from_wishlist(&slug);
    Json(front.wishlist_entries())
}

async fn move_to_cart(State(front): State<AppState>, Path(slug): Path<String>) -> Result<Json<CartView>, (StatusCode, String)> {
    front.move_to_cart(&slug).await.map_err(http_err)?;
    Ok(Json(cart_view(&front)))
}

async fn dispatch_intent(State(front): State<AppState>, Json(intent): Json<Intent>) -> Result<StatusCode, (StatusCode, String)> {
    front.dispatch(intent).await.map(|()| StatusCode::ACCEPTED).map_err(http_err)
}

async fn get_route(State(front): State<AppState>) -> Json<RouteState> {
    Json(front.route())
}

#[derive(Deserialize)]
struct NavigateRequest {
    target: String,
}

async fn navigate(State(front): State<AppState>, Json(r): Json<NavigateRequest>) -> Json<RouteState> {
    Json(front.navigate(&r.target).await)
}

async fn get_profile(State(front): State<AppState>) -> Result<Json<CustomerInfo>, StatusCode> {
    front.profile().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn checkout(State(front): State<AppState>, Json(customer): Json<CustomerInfo>) -> Result<(StatusCode, Json<CheckoutReceipt>), (StatusCode, String)> {
    let receipt = front.checkout(customer).await.map_err(http_err)?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn order_history(State(front): State<AppState>) -> Json<Vec<Order>> {
    Json(front.order_history())
}
