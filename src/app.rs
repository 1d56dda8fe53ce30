//! Root controller: one owner for every piece of storefront state.
//!
//! A view layer emits [`Intent`]s and subscribes to [`StoreEvent`]s; it
//! never mutates state directly. For every mutation the persistence write
//! happens before the matching event is broadcast.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::domain::aggregates::cart::{Cart, CartLine, CouponOutcome};
use crate::domain::aggregates::catalog::{Catalog, CatalogSource, Product};
use crate::domain::aggregates::order::{self, CustomerInfo, Order};
use crate::domain::aggregates::wishlist::Wishlist;
use crate::domain::events::{Notice, StoreEvent};
use crate::domain::pricing::{AppliedCoupon, Totals};
use crate::domain::router::{self, RouteState, Router};
use crate::domain::value_objects::Slug;
use crate::notify::{Envelope, EventKind, Notifier, PageMeta};
use crate::storage::{self, keys, KvStore};
use crate::{Result, StoreError};

/// Commands a view layer emits. Everything user-driven funnels through
/// [`Storefront::dispatch`].
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    AddToCart {
        slug: String,
        #[serde(default = "default_quantity")]
        quantity: u32,
    },
    RemoveFromCart { slug: String },
    SetQuantity { slug: String, quantity: i64 },
    ClearCart,
    ApplyCoupon { code: String },
    AddToWishlist { slug: String },
    RemoveFromWishlist { slug: String },
    MoveToCart { slug: String },
    Navigate { target: String },
    Checkout { customer: CustomerInfo },
}

fn default_quantity() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

/// What checkout hands back: the frozen order and the deep link whose
/// opening is the user-visible success signal.
#[derive(Clone, Debug, Serialize)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub chat_url: String,
}

pub struct Storefront {
    config: StoreConfig,
    catalog: Catalog,
    store: Arc<dyn KvStore>,
    notifier: Option<Notifier>,
    session: Session,
    cart: Mutex<Cart>,
    wishlist: Mutex<Wishlist>,
    router: Mutex<Router>,
    profile: Mutex<Option<CustomerInfo>>,
    events: broadcast::Sender<StoreEvent>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Storefront {
    /// Restore persisted state through the gateway and announce the visit.
    /// Absent or corrupt local data yields empty collections; boot never
    /// fails on it.
    pub fn boot(config: StoreConfig, store: Arc<dyn KvStore>) -> Self {
        let source = CatalogSource::from_location(&config.products_source);
        Self::boot_with_source(config, store, source)
    }

    /// Same as [`boot`](Self::boot) with an explicit catalog source, for
    /// embedders and tests.
    pub fn boot_with_source(
        config: StoreConfig,
        store: Arc<dyn KvStore>,
        source: CatalogSource,
    ) -> Self {
        let notifier = config.webhook_url.clone().map(Notifier::new);

        let session = storage::load_json::<Session>(store.as_ref(), keys::SESSION)
            .unwrap_or_else(|| {
                let session = Session { id: Uuid::now_v7(), started_at: Utc::now() };
                storage::save_json(store.as_ref(), keys::SESSION, &session);
                session
            });

        let mut cart = Cart::from_lines(
            storage::load_json::<Vec<CartLine>>(store.as_ref(), keys::CART).unwrap_or_default(),
        );
        if config.persist_coupon {
            cart.set_coupon(storage::load_json::<AppliedCoupon>(store.as_ref(), keys::COUPON));
        }
        let wishlist = Wishlist::from_entries(
            storage::load_json::<Vec<Slug>>(store.as_ref(), keys::WISHLIST).unwrap_or_default(),
        );
        let profile = storage::load_json::<CustomerInfo>(store.as_ref(), keys::USER);

        let (events, _) = broadcast::channel(64);
        let front = Self {
            config,
            catalog: Catalog::new(source),
            store,
            notifier,
            session,
            cart: Mutex::new(cart),
            wishlist: Mutex::new(wishlist),
            router: Mutex::new(Router::new()),
            profile: Mutex::new(profile),
            events,
        };
        front.notify(EventKind::Visit, json!({ "started_at": front.session.started_at }));
        front
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Saved contact fields, reused to pre-fill the next checkout.
    pub fn profile(&self) -> Option<CustomerInfo> {
        lock(&self.profile).clone()
    }

    pub async fn dispatch(&self, intent: Intent) -> Result<()> {
        match intent {
            Intent::AddToCart { slug, quantity } => self.add_to_cart(&slug, quantity).await,
            Intent::RemoveFromCart { slug } => {
                self.remove_from_cart(&slug);
                Ok(())
            }
            Intent::SetQuantity { slug, quantity } => {
                self.set_quantity(&slug, quantity);
                Ok(())
            }
            Intent::ClearCart => {
                self.clear_cart();
                Ok(())
            }
            Intent::ApplyCoupon { code } => {
                self.apply_coupon(&code);
                Ok(())
            }
            Intent::AddToWishlist { slug } => self.add_to_wishlist(&slug).await,
            Intent::RemoveFromWishlist { slug } => {
                self.remove_from_wishlist(&slug);
                Ok(())
            }
            Intent::MoveToCart { slug } => self.move_to_cart(&slug).await,
            Intent::Navigate { target } => {
                self.navigate(&target).await;
                Ok(())
            }
            Intent::Checkout { customer } => self.checkout(customer).await.map(|_| ()),
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub async fn products(&self) -> Result<Arc<Vec<Product>>> {
        self.catalog.load().await
    }

    pub async fn product(&self, slug: &str) -> Result<Product> {
        self.catalog.find_by_slug(slug).await
    }

    /// Explicit reload: drop the session cache, fetch again.
    pub async fn reload_catalog(&self) -> Result<()> {
        self.catalog.invalidate().await;
        self.catalog.load().await.map(|_| ())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    pub fn cart_lines(&self) -> Vec<CartLine> {
        lock(&self.cart).lines().to_vec()
    }

    pub fn cart_totals(&self) -> Totals {
        lock(&self.cart).totals(&self.config)
    }

    pub fn applied_coupon(&self) -> Option<AppliedCoupon> {
        lock(&self.cart).coupon().cloned()
    }

    pub fn item_count(&self) -> u32 {
        lock(&self.cart).item_count()
    }

    pub async fn add_to_cart(&self, slug: &str, quantity: u32) -> Result<()> {
        let product = self.catalog.find_by_slug(slug).await?;
        {
            let mut cart = lock(&self.cart);
            cart.add(&product, quantity);
            self.persist_cart(&cart);
        }
        self.emit(StoreEvent::CartChanged);
        self.toast(Notice::success(format!("{} added to cart!", product.name)));
        Ok(())
    }

    pub fn remove_from_cart(&self, slug: &str) {
        {
            let mut cart = lock(&self.cart);
            cart.remove(&Slug::new(slug));
            self.persist_cart(&cart);
        }
        self.emit(StoreEvent::CartChanged);
        self.toast(Notice::info("Item removed from cart"));
    }

    pub fn set_quantity(&self, slug: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(slug);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let changed = {
            let mut cart = lock(&self.cart);
            let changed = cart.set_quantity(&Slug::new(slug), quantity);
            if changed {
                self.persist_cart(&cart);
            }
            changed
        };
        if changed {
            self.emit(StoreEvent::CartChanged);
        }
    }

    pub fn clear_cart(&self) {
        {
            let mut cart = lock(&self.cart);
            cart.clear();
            self.persist_cart(&cart);
        }
        self.emit(StoreEvent::CartChanged);
        self.toast(Notice::info("Cart cleared"));
    }

    pub fn apply_coupon(&self, code: &str) {
        let outcome = {
            let mut cart = lock(&self.cart);
            let outcome = cart.apply_coupon(code);
            self.persist_cart(&cart);
            outcome
        };
        self.emit(StoreEvent::CartChanged);
        match outcome {
            CouponOutcome::Applied(coupon) => self.toast(Notice::success(format!(
                "Coupon {} applied: {}% off",
                coupon.code, coupon.value
            ))),
            CouponOutcome::Cleared => self.toast(Notice::info("Coupon removed")),
            CouponOutcome::Unknown => self.toast(Notice::error("That coupon code isn't valid")),
        }
    }

    fn persist_cart(&self, cart: &Cart) {
        storage::save_json(self.store.as_ref(), keys::CART, cart.lines());
        if self.config.persist_coupon {
            match cart.coupon() {
                Some(coupon) => storage::save_json(self.store.as_ref(), keys::COUPON, coupon),
                None => self.store.remove(keys::COUPON),
            }
        }
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    pub fn wishlist_entries(&self) -> Vec<Slug> {
        lock(&self.wishlist).entries().to_vec()
    }

    pub async fn add_to_wishlist(&self, slug: &str) -> Result<()> {
        let product = self.catalog.find_by_slug(slug).await?;
        let added = {
            let mut wishlist = lock(&self.wishlist);
            let added = wishlist.add(product.slug.clone());
            if added {
                storage::save_json(self.store.as_ref(), keys::WISHLIST, wishlist.entries());
            }
            added
        };
        if added {
            self.emit(StoreEvent::WishlistChanged);
            self.toast(Notice::success(format!("{} saved to wishlist", product.name)));
        } else {
            self.toast(Notice::info(format!("{} is already in your wishlist", product.name)));
        }
        Ok(())
    }

    pub fn remove_from_wishlist(&self, slug: &str) {
        let removed = {
            let mut wishlist = lock(&self.wishlist);
            let removed = wishlist.remove(&Slug::new(slug));
            if removed {
                storage::save_json(self.store.as_ref(), keys::WISHLIST, wishlist.entries());
            }
            removed
        };
        if removed {
            self.emit(StoreEvent::WishlistChanged);
        }
    }

    /// Cart add first; a failure leaves the wishlist entry in place.
    pub async fn move_to_cart(&self, slug: &str) -> Result<()> {
        self.add_to_cart(slug, 1).await?;
        self.remove_from_wishlist(slug);
        Ok(())
    }

    // =========================================================================
    // Routing
    // =========================================================================

    pub fn route(&self) -> RouteState {
        lock(&self.router).current().clone()
    }

    pub fn fragment(&self) -> String {
        lock(&self.router).fragment().to_string()
    }

    /// Programmatic navigation; same transition as a host fragment change.
    pub async fn navigate(&self, target: &str) -> RouteState {
        self.handle_fragment(target).await
    }

    /// The single transition path. Product routes await the catalog; an
    /// unknown slug reports the miss and lands on the listing section
    /// instead of a dead view.
    pub async fn handle_fragment(&self, fragment: &str) -> RouteState {
        let mut target = router::normalize(fragment);
        if let RouteState::ProductDetail(slug) = router::resolve(&target) {
            match self.catalog.find_by_slug(slug.as_str()).await {
                Ok(_) => {}
                Err(StoreError::ProductNotFound(_)) => {
                    self.toast(Notice::error("Product not found"));
                    target = router::normalize("products");
                }
                Err(err) => {
                    tracing::error!(error = %err, "catalog load failed during routing");
                    self.toast(Notice::error(
                        "Failed to load products. Please refresh the page to try again.",
                    ));
                    target = router::normalize("products");
                }
            }
        }
        let changed = {
            let mut router = lock(&self.router);
            router.sync(&target)
        };
        match changed {
            Some(state) => {
                self.emit(StoreEvent::RouteChanged(state.clone()));
                state
            }
            None => self.route(),
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// The order pipeline: validate (advisory), save the profile, freeze
    /// the order, append history, notify, hand back the chat link.
    pub async fn checkout(&self, customer: CustomerInfo) -> Result<CheckoutReceipt> {
        let order = {
            let cart = lock(&self.cart);
            if cart.is_empty() {
                self.toast(Notice::error("Your cart is empty!"));
                return Err(StoreError::EmptyCart);
            }
            // totals are recomputed at submission, not reused from display
            let totals = cart.totals(&self.config);
            Order::assemble(&cart, &totals, customer.clone())
        };

        for notice in order::advisory_notices(&customer) {
            self.toast(notice);
        }

        storage::save_json(self.store.as_ref(), keys::USER, &customer);
        *lock(&self.profile) = Some(customer);

        // history append is best-effort; the handoff proceeds regardless
        let mut history =
            storage::load_json::<Vec<Order>>(self.store.as_ref(), keys::ORDERS).unwrap_or_default();
        history.push(order.clone());
        storage::save_json(self.store.as_ref(), keys::ORDERS, &history);

        self.notify(
            EventKind::Order,
            serde_json::to_value(&order).unwrap_or(serde_json::Value::Null),
        );

        let chat_url = order.chat_url(&self.config.whatsapp_number);
        self.emit(StoreEvent::OrderPlaced { order_id: order.id, chat_url: chat_url.clone() });
        self.toast(Notice::success("Redirecting to WhatsApp..."));
        Ok(CheckoutReceipt { order, chat_url })
    }

    pub fn order_history(&self) -> Vec<Order> {
        storage::load_json(self.store.as_ref(), keys::ORDERS).unwrap_or_default()
    }

    // =========================================================================
    // Signals
    // =========================================================================

    fn emit(&self, event: StoreEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }

    fn toast(&self, notice: Notice) {
        self.emit(StoreEvent::Notice(notice));
    }

    fn notify(&self, kind: EventKind, payload: serde_json::Value) {
        if let Some(notifier) = &self.notifier {
            notifier.send_detached(Envelope {
                kind,
                payload,
                session: self.session.id,
                page: PageMeta { path: self.fragment(), referrer: None },
            });
        }
    }
}
