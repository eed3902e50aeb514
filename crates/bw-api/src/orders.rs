use tracing::{debug, instrument};

use crate::client::{endpoints, ApiClient};
use crate::errors::Result;
use crate::models::{
    Book, CheckoutLine, CheckoutRequest, CheckoutResponse, ListingRequest, Order, Page,
};

/// Orders and the seller listing workflow
///
/// Pricing, stock and order state transitions all live on the backend; this
/// side only submits intents and renders what comes back.
impl ApiClient {
    #[instrument(skip(self))]
    pub async fn my_orders(&self, page: u32, size: u32) -> Result<Page<Order>> {
        self.require_token()?;
        let mut url = self.endpoint(endpoints::ORDERS)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());

        self.get_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn order(&self, id: u64) -> Result<Order> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}", endpoints::ORDERS, id))?;
        self.get_enveloped(url).await
    }

    /// Place an order for the cart's selected lines
    ///
    /// Gateway payments come back with a `payment_url` to redirect to; the
    /// gateway then returns the shopper via the payment callback route.
    /// Propagates failure so checkout can display it.
    #[instrument(skip(self, request))]
    pub async fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResponse> {
        self.require_token()?;
        debug!("Placing order for {} lines", request.lines.len());
        let url = self.endpoint(endpoints::CHECKOUT)?;
        self.post_enveloped(url, request).await
    }

    /// The cart copy stored on the account, for carrying it across devices
    #[instrument(skip(self))]
    pub async fn saved_cart(&self) -> Result<Vec<CheckoutLine>> {
        self.require_token()?;
        let url = self.endpoint(endpoints::CART)?;
        self.get_enveloped(url).await
    }

    /// Replace the stored cart copy with the local one
    #[instrument(skip(self, lines))]
    pub async fn save_cart(&self, lines: &[CheckoutLine]) -> Result<()> {
        self.require_token()?;
        let url = self.endpoint(endpoints::CART)?;
        self.put_empty(url, lines).await
    }

    /// The signed-in seller's own listings
    #[instrument(skip(self))]
    pub async fn my_listings(&self, page: u32, size: u32) -> Result<Page<Book>> {
        self.require_token()?;
        let mut url = self.endpoint(&format!("{}/mine", endpoints::LISTINGS))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());

        self.get_enveloped(url).await
    }

    /// Put a used book up for sale. Propagates failure so the form can
    /// display it. New listings start out pending approval.
    #[instrument(skip(self, request))]
    pub async fn create_listing(&self, request: &ListingRequest) -> Result<Book> {
        self.require_token()?;
        let url = self.endpoint(endpoints::LISTINGS)?;
        self.post_enveloped(url, request).await
    }

    /// Listings waiting for back-office approval
    #[instrument(skip(self))]
    pub async fn pending_listings(&self, page: u32, size: u32) -> Result<Page<Book>> {
        self.require_token()?;
        let mut url = self.endpoint(&format!("{}/pending", endpoints::LISTINGS))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());

        self.get_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn approve_listing(&self, id: u64) -> Result<Book> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}/approve", endpoints::LISTINGS, id))?;
        self.post_enveloped(url, &serde_json::json!({})).await
    }

    #[instrument(skip(self))]
    pub async fn reject_listing(&self, id: u64) -> Result<Book> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}/reject", endpoints::LISTINGS, id))?;
        self.post_enveloped(url, &serde_json::json!({})).await
    }
}
