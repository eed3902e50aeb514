//! REST client for the bookswap backend's domain endpoints
//!
//! The marketplace delegates all business logic - pricing, stock, order
//! state, payment settlement - to the backend API; this crate is the typed
//! surface the storefront calls it through. Every endpoint answers with the
//! shared `{ code, result, message }` envelope (code 1000 is success), which
//! [`ApiClient`] unwraps before returning.
//!
//! Two external contracts live here beside the backend itself: the payment
//! gateway's completion redirect ([`payment`]) and the image host's signed
//! delete ([`images`]).

pub mod addresses;
pub mod admin;
pub mod catalog;
pub mod client;
pub mod errors;
pub mod images;
pub mod models;
pub mod orders;
pub mod payment;

pub use client::{or_sentinel, ApiClient};
pub use errors::{ApiError, Result};
pub use images::{ImageHost, ImageHostConfig};
pub use models::{
    Address, AddressRequest, Author, AuthorRequest, Book, Category, CheckoutLine, CheckoutRequest,
    CheckoutResponse, District, ListingRequest, ListingStatus, Order, OrderLine, OrderStatus, Page,
    PaymentMethod, Province, Review, ReviewRequest, Slide, SlideRequest, Ward,
};
pub use payment::{parse_return_url, PaymentOutcome, GATEWAY_SUCCESS_CODE};
