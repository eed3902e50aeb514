use tracing::{debug, instrument};

use crate::client::{endpoints, ApiClient};
use crate::errors::Result;
use crate::models::{Author, Book, Category, Page, Review, ReviewRequest, Slide};

/// Catalog browsing - books, authors, categories, homepage slides, reviews.
/// Everything here works without a session.
impl ApiClient {
    #[instrument(skip(self))]
    pub async fn books(&self, page: u32, size: u32) -> Result<Page<Book>> {
        let mut url = self.endpoint(endpoints::BOOKS)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());

        debug!("Fetching book page {}", page);
        self.get_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn book(&self, id: u64) -> Result<Book> {
        let url = self.endpoint(&format!("{}/{}", endpoints::BOOKS, id))?;
        self.get_enveloped(url).await
    }

    /// Full-text search over the catalog
    #[instrument(skip(self))]
    pub async fn search_books(&self, query: &str, page: u32, size: u32) -> Result<Page<Book>> {
        let mut url = self.endpoint(&format!("{}/search", endpoints::BOOKS))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());

        self.get_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn authors(&self, page: u32, size: u32) -> Result<Page<Author>> {
        let mut url = self.endpoint(endpoints::AUTHORS)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());

        self.get_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn author(&self, id: u64) -> Result<Author> {
        let url = self.endpoint(&format!("{}/{}", endpoints::AUTHORS, id))?;
        self.get_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>> {
        let url = self.endpoint(endpoints::CATEGORIES)?;
        self.get_enveloped(url).await
    }

    /// Homepage carousel slides, in display order
    #[instrument(skip(self))]
    pub async fn slides(&self) -> Result<Vec<Slide>> {
        let url = self.endpoint(endpoints::SLIDES)?;
        let mut slides: Vec<Slide> = self.get_enveloped(url).await?;
        slides.sort_by_key(|slide| slide.position.unwrap_or(u32::MAX));
        Ok(slides)
    }

    #[instrument(skip(self))]
    pub async fn book_reviews(&self, book_id: u64) -> Result<Vec<Review>> {
        let url = self.endpoint(&format!("{}/{}/reviews", endpoints::BOOKS, book_id))?;
        self.get_enveloped(url).await
    }

    /// Submit a review. Propagates failure so the form can display it.
    #[instrument(skip(self, request))]
    pub async fn submit_review(&self, book_id: u64, request: &ReviewRequest) -> Result<Review> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}/reviews", endpoints::BOOKS, book_id))?;
        self.post_enveloped(url, request).await
    }
}
