use tracing::instrument;

use bw_auth::UserProfile;

use crate::client::{endpoints, ApiClient};
use crate::errors::Result;
use crate::models::{Author, AuthorRequest, Page, Slide, SlideRequest};

/// Back-office management - authors, homepage slides, user accounts
///
/// The route guard keeps non-admins away from these screens; the backend
/// enforces the same rule again on every endpoint here, so a forged token
/// gets a rejection envelope rather than data.
impl ApiClient {
    /// Create an author. Propagates failure so the form can display it.
    #[instrument(skip(self, request))]
    pub async fn create_author(&self, request: &AuthorRequest) -> Result<Author> {
        self.require_token()?;
        let url = self.endpoint(endpoints::AUTHORS)?;
        self.post_enveloped(url, request).await
    }

    /// Replace an author. Propagates failure so the form can display it.
    #[instrument(skip(self, request))]
    pub async fn update_author(&self, id: u64, request: &AuthorRequest) -> Result<Author> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}", endpoints::AUTHORS, id))?;
        self.put_enveloped(url, request).await
    }

    #[instrument(skip(self))]
    pub async fn delete_author(&self, id: u64) -> Result<()> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}", endpoints::AUTHORS, id))?;
        self.delete_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn delete_book(&self, id: u64) -> Result<()> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}", endpoints::BOOKS, id))?;
        self.delete_enveloped(url).await
    }

    /// Add a slide to the homepage carousel. Propagates failure so the form
    /// can display it.
    #[instrument(skip(self, request))]
    pub async fn create_slide(&self, request: &SlideRequest) -> Result<Slide> {
        self.require_token()?;
        let url = self.endpoint(endpoints::SLIDES)?;
        self.post_enveloped(url, request).await
    }

    #[instrument(skip(self))]
    pub async fn delete_slide(&self, id: u64) -> Result<()> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}", endpoints::SLIDES, id))?;
        self.delete_enveloped(url).await
    }

    /// Registered accounts, for the back-office user screen
    #[instrument(skip(self))]
    pub async fn users(&self, page: u32, size: u32) -> Result<Page<UserProfile>> {
        self.require_token()?;
        let mut url = self.endpoint(endpoints::USERS)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());

        self.get_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}", endpoints::USERS, id))?;
        self.delete_enveloped(url).await
    }
}
