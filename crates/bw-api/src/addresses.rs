use tracing::instrument;

use crate::client::{endpoints, ApiClient};
use crate::errors::Result;
use crate::models::{Address, AddressRequest, District, Province, Ward};

/// Delivery addresses and the cascading province → district → ward lookup
/// backing the address form. Each level is fetched only once its parent is
/// chosen; picking a new parent invalidates the levels below it on the form
/// side.
impl ApiClient {
    #[instrument(skip(self))]
    pub async fn provinces(&self) -> Result<Vec<Province>> {
        let url = self.endpoint(endpoints::PROVINCES)?;
        self.get_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn districts(&self, province_id: u64) -> Result<Vec<District>> {
        let url = self.endpoint(&format!(
            "{}/{}/districts",
            endpoints::PROVINCES,
            province_id
        ))?;
        self.get_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn wards(&self, district_id: u64) -> Result<Vec<Ward>> {
        let url = self.endpoint(&format!("districts/{}/wards", district_id))?;
        self.get_enveloped(url).await
    }

    #[instrument(skip(self))]
    pub async fn my_addresses(&self) -> Result<Vec<Address>> {
        self.require_token()?;
        let url = self.endpoint(endpoints::ADDRESSES)?;
        self.get_enveloped(url).await
    }

    /// Create an address. Propagates failure so the form can display it.
    #[instrument(skip(self, request))]
    pub async fn create_address(&self, request: &AddressRequest) -> Result<Address> {
        self.require_token()?;
        let url = self.endpoint(endpoints::ADDRESSES)?;
        self.post_enveloped(url, request).await
    }

    /// Replace an address. Propagates failure so the form can display it.
    #[instrument(skip(self, request))]
    pub async fn update_address(&self, id: u64, request: &AddressRequest) -> Result<Address> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}", endpoints::ADDRESSES, id))?;
        self.put_enveloped(url, request).await
    }

    #[instrument(skip(self))]
    pub async fn delete_address(&self, id: u64) -> Result<()> {
        self.require_token()?;
        let url = self.endpoint(&format!("{}/{}", endpoints::ADDRESSES, id))?;
        self.delete_enveloped(url).await
    }
}
