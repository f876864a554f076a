//! Async loaders the server awaits before applying results to a view.
//!
//! Backend calls are blocking, so each one runs on the blocking pool and its
//! error is mapped into the [`ViewError`] taxonomy under the section title the
//! page shows for it.

use std::sync::Arc;

use serde_json::Value;

use crate::api::{
    ApiError, DashboardApi, Figure, PortfolioVisualizations, PropertyDetail, PropertyOption,
};
use crate::listing::{Listing, ListingFilter};
use crate::view::{MapSection, PropertySection, SectionPayload, ViewError};

pub const LISTINGS_SECTION: &str = "Listings";
pub const PROPERTY_SECTION: &str = "Property";
pub const VISUALIZATIONS_SECTION: &str = "Opportunity Visualizations";
pub const SELECTOR_SECTION: &str = "Property Selector";
pub const RADAR_SECTION: &str = "Property Radar";

#[derive(Clone)]
pub struct ViewController {
    api: Arc<dyn DashboardApi>,
}

impl ViewController {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self { api }
    }

    pub async fn load_listings(&self, filter: ListingFilter) -> Result<Vec<Listing>, ViewError> {
        self.blocking(LISTINGS_SECTION, move |api| api.listings(filter))
            .await
    }

    pub async fn load_property(&self, stock_number: &str) -> Result<PropertyDetail, ViewError> {
        let stock_number = stock_number.to_string();
        self.blocking(PROPERTY_SECTION, move |api| api.property(&stock_number))
            .await
    }

    /// The map is served by the property endpoint; the other sections have
    /// their own.
    pub async fn load_section(
        &self,
        stock_number: &str,
        section: PropertySection,
    ) -> Result<SectionPayload, ViewError> {
        let stock_number = stock_number.to_string();
        self.blocking(section.title(), move |api| match section {
            PropertySection::Map => api
                .property(&stock_number)
                .map(|detail| SectionPayload::Map(MapSection::from_detail(&detail))),
            PropertySection::Opportunity => api
                .property_opportunity(&stock_number)
                .map(SectionPayload::Opportunity),
            PropertySection::AiReport => api
                .ai_report(&stock_number)
                .map(SectionPayload::AiReport),
        })
        .await
    }

    pub async fn load_visualizations(&self) -> Result<PortfolioVisualizations, ViewError> {
        self.blocking(VISUALIZATIONS_SECTION, |api| {
            api.opportunity_visualizations()
        })
        .await
    }

    pub async fn load_property_options(&self) -> Result<Vec<PropertyOption>, ViewError> {
        self.blocking(SELECTOR_SECTION, |api| api.opportunity_properties())
            .await
    }

    /// Radar figures are validated here so a malformed one fails only its slot.
    pub async fn load_radar(&self, property_id: &str) -> Result<Value, ViewError> {
        let property_id = property_id.to_string();
        let raw = self
            .blocking(RADAR_SECTION, move |api| api.radar_chart(&property_id))
            .await?;
        Figure::from_value(&raw)
            .map_err(|message| ViewError::data_format(RADAR_SECTION, message))?;
        Ok(raw)
    }

    async fn blocking<T, F>(&self, section: &'static str, fetch: F) -> Result<T, ViewError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DashboardApi) -> Result<T, ApiError> + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        match tokio::task::spawn_blocking(move || fetch(api.as_ref())).await {
            Ok(result) => result.map_err(|err| ViewError::from_api(section, err)),
            Err(join_err) => Err(ViewError::Network {
                section: section.to_string(),
                message: format!("background task failed: {join_err}"),
                not_found: false,
            }),
        }
    }
}
