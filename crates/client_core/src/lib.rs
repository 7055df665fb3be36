//! Client core for the people and demography collection services.
//!
//! The interesting parts live in three places: [`query`] turns UI-level
//! selections into request descriptors, [`PeopleClient::search`] dispatches
//! them and classifies the response as synchronous data or an accepted
//! asynchronous task, and [`pagination`]/[`session`] own the listing state
//! machine with its last-writer-wins handling of overlapping fetches.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use shared::domain::{Country, NewPerson, Person, PersonId, PersonPatch};
use shared::protocol::{
    FilterClause, LocationSelector, PeoplePage, SearchAccepted, SearchOutcome, SearchRequest,
};

pub mod config;
pub mod demography;
pub mod error;
mod http;
pub mod pagination;
pub mod query;
pub mod session;

pub use config::{load_settings, ClientSettings};
pub use demography::{CategoryStat, DemographyClient, DemographySnapshot};
pub use error::ClientError;
pub use pagination::{compute_window, ListEvent, ListState, PaginationWindow, Phase};
pub use query::{build_search_request, ListQuery};
pub use session::{ListBackend, ListSession};

use crate::http::{api_error, decode_json, decode_or_default, expect_success, normalize_base_url};

/// Header whose presence switches /people/search into asynchronous mode.
pub const CALLBACK_URL_HEADER: &str = "X-Callback-URL";

#[derive(Serialize)]
struct SearchBody<'a> {
    filters: &'a [FilterClause],
}

/// Client for the people collection service.
pub struct PeopleClient {
    http: Client,
    base_url: String,
}

impl PeopleClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET /people: filtered, sorted, paginated listing.
    pub async fn list(&self, query: &ListQuery) -> Result<PeoplePage, ClientError> {
        let response = self
            .http
            .get(self.url("/people"))
            .query(&query.query_pairs())
            .send()
            .await?;
        decode_or_default(response).await
    }

    /// POST /people/search, the search dispatcher.
    ///
    /// The clause list travels in the body since its length is unbounded;
    /// sort and page ride as query parameters and the callback URL, when
    /// present, as a header, so the body shape is identical in both modes.
    /// A 202 acknowledges an asynchronous task; any other 2xx carries the
    /// results inline. No retries and no state mutation; the return value is
    /// the sole channel back to the caller.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, ClientError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(sort) = &request.sort {
            params.push(("sortBy", sort.field.clone()));
            params.push(("sortOrder", sort.order.as_str().to_string()));
        }
        params.push(("page", request.page.index.to_string()));
        params.push(("pageSize", request.page.size.to_string()));

        let mut builder = self
            .http
            .post(self.url("/people/search"))
            .query(&params)
            .json(&SearchBody {
                filters: &request.filters,
            });
        if let Some(callback_url) = &request.callback_url {
            builder = builder.header(CALLBACK_URL_HEADER, callback_url);
        }

        let response = builder.send().await?;
        if response.status() == StatusCode::ACCEPTED {
            let accepted: SearchAccepted = decode_json(response).await?;
            Ok(SearchOutcome::Accepted(accepted))
        } else if response.status().is_success() {
            let page: PeoplePage = decode_or_default(response).await?;
            Ok(SearchOutcome::Sync(page))
        } else {
            Err(api_error(response).await)
        }
    }

    /// GET /people/{id}
    pub async fn get(&self, id: PersonId) -> Result<Person, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/people/{}", id.0)))
            .send()
            .await?;
        decode_json(response).await
    }

    /// POST /people: full payload create.
    pub async fn create(&self, person: &NewPerson) -> Result<Person, ClientError> {
        let response = self
            .http
            .post(self.url("/people"))
            .json(person)
            .send()
            .await?;
        decode_json(response).await
    }

    /// PATCH /people/{id}: sparse map of only the changed attributes. An
    /// empty patch is rejected locally; the backend would refuse it anyway.
    pub async fn update(&self, id: PersonId, patch: &PersonPatch) -> Result<Person, ClientError> {
        if patch.is_empty() {
            return Err(ClientError::Validation(
                "update payload cannot be empty".to_string(),
            ));
        }
        let response = self
            .http
            .patch(self.url(&format!("/people/{}", id.0)))
            .json(patch)
            .send()
            .await?;
        decode_json(response).await
    }

    /// DELETE /people/{id}
    pub async fn delete(&self, id: PersonId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/people/{}", id.0)))
            .send()
            .await?;
        expect_success(response).await
    }

    /// DELETE /people/nationality/{nationality}: bulk delete.
    pub async fn delete_by_nationality(&self, nationality: Country) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/people/nationality/{}", nationality.as_str())))
            .send()
            .await?;
        expect_success(response).await
    }

    /// DELETE /people/location: deletes one person at an exact location.
    /// The coordinates travel in the body.
    pub async fn delete_by_location(
        &self,
        location: &LocationSelector,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url("/people/location"))
            .json(location)
            .send()
            .await?;
        expect_success(response).await
    }

    /// GET /people/location/greater?x&y&z: people whose location
    /// coordinates are all greater than the given ones.
    pub async fn located_beyond(
        &self,
        location: &LocationSelector,
    ) -> Result<PeoplePage, ClientError> {
        let response = self
            .http
            .get(self.url("/people/location/greater"))
            .query(&[
                ("x", location.x.to_string()),
                ("y", location.y.to_string()),
                ("z", location.z.to_string()),
            ])
            .send()
            .await?;
        decode_or_default(response).await
    }
}

#[async_trait]
impl ListBackend for PeopleClient {
    async fn fetch_page(&self, query: ListQuery) -> Result<PeoplePage, ClientError> {
        self.list(&query).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
