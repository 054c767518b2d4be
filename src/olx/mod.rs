use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::classify::{LookupError, UserDirectory};
use crate::config::{Olx, SearchParam};
use crate::olx::model::{OffersResponse, UserResponse};

pub mod model;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SEARCH_QUERY: &str = r#"query ListingSearchQuery($searchParameters: [SearchParameter!]) {
  clientCompatibleListings(searchParameters: $searchParameters) {
    __typename
    ... on ListingSuccess {
      data {
        id
        title
        url
        description
        created_time
        last_refresh_time
        location { district { name } }
        contact { name phone }
        user { id uuid }
        params {
          key
          value {
            ... on PriceParam { value currency }
          }
        }
      }
    }
  }
}"#;

/// Where a polling cycle gets its raw search response from.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// `Ok(None)` means the response carried no usable data this cycle.
    async fn fetch_listings(&self) -> Result<Option<Value>>;
}

#[derive(Clone)]
pub struct OlxClient {
    http: Client,
    graphql_url: Url,
    api_base: Url,
    search: Vec<SearchParam>,
}

impl fmt::Debug for OlxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OlxClient")
            .field("graphql_url", &self.graphql_url)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl OlxClient {
    pub fn from_config(cfg: &Olx) -> Result<Self> {
        let graphql_url = Url::parse(&cfg.graphql_url).context("invalid olx.graphql_url")?;
        let mut base = cfg.api_base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_base = Url::parse(&base).context("invalid olx.api_base")?;
        let http = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            graphql_url,
            api_base,
            search: cfg.search.clone(),
        })
    }

    pub fn search_body(&self) -> Value {
        json!({
            "query": SEARCH_QUERY,
            "variables": { "searchParameters": self.search },
        })
    }

    pub fn build_search_request(&self) -> Result<reqwest::Request> {
        self.http
            .post(self.graphql_url.clone())
            .header("Content-Type", "application/json")
            .json(&self.search_body())
            .build()
            .context("failed to build search request")
    }

    pub fn user_url(&self, user_id: &str) -> Result<Url, LookupError> {
        self.api_base
            .join(&format!("users/{}/", user_id))
            .map_err(bad_url)
    }

    pub fn offers_url(&self, user_uuid: &str) -> Result<Url, LookupError> {
        let mut url = self.api_base.join("offers/").map_err(bad_url)?;
        url.query_pairs_mut()
            .append_pair("offset", "0")
            .append_pair("limit", "10")
            .append_pair("category_id", "0")
            .append_pair("sort_by", "created_at:desc")
            .append_pair("query", "")
            .append_pair("user_id", user_uuid);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, LookupError> {
        let res = self.http.get(url).send().await?;
        if res.status() != StatusCode::OK {
            return Err(LookupError::Status(res.status()));
        }
        let body = res.text().await?;
        serde_json::from_str(&body).map_err(|e| LookupError::Malformed(e.to_string()))
    }
}

fn bad_url(err: impl fmt::Display) -> LookupError {
    LookupError::Malformed(format!("bad lookup url: {err}"))
}

#[async_trait]
impl ListingSource for OlxClient {
    async fn fetch_listings(&self) -> Result<Option<Value>> {
        let request = self.build_search_request()?;
        debug!(url = %request.url(), "searching listings");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach marketplace")?;
        let status = res.status();
        if !status.is_success() {
            warn!(%status, "search returned non-success status");
        }
        let body = res.text().await.context("failed to read search response")?;
        parse_search_body(&body)
    }
}

/// Decode a search response body. Anything but a JSON object carries no listings.
fn parse_search_body(body: &str) -> Result<Option<Value>> {
    let data: Value = serde_json::from_str(body).context("invalid search response JSON")?;
    if !data.is_object() {
        warn!("search response is not a JSON object; nothing to process");
        return Ok(None);
    }
    Ok(Some(data))
}

#[async_trait]
impl UserDirectory for OlxClient {
    async fn is_business(&self, user_id: &str) -> Result<bool, LookupError> {
        let resp: UserResponse = self.get_json(self.user_url(user_id)?).await?;
        let is_business = resp.is_business();
        info!(user_id, is_business, "checked business status");
        Ok(is_business)
    }

    async fn real_estate_listings_count(&self, user_uuid: &str) -> Result<u32, LookupError> {
        let resp: OffersResponse = self.get_json(self.offers_url(user_uuid)?).await?;
        let count = resp.real_estate_count();
        info!(user_uuid, count, "counted real estate listings");
        Ok(count)
    }
}
