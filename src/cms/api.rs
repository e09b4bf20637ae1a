use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use super::{
    ApiInfo, CmsError, DocumentClient, Predicate, QueryOptions, QueryResponse, orderings_param,
    predicates_param,
};

/// HTTP implementation of [`DocumentClient`].
///
/// Queries without an explicit ref use the API's master ref, which is read
/// from the root endpoint once and reused for the life of the client.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    endpoint: Url,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl ApiClient {
    pub fn new(endpoint: Url, access_token: Option<String>) -> Result<Self, CmsError> {
        if endpoint.cannot_be_a_base() {
            return Err(CmsError::NotABase(endpoint.to_string()));
        }
        let http = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self {
            http,
            endpoint,
            access_token,
            master_ref: OnceCell::new(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("spacetraveling/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The ref of the published content.
    pub async fn master_ref(&self) -> Result<String, CmsError> {
        self.master_ref
            .get_or_try_init(|| async {
                let mut url = self.endpoint.clone();
                if let Some(token) = &self.access_token {
                    url.query_pairs_mut().append_pair("access_token", token);
                }
                let info: ApiInfo = self.get_json(url).await?;
                info.master_ref()
                    .map(|r| r.reference.clone())
                    .ok_or_else(|| CmsError::NoMasterRef(self.endpoint.to_string()))
            })
            .await
            .cloned()
    }

    /// Build the search URL of a query against the given content ref.
    pub fn search_url(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
        reference: &str,
    ) -> Result<Url, CmsError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| CmsError::NotABase(self.endpoint.to_string()))?
            .pop_if_empty()
            .push("documents")
            .push("search");
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("ref", reference);
            if !predicates.is_empty() {
                qp.append_pair("q", &predicates_param(predicates));
            }
            if let Some(size) = options.page_size {
                qp.append_pair("pageSize", &size.to_string());
            }
            if let Some(after) = &options.after {
                qp.append_pair("after", after);
            }
            if !options.orderings.is_empty() {
                qp.append_pair("orderings", &orderings_param(&options.orderings));
            }
            if !options.fetch.is_empty() {
                qp.append_pair("fetch", &options.fetch.join(","));
            }
            if let Some(token) = &self.access_token {
                qp.append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CmsError> {
        debug!(%url, "GET");
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(CmsError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        serde_json::from_slice(&bytes).map_err(|source| CmsError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl DocumentClient for ApiClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse, CmsError> {
        let reference = match &options.reference {
            Some(r) => r.clone(),
            None => self.master_ref().await?,
        };
        let url = self.search_url(predicates, options, &reference)?;
        self.get_json(url).await
    }

    async fn fetch_page(&self, cursor: &Url) -> Result<QueryResponse, CmsError> {
        self.get_json(cursor.clone()).await
    }
}
