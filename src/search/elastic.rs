use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::marker::PhantomData;
use std::time::Duration;

use super::{SearchEngine, SearchError};
use crate::config::SearchConfig;
use crate::domain::Entity;

/// Elasticsearch REST client for the index named after the entity
pub struct ElasticsearchEngine<E> {
    client: Client,
    base_url: String,
    _phantom: PhantomData<E>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse<E> {
    hits: Hits<E>,
}

#[derive(Debug, Deserialize)]
struct Hits<E> {
    hits: Vec<Hit<E>>,
}

#[derive(Debug, Deserialize)]
struct Hit<E> {
    #[serde(rename = "_source")]
    source: E,
}

impl<E: Entity> ElasticsearchEngine<E> {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            _phantom: PhantomData,
        })
    }

    fn document_url(&self, id: i64) -> String {
        format!("{}/{}/_doc/{}", self.base_url, E::NAME, id)
    }

    fn search_url(&self) -> String {
        format!("{}/{}/_search", self.base_url, E::NAME)
    }

    async fn error_for(response: reqwest::Response) -> SearchError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SearchError::Status { status, body }
    }
}

#[async_trait]
impl<E: Entity> SearchEngine<E> for ElasticsearchEngine<E> {
    async fn index(&self, id: i64, record: &E) -> Result<(), SearchError> {
        let response = self.client.put(self.document_url(id)).json(record).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), SearchError> {
        let response = self.client.delete(self.document_url(id)).send().await?;
        // Already absent from the index
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        Ok(())
    }

    async fn query(&self, query: &str) -> Result<Vec<E>, SearchError> {
        let body = json!({ "query": { "query_string": { "query": query } } });
        let response = self.client.post(self.search_url()).json(&body).send().await?;
        // The index is created on the first write, so until then nothing matches
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Index {} does not exist yet, answering an empty search", E::NAME);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let parsed: SearchResponse<E> = response.json().await?;
        Ok(parsed.hits.hits.into_iter().map(|hit| hit.source).collect())
    }
}
