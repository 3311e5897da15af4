use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{SearchEngine, SearchError};
use crate::domain::Entity;

/// In-process index scoring documents by matched query terms
pub struct MemorySearchEngine<E> {
    documents: RwLock<BTreeMap<i64, E>>,
    failing: AtomicBool,
}

impl<E: Entity> Default for MemorySearchEngine<E> {
    fn default() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            failing: AtomicBool::new(false),
        }
    }
}

impl<E: Entity> MemorySearchEngine<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose every call fails
    pub fn failing() -> Self {
        let engine = Self::new();
        engine.set_failing(true);
        engine
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn check(&self) -> Result<(), SearchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SearchError::Transport("search engine unavailable".to_string()));
        }
        Ok(())
    }
}

/// Lowercased words of every string and number leaf in the document
fn document_terms(value: &Value, terms: &mut Vec<String>) {
    match value {
        Value::String(s) => terms.extend(tokenize(s)),
        Value::Number(n) => terms.push(n.to_string()),
        Value::Array(items) => items.iter().for_each(|item| document_terms(item, terms)),
        Value::Object(map) => map.values().for_each(|item| document_terms(item, terms)),
        Value::Bool(_) | Value::Null => {}
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl<E: Entity> SearchEngine<E> for MemorySearchEngine<E> {
    async fn index(&self, id: i64, record: &E) -> Result<(), SearchError> {
        self.check()?;
        self.documents.write().await.insert(id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), SearchError> {
        self.check()?;
        self.documents.write().await.remove(&id);
        Ok(())
    }

    async fn query(&self, query: &str) -> Result<Vec<E>, SearchError> {
        self.check()?;
        let documents = self.documents.read().await;

        if query.trim() == "*" {
            return Ok(documents.values().cloned().collect());
        }

        let wanted: Vec<String> = tokenize(query).collect();
        let mut scored: Vec<(usize, &E)> = Vec::new();
        for record in documents.values() {
            let value = serde_json::to_value(record).map_err(|e| SearchError::Decode(e.to_string()))?;
            let mut terms = Vec::new();
            document_terms(&value, &mut terms);

            let score = wanted.iter().filter(|word| terms.contains(word)).count();
            if score > 0 {
                scored.push((score, record));
            }
        }

        // Stable sort keeps id order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().map(|(_, record)| record.clone()).collect())
    }
}
