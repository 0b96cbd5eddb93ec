// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Elasticsearch driver implementation
//!
//! Every namespace+table pair gets its own index, addressed through the
//! single-type `_doc` API that 6.2+ through 8.x clusters all accept:
//!
//! ```text
//! DatabaseInfo (name, table) -> index "<name>.<table>"
//! Record.id                  -> /<index>/_doc/<id>, Record -> _source
//! ```
//!
//! Namespaces may not contain `.`, so the index name stays unambiguous.
//!
//! Search is delegated to the cluster: `match_all` for an empty term map,
//! otherwise a `query_string` of `field:(value)` clauses joined with `AND`,
//! sorted on `created` then `id`.

use super::handle::{first_node, stamp_write, HandleState};
use super::traits::{Database, Driver};
use super::types::DriverKind;
use crate::config::ElasticsearchConfig;
use crate::error::{DbError, DbResult};
use crate::model::{DatabaseInfo, Node, Record, SearchQuery};
use log::{debug, info, warn};
use parking_lot::RwLock;
use reqwest::{Method, Url};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Document type used on every index
const DOC_TYPE: &str = "_doc";

/// Decoded HTTP response from the cluster
#[derive(Debug, Clone, PartialEq)]
pub struct EsResponse {
    pub status: u16,
    /// JSON body; `Null` when empty, a JSON string when not JSON
    pub body: Value,
}

impl EsResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn error_type(&self) -> Option<&str> {
        self.body.pointer("/error/type").and_then(Value::as_str)
    }

    /// Backend error describing a failed request
    fn into_error(self, context: &str) -> DbError {
        let reason = self
            .body
            .pointer("/error/reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.body.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| self.body.to_string());
        let message = format!("{} failed with status {}: {}", context, self.status, reason);
        match self.status {
            429 | 502 | 503 | 504 => DbError::transient(message),
            _ => DbError::backend(message),
        }
    }
}

/// HTTP access to one cluster node
///
/// `path` holds unencoded segments; implementations percent-encode them.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        method: Method,
        path: &[&str],
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> DbResult<EsResponse>;
}

/// Blocking reqwest transport
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base: Url,
    username: Option<String>,
    password: Option<String>,
}

impl HttpTransport {
    pub fn new(node: &Node, config: &ElasticsearchConfig) -> DbResult<Self> {
        let base = Url::parse(&format!(
            "{}://{}:{}/",
            config.scheme, node.address, node.port
        ))
        .map_err(|e| DbError::Config(format!("Invalid elasticsearch node {}: {}", node, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &[&str], query: &[(&str, &str)]) -> DbResult<Url> {
        // The url crate drops dot segments instead of encoding them
        if let Some(segment) = path.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(DbError::InvalidRecord(format!(
                "path segment '{}' cannot be addressed",
                segment
            )));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DbError::Config(format!("Base URL {} cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(path);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        method: Method,
        path: &[&str],
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> DbResult<EsResponse> {
        let url = self.url(path, query)?;
        let mut request = self.client.request(method, url);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let text = response.text()?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text))
        };
        Ok(EsResponse { status, body })
    }
}

/// Elasticsearch driver
pub struct ElasticsearchDriver {
    config: ElasticsearchConfig,
}

impl ElasticsearchDriver {
    pub fn new(config: ElasticsearchConfig) -> Self {
        Self { config }
    }
}

impl Driver for ElasticsearchDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Elasticsearch
    }

    fn new_db(&self, nodes: &[Node]) -> DbResult<Box<dyn Database>> {
        let node = first_node(nodes)?;
        debug!("Connecting to elasticsearch at {}", node);

        let transport = HttpTransport::new(node, &self.config)?;
        let db = ElasticsearchDatabase::connect(Arc::new(transport), self.config.refresh_on_write)?;
        Ok(Box::new(db))
    }
}

#[derive(Debug, Clone)]
struct IndexBinding {
    index: String,
}

/// Index holding one namespace+table
fn index_name(database: &DatabaseInfo) -> DbResult<String> {
    if database.name.contains('.') {
        return Err(DbError::NotAvailable(format!(
            "elasticsearch namespace '{}' may not contain '.'",
            database.name
        )));
    }
    Ok(format!("{}.{}", database.name, database.table))
}

/// Ids the document API can address
fn document_id(id: &str) -> DbResult<&str> {
    match id {
        "" | "." | ".." => Err(DbError::InvalidRecord(format!(
            "elasticsearch cannot address document id '{}'",
            id
        ))),
        _ => Ok(id),
    }
}

struct EsInner {
    transport: Option<Arc<dyn Transport>>,
    state: HandleState<IndexBinding>,
}

impl EsInner {
    fn transport(&self) -> DbResult<&Arc<dyn Transport>> {
        self.transport
            .as_ref()
            .ok_or_else(|| DbError::NotAvailable("elasticsearch connection is closed".into()))
    }

    fn bound(&self) -> DbResult<(&IndexBinding, &Arc<dyn Transport>)> {
        let binding = self.state.bound()?;
        Ok((binding, self.transport()?))
    }
}

/// Elasticsearch database handle
pub struct ElasticsearchDatabase {
    inner: RwLock<EsInner>,
    refresh_on_write: bool,
}

impl ElasticsearchDatabase {
    /// Probe cluster health and return an unbound handle
    pub fn connect(transport: Arc<dyn Transport>, refresh_on_write: bool) -> DbResult<Self> {
        let response = transport.send(Method::GET, &["_cluster", "health"], &[], None)?;
        if !response.is_success() {
            return Err(response.into_error("cluster health check"));
        }

        Ok(Self {
            inner: RwLock::new(EsInner {
                transport: Some(transport),
                state: HandleState::Unbound,
            }),
            refresh_on_write,
        })
    }

    /// Query parameters making a write visible to search before returning
    fn refresh_query(&self) -> &'static [(&'static str, &'static str)] {
        if self.refresh_on_write {
            &[("refresh", "wait_for")]
        } else {
            &[]
        }
    }

    fn index_exists(transport: &dyn Transport, index: &str) -> bool {
        match transport.send(Method::HEAD, &[index], &[], None) {
            Ok(response) if response.is_success() => true,
            Ok(response) if response.status == 404 => false,
            Ok(response) => {
                warn!(
                    "Existence probe for index '{}' returned status {}",
                    index, response.status
                );
                false
            }
            Err(e) => {
                warn!("Existence probe for index '{}' failed: {}", index, e);
                false
            }
        }
    }

    fn write(&self, record: &mut Record) -> DbResult<()> {
        let inner = self.inner.read();
        let (binding, transport) = inner.bound()?;
        document_id(&record.id)?;

        stamp_write(record)?;
        let body = serde_json::to_value(&*record)?;

        debug!("Indexing document '{}' into {}", record.id, binding.index);
        let response = transport.send(
            Method::PUT,
            &[binding.index.as_str(), DOC_TYPE, record.id.as_str()],
            self.refresh_query(),
            Some(&body),
        )?;
        if !response.is_success() {
            return Err(response.into_error("index document"));
        }
        Ok(())
    }
}

impl Database for ElasticsearchDatabase {
    fn init(&self, database: &DatabaseInfo) -> DbResult<()> {
        let mut inner = self.inner.write();
        inner.state.ensure_open()?;
        database.validate()?;
        let index = index_name(database)?;
        let transport = inner.transport()?.clone();

        if !Self::index_exists(transport.as_ref(), &index) {
            let response = transport.send(Method::PUT, &[index.as_str()], &[], None)?;
            if response.is_success() {
                info!("Created index '{}'", index);
            } else if response.status == 400
                && matches!(
                    response.error_type(),
                    Some("resource_already_exists_exception" | "index_already_exists_exception")
                )
            {
                warn!("Index '{}' was created concurrently", index);
            } else {
                return Err(response.into_error("create index"));
            }
        }

        info!("Elasticsearch handle bound to {} (index '{}')", database, index);
        inner.state = HandleState::Bound(IndexBinding { index });
        Ok(())
    }

    fn close(&self) -> DbResult<()> {
        let mut inner = self.inner.write();
        if inner.transport.take().is_some() {
            info!("Elasticsearch handle closed");
        }
        inner.state = HandleState::Closed;
        Ok(())
    }

    fn create(&self, record: &mut Record) -> DbResult<()> {
        self.write(record)
    }

    fn read(&self, id: &str) -> DbResult<Option<Record>> {
        let inner = self.inner.read();
        let (binding, transport) = inner.bound()?;
        let id = document_id(id)?;

        let response = transport.send(
            Method::GET,
            &[binding.index.as_str(), DOC_TYPE, id],
            &[],
            None,
        )?;
        if response.body.get("found").and_then(Value::as_bool) == Some(false) {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(response.into_error("get document"));
        }

        let source = response
            .body
            .get("_source")
            .cloned()
            .ok_or_else(|| DbError::Serialization(format!("document '{}' has no _source", id)))?;
        Ok(Some(serde_json::from_value(source)?))
    }

    fn update(&self, record: &mut Record) -> DbResult<()> {
        self.write(record)
    }

    fn delete(&self, id: &str) -> DbResult<()> {
        let inner = self.inner.read();
        let (binding, transport) = inner.bound()?;
        let id = document_id(id)?;

        debug!("Deleting document '{}' from {}", id, binding.index);
        let response = transport.send(
            Method::DELETE,
            &[binding.index.as_str(), DOC_TYPE, id],
            self.refresh_query(),
            None,
        )?;
        if response.is_success() || response.status == 404 {
            return Ok(());
        }
        Err(response.into_error("delete document"))
    }

    fn search(&self, query: &SearchQuery) -> DbResult<Vec<Record>> {
        let inner = self.inner.read();
        let (binding, transport) = inner.bound()?;

        let body = search_body(query);
        debug!("Searching {} with {}", binding.index, body);
        let response = transport.send(
            Method::POST,
            &[binding.index.as_str(), "_search"],
            &[],
            Some(&body),
        )?;
        if !response.is_success() {
            return Err(response.into_error("search"));
        }

        let hits = response
            .body
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .ok_or_else(|| DbError::Serialization("search response has no hits".into()))?;

        hits.iter()
            .map(|hit| {
                let source = hit.get("_source").cloned().ok_or_else(|| {
                    DbError::Serialization("search hit has no _source".into())
                })?;
                Ok(serde_json::from_value(source)?)
            })
            .collect()
    }
}

/// Request body for a search
pub(crate) fn search_body(query: &SearchQuery) -> Value {
    let (offset, limit) = query.page();
    let order = if query.reverse { "desc" } else { "asc" };
    let matcher = if query.terms.is_empty() {
        json!({ "match_all": {} })
    } else {
        json!({
            "query_string": {
                "query": query_string(&query.terms),
                "default_operator": "AND",
            }
        })
    };

    json!({
        "from": offset,
        "size": limit,
        "sort": [
            { "created": { "order": order, "unmapped_type": "long" } },
            { "id.keyword": { "order": order, "unmapped_type": "keyword" } },
        ],
        "query": matcher,
    })
}

/// `field:(value) AND ...`; an empty value only requires the field to exist
pub(crate) fn query_string(terms: &BTreeMap<String, String>) -> String {
    terms
        .iter()
        .map(|(field, value)| {
            let field = escape_field(field);
            if value.is_empty() {
                format!("_exists_:{}", field)
            } else {
                format!("{}:({})", field, escape_value(value))
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

// `*` and `?` stay live in values so terms can match substrings. `<` and `>`
// cannot be escaped, and bare operator words are lowercased so the analyzer
// treats them as plain tokens.
fn escape_value(value: &str) -> String {
    let stripped: String = value.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let words = stripped
        .split(' ')
        .map(|word| match word {
            "AND" | "OR" | "NOT" => word.to_lowercase(),
            _ => word.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    escape(
        &words,
        &[
            '\\', '+', '-', '=', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~',
            ':', '/',
        ],
    )
}

fn escape_field(field: &str) -> String {
    escape(
        field,
        &[
            '\\', '+', '-', '=', '&', '|', '>', '<', '!', '(', ')', '{', '}', '[', ']', '^', '"',
            '~', '*', '?', ':', '/', ' ',
        ],
    )
}

fn escape(input: &str, reserved: &[char]) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if reserved.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
