//! Blocking HTTP client for an Elasticsearch cluster.

use super::{IndexService, MergeStatus};
use crate::config::ElasticsearchConfig;
use crate::models::{Mapping, Settings};
use crate::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Certificate, Method};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// [`IndexService`] over the Elasticsearch REST API.
pub struct ElasticsearchClient {
    base_url: String,
    user: Option<String>,
    password: Option<String>,
    http: Client,
}

#[derive(Serialize)]
struct CreateIndexBody<'a> {
    settings: &'a Settings,
    mappings: &'a Mapping,
}

impl ElasticsearchClient {
    pub fn new(config: &ElasticsearchConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_seconds));
        if let Some(path) = &config.ca_cert {
            let pem = std::fs::read(path).map_err(|e| Error::io(path, e))?;
            let certificate = Certificate::from_pem(&pem)
                .map_err(|e| Error::malformed(path, format!("invalid CA certificate: {}", e)))?;
            builder = builder.add_root_certificate(certificate);
        }
        let http = builder
            .build()
            .map_err(|e| Error::ExternalService(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            user: config.user.clone(),
            password: config.password.clone(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        debug!("{} {}", method, url);
        let builder = self.http.request(method, url);
        match &self.user {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }

    fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        builder
            .send()
            .map_err(|e| Error::ExternalService(format!("{} failed: {}", what, e)))
    }

    /// Send and require a 2xx response.
    fn send_ok(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = self.send(builder, what)?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().unwrap_or_default();
        Err(Error::ExternalService(format!(
            "{} returned {}: {}",
            what, status, body
        )))
    }

    /// HEAD request mapping 200 to true and 404 to false.
    fn exists(&self, path: &str, what: &str) -> Result<bool> {
        let response = self.send(self.request(Method::HEAD, path), what)?;
        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(Error::ExternalService(format!(
                "{} returned unexpected status {}",
                what, status
            ))),
        }
    }
}

fn encode(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

/// Sum `nodes.*.thread_pool.force_merge.active` from a node stats response.
fn active_force_merges(stats: &Value) -> u64 {
    stats
        .get("nodes")
        .and_then(Value::as_object)
        .map(|nodes| {
            nodes
                .values()
                .filter_map(|node| node.pointer("/thread_pool/force_merge/active"))
                .filter_map(Value::as_u64)
                .sum()
        })
        .unwrap_or(0)
}

impl IndexService for ElasticsearchClient {
    fn index_exists(&self, index: &str) -> Result<bool> {
        self.exists(&encode(index), &format!("index exists check for '{}'", index))
    }

    fn create_index(&self, index: &str, settings: &Settings, mappings: &Mapping) -> Result<()> {
        let body = CreateIndexBody { settings, mappings };
        let builder = self.request(Method::PUT, &encode(index)).json(&body);
        self.send_ok(builder, &format!("create index '{}'", index))?;
        Ok(())
    }

    fn delete_index(&self, index: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &encode(index));
        self.send_ok(builder, &format!("delete index '{}'", index))?;
        Ok(())
    }

    fn put_alias(&self, alias: &str, index: &str) -> Result<()> {
        let path = format!("{}/_alias/{}", encode(index), encode(alias));
        self.send_ok(
            self.request(Method::PUT, &path),
            &format!("put alias '{}' on '{}'", alias, index),
        )?;
        Ok(())
    }

    fn alias_exists(&self, alias: &str) -> Result<bool> {
        self.exists(
            &format!("_alias/{}", encode(alias)),
            &format!("alias exists check for '{}'", alias),
        )
    }

    fn force_merge(&self, indices: &[String], max_segments: u32) -> Result<MergeStatus> {
        let targets: Vec<String> = indices.iter().map(|i| encode(i)).collect();
        let path = format!(
            "{}/_forcemerge?max_num_segments={}",
            targets.join(","),
            max_segments
        );
        match self.request(Method::POST, &path).send() {
            Ok(response) if response.status().is_success() => Ok(MergeStatus::Completed),
            Ok(response) => {
                let status = response.status();
                let body = response.text().unwrap_or_default();
                Err(Error::ExternalService(format!(
                    "force merge returned {}: {}",
                    status, body
                )))
            }
            Err(e) if e.is_timeout() => Ok(MergeStatus::TimedOut),
            Err(e) => Err(Error::ExternalService(format!("force merge failed: {}", e))),
        }
    }

    fn force_merge_active(&self) -> Result<u64> {
        let response = self.send_ok(
            self.request(Method::GET, "_nodes/stats/thread_pool"),
            "node stats",
        )?;
        let stats: Value = response
            .json()
            .map_err(|e| Error::ExternalService(format!("node stats response: {}", e)))?;
        Ok(active_force_merges(&stats))
    }
}
