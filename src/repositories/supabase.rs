//! Hosted backend client
//!
//! Talks to a Supabase project over its REST surfaces: PostgREST for the
//! catalog tables (`/rest/v1/<table>`) and the Storage API for the image
//! bucket (`/storage/v1/object/...`). Every request carries the anon key as
//! both the `apikey` header and a bearer token.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};

use super::traits::{
    CategoryRow, CategoryRowPatch, DishRow, DishRowPatch, ObjectStore, TableStore,
};
use crate::config::RemoteConfig;
use crate::errors::{RemoteError, RemoteResult};
use crate::utils::UrlUtils;

const CATEGORIES_TABLE: &str = "categories";
const DISHES_TABLE: &str = "dishes";

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    cache_control: String,
}

impl SupabaseClient {
    pub fn new(
        client: Client,
        base_url: &str,
        anon_key: &str,
        bucket: &str,
        cache_control: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            bucket: bucket.to_string(),
            cache_control: cache_control.to_string(),
        }
    }

    /// Build a client when both endpoint and key are configured
    pub fn from_config(client: Client, config: &RemoteConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let url = config.url.as_deref()?;
        let key = config.anon_key.as_deref()?;
        Some(Self::new(
            client,
            url,
            key,
            &config.bucket,
            &config.cache_control,
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn storage_url(&self, suffix: &str) -> String {
        format!(
            "{}/storage/v1/object/{}{}",
            self.base_url, self.bucket, suffix
        )
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.anon_key)) {
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        headers
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url).headers(self.auth_headers())
    }

    /// Send and map transport failures and non-success statuses
    async fn send(&self, operation: &str, builder: RequestBuilder) -> RemoteResult<Response> {
        trace!("Remote store request: {}", operation);
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::transport(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::status(operation, status.as_u16(), body));
        }
        Ok(response)
    }

    async fn select_ordered<T: DeserializeOwned>(&self, table: &str) -> RemoteResult<Vec<T>> {
        let operation = format!("select {table}");
        let builder = self
            .request(Method::GET, &self.table_url(table))
            .query(&[("select", "*"), ("order", "sort_order.asc")]);
        let response = self.send(&operation, builder).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| RemoteError::invalid_response(operation, e.to_string()))
    }

    async fn count(&self, table: &str, filter: Option<(&str, String)>) -> RemoteResult<u64> {
        let operation = format!("count {table}");
        let mut builder = self
            .request(Method::HEAD, &self.table_url(table))
            .header("Prefer", "count=exact")
            .query(&[("select", "*")]);
        if let Some((column, value)) = filter {
            builder = builder.query(&[(column, value)]);
        }

        let response = self.send(&operation, builder).await?;
        let header = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| RemoteError::invalid_response(&operation, "missing Content-Range"))?;
        parse_content_range_total(header).ok_or_else(|| {
            RemoteError::invalid_response(&operation, format!("unparseable Content-Range '{header}'"))
        })
    }

    async fn insert<T: Serialize + ?Sized>(&self, table: &str, body: &T) -> RemoteResult<()> {
        let builder = self
            .request(Method::POST, &self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(body);
        self.send(&format!("insert {table}"), builder).await?;
        Ok(())
    }

    async fn upsert<T: Serialize + ?Sized>(&self, table: &str, body: &T) -> RemoteResult<()> {
        let builder = self
            .request(Method::POST, &self.table_url(table))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", "id")])
            .json(body);
        self.send(&format!("upsert {table}"), builder).await?;
        Ok(())
    }

    async fn patch_eq<T: Serialize + ?Sized>(
        &self,
        table: &str,
        column: &str,
        value: &str,
        body: &T,
    ) -> RemoteResult<()> {
        let builder = self
            .request(Method::PATCH, &self.table_url(table))
            .header("Prefer", "return=minimal")
            .query(&[(column, format!("eq.{value}"))])
            .json(body);
        self.send(&format!("update {table}"), builder).await?;
        Ok(())
    }

    async fn delete_eq(&self, table: &str, column: &str, value: &str) -> RemoteResult<()> {
        let builder = self
            .request(Method::DELETE, &self.table_url(table))
            .query(&[(column, format!("eq.{value}"))]);
        self.send(&format!("delete {table}"), builder).await?;
        Ok(())
    }
}

/// Total from a PostgREST `Content-Range` header (`0-9/42`, `*/0`)
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl TableStore for SupabaseClient {
    async fn select_categories(&self) -> RemoteResult<Vec<CategoryRow>> {
        self.select_ordered(CATEGORIES_TABLE).await
    }

    async fn select_dishes(&self) -> RemoteResult<Vec<DishRow>> {
        self.select_ordered(DISHES_TABLE).await
    }

    async fn count_categories(&self) -> RemoteResult<u64> {
        self.count(CATEGORIES_TABLE, None).await
    }

    async fn count_dishes_in_category(&self, category_id: &str) -> RemoteResult<u64> {
        self.count(DISHES_TABLE, Some(("category_id", format!("eq.{category_id}"))))
            .await
    }

    async fn insert_category(&self, row: &CategoryRow) -> RemoteResult<()> {
        self.insert(CATEGORIES_TABLE, row).await
    }

    async fn insert_dish(&self, row: &DishRow) -> RemoteResult<()> {
        self.insert(DISHES_TABLE, row).await
    }

    async fn update_dish(&self, dish_id: &str, patch: &DishRowPatch) -> RemoteResult<()> {
        self.patch_eq(DISHES_TABLE, "id", dish_id, patch).await
    }

    async fn update_category(
        &self,
        category_id: &str,
        patch: &CategoryRowPatch,
    ) -> RemoteResult<()> {
        self.patch_eq(CATEGORIES_TABLE, "id", category_id, patch)
            .await
    }

    async fn delete_dish(&self, dish_id: &str) -> RemoteResult<()> {
        self.delete_eq(DISHES_TABLE, "id", dish_id).await
    }

    async fn delete_dishes_in_category(&self, category_id: &str) -> RemoteResult<()> {
        self.delete_eq(DISHES_TABLE, "category_id", category_id)
            .await
    }

    async fn delete_category(&self, category_id: &str) -> RemoteResult<()> {
        self.delete_eq(CATEGORIES_TABLE, "id", category_id).await
    }

    async fn upsert_categories(&self, rows: &[CategoryRow]) -> RemoteResult<()> {
        self.upsert(CATEGORIES_TABLE, rows).await
    }

    async fn upsert_dishes(&self, rows: &[DishRow]) -> RemoteResult<()> {
        self.upsert(DISHES_TABLE, rows).await
    }
}

#[async_trait]
impl ObjectStore for SupabaseClient {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> RemoteResult<()> {
        let size = bytes.len();
        let builder = self
            .request(Method::POST, &self.storage_url(&format!("/{path}")))
            .header(CONTENT_TYPE, content_type)
            .header("cache-control", format!("max-age={}", self.cache_control))
            .header("x-upsert", "false")
            .body(bytes);
        self.send("upload object", builder).await?;
        debug!("Uploaded {} ({} bytes) to bucket {}", path, size, self.bucket);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        UrlUtils::storage_public_url(&self.base_url, &self.bucket, path)
    }

    async fn remove(&self, paths: &[String]) -> RemoteResult<()> {
        let builder = self
            .request(Method::DELETE, &self.storage_url(""))
            .json(&json!({ "prefixes": paths }));
        self.send("remove objects", builder).await?;
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
