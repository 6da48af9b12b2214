use crate::config::Config;
use crate::error::ApiError;
use crate::models::{NewTodo, TodoId, TodoItem, TodoUpdate, UploadedImage};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

/// Calls against the remote todo service. No retries, no caching.
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list(&self, page: u32, page_size: u32) -> Result<Vec<TodoItem>, ApiError>;
    async fn create(&self, name: &str) -> Result<TodoItem, ApiError>;
    async fn get(&self, id: TodoId) -> Result<TodoItem, ApiError>;
    async fn update(&self, item: &TodoItem) -> Result<TodoItem, ApiError>;
    async fn remove(&self, id: TodoId) -> Result<(), ApiError>;
    async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError>;
}

pub struct TodoClient {
    client: Client,
    base_url: String,
    tenant_id: String,
}

impl TodoClient {
    pub fn new(config: &Config) -> Result<TodoClient, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(TodoClient {
            client,
            base_url: config.base_url(),
            tenant_id: config.tenant_id.clone(),
        })
    }

    fn items_url(&self) -> String {
        format!("{}/items", self.base_url)
    }

    fn item_url(&self, id: TodoId) -> String {
        format!("{}/items/{}", self.base_url, id)
    }

    fn upload_url(&self) -> String {
        format!("{}/images/upload", self.base_url)
    }

    fn stamp(&self, mut item: TodoItem) -> TodoItem {
        item.tenant_id = self.tenant_id.clone();
        item
    }
}

#[async_trait]
impl TodoApi for TodoClient {
    async fn list(&self, page: u32, page_size: u32) -> Result<Vec<TodoItem>, ApiError> {
        debug!(page, page_size, "listing todos");
        let res = self
            .client
            .get(self.items_url())
            .query(&[("page", page), ("pageSize", page_size)])
            .send()
            .await?;

        let items = check(res, None).await?.json::<Vec<TodoItem>>().await?;
        Ok(items.into_iter().map(|item| self.stamp(item)).collect())
    }

    async fn create(&self, name: &str) -> Result<TodoItem, ApiError> {
        debug!(name, "creating todo");
        let res = self
            .client
            .post(self.items_url())
            .json(&NewTodo { name })
            .send()
            .await?;

        let item = check(res, None).await?.json::<TodoItem>().await?;
        Ok(self.stamp(item))
    }

    async fn get(&self, id: TodoId) -> Result<TodoItem, ApiError> {
        debug!(%id, "fetching todo");
        let res = self.client.get(self.item_url(id)).send().await?;

        let item = check(res, Some(id)).await?.json::<TodoItem>().await?;
        Ok(self.stamp(item))
    }

    async fn update(&self, item: &TodoItem) -> Result<TodoItem, ApiError> {
        debug!(id = %item.id, "updating todo");
        let res = self
            .client
            .patch(self.item_url(item.id))
            .json(&TodoUpdate::from(item))
            .send()
            .await?;

        let item = check(res, Some(item.id)).await?.json::<TodoItem>().await?;
        Ok(self.stamp(item))
    }

    async fn remove(&self, id: TodoId) -> Result<(), ApiError> {
        debug!(%id, "deleting todo");
        let res = self.client.delete(self.item_url(id)).send().await?;
        check(res, Some(id)).await?;
        Ok(())
    }

    async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        debug!(file_name, size = bytes.len(), "uploading image");
        let upload_err = |err: reqwest::Error| ApiError::Upload(err.to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(image_mime(file_name))
            .map_err(upload_err)?;
        let form = Form::new().part("image", part);

        let res = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(upload_err)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Upload(format!("{}: {}", status, body)));
        }

        let uploaded = res.json::<UploadedImage>().await.map_err(upload_err)?;
        Ok(uploaded.url)
    }
}

async fn check(res: Response, id: Option<TodoId>) -> Result<Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(error_for_status(status, id, body))
}

fn error_for_status(status: StatusCode, id: Option<TodoId>, body: String) -> ApiError {
    match id {
        Some(id) if status == StatusCode::NOT_FOUND => ApiError::NotFound(id),
        _ => ApiError::Service { status, body },
    }
}

fn image_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
