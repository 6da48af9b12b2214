use crate::api::TodoApi;
use crate::error::ApiError;
use crate::models::{TodoId, TodoItem};
use std::path::PathBuf;

/// A network call a view wants made. The app runs it off the UI loop and
/// hands the matching [`Response`] back to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    List { page: u32, page_size: u32 },
    Get(TodoId),
    Create(String),
    Update(TodoItem),
    Delete(TodoId),
    UploadImage(PathBuf),
}

#[derive(Debug)]
pub enum Response {
    Listed(Result<Vec<TodoItem>, ApiError>),
    Fetched(TodoId, Result<TodoItem, ApiError>),
    Created(String, Result<TodoItem, ApiError>),
    Updated(TodoId, Result<TodoItem, ApiError>),
    Deleted(TodoId, Result<(), ApiError>),
    ImageUploaded(Result<String, ApiError>),
}

impl Request {
    pub async fn run(self, api: &dyn TodoApi) -> Response {
        match self {
            Request::List { page, page_size } => Response::Listed(api.list(page, page_size).await),
            Request::Get(id) => Response::Fetched(id, api.get(id).await),
            Request::Create(name) => {
                let result = api.create(&name).await;
                Response::Created(name, result)
            }
            Request::Update(item) => Response::Updated(item.id, api.update(&item).await),
            Request::Delete(id) => Response::Deleted(id, api.remove(id).await),
            Request::UploadImage(path) => Response::ImageUploaded(upload_file(api, path).await),
        }
    }
}

async fn upload_file(api: &dyn TodoApi, path: PathBuf) -> Result<String, ApiError> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|err| ApiError::Upload(format!("{}: {}", path.display(), err)))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    api.upload_image(&file_name, bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;

    #[tokio::test]
    async fn test_upload_missing_file_is_upload_error() {
        let api = FakeApi::default();
        let response = Request::UploadImage(PathBuf::from("/nonexistent/cat.png"))
            .run(&api)
            .await;

        assert!(matches!(response, Response::ImageUploaded(Err(ApiError::Upload(_)))));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_reads_file_and_returns_url() {
        let path = std::env::temp_dir().join(format!("doit-upload-{}.png", std::process::id()));
        tokio::fs::write(&path, b"\x89PNG").await.unwrap();

        let api = FakeApi::default();
        let response = Request::UploadImage(path.clone()).run(&api).await;
        let _ = tokio::fs::remove_file(&path).await;

        match response {
            Response::ImageUploaded(Ok(url)) => assert!(url.ends_with(".png")),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let api = FakeApi::default();
        let created = api.create("A").await.unwrap();

        let deleted = Request::Delete(created.id).run(&api).await;
        assert!(matches!(deleted, Response::Deleted(_, Ok(()))));

        let fetched = Request::Get(created.id).run(&api).await;
        assert!(matches!(fetched, Response::Fetched(_, Err(ApiError::NotFound(_)))));
    }
}
