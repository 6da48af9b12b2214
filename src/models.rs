use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub u64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// TodoItem as returned by the service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: TodoId,
    pub name: String,
    pub is_completed: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub tenant_id: String,
}

impl TodoItem {
    pub fn memo_text(&self) -> &str {
        self.memo.as_deref().unwrap_or("")
    }

    pub fn image_url_text(&self) -> &str {
        self.image_url.as_deref().unwrap_or("")
    }
}

#[derive(Serialize, Debug)]
pub struct NewTodo<'a> {
    pub name: &'a str,
}

/// PATCH body. Optional fields go out as empty strings, never `null`.
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoUpdate<'a> {
    pub name: &'a str,
    pub memo: &'a str,
    pub image_url: &'a str,
    pub is_completed: bool,
}

impl<'a> From<&'a TodoItem> for TodoUpdate<'a> {
    fn from(item: &'a TodoItem) -> Self {
        TodoUpdate {
            name: &item.name,
            memo: item.memo_text(),
            image_url: item.image_url_text(),
            is_completed: item.is_completed,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct UploadedImage {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_deserialize_item_with_null_fields() {
        let item: TodoItem = serde_json::from_value(json!({
            "id": 7,
            "tenantId": "doit",
            "name": "Buy milk",
            "isCompleted": false,
            "imageUrl": null,
            "memo": null
        }))
        .unwrap();

        assert_eq!(
            item,
            TodoItem {
                id: TodoId(7),
                name: "Buy milk".to_string(),
                is_completed: false,
                image_url: None,
                memo: None,
                tenant_id: "doit".to_string(),
            }
        );
    }

    #[test]
    fn test_deserialize_item_without_optional_fields() {
        let item: TodoItem =
            serde_json::from_value(json!({ "id": 1, "name": "A", "isCompleted": true })).unwrap();
        assert_eq!(item.memo, None);
        assert_eq!(item.image_url, None);
        assert_eq!(item.tenant_id, "");
    }

    #[test]
    fn test_update_body_sends_empty_strings_for_missing_fields() {
        let item = TodoItem {
            id: TodoId(3),
            name: "Walk".to_string(),
            is_completed: true,
            image_url: None,
            memo: None,
            tenant_id: "doit".to_string(),
        };

        let body = serde_json::to_value(TodoUpdate::from(&item)).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "Walk",
                "memo": "",
                "imageUrl": "",
                "isCompleted": true
            })
        );
    }

    #[test]
    fn test_update_body_keeps_present_fields() {
        let item = TodoItem {
            id: TodoId(3),
            name: "Walk".to_string(),
            is_completed: false,
            image_url: Some("https://img.example/a.png".to_string()),
            memo: Some("around the park".to_string()),
            tenant_id: String::new(),
        };

        let body = serde_json::to_value(TodoUpdate::from(&item)).unwrap();
        assert_eq!(body["imageUrl"], "https://img.example/a.png");
        assert_eq!(body["memo"], "around the park");
        assert!(body.get("tenantId").is_none());
    }
}
