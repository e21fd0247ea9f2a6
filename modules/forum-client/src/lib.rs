pub mod error;
pub mod types;

pub use error::{ForumError, Result};
pub use types::{DirectMessage, ForumPost, ForumReply, TopicView};

/// Read-only client for the discussion/messaging API.
///
/// Every call is bearer-token authenticated. Non-2xx responses surface as
/// `ForumError::Api` with the body text, so callers can log and move on.
pub struct ForumClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ForumClient {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Fetch a topic's view: root posts plus nested replies.
    pub async fn topic_view(&self, topic_id: &str) -> Result<TopicView> {
        let url = format!("{}/topics/{}/view", self.base_url, topic_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ForumError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let view: TopicView = resp.json().await?;
        tracing::debug!(topic_id, posts = view.posts.len(), "Fetched topic view");
        Ok(view)
    }

    /// Fetch the flat direct-message feed.
    pub async fn direct_messages(&self) -> Result<Vec<DirectMessage>> {
        let url = format!("{}/messages", self.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ForumError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let messages: Vec<DirectMessage> = resp.json().await?;
        tracing::debug!(count = messages.len(), "Fetched direct messages");
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_view_parses_nested_replies() {
        let raw = r#"{
            "topicId": "t-9",
            "title": "Homework help",
            "posts": [
                {
                    "id": "p-1",
                    "authorId": "u-4",
                    "body": "first post",
                    "createdAt": "2026-03-01T09:30:00Z",
                    "replies": [
                        {"id": "c-1", "authorId": "u-5", "body": "a reply", "createdAt": "2026-03-01T10:00:00Z"}
                    ]
                }
            ]
        }"#;
        let view: TopicView = serde_json::from_str(raw).unwrap();
        assert_eq!(view.topic_id.as_deref(), Some("t-9"));
        assert_eq!(view.posts.len(), 1);
        assert_eq!(view.posts[0].replies.len(), 1);
        assert_eq!(view.posts[0].replies[0].id.as_deref(), Some("c-1"));
    }

    #[test]
    fn topic_view_tolerates_missing_fields() {
        let raw = r#"{"posts": [{"id": "p-2"}]}"#;
        let view: TopicView = serde_json::from_str(raw).unwrap();
        assert_eq!(view.posts.len(), 1);
        assert!(view.posts[0].body.is_none());
        assert!(view.posts[0].replies.is_empty());
    }
}
