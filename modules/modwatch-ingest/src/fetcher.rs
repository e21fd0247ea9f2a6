//! Pulls content out of the discussion API and normalizes it into
//! `ContentRecord`s. One topic failing never aborts the rest.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use forum_client::{DirectMessage, ForumClient, TopicView};
use modwatch_common::{normalize_timestamp, sanitize_body, ContentRecord, ContentType};

/// Seam over the discussion API so tests can run against a stub.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn topic_view(&self, topic_id: &str) -> forum_client::Result<TopicView>;

    async fn direct_messages(&self) -> forum_client::Result<Vec<DirectMessage>>;
}

#[async_trait]
impl ContentSource for ForumClient {
    async fn topic_view(&self, topic_id: &str) -> forum_client::Result<TopicView> {
        ForumClient::topic_view(self, topic_id).await
    }

    async fn direct_messages(&self) -> forum_client::Result<Vec<DirectMessage>> {
        ForumClient::direct_messages(self).await
    }
}

pub struct ContentFetcher<S> {
    source: S,
    topics: Vec<String>,
}

impl<S: ContentSource> ContentFetcher<S> {
    pub fn new(source: S, topics: Vec<String>) -> Self {
        Self { source, topics }
    }

    /// Fetch every configured topic plus the direct-message feed.
    /// Returns the union of all successfully parsed records; order is not
    /// significant. Failed topics are logged and skipped.
    pub async fn fetch_all(&self) -> Vec<ContentRecord> {
        let mut records = Vec::new();
        let mut topics_failed = 0u32;

        // Topics fetch concurrently, 5 at a time; each failure is isolated.
        let results: Vec<_> = stream::iter(self.topics.clone().into_iter().map(|topic_id| async move {
            let result = self.source.topic_view(&topic_id).await;
            (topic_id, result)
        }))
        .buffer_unordered(5)
        .collect()
        .await;

        for (topic_id, result) in results {
            match result {
                Ok(view) => collect_topic(&view, &mut records),
                Err(e) => {
                    warn!(%topic_id, error = %e, "Topic fetch failed, skipping");
                    topics_failed += 1;
                }
            }
        }

        match self.source.direct_messages().await {
            Ok(messages) => {
                for msg in &messages {
                    if let Some(record) = message_record(msg) {
                        records.push(record);
                    }
                }
            }
            Err(e) => warn!(error = %e, "Message feed fetch failed, skipping"),
        }

        info!(
            records = records.len(),
            topics = self.topics.len(),
            topics_failed,
            "Content fetch complete"
        );
        records
    }
}

fn collect_topic(view: &TopicView, records: &mut Vec<ContentRecord>) {
    for post in &view.posts {
        let post_id = match non_empty(post.id.as_deref()) {
            Some(id) => id.to_string(),
            None => continue,
        };

        if let Some(record) = content_record(
            ContentType::Post,
            &post_id,
            None,
            post.author_id.as_deref(),
            post.body.as_deref(),
            post.created_at.as_deref(),
        ) {
            records.push(record);
        }

        for reply in &post.replies {
            let reply_id = match non_empty(reply.id.as_deref()) {
                Some(id) => id,
                None => continue,
            };
            if let Some(record) = content_record(
                ContentType::Comment,
                reply_id,
                Some(post_id.as_str()),
                reply.author_id.as_deref(),
                reply.body.as_deref(),
                reply.created_at.as_deref(),
            ) {
                records.push(record);
            }
        }
    }
}

fn message_record(msg: &DirectMessage) -> Option<ContentRecord> {
    let id = non_empty(msg.id.as_deref())?;
    content_record(
        ContentType::Message,
        id,
        None,
        msg.author_id.as_deref(),
        msg.body.as_deref(),
        msg.created_at.as_deref(),
    )
}

fn content_record(
    content_type: ContentType,
    content_id: &str,
    parent_id: Option<&str>,
    author_id: Option<&str>,
    body: Option<&str>,
    created_at: Option<&str>,
) -> Option<ContentRecord> {
    let raw_body = non_empty(body)?;
    let body = sanitize_body(raw_body);
    if body.is_empty() {
        debug!(content_id, "Body empty after sanitizing, skipping");
        return None;
    }

    let created_at = created_at
        .and_then(normalize_timestamp)
        .unwrap_or_else(Utc::now);

    Some(ContentRecord {
        content_type,
        content_id: content_id.to_string(),
        parent_id: parent_id.map(str::to_string),
        author_id: author_id
            .and_then(|a| non_empty(Some(a)))
            .map(str::to_string),
        body,
        created_at,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
