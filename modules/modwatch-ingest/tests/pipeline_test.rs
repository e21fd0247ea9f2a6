//! End-to-end pipeline test: fetch → stage → upload against in-memory
//! stores and a stub content source.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use forum_client::{DirectMessage, ForumError, ForumPost, ForumReply, TopicView};
use modwatch_common::{
    ContentType, Incident, IncidentStatus, Severity, SeverityPolicy,
};
use modwatch_ingest::{fetch_and_stage, ContentFetcher, ContentSource, Stager, Uploader};
use modwatch_store::{IncidentStore, MemoryReports, MemoryStaging, MemoryStore, StagingStore};

// ---------------------------------------------------------------------------
// Stub content source
// ---------------------------------------------------------------------------

struct StubForum {
    views: HashMap<String, TopicView>,
    failing_topics: Vec<String>,
    messages: Vec<DirectMessage>,
}

#[async_trait]
impl ContentSource for StubForum {
    async fn topic_view(&self, topic_id: &str) -> forum_client::Result<TopicView> {
        if self.failing_topics.iter().any(|t| t == topic_id) {
            return Err(ForumError::Api {
                status: 500,
                message: "boom".into(),
            });
        }
        self.views
            .get(topic_id)
            .cloned()
            .ok_or_else(|| ForumError::Parse(format!("no such topic {topic_id}")))
    }

    async fn direct_messages(&self) -> forum_client::Result<Vec<DirectMessage>> {
        Ok(self.messages.clone())
    }
}

fn forum_fixture() -> StubForum {
    let post = ForumPost {
        id: Some("p-1".into()),
        author_id: Some("u-1".into()),
        body: Some("<p>flagged post</p>".into()),
        created_at: Some("2026-03-01T09:30:00Z".into()),
        replies: vec![
            ForumReply {
                id: Some("c-1".into()),
                author_id: Some("u-2".into()),
                body: Some("a reply".into()),
                created_at: Some("2026-03-01T10:00:00Z".into()),
            },
            ForumReply {
                id: Some("c-2".into()),
                author_id: Some("u-3".into()),
                body: Some("another reply".into()),
                created_at: Some("2026-03-01T10:05:00Z".into()),
            },
        ],
    };

    let mut views = HashMap::new();
    views.insert(
        "t-1".to_string(),
        TopicView {
            topic_id: Some("t-1".into()),
            title: Some("Flagged thread".into()),
            posts: vec![post],
        },
    );

    StubForum {
        views,
        failing_topics: vec!["t-down".to_string()],
        messages: vec![DirectMessage {
            id: Some("m-1".into()),
            author_id: Some("u-4".into()),
            body: Some("a message".into()),
            created_at: Some("2026-03-01T11:00:00Z".into()),
        }],
    }
}

fn report(id: &str, severity: Severity) -> Incident {
    Incident {
        incident_id: id.to_string(),
        content_id: "p-1".into(),
        content_type: ContentType::Post,
        author_id: "u-1".into(),
        severity_level: severity,
        status: IncidentStatus::PendingReview,
        timestamp: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pipeline_is_idempotent_end_to_end() {
    let topics = vec!["t-1".to_string(), "t-down".to_string()];
    let fetcher = ContentFetcher::new(forum_fixture(), topics);
    let staging = Arc::new(MemoryStaging::new());
    let stager = Stager::new(staging.clone());

    // First cycle: 1 post + 2 comments + 1 message, the failing topic skipped.
    let appended = fetch_and_stage(&fetcher, &stager).await.unwrap();
    assert_eq!(appended, 4);
    assert_eq!(staging.save_count(), 1);

    // Unchanged upstream: nothing new, no staging write.
    let appended = fetch_and_stage(&fetcher, &stager).await.unwrap();
    assert_eq!(appended, 0);
    assert_eq!(staging.save_count(), 1);

    let dataset = staging.load().await;
    assert_eq!(dataset.len(), 4);

    // Upload promotes everything once; a second run inserts nothing.
    let store = Arc::new(MemoryStore::new());
    let uploader = Uploader::new(
        store.clone(),
        staging.clone(),
        Arc::new(MemoryReports::new(vec![
            report("inc-1", Severity::Low),
            report("inc-2", Severity::Medium),
            report("inc-3", Severity::High),
        ])),
        SeverityPolicy::automated(),
    );

    let first = uploader.run().await.unwrap();
    assert_eq!(first.content_inserted, 4);
    assert_eq!(first.content_skipped, 0);
    assert_eq!(first.incidents_inserted, 2);
    assert_eq!(first.incidents_skipped, 1); // the medium report

    let second = uploader.run().await.unwrap();
    assert_eq!(second.content_inserted, 0);
    assert_eq!(second.content_skipped, 4);
    assert_eq!(second.incidents_inserted, 0);
    assert_eq!(second.incidents_skipped, 3);

    // The medium report never reached durable storage on the automated path.
    assert!(!store.incident_exists("inc-2").await.unwrap());
    assert!(store.incident_exists("inc-1").await.unwrap());
    assert!(store.incident_exists("inc-3").await.unwrap());
}

#[tokio::test]
async fn manual_policy_admits_what_the_automated_path_filters() {
    let store = Arc::new(MemoryStore::new());
    let uploader = Uploader::new(
        store.clone(),
        Arc::new(MemoryStaging::new()),
        Arc::new(MemoryReports::new(vec![report("inc-2", Severity::Medium)])),
        SeverityPolicy::manual(),
    );

    let stats = uploader.run().await.unwrap();
    assert_eq!(stats.incidents_inserted, 1);
    assert!(store.incident_exists("inc-2").await.unwrap());
}
