use serde::Deserialize;

/// A topic view: the root posts plus their nested replies.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicView {
    #[serde(rename = "topicId")]
    pub topic_id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub posts: Vec<ForumPost>,
}

/// A root post within a topic.
#[derive(Debug, Clone, Deserialize)]
pub struct ForumPost {
    pub id: Option<String>,
    #[serde(rename = "authorId")]
    pub author_id: Option<String>,
    pub body: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub replies: Vec<ForumReply>,
}

/// A reply nested under a root post.
#[derive(Debug, Clone, Deserialize)]
pub struct ForumReply {
    pub id: Option<String>,
    #[serde(rename = "authorId")]
    pub author_id: Option<String>,
    pub body: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

/// A direct message from the flat feed endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectMessage {
    pub id: Option<String>,
    #[serde(rename = "authorId")]
    pub author_id: Option<String>,
    pub body: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}
