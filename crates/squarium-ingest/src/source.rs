//! Upstream launch source.
//!
//! [`ProductHuntClient`] pulls recent posts and their comments through the
//! Product Hunt v2 GraphQL API.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use squarium_core::config::SourceConfig;
use squarium_core::error::SquariumError;
use squarium_core::types::{SourceComment, SourceItem};

/// Remote feed of launched products.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Items created within the last `days_back` days, comments included.
    async fn fetch_recent(&self, days_back: u32) -> Result<Vec<SourceItem>, SquariumError>;
}

const RECENT_POSTS_QUERY: &str = r#"
query GetRecentPosts($postedAfter: DateTime!, $first: Int!, $commentsFirst: Int!) {
  posts(postedAfter: $postedAfter, first: $first) {
    edges {
      node {
        id
        name
        tagline
        description
        votesCount
        url
        createdAt
        comments(first: $commentsFirst) {
          edges {
            node {
              id
              body
              user { name }
              votesCount
              createdAt
            }
          }
        }
      }
    }
  }
}
"#;

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<PostsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct PostsData {
    posts: Connection<Post>,
}

#[derive(Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    edges: Vec<Edge<T>>,
}

#[derive(Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Post {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    tagline: String,
    description: Option<String>,
    #[serde(default)]
    votes_count: i64,
    #[serde(default)]
    url: String,
    created_at: DateTime<Utc>,
    comments: Option<Connection<Comment>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Comment {
    id: String,
    #[serde(default)]
    body: String,
    user: Option<User>,
    #[serde(default)]
    votes_count: i64,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct User {
    #[serde(default)]
    name: String,
}

impl From<Post> for SourceItem {
    fn from(post: Post) -> Self {
        let comments = post
            .comments
            .map(|c| c.edges.into_iter().map(|e| e.node.into()).collect())
            .unwrap_or_default();
        SourceItem {
            external_id: post.id,
            name: post.name,
            tagline: post.tagline,
            description: post.description.unwrap_or_default(),
            votes: post.votes_count,
            url: post.url,
            created_at: post.created_at,
            comments,
        }
    }
}

impl From<Comment> for SourceComment {
    fn from(comment: Comment) -> Self {
        SourceComment {
            external_id: comment.id,
            author: comment.user.map(|u| u.name).unwrap_or_default(),
            body: comment.body,
            votes: comment.votes_count,
            created_at: comment.created_at,
        }
    }
}

/// Product Hunt GraphQL client.
pub struct ProductHuntClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    posts_per_fetch: u32,
    comments_per_post: u32,
}

impl std::fmt::Debug for ProductHuntClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductHuntClient")
            .field("endpoint", &self.endpoint)
            .field("posts_per_fetch", &self.posts_per_fetch)
            .field("comments_per_post", &self.comments_per_post)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl ProductHuntClient {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            posts_per_fetch: config.posts_per_fetch,
            comments_per_post: config.comments_per_post,
        }
    }

    fn request_body(&self, posted_after: DateTime<Utc>) -> serde_json::Value {
        json!({
            "query": RECENT_POSTS_QUERY,
            "variables": {
                "postedAfter": posted_after.to_rfc3339(),
                "first": self.posts_per_fetch,
                "commentsFirst": self.comments_per_post,
            }
        })
    }
}

#[async_trait]
impl SourceClient for ProductHuntClient {
    async fn fetch_recent(&self, days_back: u32) -> Result<Vec<SourceItem>, SquariumError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SquariumError::Source("Product Hunt API key is not configured".to_string()))?;

        let posted_after = Utc::now() - Duration::days(i64::from(days_back));
        debug!(%posted_after, "Fetching Product Hunt posts");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.request_body(posted_after))
            .send()
            .await
            .map_err(|e| SquariumError::Source(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SquariumError::Source(format!(
                "Product Hunt API error ({}): {}",
                status, body
            )));
        }

        let parsed: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| SquariumError::Source(format!("invalid response: {}", e)))?;
        let items = parse_posts(parsed)?;

        info!(count = items.len(), days_back, "Fetched Product Hunt posts");
        Ok(items)
    }
}

fn parse_posts(response: GraphQlResponse) -> Result<Vec<SourceItem>, SquariumError> {
    match response.data {
        Some(data) => Ok(data
            .posts
            .edges
            .into_iter()
            .map(|e| e.node.into())
            .collect()),
        None => {
            let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
            Err(SquariumError::Source(format!(
                "GraphQL error: {}",
                if messages.is_empty() {
                    "no data returned".to_string()
                } else {
                    messages.join("; ")
                }
            )))
        }
    }
}
