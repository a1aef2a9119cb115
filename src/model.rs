//! Topic and subscription records as delivered by the Pub/Sub REST API.
//!
//! The graph core only reads these; the fetch layer that produces them is
//! external. Documents are accepted either as the REST list envelope
//! (`{"topics": [...], "nextPageToken": "..."}`) or as a bare JSON array.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Resource labels. Ordered so that label scans are deterministic.
pub type Labels = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceState {
    Active,
    Deleted,
    ResourceError,
    #[serde(other)]
    Unspecified,
}

impl ResourceState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Deleted => "DELETED",
            Self::ResourceError => "RESOURCE_ERROR",
            Self::Unspecified => "STATE_UNSPECIFIED",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStoragePolicy {
    #[serde(default)]
    pub allowed_persistence_regions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSettings {
    pub schema: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ResourceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_storage_policy: Option<MessageStoragePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_settings: Option<SchemaSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfies_pzs: Option<bool>,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    pub fn project_id(&self) -> Option<&str> {
        project_id(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcToken {
    #[serde(default)]
    pub service_account_email: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushConfig {
    #[serde(default)]
    pub push_endpoint: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc_token: Option<OidcToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterPolicy {
    pub dead_letter_topic: String,
    #[serde(default)]
    pub max_delivery_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    #[serde(default)]
    pub minimum_backoff: Option<String>,
    #[serde(default)]
    pub maximum_backoff: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub name: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_config: Option<PushConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_deadline_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain_acked_messages: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_retention_duration: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_letter_policy: Option<DeadLetterPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_message_ordering: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_exactly_once_delivery: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ResourceState>,
}

impl Subscription {
    pub fn new(name: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topic: topic.into(),
            ..Self::default()
        }
    }

    pub fn with_push_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.push_config = Some(PushConfig {
            push_endpoint: endpoint.into(),
            ..PushConfig::default()
        });
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    pub fn topic_short_name(&self) -> &str {
        short_name(&self.topic)
    }

    pub fn project_id(&self) -> Option<&str> {
        project_id(&self.name)
    }

    /// The push endpoint URL. The API reports pull subscriptions with an
    /// empty `pushConfig`, so an empty endpoint counts as absent.
    pub fn push_endpoint(&self) -> Option<&str> {
        self.push_config
            .as_ref()
            .map(|config| config.push_endpoint.as_str())
            .filter(|endpoint| !endpoint.is_empty())
    }

    pub fn delivery(&self) -> DeliveryType {
        if self.push_endpoint().is_some() {
            DeliveryType::Push
        } else {
            DeliveryType::Pull
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    Push,
    Pull,
}

impl DeliveryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "Push",
            Self::Pull => "Pull",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicsResponse {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionsResponse {
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TopicsDocument {
    List(Vec<Topic>),
    Envelope(TopicsResponse),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SubscriptionsDocument {
    List(Vec<Subscription>),
    Envelope(SubscriptionsResponse),
}

/// A strictly parsed `projects/{project}/{collection}/{name}` resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
    pub project_id: String,
    pub name: String,
}

/// Last `/`-separated segment of a resource name.
pub fn short_name(resource: &str) -> &str {
    resource.rsplit('/').next().unwrap_or(resource)
}

/// Second segment of a `projects/{id}/...` name, if present and non-empty.
pub fn project_id(resource: &str) -> Option<&str> {
    resource.split('/').nth(1).filter(|id| !id.is_empty())
}

pub fn parse_topic_name(name: &str) -> Result<ResourceName, GraphError> {
    parse_resource_name(name, "topics")
        .ok_or_else(|| GraphError::InvalidTopicName(name.to_string()))
}

pub fn parse_subscription_name(name: &str) -> Result<ResourceName, GraphError> {
    parse_resource_name(name, "subscriptions")
        .ok_or_else(|| GraphError::InvalidSubscriptionName(name.to_string()))
}

fn parse_resource_name(name: &str, collection: &str) -> Option<ResourceName> {
    let parts: Vec<&str> = name.split('/').collect();
    match parts.as_slice() {
        ["projects", project, kind, resource]
            if *kind == collection && !project.is_empty() && !resource.is_empty() =>
        {
            Some(ResourceName {
                project_id: project.to_string(),
                name: resource.to_string(),
            })
        }
        _ => None,
    }
}

pub fn parse_topics(input: &str) -> Result<Vec<Topic>, GraphError> {
    let doc: TopicsDocument =
        serde_json::from_str(input).map_err(|source| GraphError::Json {
            what: "topics",
            source,
        })?;
    Ok(match doc {
        TopicsDocument::List(topics) => topics,
        TopicsDocument::Envelope(response) => response.topics,
    })
}

pub fn parse_subscriptions(input: &str) -> Result<Vec<Subscription>, GraphError> {
    let doc: SubscriptionsDocument =
        serde_json::from_str(input).map_err(|source| GraphError::Json {
            what: "subscriptions",
            source,
        })?;
    Ok(match doc {
        SubscriptionsDocument::List(subscriptions) => subscriptions,
        SubscriptionsDocument::Envelope(response) => response.subscriptions,
    })
}

/// Reads a topics document from `path`, or stdin when `path` is `-`.
pub fn load_topics(path: &Path) -> Result<Vec<Topic>, GraphError> {
    parse_topics(&read_document(path)?)
}

/// Reads a subscriptions document from `path`, or stdin when `path` is `-`.
pub fn load_subscriptions(path: &Path) -> Result<Vec<Subscription>, GraphError> {
    parse_subscriptions(&read_document(path)?)
}

fn read_document(path: &Path) -> Result<String, GraphError> {
    let io_err = |source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    };
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(io_err)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(io_err)
}
