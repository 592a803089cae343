//! DynamoDB-backed session storage: one record per session in a single table.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType, TableStatus, TimeToLiveSpecification,
};
use aws_sdk_dynamodb::Client;
use chrono::Utc;

use crate::item::{decode_items, encode_items, SessionItem};
use crate::traits::Session;

const ATTR_SESSION_ID: &str = "session_id";
const ATTR_DATA: &str = "conversation_data";
const ATTR_UPDATED_AT: &str = "updated_at";
const ATTR_TTL: &str = "ttl";

const TABLE_POLL_INTERVAL: Duration = Duration::from_secs(1);
const TABLE_POLL_ATTEMPTS: usize = 30;

/// Session storage backed by a DynamoDB table.
///
/// Each session is one record keyed by `session_id`: the whole history lives
/// in a `conversation_data` string attribute holding a JSON array, next to a
/// numeric `updated_at` write timestamp and, when a TTL is configured, a
/// numeric `ttl` attribute with the absolute expiry in epoch seconds. The
/// `ttl` attribute only has effect on tables with attribute-based expiration
/// enabled for that name (see [`create_table_if_not_exists`]).
///
/// `add_items` and `pop_item` are read-modify-write over the whole record
/// with no conditional check, so concurrent writers to the same session can
/// lose an update; the last whole-record write wins. Callers that need
/// stronger guarantees should serialize access per session id themselves.
///
/// # Example
///
/// ```no_run
/// use agent_sessions::{DynamoDbSession, Session, SessionItem};
///
/// # async fn run() -> anyhow::Result<()> {
/// let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
/// let client = aws_sdk_dynamodb::Client::new(&config);
///
/// let session = DynamoDbSession::new("user-123", client, "agent_sessions").with_ttl(3600);
/// session
///     .add_items(vec![SessionItem::message("user", "Hello")])
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct DynamoDbSession {
    session_id: String,
    client: Client,
    table_name: String,
    ttl_seconds: Option<u64>,
}

impl DynamoDbSession {
    /// Binds a session id to a caller-supplied client and table. No I/O
    /// happens until the first operation.
    pub fn new(
        session_id: impl Into<String>,
        client: Client,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            client,
            table_name: table_name.into(),
            ttl_seconds: None,
        }
    }

    /// Expires the record `seconds` after its last write. Reads do not
    /// refresh the expiry.
    #[must_use]
    pub fn with_ttl(mut self, seconds: u64) -> Self {
        self.ttl_seconds = Some(seconds);
        self
    }

    async fn read_all(&self) -> Result<Vec<SessionItem>> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ATTR_SESSION_ID, AttributeValue::S(self.session_id.clone()))
            .projection_expression(ATTR_DATA)
            .send()
            .await?;
        // A missing record and a record without the data attribute both read
        // as an empty history.
        let data = response
            .item()
            .and_then(|record| record.get(ATTR_DATA))
            .and_then(|attr| attr.as_s().ok())
            .map_or("[]", String::as_str);
        Ok(decode_items(data)?)
    }

    async fn write_all(&self, items: &[SessionItem]) -> Result<()> {
        let now = Utc::now().timestamp();
        let mut request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item(ATTR_SESSION_ID, AttributeValue::S(self.session_id.clone()))
            .item(ATTR_DATA, AttributeValue::S(encode_items(items)?))
            .item(ATTR_UPDATED_AT, AttributeValue::N(now.to_string()));
        if let Some(seconds) = self.ttl_seconds {
            let expires_at = now + seconds as i64;
            request = request.item(ATTR_TTL, AttributeValue::N(expires_at.to_string()));
        }
        request.send().await?;
        Ok(())
    }
}

#[async_trait]
impl Session for DynamoDbSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn get_items(&self, limit: Option<usize>) -> Result<Vec<SessionItem>> {
        // The empty suffix needs no read.
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        let mut items = self.read_all().await?;
        if let Some(n) = limit {
            let keep_from = items.len().saturating_sub(n);
            items = items.split_off(keep_from);
        }
        Ok(items)
    }

    async fn add_items(&self, items: Vec<SessionItem>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let added = items.len();
        let mut stored = self.read_all().await?;
        stored.extend(items);
        self.write_all(&stored).await?;
        tracing::debug!(
            session_id = %self.session_id,
            count = added,
            total = stored.len(),
            "appended session items"
        );
        Ok(())
    }

    async fn pop_item(&self) -> Result<Option<SessionItem>> {
        let mut items = self.read_all().await?;
        match items.pop() {
            Some(popped) => {
                self.write_all(&items).await?;
                Ok(Some(popped))
            }
            None => Ok(None),
        }
    }

    async fn clear_session(&self) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(ATTR_SESSION_ID, AttributeValue::S(self.session_id.clone()))
            .send()
            .await?;
        tracing::debug!(session_id = %self.session_id, "cleared session");
        Ok(())
    }
}

/// Creates the session table if it does not exist and waits until it is
/// usable, optionally enabling attribute-based expiration on the `ttl`
/// attribute.
///
/// Convenience for development and tests. Production tables are normally
/// provisioned by infrastructure tooling; the backend itself never calls
/// this.
pub async fn create_table_if_not_exists(
    client: &Client,
    table_name: &str,
    enable_ttl: bool,
) -> Result<()> {
    match client.describe_table().table_name(table_name).send().await {
        Ok(_) => return Ok(()),
        Err(err)
            if err
                .as_service_error()
                .is_some_and(|service| service.is_resource_not_found_exception()) => {}
        Err(err) => return Err(err.into()),
    }

    tracing::info!(table = %table_name, "creating session table");
    client
        .create_table()
        .table_name(table_name)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(ATTR_SESSION_ID)
                .key_type(KeyType::Hash)
                .build()?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(ATTR_SESSION_ID)
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await?;
    wait_until_active(client, table_name).await?;

    if enable_ttl {
        client
            .update_time_to_live()
            .table_name(table_name)
            .time_to_live_specification(
                TimeToLiveSpecification::builder()
                    .enabled(true)
                    .attribute_name(ATTR_TTL)
                    .build()?,
            )
            .send()
            .await?;
    }
    Ok(())
}

async fn wait_until_active(client: &Client, table_name: &str) -> Result<()> {
    for _ in 0..TABLE_POLL_ATTEMPTS {
        let described = client.describe_table().table_name(table_name).send().await?;
        let active = described.table().and_then(|table| table.table_status())
            == Some(&TableStatus::Active);
        if active {
            return Ok(());
        }
        tokio::time::sleep(TABLE_POLL_INTERVAL).await;
    }
    anyhow::bail!("table `{table_name}` was not active after {TABLE_POLL_ATTEMPTS} checks")
}
