//! Shared wiring for integration tests: in-memory adapters, a manual clock
//! and a small catalog.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nexchat::adapters::catalog::CatalogSchemaProvider;
use nexchat::adapters::clock::ManualClock;
use nexchat::adapters::document::InMemoryDocumentStore;
use nexchat::adapters::intent::KeywordIntentParser;
use nexchat::adapters::permissions::StubPermissionChecker;
use nexchat::adapters::presenter::MarkdownPresenter;
use nexchat::adapters::storage::InMemorySessionStore;
use nexchat::application::{
    HandleTurnCommand, HandleTurnHandler, IntakePorts, TurnConfig, TurnReply,
};
use nexchat::domain::foundation::{Actor, Timestamp, UserKey};
use nexchat::domain::intake::Session;
use nexchat::domain::schema::RecordType;
use nexchat::ports::{
    Document, DocumentStore, FieldPresenter, IntentParser, PermissionChecker, SchemaProvider,
    SessionStore, SessionStoreError,
};

/// 2025-06-15T15:06:40Z
pub const START: i64 = 1_750_000_000;

pub const CATALOG: &str = r#"
record_types:
  - name: Customer
    title_field: customer_name
    fields:
      - { name: customer_name, type: short_text, required: true }
      - name: customer_group
        type: select
        options: [Commercial, Individual]
        required: true
      - { name: territory, type: short_text }
    records:
      - { customer_name: Acme, customer_group: Commercial }
      - { customer_name: Acme Logistics, customer_group: Commercial }
      - { customer_name: Globex, customer_group: Commercial }

  - name: Work Order
    fields:
      - { name: title, type: short_text, required: true }
      - name: priority
        type: select
        options: [Alpha, Beta, Gamma]
        required: true
    subgroups:
      - { name: tasks, row_type: Work Order Task }

  - name: Work Order Task
    fields:
      - { name: code, type: short_text, required: true }

  - name: Sales Order
    fields:
      - { name: customer, type: reference, record_type: Customer, required: true }
      - { name: transaction_date, label: Date, type: date, required: true, default: Today }
      - { name: delivery_date, type: date, required: true, rules: [not_in_past] }
      - { name: discount, type: percent }
    subgroups:
      - { name: items, row_type: Sales Order Item }

  - name: Sales Order Item
    fields:
      - { name: item_code, label: Item, type: short_text, required: true }
      - { name: qty, label: Quantity, type: decimal, required: true, rules: [positive] }
"#;

pub fn user() -> UserKey {
    UserKey::new("ana@example.com").unwrap()
}

pub fn record_type(name: &str) -> RecordType {
    RecordType::new(name).unwrap()
}

/// Session store whose next `put` can lose a race against a concurrent
/// writer, and whose deletes can be made to fail.
#[derive(Clone)]
pub struct RacingSessionStore {
    inner: InMemorySessionStore,
    race_next_put: Arc<AtomicBool>,
    deletes_fail: Arc<AtomicBool>,
}

impl RacingSessionStore {
    pub fn new(inner: InMemorySessionStore) -> Self {
        Self {
            inner,
            race_next_put: Arc::new(AtomicBool::new(false)),
            deletes_fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn race_next_put(&self) {
        self.race_next_put.store(true, Ordering::SeqCst);
    }

    pub fn set_deletes_failing(&self, failing: bool) {
        self.deletes_fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for RacingSessionStore {
    async fn get(&self, user: &UserKey) -> Result<Option<Session>, SessionStoreError> {
        self.inner.get(user).await
    }

    async fn put(
        &self,
        user: &UserKey,
        session: &Session,
        ttl: Duration,
    ) -> Result<u64, SessionStoreError> {
        if self.race_next_put.swap(false, Ordering::SeqCst) {
            self.inner.put(user, session, ttl).await?;
        }
        self.inner.put(user, session, ttl).await
    }

    async fn delete(&self, user: &UserKey) -> Result<(), SessionStoreError> {
        if self.deletes_fail.load(Ordering::SeqCst) {
            return Err(SessionStoreError::Unavailable("delete refused".into()));
        }
        self.inner.delete(user).await
    }
}

/// Everything a turn touches, with handles to inspect it.
pub struct Harness {
    pub handler: Arc<HandleTurnHandler>,
    pub sessions: RacingSessionStore,
    pub documents: Arc<InMemoryDocumentStore>,
    pub clock: ManualClock,
    pub actor: Actor,
}

pub struct HarnessBuilder {
    intents: Option<Arc<dyn IntentParser>>,
    permissions: Arc<dyn PermissionChecker>,
    presenter: Arc<dyn FieldPresenter>,
}

impl HarnessBuilder {
    pub fn intents(mut self, intents: Arc<dyn IntentParser>) -> Self {
        self.intents = Some(intents);
        self
    }

    pub fn permissions(mut self, permissions: Arc<dyn PermissionChecker>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn presenter(mut self, presenter: Arc<dyn FieldPresenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub async fn build(self) -> Harness {
        let clock = ManualClock::new(Timestamp::from_unix_secs(START).unwrap());
        let catalog = CatalogSchemaProvider::from_yaml_str(CATALOG).unwrap();
        let rules = catalog.field_rules();

        let documents = Arc::new(
            InMemoryDocumentStore::new(Arc::new(clock.clone()))
                .with_title_fields(catalog.title_fields()),
        );
        for (rt, data) in catalog.seed_records() {
            documents.create(&rt, data).await.unwrap();
        }

        let schema: Arc<dyn SchemaProvider> = Arc::new(catalog);
        let intents = self
            .intents
            .unwrap_or_else(|| Arc::new(KeywordIntentParser::new(schema.clone())));
        let sessions = RacingSessionStore::new(InMemorySessionStore::new(Arc::new(clock.clone())));

        let ports = IntakePorts {
            sessions: Arc::new(sessions.clone()),
            schema,
            permissions: self.permissions,
            documents: documents.clone(),
            intents,
            presenter: self.presenter,
            clock: Arc::new(clock.clone()),
        };
        let handler = HandleTurnHandler::new(ports, TurnConfig::default()).with_field_rules(rules);

        Harness {
            handler: Arc::new(handler),
            sessions,
            documents,
            clock,
            actor: Actor::new(user(), vec!["sales".to_string()]),
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            intents: None,
            permissions: Arc::new(StubPermissionChecker::allowing()),
            presenter: Arc::new(MarkdownPresenter::default()),
        }
    }

    pub async fn new() -> Harness {
        Self::builder().build().await
    }

    pub async fn say(&self, message: &str) -> TurnReply {
        self.handler
            .handle(HandleTurnCommand {
                actor: self.actor.clone(),
                message: message.to_string(),
            })
            .await
    }

    /// Sends each message in order, returning the last reply.
    pub async fn say_all(&self, messages: &[&str]) -> TurnReply {
        let mut last = None;
        for message in messages {
            last = Some(self.say(message).await);
        }
        last.expect("at least one message")
    }

    pub async fn session(&self) -> Option<Session> {
        self.sessions.get(&self.actor.key).await.unwrap()
    }

    /// Documents created after seeding, of one record type.
    pub async fn created(&self, name: &str) -> Vec<Document> {
        let rt = record_type(name);
        self.documents
            .created()
            .await
            .into_iter()
            .filter(|d| d.record_type == rt)
            .collect()
    }

    pub async fn created_payloads(&self, name: &str) -> Vec<Value> {
        self.created(name)
            .await
            .into_iter()
            .map(|d| Value::Object(d.data))
            .collect()
    }
}
