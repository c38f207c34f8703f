use chrono::{DateTime, Utc};
use serde_json::json;
use std::ops::Deref;

use bilingual_cms_postgrest::SortOrder;

use super::{timestamp, ContentRepository};
use crate::context::CmsContext;
use crate::error::Result;
use crate::i18n::Message;
use crate::models::{ContactMessage, MessageStatus, NewContactMessage};
use crate::store::{Filter, ListQuery};

/// Contact form inbox
pub struct MessageRepository {
    messages: ContentRepository<ContactMessage>,
}

impl Deref for MessageRepository {
    type Target = ContentRepository<ContactMessage>;

    fn deref(&self) -> &Self::Target {
        &self.messages
    }
}

impl MessageRepository {
    pub fn new(ctx: CmsContext) -> Self {
        Self {
            messages: ContentRepository::new(ctx),
        }
    }

    /// Public contact form. New messages always start as `new`.
    pub async fn submit(&self, message: &NewContactMessage) -> Result<ContactMessage> {
        let result = async {
            let mut fields = super::to_fields(message)?;
            fields.insert("status".to_string(), json!(MessageStatus::New));
            self.messages.insert_row(&fields).await
        }
        .await;
        match &result {
            Ok(_) => self.context().success(Message::MessageSent),
            Err(err) => self.context().failure(Message::SaveFailed, err),
        }
        result
    }

    /// Inbox view, newest first, optionally narrowed by status and a
    /// creation-time window (both bounds inclusive).
    pub async fn list_filtered(
        &self,
        status: Option<MessageStatus>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContactMessage>> {
        let mut query = ListQuery::new();
        if let Some(status) = status {
            query = query.filter(Filter::eq("status", status.as_str()));
        }
        if let Some(from) = from {
            query = query.filter(Filter::gte("created_at", timestamp(from)));
        }
        if let Some(to) = to {
            query = query.filter(Filter::lte("created_at", timestamp(to)));
        }
        self.messages
            .list_with(query.order("created_at", SortOrder::Descending))
            .await
    }

    /// Any status may follow any other.
    pub async fn set_status(&self, id: &str, status: MessageStatus) -> Result<ContactMessage> {
        let result = self
            .messages
            .patch_row(id, &json!({ "status": status }), None)
            .await;
        match &result {
            Ok(_) => self.context().success(Message::StatusChanged),
            Err(err) => self.context().failure(Message::SaveFailed, err),
        }
        result
    }

    /// `new` messages among the loaded items
    pub fn unread_count(&self) -> usize {
        self.items()
            .iter()
            .filter(|message| message.status == MessageStatus::New)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::media::MemoryMediaStore;
    use crate::notify::RecordingNotifier;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn repo() -> MessageRepository {
        MessageRepository::new(CmsContext::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryMediaStore::new("https://cdn.test")),
            Arc::new(RecordingNotifier::new()),
            Language::En,
        ))
    }

    fn form(name: &str) -> NewContactMessage {
        NewContactMessage {
            name: name.into(),
            email: format!("{}@example.com", name),
            message: "Hello".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn status_transitions_are_unconstrained() {
        let inbox = repo();
        let msg = inbox.submit(&form("sara")).await.unwrap();
        assert_eq!(msg.status, MessageStatus::New);

        for status in [MessageStatus::Archived, MessageStatus::New, MessageStatus::Replied, MessageStatus::Read] {
            let updated = inbox.set_status(&msg.id, status).await.unwrap();
            assert_eq!(updated.status, status);
        }
    }

    #[tokio::test]
    async fn unread_count_tracks_status_changes() {
        let inbox = repo();
        let a = inbox.submit(&form("a")).await.unwrap();
        inbox.submit(&form("b")).await.unwrap();
        inbox.list().await.unwrap();
        assert_eq!(inbox.unread_count(), 2);

        inbox.set_status(&a.id, MessageStatus::Read).await.unwrap();
        assert_eq!(inbox.unread_count(), 1);
    }

    #[tokio::test]
    async fn date_window_is_inclusive() {
        let inbox = repo();
        let first = inbox.submit(&form("a")).await.unwrap();
        let second = inbox.submit(&form("b")).await.unwrap();
        let from = first.created_at.unwrap();
        let to = second.created_at.unwrap();

        let both = inbox.list_filtered(None, Some(from), Some(to)).await.unwrap();
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].id, second.id);

        let only_first = inbox.list_filtered(None, None, Some(from)).await.unwrap();
        assert_eq!(only_first.len(), 1);
        assert_eq!(only_first[0].id, first.id);
    }
}
