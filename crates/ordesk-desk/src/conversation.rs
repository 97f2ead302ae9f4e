// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only conversation log bound to a ticket.
//!
//! Messages are ordered by insertion sequence. `created_at` is stamped on the
//! writer thread and never runs behind an earlier message on the same ticket,
//! so timestamp order agrees with `seq`. There is no edit or delete path; the
//! table triggers reject both.

use ordesk_bus::{DeskEvent, EventBus};
use ordesk_core::{now_timestamp, Message, NewMessage, OrdeskError};
use ordesk_storage::queries::{messages, tickets};
use ordesk_storage::Database;
use rusqlite::Connection;
use tracing::debug;

fn require_ticket(conn: &Connection, ticket_id: &str) -> Result<(), OrdeskError> {
    match tickets::get(conn, ticket_id)? {
        Some(_) => Ok(()),
        None => Err(OrdeskError::TicketNotFound(ticket_id.to_string())),
    }
}

/// Clamp `now` so it never sorts before the latest stored timestamp.
fn stamp_after(now: String, latest: Option<String>) -> String {
    match latest {
        Some(latest) if latest > now => latest,
        _ => now,
    }
}

#[derive(Clone)]
pub struct ConversationLog {
    db: Database,
    bus: EventBus,
}

impl ConversationLog {
    pub fn new(db: Database, bus: EventBus) -> Self {
        Self { db, bus }
    }

    /// Append a message. Fails only when the ticket does not exist.
    pub async fn append(&self, ticket_id: &str, input: NewMessage) -> Result<Message, OrdeskError> {
        let mut message = Message {
            seq: 0,
            id: uuid::Uuid::new_v4().to_string(),
            ticket_id: ticket_id.to_string(),
            sender_id: input.sender_id,
            sender_role: input.sender_role,
            body: input.body,
            attachment: input.attachment,
            kind: input.kind,
            created_at: String::new(),
        };

        let mut row = message.clone();
        (message.seq, message.created_at) = self
            .db
            .call(move |conn| {
                require_ticket(conn, &row.ticket_id)?;
                let latest = messages::latest_created_at(conn, &row.ticket_id)?;
                row.created_at = stamp_after(now_timestamp(), latest);
                let seq = messages::insert(conn, &row)?;
                Ok((seq, row.created_at))
            })
            .await?;

        debug!(
            ticket_id,
            message_id = %message.id,
            seq = message.seq,
            sender_role = %message.sender_role,
            "message appended"
        );
        self.bus.publish(DeskEvent::MessageAppended {
            ticket_id: message.ticket_id.clone(),
            message_id: message.id.clone(),
            seq: message.seq,
        });
        Ok(message)
    }

    /// The whole conversation, oldest first.
    pub async fn list(&self, ticket_id: &str) -> Result<Vec<Message>, OrdeskError> {
        let id = ticket_id.to_string();
        self.db
            .call(move |conn| {
                require_ticket(conn, &id)?;
                messages::list(conn, &id, None)
            })
            .await
    }

    /// Messages after `after_seq`, for incremental polling. Pass the `seq`
    /// of the last message already seen.
    pub async fn list_after(
        &self,
        ticket_id: &str,
        after_seq: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, OrdeskError> {
        let id = ticket_id.to_string();
        self.db
            .call(move |conn| {
                require_ticket(conn, &id)?;
                messages::list_after(conn, &id, after_seq, limit)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_order, orchestrator, seed_agents, seed_catalog, test_db};
    use ordesk_core::{MessageKind, SenderRole};

    fn text(sender: &str, role: SenderRole, body: &str) -> NewMessage {
        NewMessage {
            sender_id: sender.into(),
            sender_role: role,
            body: body.into(),
            attachment: None,
            kind: MessageKind::Text,
        }
    }

    #[tokio::test]
    async fn appended_messages_list_in_order_and_stay_stable() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["agent-a"]).await;
        let bus = EventBus::default();
        let created = orchestrator(db.clone(), bus.clone())
            .create_order_with_ticket(new_order())
            .await
            .unwrap();
        let log = ConversationLog::new(db, bus);
        let ticket_id = created.ticket.id.as_str();

        let m1 = log
            .append(ticket_id, text("brand-1", SenderRole::Brand, "where is my video?"))
            .await
            .unwrap();
        let m2 = log
            .append(ticket_id, text("agent-a", SenderRole::Agent, "checking now"))
            .await
            .unwrap();
        let m3 = log
            .append(ticket_id, NewMessage::system("creator notified"))
            .await
            .unwrap();

        let first = log.list(ticket_id).await.unwrap();
        let second = log.list(ticket_id).await.unwrap();
        assert_eq!(first, vec![m1.clone(), m2.clone(), m3.clone()]);
        assert_eq!(first, second);

        let tail = log.list_after(ticket_id, m1.seq, None).await.unwrap();
        assert_eq!(tail, vec![m2, m3]);
    }

    #[tokio::test]
    async fn append_never_stamps_behind_an_earlier_message() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["agent-a"]).await;
        let bus = EventBus::default();
        let created = orchestrator(db.clone(), bus.clone())
            .create_order_with_ticket(new_order())
            .await
            .unwrap();
        let ticket_id = created.ticket.id.clone();

        // A row stamped in the future, as after a wall-clock step back.
        let future = Message {
            seq: 0,
            id: "from-the-future".into(),
            ticket_id: ticket_id.clone(),
            sender_id: "brand-1".into(),
            sender_role: SenderRole::Brand,
            body: "ahead".into(),
            attachment: None,
            kind: MessageKind::Text,
            created_at: "2999-01-01T00:00:00.000Z".into(),
        };
        let first_seq = db
            .call(move |conn| messages::insert(conn, &future))
            .await
            .unwrap();

        let log = ConversationLog::new(db, bus);
        let appended = log
            .append(&ticket_id, text("agent-a", SenderRole::Agent, "behind"))
            .await
            .unwrap();
        assert!(appended.seq > first_seq);
        assert!(appended.created_at.as_str() >= "2999-01-01T00:00:00.000Z");

        let page = log.list_after(&ticket_id, 0, Some(1)).await.unwrap();
        assert_eq!(page[0].id, "from-the-future");
        let rest = log.list_after(&ticket_id, page[0].seq, None).await.unwrap();
        assert_eq!(rest, vec![appended]);
    }

    #[test]
    fn stamp_after_keeps_the_later_timestamp() {
        let now = "2026-01-01T00:00:01.000Z".to_string();
        assert_eq!(stamp_after(now.clone(), None), now);
        assert_eq!(
            stamp_after(now.clone(), Some("2026-01-01T00:00:00.500Z".into())),
            now
        );
        assert_eq!(
            stamp_after(now, Some("2026-01-01T00:00:02.000Z".into())),
            "2026-01-01T00:00:02.000Z"
        );
    }

    #[tokio::test]
    async fn unknown_ticket_is_not_found() {
        let (db, _dir) = test_db().await;
        let log = ConversationLog::new(db, EventBus::default());

        assert!(matches!(
            log.append("missing", NewMessage::system("hello")).await,
            Err(OrdeskError::TicketNotFound(_))
        ));
        assert!(matches!(
            log.list("missing").await,
            Err(OrdeskError::TicketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn append_publishes_event() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["agent-a"]).await;
        let bus = EventBus::default();
        let created = orchestrator(db.clone(), bus.clone())
            .create_order_with_ticket(new_order())
            .await
            .unwrap();
        let mut rx = bus.subscribe();
        let log = ConversationLog::new(db, bus);

        let message = log
            .append(&created.ticket.id, NewMessage::system("hi"))
            .await
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(
            event.payload,
            DeskEvent::MessageAppended {
                ticket_id: created.ticket.id.clone(),
                message_id: message.id,
                seq: message.seq,
            }
        );
    }
}
