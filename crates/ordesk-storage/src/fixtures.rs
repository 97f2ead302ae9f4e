// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seed data shared by the query module tests.

use ordesk_core::types::{Package, User};
use ordesk_core::{AccountStatus, Order, OrderStatus, Ticket, TicketStatus, UserRole};
use rusqlite::Connection;
use tempfile::TempDir;

use crate::queries::{orders, packages, tickets, users};
use crate::Database;

pub(crate) const TS: &str = "2026-01-01T00:00:00.000Z";

pub(crate) async fn open_seeded() -> (Database, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("seeded.db");
    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
    db.call(|conn| seed(conn)).await.unwrap();
    (db, dir)
}

fn seed(conn: &Connection) -> Result<(), ordesk_core::OrdeskError> {
    for (id, role) in [
        ("brand-1", UserRole::Brand),
        ("creator-1", UserRole::Creator),
        ("agent-a", UserRole::Agent),
        ("agent-b", UserRole::Agent),
    ] {
        users::upsert(
            conn,
            &User {
                id: id.into(),
                display_name: id.into(),
                role,
                status: AccountStatus::Active,
                created_at: TS.into(),
            },
        )?;
    }
    packages::insert(
        conn,
        &Package {
            id: "pkg-1".into(),
            creator_id: "creator-1".into(),
            title: "Launch video".into(),
            price: 2500,
            currency: "USD".into(),
            active: true,
            created_at: TS.into(),
        },
    )
}

pub(crate) fn order(id: &str) -> Order {
    Order {
        id: id.into(),
        package_id: "pkg-1".into(),
        brand_id: "brand-1".into(),
        creator_id: "creator-1".into(),
        quantity: 1,
        total_amount: 2500,
        currency: "USD".into(),
        status: OrderStatus::Pending,
        created_at: TS.into(),
    }
}

pub(crate) fn ticket(id: &str, order_id: &str, agent_id: &str) -> Ticket {
    Ticket {
        id: id.into(),
        order_id: order_id.into(),
        assigned_agent_id: agent_id.into(),
        status: TicketStatus::Open,
        channel_id: format!("pending-{id}"),
        channel_pending: true,
        created_at: TS.into(),
        updated_at: TS.into(),
    }
}

/// Insert an order and its ticket in one go.
pub(crate) fn order_with_ticket(
    conn: &Connection,
    order_id: &str,
    ticket_id: &str,
    agent_id: &str,
) -> Result<(), ordesk_core::OrdeskError> {
    orders::insert(conn, &order(order_id))?;
    tickets::insert(conn, &ticket(ticket_id, order_id, agent_id))
}
