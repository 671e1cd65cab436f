//! Invoice synchronizer and status mapper tests.

mod common;

use common::*;

use atelier::sync::{map_stripe_status, sync_invoice};

// ============ Status mapper ============

#[test]
fn test_status_mapping_table() {
    assert_eq!(map_stripe_status("draft"), InvoiceStatus::Draft);
    assert_eq!(map_stripe_status("open"), InvoiceStatus::Sent);
    assert_eq!(map_stripe_status("paid"), InvoiceStatus::Paid);
    assert_eq!(map_stripe_status("void"), InvoiceStatus::Draft);
    assert_eq!(map_stripe_status("uncollectible"), InvoiceStatus::Overdue);
}

#[test]
fn test_unknown_status_defaults_to_draft() {
    assert_eq!(map_stripe_status("deleted"), InvoiceStatus::Draft);
    assert_eq!(map_stripe_status(""), InvoiceStatus::Draft);
    assert_eq!(map_stripe_status("OPEN"), InvoiceStatus::Draft);
    assert_eq!(map_stripe_status("partially_paid"), InvoiceStatus::Draft);
}

// ============ Synchronizer ============

#[test]
fn test_sync_normalizes_open_invoice() {
    let mut conn = setup_test_db();
    let client = create_test_client(&conn, "ada@example.com");

    let inv = stripe_invoice("in_1234567890", "open", Some("ada@example.com"));
    let synced = sync_invoice(&mut conn, &inv).expect("sync should succeed");

    assert_eq!(synced.status, InvoiceStatus::Sent);
    assert_eq!(synced.total_cents, 250000);
    assert_eq!(synced.subtotal_cents, 250000);
    assert_eq!(synced.client_id, client.id);
    assert_eq!(synced.currency, "usd");
    assert_eq!(synced.issue_date, "2026-01-01");
    assert_eq!(synced.due_date, "2026-02-01");
    // No Stripe number yet - synthesized from the last 8 chars of the id
    assert_eq!(synced.invoice_number, "DRAFT-34567890");
    assert!(synced.synced_at.is_some());
}

#[test]
fn test_sync_keeps_provider_number_when_present() {
    let mut conn = setup_test_db();
    create_test_client(&conn, "ada@example.com");

    let mut inv = stripe_invoice("in_abc", "open", Some("ada@example.com"));
    inv.number = Some("INV-2026-004".to_string());
    let synced = sync_invoice(&mut conn, &inv).unwrap();

    assert_eq!(synced.invoice_number, "INV-2026-004");
}

#[test]
fn test_short_stripe_id_draft_number() {
    let mut conn = setup_test_db();
    create_test_client(&conn, "ada@example.com");

    let inv = stripe_invoice("in_123", "draft", Some("ada@example.com"));
    let synced = sync_invoice(&mut conn, &inv).unwrap();

    // Shorter than 8 chars: the whole id is used
    assert_eq!(synced.invoice_number, "DRAFT-in_123");
}

#[test]
fn test_sync_is_idempotent() {
    let mut conn = setup_test_db();
    create_test_client(&conn, "ada@example.com");

    let mut inv = stripe_invoice("in_repeat", "open", Some("ada@example.com"));
    inv.lines = Some(StripeList {
        data: vec![
            stripe_line("il_1", "Design sprint", 2, 200000),
            stripe_line("il_2", "Hosting", 1, 50000),
        ],
    });

    let first = sync_invoice(&mut conn, &inv).unwrap();
    let second = sync_invoice(&mut conn, &inv).unwrap();

    // Same local row, same content
    assert_eq!(first.id, second.id);
    assert_eq!(first.invoice_number, second.invoice_number);
    assert_eq!(first.total_cents, second.total_cents);
    assert_eq!(first.status, second.status);
    assert_eq!(first.created_at, second.created_at);

    // Exactly one set of line items, no duplicates
    let lines = queries::get_line_items(&conn, &second.id).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].description, "Design sprint");
    assert_eq!(lines[1].description, "Hosting");

    let all = queries::list_invoices(&conn).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn test_sync_replaces_line_items() {
    let mut conn = setup_test_db();
    create_test_client(&conn, "ada@example.com");

    let mut inv = stripe_invoice("in_lines", "open", Some("ada@example.com"));
    inv.lines = Some(StripeList {
        data: vec![
            stripe_line("il_1", "Logo design", 1, 120000),
            stripe_line("il_2", "Brand book", 1, 80000),
        ],
    });
    let synced = sync_invoice(&mut conn, &inv).unwrap();
    assert_eq!(queries::get_line_items(&conn, &synced.id).unwrap().len(), 2);

    // Provider now reports a single consolidated line
    inv.lines = Some(StripeList {
        data: vec![stripe_line("il_3", "Brand package", 1, 200000)],
    });
    let resynced = sync_invoice(&mut conn, &inv).unwrap();

    let lines = queries::get_line_items(&conn, &resynced.id).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].description, "Brand package");
    assert_eq!(lines[0].amount_cents, 200000);
}

#[test]
fn test_line_rate_derived_from_amount() {
    let mut conn = setup_test_db();
    create_test_client(&conn, "ada@example.com");

    let mut inv = stripe_invoice("in_rates", "open", Some("ada@example.com"));
    inv.lines = Some(StripeList {
        data: vec![
            stripe_line("il_1", "Workshops", 4, 100000),
            stripe_line("il_2", "Retainer credit", 0, 50000),
        ],
    });
    let synced = sync_invoice(&mut conn, &inv).unwrap();

    let lines = queries::get_line_items(&conn, &synced.id).unwrap();
    assert_eq!(lines[0].unit_rate_cents, 25000);
    assert_eq!(lines[0].amount_cents, 100000);
    // Quantity zero: rate falls back to the line amount, no division
    assert_eq!(lines[1].quantity, 0);
    assert_eq!(lines[1].unit_rate_cents, 50000);
}

#[test]
fn test_owner_resolution_prefers_email() {
    let mut conn = setup_test_db();
    let by_email = create_test_client(&conn, "ada@example.com");
    let by_customer = create_test_client(&conn, "other@example.com");
    queries::set_stripe_customer_id(&conn, &by_customer.id, "cus_42").unwrap();

    let mut inv = stripe_invoice("in_owner", "open", Some("ada@example.com"));
    inv.customer = Some("cus_42".to_string());
    let synced = sync_invoice(&mut conn, &inv).unwrap();

    assert_eq!(synced.client_id, by_email.id);
}

#[test]
fn test_owner_resolution_falls_back_to_customer_ref() {
    let mut conn = setup_test_db();
    let client = create_test_client(&conn, "ada@example.com");
    queries::set_stripe_customer_id(&conn, &client.id, "cus_42").unwrap();

    let mut inv = stripe_invoice("in_fallback", "open", Some("unknown@example.com"));
    inv.customer = Some("cus_42".to_string());
    let synced = sync_invoice(&mut conn, &inv).unwrap();

    assert_eq!(synced.client_id, client.id);
}

#[test]
fn test_unresolvable_owner_is_fatal() {
    let mut conn = setup_test_db();
    create_test_client(&conn, "ada@example.com");

    let inv = stripe_invoice("in_orphan", "open", Some("stranger@example.com"));
    let err = sync_invoice(&mut conn, &inv).unwrap_err();

    assert!(matches!(err, AppError::UserResolution(_)));
    // Nothing was written
    assert!(queries::list_invoices(&conn).unwrap().is_empty());
}

#[test]
fn test_void_maps_to_draft() {
    let mut conn = setup_test_db();
    create_test_client(&conn, "ada@example.com");

    let inv = stripe_invoice("in_void", "void", Some("ada@example.com"));
    let synced = sync_invoice(&mut conn, &inv).unwrap();

    assert_eq!(synced.status, InvoiceStatus::Draft);
}

#[test]
fn test_sync_updates_status_on_resync() {
    let mut conn = setup_test_db();
    create_test_client(&conn, "ada@example.com");

    let mut inv = stripe_invoice("in_pay", "open", Some("ada@example.com"));
    let synced = sync_invoice(&mut conn, &inv).unwrap();
    assert_eq!(synced.status, InvoiceStatus::Sent);

    inv.status = "paid".to_string();
    let resynced = sync_invoice(&mut conn, &inv).unwrap();
    assert_eq!(resynced.id, synced.id);
    assert_eq!(resynced.status, InvoiceStatus::Paid);
}
