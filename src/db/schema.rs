use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Portal users (studio admins and clients)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('admin', 'client')),
            company TEXT,
            phone TEXT,
            stripe_customer_id TEXT,
            api_key TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        CREATE INDEX IF NOT EXISTS idx_users_stripe_customer ON users(stripe_customer_id);

        -- Invoices, normalized from Stripe on every sync.
        -- stripe_invoice_id is the upsert key; unique when present.
        CREATE TABLE IF NOT EXISTS invoices (
            id TEXT PRIMARY KEY,
            stripe_invoice_id TEXT UNIQUE,
            invoice_number TEXT NOT NULL,
            client_id TEXT NOT NULL REFERENCES users(id),
            project_id TEXT REFERENCES projects(id),
            issue_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            subtotal_cents INTEGER NOT NULL DEFAULT 0,
            tax_cents INTEGER NOT NULL DEFAULT 0,
            total_cents INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL CHECK (status IN ('Draft', 'Sent', 'Paid', 'Overdue')),
            currency TEXT NOT NULL DEFAULT 'usd',
            pdf_url TEXT,
            hosted_invoice_url TEXT,
            payment_intent_id TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',
            synced_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_invoices_client ON invoices(client_id);
        CREATE INDEX IF NOT EXISTS idx_invoices_status ON invoices(status);

        -- Invoice lines, fully replaced on every sync (delete-all-then-insert).
        CREATE TABLE IF NOT EXISTS invoice_line_items (
            id TEXT PRIMARY KEY,
            invoice_id TEXT NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            unit_rate_cents INTEGER NOT NULL,
            amount_cents INTEGER NOT NULL,
            position INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_line_items_invoice ON invoice_line_items(invoice_id);

        -- Client engagements shown on the portal dashboard
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES users(id),
            name TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL CHECK (status IN ('proposal', 'active', 'review', 'complete')),
            progress INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_projects_client ON projects(client_id);

        -- Deliverables and contracts shared with clients
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES users(id),
            project_id TEXT REFERENCES projects(id),
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_documents_client ON documents(client_id);
        "#,
    )
}
