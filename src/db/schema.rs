pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS wallets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id),
    name        TEXT NOT NULL,
    currency    TEXT NOT NULL DEFAULT 'USD',
    balance     TEXT NOT NULL DEFAULT '0',
    is_default  BOOLEAN NOT NULL DEFAULT 0,
    is_active   BOOLEAN NOT NULL DEFAULT 1,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    UNIQUE(user_id, name)
);

CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER REFERENCES users(id),
    name        TEXT NOT NULL,
    color       TEXT NOT NULL DEFAULT '#6B7280',
    icon        TEXT NOT NULL DEFAULT '',
    is_system   BOOLEAN NOT NULL DEFAULT 0,
    is_active   BOOLEAN NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS ledger_entries (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id          INTEGER NOT NULL REFERENCES users(id),
    wallet_id        INTEGER NOT NULL REFERENCES wallets(id),
    category_id      INTEGER REFERENCES categories(id),
    amount           TEXT NOT NULL,
    currency         TEXT NOT NULL,
    transaction_date TEXT NOT NULL,
    merchant         TEXT NOT NULL DEFAULT '',
    description      TEXT NOT NULL DEFAULT '',
    kind             TEXT NOT NULL DEFAULT 'EXPENSE',
    is_recurring     BOOLEAN NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_user_date ON ledger_entries(user_id, transaction_date);
CREATE INDEX IF NOT EXISTS idx_entries_wallet ON ledger_entries(wallet_id);
CREATE INDEX IF NOT EXISTS idx_entries_category ON ledger_entries(category_id);

CREATE TABLE IF NOT EXISTS budgets (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER NOT NULL REFERENCES users(id),
    category_id     INTEGER REFERENCES categories(id),
    name            TEXT NOT NULL,
    amount          TEXT NOT NULL,
    period          TEXT NOT NULL DEFAULT 'MONTHLY',
    start_date      TEXT NOT NULL,
    end_date        TEXT NOT NULL,
    is_active       BOOLEAN NOT NULL DEFAULT 1,
    alert_threshold TEXT NOT NULL DEFAULT '80',
    alert_enabled   BOOLEAN NOT NULL DEFAULT 1,
    description     TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_budgets_user_active ON budgets(user_id, is_active);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[
    // Future migrations go here:
    // (1, "ALTER TABLE ledger_entries ADD COLUMN tags_json TEXT;"),
];
