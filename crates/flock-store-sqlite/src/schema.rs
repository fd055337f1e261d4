//! SQL schema for the Flock SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS roles (
    role_id    TEXT PRIMARY KEY,
    name       TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Keys of the shape '<action> <resource>', e.g. 'create person'.
CREATE TABLE IF NOT EXISTS permissions (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS role_permissions (
    role_id    TEXT NOT NULL REFERENCES roles(role_id)     ON DELETE CASCADE,
    permission TEXT NOT NULL REFERENCES permissions(name)  ON DELETE CASCADE,
    PRIMARY KEY (role_id, permission)
);

CREATE TABLE IF NOT EXISTS user_roles (
    user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    role_id TEXT NOT NULL REFERENCES roles(role_id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, role_id)
);

CREATE TABLE IF NOT EXISTS people (
    person_id    TEXT PRIMARY KEY,
    first_name   TEXT NOT NULL,
    last_name    TEXT NOT NULL,
    gender       TEXT NOT NULL
                 CHECK (gender IN ('male', 'female', 'other')),
    civil_status TEXT
                 CHECK (civil_status IN ('single', 'married', 'widowed',
                        'divorced', 'separated', 'free_union', 'other')),
    dob          TEXT,              -- YYYY-MM-DD
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    deleted_at   TEXT               -- soft-delete tombstone
);

-- Exactly one row per person, removed with the person on hard delete.
CREATE TABLE IF NOT EXISTS spiritual_information (
    person_id     TEXT PRIMARY KEY REFERENCES people(person_id) ON DELETE CASCADE,
    membership_at TEXT,
    baptized_at   TEXT,
    saved_at      TEXT,
    testimony     TEXT
);

CREATE TABLE IF NOT EXISTS contact_information (
    person_id       TEXT PRIMARY KEY REFERENCES people(person_id) ON DELETE CASCADE,
    email           TEXT,
    phone           TEXT,
    alternate_phone TEXT,
    address_line_1  TEXT,
    address_line_2  TEXT,
    city            TEXT,
    state           TEXT,
    postal_code     TEXT,
    country         TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS people_first_name_idx ON people(first_name);
CREATE INDEX IF NOT EXISTS people_deleted_idx    ON people(deleted_at);
CREATE INDEX IF NOT EXISTS user_roles_role_idx   ON user_roles(role_id);

PRAGMA user_version = 1;
";
