//! SQL statements for the usage tables

pub const CREATE_USAGE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS usage_records (
    id SERIAL PRIMARY KEY,
    platform TEXT NOT NULL,
    address_hash TEXT NOT NULL,
    logged_at TEXT NOT NULL,
    method TEXT NOT NULL,
    version TEXT NOT NULL,
    protocol TEXT NOT NULL,
    status INTEGER NOT NULL,
    payload BIGINT NOT NULL
)
"#;

pub const CREATE_ADDRESS_COUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS address_counts (
    id SERIAL PRIMARY KEY,
    platform TEXT NOT NULL,
    address_hash TEXT NOT NULL,
    uses BIGINT NOT NULL
)
"#;

pub const CREATE_PLATFORM_SUMMARIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS platform_summaries (
    id SERIAL PRIMARY KEY,
    log_date DATE NOT NULL,
    start_time TIME NOT NULL,
    end_time TIME NOT NULL,
    first_length BIGINT NOT NULL,
    second_length BIGINT NOT NULL,
    duration TEXT NOT NULL,
    first_average BIGINT NOT NULL,
    second_average BIGINT NOT NULL
)
"#;

pub const INSERT_USAGE_RECORD: &str = r#"
INSERT INTO usage_records (platform, address_hash, logged_at, method, version, protocol, status, payload)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

pub const INSERT_ADDRESS_COUNT: &str = r#"
INSERT INTO address_counts (platform, address_hash, uses)
VALUES ($1, $2, $3)
"#;

pub const INSERT_PLATFORM_SUMMARY: &str = r#"
INSERT INTO platform_summaries (log_date, start_time, end_time, first_length, second_length, duration, first_average, second_average)
VALUES ($1, $2::time, $3::time, $4, $5, $6, $7, $8)
"#;

/// Schema statements in creation order.
pub const CREATE_TABLES: [&str; 3] = [
    CREATE_USAGE_RECORDS_TABLE,
    CREATE_ADDRESS_COUNTS_TABLE,
    CREATE_PLATFORM_SUMMARIES_TABLE,
];
