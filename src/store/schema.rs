//! Idempotent schema bundle for the deals store.
//!
//! Snapshot tables (`game_rating`, `game_price`) hold one row per game and are
//! fully replaced on update. `game_tag` carries a UNIQUE pair constraint so
//! re-linking an already-linked tag is a no-op, and `tag.tag_name` collates
//! NOCASE so "Action" and "action" are one tag.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    discord_id  INTEGER PRIMARY KEY,
    first_seen  TEXT NOT NULL,
    last_online TEXT NOT NULL,
    playstyle   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS game (
    game_id     TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    developer   TEXT,
    publisher   TEXT,
    url         TEXT NOT NULL,
    image_url   TEXT
);

CREATE TABLE IF NOT EXISTS game_rating (
    game_id        TEXT NOT NULL UNIQUE REFERENCES game(game_id) ON DELETE CASCADE,
    monthly_rating REAL,
    all_rating     REAL,
    scrape_date    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS game_price (
    game_id     TEXT NOT NULL UNIQUE REFERENCES game(game_id) ON DELETE CASCADE,
    price       TEXT,
    currency    TEXT NOT NULL DEFAULT 'USD',
    is_on_sale  INTEGER NOT NULL DEFAULT 0,
    end_date    TEXT,
    scrape_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tag (
    tag_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    tag_name TEXT NOT NULL COLLATE NOCASE UNIQUE
);

CREATE TABLE IF NOT EXISTS game_tag (
    game_id TEXT NOT NULL REFERENCES game(game_id) ON DELETE CASCADE,
    tag_id  INTEGER NOT NULL REFERENCES tag(tag_id) ON DELETE CASCADE,
    UNIQUE (game_id, tag_id)
);

CREATE TABLE IF NOT EXISTS user_activity (
    discord_id    INTEGER NOT NULL REFERENCES user(discord_id) ON DELETE CASCADE,
    game_id       TEXT NOT NULL REFERENCES game(game_id) ON DELETE CASCADE,
    activity_type TEXT NOT NULL,
    rating        INTEGER NOT NULL,
    timestamp     TEXT NOT NULL,
    UNIQUE (discord_id, game_id)
);
"#;
