use diesel::connection::SimpleConnection;
use diesel::sqlite::SqliteConnection;

use elroi_shared::errors::AppResult;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        email           TEXT NOT NULL UNIQUE,
        password_hash   TEXT NOT NULL,
        first_name      TEXT NOT NULL,
        last_name       TEXT NOT NULL,
        gender          TEXT NOT NULL,
        date_of_birth   DATE NOT NULL,
        bio             TEXT,
        profile_photo   TEXT,
        location        TEXT,
        denomination    TEXT,
        interests       TEXT,
        looking_for     TEXT,
        videos_watched  INTEGER NOT NULL DEFAULT 0,
        is_active       BOOLEAN NOT NULL DEFAULT 1,
        created_at      TIMESTAMP NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_users_gender_active
        ON users(gender, is_active);

    CREATE TABLE IF NOT EXISTS likes (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        liker_id    INTEGER NOT NULL REFERENCES users(id),
        liked_id    INTEGER NOT NULL REFERENCES users(id),
        created_at  TIMESTAMP NOT NULL,
        UNIQUE(liker_id, liked_id)
    );

    CREATE TABLE IF NOT EXISTS matches (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        user1_id    INTEGER NOT NULL REFERENCES users(id),
        user2_id    INTEGER NOT NULL REFERENCES users(id),
        status      TEXT NOT NULL DEFAULT 'pending',
        created_at  TIMESTAMP NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_matches_users
        ON matches(user1_id, user2_id);

    CREATE TABLE IF NOT EXISTS messages (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        sender_id    INTEGER NOT NULL REFERENCES users(id),
        receiver_id  INTEGER NOT NULL REFERENCES users(id),
        content      TEXT NOT NULL,
        is_read      BOOLEAN NOT NULL DEFAULT 0,
        created_at   TIMESTAMP NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_messages_pair
        ON messages(sender_id, receiver_id, created_at);

    CREATE INDEX IF NOT EXISTS idx_messages_unread
        ON messages(receiver_id, is_read);

    CREATE TABLE IF NOT EXISTS revoked_tokens (
        jti         TEXT PRIMARY KEY,
        revoked_at  TIMESTAMP NOT NULL,
        expires_at  TIMESTAMP NOT NULL
    );
";

/// Creates every table and index that does not exist yet. Safe to run on each start.
pub fn run(conn: &mut SqliteConnection) -> AppResult<()> {
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    conn.batch_execute(SCHEMA)?;
    tracing::info!("database schema up to date");
    Ok(())
}
