use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tempfile::TempDir;

use elroi_shared::clients::db::{create_pool, DbPool, PoolOptions};

use crate::migrations;
use crate::models::{Gender, NewUser, User};
use crate::schema::users;

/// A migrated database in a temporary directory. Keep the `TempDir` alive for the test's duration.
pub fn test_pool() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().unwrap();
    let url = dir.path().join("elroi-test.db");
    let pool = create_pool(url.to_str().unwrap(), PoolOptions { max_size: 4, busy_timeout_ms: 5_000 }).unwrap();
    migrations::run(&mut pool.get().unwrap()).unwrap();
    (dir, pool)
}

/// Inserts a user directly, skipping password hashing.
pub fn insert_user(conn: &mut SqliteConnection, first_name: &str, gender: Gender) -> User {
    let new_user = NewUser {
        email: format!("{}@test.com", first_name.to_lowercase()),
        password_hash: "not-a-real-hash".into(),
        first_name: first_name.into(),
        last_name: "Tester".into(),
        gender: gender.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1994, 9, 30).unwrap(),
        videos_watched: 2,
        is_active: true,
        created_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(conn)
        .unwrap()
}
