//! Loads the demo accounts into the configured database. Accounts whose email
//! is already registered are left alone, so running it twice is harmless.

use elroi_server::config::AppConfig;
use elroi_server::migrations;
use elroi_server::services::user_directory::{self, Registration};
use elroi_shared::clients::db::{self, PoolOptions};
use elroi_shared::errors::ErrorCode;

const DEMO_PASSWORD: &str = "password123";

const DEMO_USERS: [(&str, &str, &str, &str); 4] = [
    ("Emily", "Davis", "Female", "1993-07-15"),
    ("Jessica", "Wilson", "Female", "1996-11-08"),
    ("Michael", "Brown", "Male", "1991-04-22"),
    ("David", "Miller", "Male", "1994-09-30"),
];

fn main() -> anyhow::Result<()> {
    elroi_shared::middleware::init_tracing("seed");

    let config = AppConfig::load()?;
    let pool = db::create_pool(
        &config.database_url,
        PoolOptions {
            max_size: 1,
            busy_timeout_ms: config.db_busy_timeout_ms,
        },
    )?;
    let mut conn = db::get_conn(&pool)?;
    migrations::run(&mut conn)?;

    for (first_name, last_name, gender, date_of_birth) in DEMO_USERS {
        let registration = Registration {
            email: format!("{}@test.com", first_name.to_lowercase()),
            password: DEMO_PASSWORD.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            gender: gender.to_string(),
            date_of_birth: date_of_birth.to_string(),
            videos_watched: config.required_intro_videos,
        };

        match user_directory::register(&mut conn, &registration, config.required_intro_videos) {
            Ok(user) => tracing::info!(user_id = user.id, email = %user.email, %gender, "created demo user"),
            Err(e) if e.code() == Some(ErrorCode::EmailAlreadyExists) => {
                tracing::info!(email = %registration.email, "demo user already present, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
