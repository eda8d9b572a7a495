//! Directional like edges. Each ordered pair (liker, liked) appears at most once.

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;

use elroi_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Like, NewLike};
use crate::schema::likes;

fn duplicate_like() -> AppError {
    AppError::new(ErrorCode::DuplicateLike, "already liked")
}

/// Inserts the edge liker→liked, failing with `DuplicateLike` if it already exists.
pub fn record_like(conn: &mut SqliteConnection, liker_id: i32, liked_id: i32) -> AppResult<Like> {
    if has_liked(conn, liker_id, liked_id)? {
        return Err(duplicate_like());
    }

    let new_like = NewLike {
        liker_id,
        liked_id,
        created_at: Utc::now().naive_utc(),
    };

    let like = diesel::insert_into(likes::table)
        .values(&new_like)
        .get_result::<Like>(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => duplicate_like(),
            other => other.into(),
        })?;

    tracing::debug!(liker_id, liked_id, like_id = like.id, "like recorded");
    Ok(like)
}

/// Whether liked→liker already exists.
pub fn find_reciprocal(conn: &mut SqliteConnection, liker_id: i32, liked_id: i32) -> AppResult<bool> {
    has_liked(conn, liked_id, liker_id)
}

pub fn has_liked(conn: &mut SqliteConnection, liker_id: i32, liked_id: i32) -> AppResult<bool> {
    let exists = diesel::select(diesel::dsl::exists(
        likes::table
            .filter(likes::liker_id.eq(liker_id))
            .filter(likes::liked_id.eq(liked_id)),
    ))
    .get_result::<bool>(conn)?;
    Ok(exists)
}

/// Deletes the edge liker→liked. Matches created from it are kept.
pub fn remove_like(conn: &mut SqliteConnection, liker_id: i32, liked_id: i32) -> AppResult<()> {
    let deleted = diesel::delete(
        likes::table
            .filter(likes::liker_id.eq(liker_id))
            .filter(likes::liked_id.eq(liked_id)),
    )
    .execute(conn)?;

    if deleted == 0 {
        return Err(AppError::new(ErrorCode::LikeNotFound, "like not found"));
    }

    tracing::debug!(liker_id, liked_id, "like removed");
    Ok(())
}
