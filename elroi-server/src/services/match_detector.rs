//! Turns likes into matches when both sides have liked each other.
//!
//! `process_like` runs as one `BEGIN IMMEDIATE` transaction: SQLite hands out
//! the write lock before the first read, so two concurrent likes on the same
//! pair are serialized and the later one always sees the earlier one's edge.

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use elroi_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Match, MatchStatus, NewMatch};
use crate::schema::matches;
use crate::services::{like_ledger, user_directory};

#[derive(Debug, Clone)]
pub enum LikeOutcome {
    /// The edge already existed; nothing was written.
    AlreadyLiked,
    /// The like was recorded and the other user has not liked back (yet).
    Liked,
    /// The like completed a mutual pair. `created` is false when the pair had
    /// matched before (like, unlike, like again).
    Matched { record: Match, created: bool },
}

impl LikeOutcome {
    pub fn success(&self) -> bool {
        !matches!(self, LikeOutcome::AlreadyLiked)
    }

    pub fn is_match(&self) -> bool {
        matches!(self, LikeOutcome::Matched { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            LikeOutcome::AlreadyLiked => "Already liked",
            LikeOutcome::Liked => "Like sent!",
            LikeOutcome::Matched { .. } => "It's a match!",
        }
    }
}

pub fn process_like(conn: &mut SqliteConnection, liker_id: i32, liked_id: i32) -> AppResult<LikeOutcome> {
    if liker_id == liked_id {
        return Err(AppError::new(ErrorCode::CannotLikeSelf, "you cannot like yourself"));
    }

    let outcome = conn.immediate_transaction(|conn| {
        if !user_directory::exists(conn, liked_id)? {
            return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
        }

        match like_ledger::record_like(conn, liker_id, liked_id) {
            Ok(_) => {}
            Err(e) if e.code() == Some(ErrorCode::DuplicateLike) => return Ok(LikeOutcome::AlreadyLiked),
            Err(e) => return Err(e),
        }

        if !like_ledger::find_reciprocal(conn, liker_id, liked_id)? {
            return Ok(LikeOutcome::Liked);
        }

        if let Some(existing) = find_match(conn, liker_id, liked_id)? {
            return Ok(LikeOutcome::Matched { record: existing, created: false });
        }

        let record = diesel::insert_into(matches::table)
            .values(&NewMatch {
                user1_id: liker_id,
                user2_id: liked_id,
                status: MatchStatus::Accepted.to_string(),
                created_at: Utc::now().naive_utc(),
            })
            .get_result::<Match>(conn)?;

        Ok(LikeOutcome::Matched { record, created: true })
    })?;

    match &outcome {
        LikeOutcome::AlreadyLiked => {
            tracing::debug!(liker_id, liked_id, "duplicate like ignored");
        }
        LikeOutcome::Liked => {
            metrics::counter!("likes_total").increment(1);
            tracing::info!(liker_id, liked_id, "like sent");
        }
        LikeOutcome::Matched { record, created } => {
            metrics::counter!("likes_total").increment(1);
            if *created {
                metrics::counter!("matches_total").increment(1);
            }
            tracing::info!(liker_id, liked_id, match_id = record.id, created, "mutual like");
        }
    }

    Ok(outcome)
}

/// The match for the unordered pair {a, b}, whichever side created it.
pub fn find_match(conn: &mut SqliteConnection, a: i32, b: i32) -> AppResult<Option<Match>> {
    let found = matches::table
        .filter(
            matches::user1_id.eq(a).and(matches::user2_id.eq(b))
                .or(matches::user1_id.eq(b).and(matches::user2_id.eq(a))),
        )
        .order(matches::id.asc())
        .first::<Match>(conn)
        .optional()?;
    Ok(found)
}

/// Every match the user is part of, newest first.
pub fn matches_for(conn: &mut SqliteConnection, user_id: i32) -> AppResult<Vec<Match>> {
    Ok(matches::table
        .filter(matches::user1_id.eq(user_id).or(matches::user2_id.eq(user_id)))
        .order((matches::created_at.desc(), matches::id.desc()))
        .load::<Match>(conn)?)
}
