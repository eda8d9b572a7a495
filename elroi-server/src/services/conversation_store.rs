use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use elroi_shared::errors::{AppError, AppResult};

use crate::models::{Message, NewMessage};
use crate::schema::messages;
use crate::services::user_directory;

pub const MAX_MESSAGE_CHARS: usize = 5_000;

pub fn post_message(
    conn: &mut SqliteConnection,
    sender_id: i32,
    receiver_id: i32,
    content: &str,
) -> AppResult<Message> {
    if sender_id == receiver_id {
        return Err(AppError::Validation("you cannot message yourself".into()));
    }

    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("message cannot be empty".into()));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message is limited to {MAX_MESSAGE_CHARS} characters"
        )));
    }

    if !user_directory::exists(conn, receiver_id)? {
        return Err(AppError::Validation("receiver does not exist".into()));
    }

    let message = diesel::insert_into(messages::table)
        .values(&NewMessage {
            sender_id,
            receiver_id,
            content: content.to_string(),
            is_read: false,
            created_at: Utc::now().naive_utc(),
        })
        .get_result::<Message>(conn)?;

    metrics::counter!("messages_total").increment(1);
    tracing::info!(message_id = message.id, sender_id, receiver_id, "message sent");
    Ok(message)
}

/// Both directions of the conversation between `a` and `b`, oldest first.
pub fn list_thread(conn: &mut SqliteConnection, a: i32, b: i32) -> AppResult<Vec<Message>> {
    Ok(messages::table
        .filter(
            messages::sender_id.eq(a).and(messages::receiver_id.eq(b))
                .or(messages::sender_id.eq(b).and(messages::receiver_id.eq(a))),
        )
        .order((messages::created_at.asc(), messages::id.asc()))
        .load::<Message>(conn)?)
}

/// Marks everything `sender_id` sent to `receiver_id` as read. Returns how many rows flipped.
pub fn mark_read(conn: &mut SqliteConnection, receiver_id: i32, sender_id: i32) -> AppResult<usize> {
    let updated = diesel::update(
        messages::table
            .filter(messages::sender_id.eq(sender_id))
            .filter(messages::receiver_id.eq(receiver_id))
            .filter(messages::is_read.eq(false)),
    )
    .set(messages::is_read.eq(true))
    .execute(conn)?;

    if updated > 0 {
        tracing::debug!(receiver_id, sender_id, updated, "messages marked read");
    }
    Ok(updated)
}

pub fn unread_count(conn: &mut SqliteConnection, receiver_id: i32) -> AppResult<i64> {
    Ok(messages::table
        .filter(messages::receiver_id.eq(receiver_id))
        .filter(messages::is_read.eq(false))
        .select(count_star())
        .first::<i64>(conn)?)
}

/// Unread counts addressed to `receiver_id`, grouped by sender.
pub fn unread_by_sender(conn: &mut SqliteConnection, receiver_id: i32) -> AppResult<Vec<(i32, i64)>> {
    Ok(messages::table
        .filter(messages::receiver_id.eq(receiver_id))
        .filter(messages::is_read.eq(false))
        .group_by(messages::sender_id)
        .select((messages::sender_id, count_star()))
        .load::<(i32, i64)>(conn)?)
}

/// Ids of everyone the user has sent a message to or received one from.
pub fn partner_ids(conn: &mut SqliteConnection, user_id: i32) -> AppResult<Vec<i32>> {
    let mut ids: Vec<i32> = messages::table
        .filter(messages::sender_id.eq(user_id))
        .select(messages::receiver_id)
        .distinct()
        .load(conn)?;

    let received: Vec<i32> = messages::table
        .filter(messages::receiver_id.eq(user_id))
        .select(messages::sender_id)
        .distinct()
        .load(conn)?;

    ids.extend(received);
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elroi_shared::errors::ErrorCode;
    use crate::models::Gender;
    use crate::test_support::{insert_user, test_pool};

    #[test]
    fn thread_is_symmetric_and_ordered() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&mut conn, "Michael", Gender::Male);
        let b = insert_user(&mut conn, "Emily", Gender::Female);
        let c = insert_user(&mut conn, "Jessica", Gender::Female);

        post_message(&mut conn, a.id, b.id, "hi Emily").unwrap();
        post_message(&mut conn, b.id, a.id, "hello Michael").unwrap();
        post_message(&mut conn, a.id, b.id, "how are you?").unwrap();
        post_message(&mut conn, a.id, c.id, "unrelated").unwrap();

        let ab = list_thread(&mut conn, a.id, b.id).unwrap();
        let ba = list_thread(&mut conn, b.id, a.id).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(
            ab.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["hi Emily", "hello Michael", "how are you?"]
        );
        assert!(ab.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn mark_read_only_touches_one_direction_and_is_idempotent() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&mut conn, "Michael", Gender::Male);
        let b = insert_user(&mut conn, "Emily", Gender::Female);

        post_message(&mut conn, a.id, b.id, "one").unwrap();
        post_message(&mut conn, a.id, b.id, "two").unwrap();
        post_message(&mut conn, b.id, a.id, "reply").unwrap();
        assert_eq!(unread_count(&mut conn, b.id).unwrap(), 2);
        assert_eq!(unread_by_sender(&mut conn, b.id).unwrap(), vec![(a.id, 2)]);

        assert_eq!(mark_read(&mut conn, b.id, a.id).unwrap(), 2);
        let after_first = list_thread(&mut conn, a.id, b.id).unwrap();
        assert_eq!(mark_read(&mut conn, b.id, a.id).unwrap(), 0);
        assert_eq!(list_thread(&mut conn, a.id, b.id).unwrap(), after_first);

        assert_eq!(unread_count(&mut conn, b.id).unwrap(), 0);
        // Michael's copy of the reply is still unread.
        assert_eq!(unread_count(&mut conn, a.id).unwrap(), 1);
    }

    #[test]
    fn invalid_messages_are_rejected() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&mut conn, "Michael", Gender::Male);

        let err = post_message(&mut conn, a.id, 999, "anyone there?").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValidationError));

        let b = insert_user(&mut conn, "Emily", Gender::Female);
        let err = post_message(&mut conn, a.id, b.id, "   ").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValidationError));

        let err = post_message(&mut conn, a.id, b.id, &"x".repeat(MAX_MESSAGE_CHARS + 1)).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValidationError));

        let err = post_message(&mut conn, a.id, a.id, "note to self").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValidationError));

        assert!(list_thread(&mut conn, a.id, b.id).unwrap().is_empty());
    }

    #[test]
    fn partners_cover_both_directions() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let a = insert_user(&mut conn, "Michael", Gender::Male);
        let b = insert_user(&mut conn, "Emily", Gender::Female);
        let c = insert_user(&mut conn, "Jessica", Gender::Female);
        insert_user(&mut conn, "David", Gender::Male);

        post_message(&mut conn, a.id, b.id, "hi").unwrap();
        post_message(&mut conn, a.id, b.id, "again").unwrap();
        post_message(&mut conn, c.id, a.id, "hey").unwrap();

        assert_eq!(partner_ids(&mut conn, a.id).unwrap(), vec![b.id, c.id]);
        assert_eq!(partner_ids(&mut conn, b.id).unwrap(), vec![a.id]);
    }
}
