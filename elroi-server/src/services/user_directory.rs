use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::{Sqlite, SqliteConnection};
use serde::Deserialize;
use validator::Validate;

use elroi_shared::errors::{AppError, AppResult, ErrorCode};
use elroi_shared::types::pagination::PaginationParams;

use crate::models::{Gender, NewUser, UpdateProfile, User};
use crate::schema::users;
use crate::services::{auth_service, conversation_store};

#[derive(Debug, Deserialize, Validate)]
pub struct Registration {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "first name must be 1-50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "last name must be 1-50 characters"))]
    pub last_name: String,
    pub gender: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    #[serde(default)]
    pub videos_watched: i32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileChanges {
    #[validate(length(max = 2000, message = "bio is limited to 2000 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 100, message = "location is limited to 100 characters"))]
    pub location: Option<String>,
    #[validate(length(max = 100, message = "denomination is limited to 100 characters"))]
    pub denomination: Option<String>,
    #[validate(length(max = 2000, message = "interests are limited to 2000 characters"))]
    pub interests: Option<String>,
    #[validate(length(max = 50, message = "looking for is limited to 50 characters"))]
    pub looking_for: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchFilters {
    pub q: Option<String>,
    pub gender: Option<String>,
    pub location: Option<String>,
}

pub fn register(conn: &mut SqliteConnection, input: &Registration, required_videos: i32) -> AppResult<User> {
    if input.videos_watched < required_videos {
        return Err(AppError::new(
            ErrorCode::IntroVideosRequired,
            format!("you must watch at least {required_videos} introduction videos before registering"),
        ));
    }

    input.validate()?;
    auth_service::validate_password(&input.password)?;

    let first_name = required_text(&input.first_name, "first name")?;
    let last_name = required_text(&input.last_name, "last name")?;
    let gender: Gender = input.gender.parse().map_err(AppError::Validation)?;
    let date_of_birth = parse_birth_date(&input.date_of_birth)?;
    let email = input.email.trim().to_lowercase();

    let taken = diesel::select(diesel::dsl::exists(users::table.filter(users::email.eq(&email))))
        .get_result::<bool>(conn)?;
    if taken {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
    }

    let new_user = NewUser {
        email,
        password_hash: auth_service::hash_password(&input.password)?,
        first_name,
        last_name,
        gender: gender.to_string(),
        date_of_birth,
        videos_watched: input.videos_watched,
        is_active: true,
        created_at: Utc::now().naive_utc(),
    };

    let user: User = diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::new(ErrorCode::EmailAlreadyExists, "email already registered")
            }
            other => other.into(),
        })?;

    metrics::counter!("registrations_total").increment(1);
    tracing::info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

pub fn authenticate(conn: &mut SqliteConnection, email: &str, password: &str) -> AppResult<User> {
    let invalid = || AppError::new(ErrorCode::InvalidCredentials, "invalid email or password");

    let user = users::table
        .filter(users::email.eq(email.trim().to_lowercase()))
        .first::<User>(conn)
        .optional()?
        .ok_or_else(invalid)?;

    if !auth_service::verify_password(password, &user.password_hash)? {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountInactive, "account is deactivated"));
    }

    Ok(user)
}

pub fn find(conn: &mut SqliteConnection, id: i32) -> AppResult<User> {
    users::table
        .find(id)
        .first::<User>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))
}

pub fn exists(conn: &mut SqliteConnection, id: i32) -> AppResult<bool> {
    Ok(diesel::select(diesel::dsl::exists(users::table.find(id))).get_result::<bool>(conn)?)
}

pub fn find_many(conn: &mut SqliteConnection, ids: &[i32]) -> AppResult<Vec<User>> {
    Ok(users::table
        .filter(users::id.eq_any(ids))
        .order(users::id.asc())
        .load::<User>(conn)?)
}

/// Everyone the user has sent a message to or received one from.
pub fn partners_of(conn: &mut SqliteConnection, user_id: i32) -> AppResult<Vec<User>> {
    let ids = conversation_store::partner_ids(conn, user_id)?;
    find_many(conn, &ids)
}

pub fn update_profile(conn: &mut SqliteConnection, id: i32, changes: &ProfileChanges) -> AppResult<User> {
    changes.validate()?;

    let update = UpdateProfile {
        bio: changes.bio.as_deref().map(|s| s.trim().to_string()),
        location: changes.location.as_deref().map(|s| s.trim().to_string()),
        denomination: changes.denomination.as_deref().map(|s| s.trim().to_string()),
        interests: changes.interests.as_deref().map(|s| s.trim().to_string()),
        looking_for: changes.looking_for.as_deref().map(|s| s.trim().to_string()),
    };

    // An all-None changeset is rejected by diesel.
    if update.is_empty() {
        return find(conn, id);
    }

    let user = diesel::update(users::table.find(id))
        .set(&update)
        .get_result::<User>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    tracing::info!(user_id = id, "profile updated");
    Ok(user)
}

pub fn set_profile_photo(conn: &mut SqliteConnection, id: i32, file_name: &str) -> AppResult<User> {
    diesel::update(users::table.find(id))
        .set(users::profile_photo.eq(file_name))
        .get_result::<User>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))
}

pub fn set_active(conn: &mut SqliteConnection, id: i32, active: bool) -> AppResult<User> {
    let user = diesel::update(users::table.find(id))
        .set(users::is_active.eq(active))
        .get_result::<User>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    tracing::info!(user_id = id, is_active = active, "account activity changed");
    Ok(user)
}

/// Active users of the opposite gender, excluding `user`, oldest accounts first.
pub fn candidates(conn: &mut SqliteConnection, user: &User, limit: i64) -> AppResult<Vec<User>> {
    let wanted = user.gender().map(Gender::opposite).unwrap_or(Gender::Male);

    Ok(users::table
        .filter(users::gender.eq(wanted.to_string()))
        .filter(users::is_active.eq(true))
        .filter(users::id.ne(user.id))
        .order(users::id.asc())
        .limit(limit)
        .load::<User>(conn)?)
}

/// Returns one page of matching users and the total number of matches.
pub fn search(
    conn: &mut SqliteConnection,
    actor_id: i32,
    filters: &SearchFilters,
    page: &PaginationParams,
) -> AppResult<(Vec<User>, u64)> {
    let total: i64 = search_query(actor_id, filters)?.count().get_result(conn)?;

    let items = search_query(actor_id, filters)?
        .order(users::id.asc())
        .offset(page.offset() as i64)
        .limit(page.limit() as i64)
        .load::<User>(conn)?;

    Ok((items, total as u64))
}

fn search_query(actor_id: i32, filters: &SearchFilters) -> AppResult<users::BoxedQuery<'static, Sqlite>> {
    let mut query = users::table
        .filter(users::id.ne(actor_id))
        .filter(users::is_active.eq(true))
        .into_boxed();

    // SQLite LIKE is case-insensitive for ASCII.
    if let Some(q) = non_blank(&filters.q) {
        let pattern = contains_pattern(q);
        query = query.filter(
            users::first_name
                .like(pattern.clone())
                .escape('\\')
                .or(users::last_name.like(pattern).escape('\\')),
        );
    }

    if let Some(gender) = non_blank(&filters.gender) {
        let gender: Gender = gender.parse().map_err(AppError::Validation)?;
        query = query.filter(users::gender.eq(gender.to_string()));
    }

    if let Some(location) = non_blank(&filters.location) {
        query = query.filter(users::location.like(contains_pattern(location)).escape('\\'));
    }

    Ok(query)
}

/// `%value%` with the LIKE wildcards in `value` escaped by `\`.
fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn parse_birth_date(raw: &str) -> AppResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("invalid date of birth, expected YYYY-MM-DD".into()))?;
    if date > Utc::now().date_naive() {
        return Err(AppError::Validation("date of birth cannot be in the future".into()));
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_user, test_pool};

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.into(),
            password: "password123".into(),
            first_name: "Emily".into(),
            last_name: "Davis".into(),
            gender: "Female".into(),
            date_of_birth: "1993-07-15".into(),
            videos_watched: 2,
        }
    }

    #[test]
    fn register_then_authenticate() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let user = register(&mut conn, &registration("Emily@Test.com"), 2).unwrap();
        assert_eq!(user.email, "emily@test.com");
        assert_eq!(user.gender(), Some(Gender::Female));
        assert!(user.is_active);

        let again = authenticate(&mut conn, "EMILY@test.com", "password123").unwrap();
        assert_eq!(again.id, user.id);

        let err = authenticate(&mut conn, "emily@test.com", "wrong-password1").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidCredentials));
        let err = authenticate(&mut conn, "nobody@test.com", "password123").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidCredentials));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        register(&mut conn, &registration("emily@test.com"), 2).unwrap();
        let err = register(&mut conn, &registration("EMILY@test.com"), 2).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::EmailAlreadyExists));
    }

    #[test]
    fn registration_input_is_validated() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let mut input = registration("emily@test.com");
        input.videos_watched = 1;
        assert_eq!(register(&mut conn, &input, 2).unwrap_err().code(), Some(ErrorCode::IntroVideosRequired));

        let mut input = registration("emily@test.com");
        input.date_of_birth = "15/07/1993".into();
        assert_eq!(register(&mut conn, &input, 2).unwrap_err().code(), Some(ErrorCode::ValidationError));

        let mut input = registration("emily@test.com");
        input.gender = "unknown".into();
        assert_eq!(register(&mut conn, &input, 2).unwrap_err().code(), Some(ErrorCode::ValidationError));

        let mut input = registration("not-an-email");
        input.first_name = "Emily".into();
        assert_eq!(register(&mut conn, &input, 2).unwrap_err().code(), Some(ErrorCode::ValidationError));

        let mut input = registration("emily@test.com");
        input.first_name = "   ".into();
        assert_eq!(register(&mut conn, &input, 2).unwrap_err().code(), Some(ErrorCode::ValidationError));
    }

    #[test]
    fn deactivated_user_cannot_log_in() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let user = register(&mut conn, &registration("emily@test.com"), 2).unwrap();
        set_active(&mut conn, user.id, false).unwrap();
        let err = authenticate(&mut conn, "emily@test.com", "password123").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::AccountInactive));
    }

    #[test]
    fn candidates_are_active_opposite_gender_and_capped() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let michael = insert_user(&mut conn, "Michael", Gender::Male);
        insert_user(&mut conn, "David", Gender::Male);
        let emily = insert_user(&mut conn, "Emily", Gender::Female);
        let jessica = insert_user(&mut conn, "Jessica", Gender::Female);
        let hidden = insert_user(&mut conn, "Hidden", Gender::Female);
        set_active(&mut conn, hidden.id, false).unwrap();

        let found: Vec<i32> = candidates(&mut conn, &michael, 10).unwrap().iter().map(|u| u.id).collect();
        assert_eq!(found, vec![emily.id, jessica.id]);

        assert_eq!(candidates(&mut conn, &michael, 1).unwrap().len(), 1);
        assert!(candidates(&mut conn, &emily, 10).unwrap().iter().all(|u| u.gender == "Male"));
    }

    #[test]
    fn search_filters_combine() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let me = insert_user(&mut conn, "Michael", Gender::Male);
        let emily = insert_user(&mut conn, "Emily", Gender::Female);
        let emil = insert_user(&mut conn, "Emil", Gender::Male);
        insert_user(&mut conn, "Jessica", Gender::Female);
        update_profile(&mut conn, emily.id, &ProfileChanges { location: Some("Nairobi, Kenya".into()), ..Default::default() })
            .unwrap();

        let by_name = SearchFilters { q: Some("emi".into()), ..Default::default() };
        let (found, total) = search(&mut conn, me.id, &by_name, &PaginationParams::default()).unwrap();
        assert_eq!(total, 2);
        assert_eq!(found.iter().map(|u| u.id).collect::<Vec<_>>(), vec![emily.id, emil.id]);

        let narrowed = SearchFilters { q: Some("EMI".into()), gender: Some("female".into()), location: Some("nairobi".into()) };
        let (found, total) = search(&mut conn, me.id, &narrowed, &PaginationParams::default()).unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].id, emily.id);

        // The searcher never appears in their own results.
        let everyone = SearchFilters::default();
        let (found, total) = search(&mut conn, me.id, &everyone, &PaginationParams::new(1, 2)).unwrap();
        assert_eq!(total, 3);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|u| u.id != me.id));

        let bad = SearchFilters { gender: Some("robot".into()), ..Default::default() };
        assert!(search(&mut conn, me.id, &bad, &PaginationParams::default()).is_err());
    }

    #[test]
    fn profile_update_respects_limits() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let user = insert_user(&mut conn, "Emily", Gender::Female);

        let updated = update_profile(
            &mut conn,
            user.id,
            &ProfileChanges { bio: Some("  Loves hiking  ".into()), denomination: Some("Baptist".into()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Loves hiking"));
        assert_eq!(updated.denomination.as_deref(), Some("Baptist"));
        assert_eq!(updated.location, None);

        let unchanged = update_profile(&mut conn, user.id, &ProfileChanges::default()).unwrap();
        assert_eq!(unchanged.bio.as_deref(), Some("Loves hiking"));

        let too_long = ProfileChanges { looking_for: Some("x".repeat(51)), ..Default::default() };
        assert_eq!(update_profile(&mut conn, user.id, &too_long).unwrap_err().code(), Some(ErrorCode::ValidationError));

        assert_eq!(find(&mut conn, 999).unwrap_err().code(), Some(ErrorCode::UserNotFound));
    }

    #[test]
    fn partners_come_from_either_direction() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        let michael = insert_user(&mut conn, "Michael", Gender::Male);
        let emily = insert_user(&mut conn, "Emily", Gender::Female);
        let jessica = insert_user(&mut conn, "Jessica", Gender::Female);

        conversation_store::post_message(&mut conn, michael.id, emily.id, "hello").unwrap();
        conversation_store::post_message(&mut conn, jessica.id, michael.id, "hi there").unwrap();

        let names: Vec<String> = partners_of(&mut conn, michael.id)
            .unwrap()
            .into_iter()
            .map(|u| u.first_name)
            .collect();
        assert_eq!(names, vec!["Emily", "Jessica"]);
        assert!(partners_of(&mut conn, 999).unwrap().is_empty());
    }

    #[test]
    fn search_wildcards_match_literally() {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();

        let me = insert_user(&mut conn, "Michael", Gender::Male);
        let emily = insert_user(&mut conn, "Emily", Gender::Female);
        insert_user(&mut conn, "Jessica", Gender::Female);
        update_profile(&mut conn, emily.id, &ProfileChanges { location: Some("100%_Texas".into()), ..Default::default() })
            .unwrap();

        for q in ["%", "_", "\\"] {
            let by_name = SearchFilters { q: Some(q.into()), ..Default::default() };
            let (found, total) = search(&mut conn, me.id, &by_name, &PaginationParams::default()).unwrap();
            assert_eq!(total, 0, "name search for {q:?}");
            assert!(found.is_empty());
        }

        let by_location = SearchFilters { location: Some("%_".into()), ..Default::default() };
        let (found, total) = search(&mut conn, me.id, &by_location, &PaginationParams::default()).unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].id, emily.id);

        assert_eq!(contains_pattern(r"5%_a\b"), r"%5\%\_a\\b%");
    }
}
