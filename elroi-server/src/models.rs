use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{likes, matches, messages, revoked_tokens, users};

// --- Enumerations stored as text ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(format!("unknown gender: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Accepted => write!(f, "accepted"),
            MatchStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "accepted" => Ok(MatchStatus::Accepted),
            "rejected" => Ok(MatchStatus::Rejected),
            _ => Err(format!("unknown match status: {s}")),
        }
    }
}

// --- User ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub bio: Option<String>,
    pub profile_photo: Option<String>,
    pub location: Option<String>,
    pub denomination: Option<String>,
    pub interests: Option<String>,
    pub looking_for: Option<String>,
    pub videos_watched: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn gender(&self) -> Option<Gender> {
        self.gender.parse().ok()
    }

    pub fn age_on(&self, day: NaiveDate) -> u32 {
        day.years_since(self.date_of_birth).unwrap_or(0)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub videos_watched: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, AsChangeset, Deserialize, Default, Clone)]
#[diesel(table_name = users)]
pub struct UpdateProfile {
    pub bio: Option<String>,
    pub location: Option<String>,
    pub denomination: Option<String>,
    pub interests: Option<String>,
    pub looking_for: Option<String>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.bio.is_none()
            && self.location.is_none()
            && self.denomination.is_none()
            && self.interests.is_none()
            && self.looking_for.is_none()
    }
}

/// What other users get to see of a profile: no email, no credentials.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublicProfile {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub age: u32,
    pub bio: Option<String>,
    pub profile_photo: Option<String>,
    pub location: Option<String>,
    pub denomination: Option<String>,
    pub interests: Option<String>,
    pub looking_for: Option<String>,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        let age = user.age_on(Utc::now().date_naive());
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            gender: user.gender,
            age,
            bio: user.bio,
            profile_photo: user.profile_photo,
            location: user.location,
            denomination: user.denomination,
            interests: user.interests,
            looking_for: user.looking_for,
        }
    }
}

// --- Like ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: i32,
    pub liker_id: i32,
    pub liked_id: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub liker_id: i32,
    pub liked_id: i32,
    pub created_at: NaiveDateTime,
}

// --- Match ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = matches)]
pub struct Match {
    pub id: i32,
    pub user1_id: i32,
    pub user2_id: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl Match {
    pub fn status(&self) -> Option<MatchStatus> {
        self.status.parse().ok()
    }

    /// The member of the pair that is not `user_id`.
    pub fn partner_of(&self, user_id: i32) -> i32 {
        if self.user1_id == user_id { self.user2_id } else { self.user1_id }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch {
    pub user1_id: i32,
    pub user2_id: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub content: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub sender_id: i32,
    pub receiver_id: i32,
    pub content: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

// --- Revoked token ---

#[derive(Debug, Insertable)]
#[diesel(table_name = revoked_tokens)]
pub struct NewRevokedToken {
    pub jti: String,
    pub revoked_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
