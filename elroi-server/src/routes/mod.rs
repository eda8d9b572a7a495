pub mod auth;
pub mod dashboard;
pub mod health;
pub mod index;
pub mod likes;
pub mod matches;
pub mod messages;
pub mod photo;
pub mod profile;
pub mod search;
