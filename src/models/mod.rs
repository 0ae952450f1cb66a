pub mod movie;
pub mod rating;
pub mod user;

pub use movie::{Movie, NewMovie};
pub use rating::{Rating, RatingRecord};
pub use user::{NewUser, User};

/// Identifier of a registered user
pub type UserId = i64;

/// Identifier of a catalog movie
pub type MovieId = i64;
