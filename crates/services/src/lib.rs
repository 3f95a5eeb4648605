#![forbid(unsafe_code)]

pub mod controller;
pub mod error;
pub mod favorites;

pub use controller::QuizController;
pub use error::QuizError;
pub use favorites::FavoriteService;
