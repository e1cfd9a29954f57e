// src/lib.rs

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

pub use engine::{QuizSession, SessionStatus, SessionView, StartError};
pub use error::AppError;
pub use state::AppState;
