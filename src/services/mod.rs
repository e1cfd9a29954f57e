// src/services/mod.rs

pub mod accounts;
pub mod editor;
pub mod generator;
pub mod notifications;
pub mod quizzes;
pub mod scores;
pub mod session_slot;
pub mod stats;
