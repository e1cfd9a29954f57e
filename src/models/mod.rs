// src/models/mod.rs

pub mod notification;
pub mod question;
pub mod score;
pub mod user;
