//! Career Buddy: a phone-call career counselling dialog.

pub mod advisor;
pub mod config;
pub mod dialog;
pub mod error;
pub mod llm;
pub mod speech;
pub mod voice;
