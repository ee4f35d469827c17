//! What the caller hears besides the questions: short acknowledgements after
//! each answer and the closing career recommendation.
//!
//! Both paths prefer the AI text service and fall back to deterministic text
//! whenever it is off, cooling down or failing. They share one
//! [`CooldownGate`](crate::llm::CooldownGate).

pub mod ack;
pub mod recommend;

pub use ack::AckGenerator;
pub use recommend::{RecommendationEngine, Track, likely_track, rule_based_careers};
