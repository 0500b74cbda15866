mod client;
mod dto;

use thiserror::Error;

pub use client::SpoonacularClient;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("request to meal planning API failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("meal planning API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable meal planning API response: {0}")]
    Decode(String),
}
