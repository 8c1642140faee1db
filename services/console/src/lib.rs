//! Operator console for the police-verification desk, plus the in-memory contract stub
//! it can be pointed at during local development.

mod cli;
mod commands;
mod render;
pub mod stub;

use rental_desk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
