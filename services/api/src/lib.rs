mod cli;
mod infra;
mod routes;
mod score;
mod server;

use faculty_appraisal::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
