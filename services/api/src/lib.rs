mod cli;
mod infra;
mod routes;
mod server;
mod simulate;

use pricing_governance::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
