use lambda_http::{run, Error};
use std::env::set_var;
use tracing::info;

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use shared::config::Config;

#[tokio::main]
async fn main() -> Result<(), Error> {
    set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    let sdk_config = aws_config::load_from_env().await;
    let app_state = state::AppState::from_config(&config, &sdk_config);
    info!("Serving club and game routes");

    run(routes::router(app_state)).await
}
