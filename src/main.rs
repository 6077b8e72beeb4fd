mod handlers;
mod models;
mod routes;
mod utils;

use std::error::Error;

use tokio::net::TcpListener;
use tracing::info;
use utils::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let config = Config::init();
    let addr = format!("{}:{}", config.host, config.port);

    let app = routes::make_app(config).await?;

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
