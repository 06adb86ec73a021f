use std::net::SocketAddr;

use tracing::info;

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::server;

#[derive(Debug, Clone)]
pub struct ServeCommandArgs {
    pub bind: String,
}

pub async fn run(ctx: AppContext, args: ServeCommandArgs) -> AppResult<()> {
    let addr: SocketAddr = args.bind.parse().map_err(|err| {
        AppError::Configuration(format!("invalid bind address '{}': {err}", args.bind))
    })?;
    info!(%addr, path = server::WEBHOOK_PATH, "starting webhook relay");
    server::start_server(ctx, addr).await
}
