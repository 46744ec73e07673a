use anyhow::{Context, Result};
use tokio::runtime::Runtime;

pub mod analyze;
pub mod serve;

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}
