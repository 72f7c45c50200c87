use anyhow::Result;
use enovel::{cli::parse_args, run_enovel};
use env_logger::Env;
use log::warn;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let config = parse_args()?;
    let failures = run_enovel(config).await?;
    if failures > 0 {
        warn!("{failures} command(s) failed");
    }
    Ok(())
}
