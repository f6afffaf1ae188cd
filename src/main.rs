use anyhow::{Context, Result};
use clap::Parser;

use quiz_client::cli::{Cli, Commands};
use quiz_client::{logger, run_admin, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref()).context("加载配置失败")?;

    // 初始化日志
    logger::init_with(cli.verbose || config.verbose_logging);

    match cli.command.unwrap_or(Commands::Play { session_id: None }) {
        Commands::Play { session_id } => {
            if session_id.is_some() {
                config.session_id = session_id;
            }
            // 初始化并运行应用
            let _outcome = App::initialize(config).await?.run().await?;
        }
        Commands::Admin { command } => {
            run_admin(&config, command).await?;
        }
    }

    Ok(())
}
