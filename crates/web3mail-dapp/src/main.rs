//! web3mail compute task binary.

use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use web3mail::IpfsClient;
use web3mail::config::BELLECOUR_IPFS_NODE;
use web3mail_dapp::mailjet::MAILJET_API_URL;
use web3mail_dapp::{MailjetClient, TaskEnv};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web3mail=debug,web3mail_dapp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn start() -> anyhow::Result<()> {
    let env = TaskEnv::from_env()?;
    let mailjet = MailjetClient::new(&Url::parse(MAILJET_API_URL)?, &env.developer_secret)?;
    let ipfs = IpfsClient::new(
        Url::parse(BELLECOUR_IPFS_NODE)?,
        env.ipfs_gateway.clone(),
    );

    let result = web3mail_dapp::run(&env, &ipfs, &mailjet)
        .await
        .context("Failed to run web3mail task")?;
    info!(path = %result.display(), "Task completed");
    Ok(())
}
