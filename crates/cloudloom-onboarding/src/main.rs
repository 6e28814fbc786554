//! cloudloom-onboarding: provision a customer account and consume its findings
//!
//! Stands in for the HTTP layer of the platform: it runs one onboarding,
//! prints the resulting queue description and keeps the consumer running
//! until Ctrl-C.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cloudloom_common::ResourceNameSet;
use cloudloom_onboarding::aws::AwsProvider;
use cloudloom_onboarding::config::{OnboardingConfig, TrustConfig};
use cloudloom_onboarding::consumer::LoggingFindingHandler;
use cloudloom_onboarding::orchestrator::{LogReporter, Onboarding};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cloudloom-onboarding")]
#[command(about = "Cross-account AWS onboarding for CloudLoom")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Where to find the target account and how to provision it
#[derive(clap::Args, Debug)]
struct TargetArgs {
    /// JSON configuration file
    #[arg(short, long, env = "CLOUDLOOM_CONFIG")]
    config: Option<PathBuf>,

    /// Role in the target account that trusts the platform
    #[arg(long, env = "CLOUDLOOM_ROLE_ARN")]
    role_arn: Option<String>,

    /// External id of the trust relationship
    #[arg(long, env = "CLOUDLOOM_EXTERNAL_ID", hide_env_values = true)]
    external_id: Option<String>,

    /// Home region for the bucket, log group, trail and queue
    #[arg(long)]
    region: Option<String>,

    /// Comma-separated regions whose API activity is routed to the queue
    #[arg(long, value_delimiter = ',')]
    monitored_regions: Vec<String>,

    /// Also set up compliance recording into the log bucket
    #[arg(long)]
    compliance_recording: bool,
}

impl TargetArgs {
    /// Build the run configuration, command-line values taking precedence
    fn into_config(self) -> Result<OnboardingConfig> {
        let mut config = match &self.config {
            Some(path) => OnboardingConfig::load(path)?,
            None => {
                let role_arn = self
                    .role_arn
                    .clone()
                    .context("--role-arn or a config file is required")?;
                let external_id = self
                    .external_id
                    .clone()
                    .context("--external-id or a config file is required")?;
                OnboardingConfig::new(TrustConfig::new(role_arn, external_id))
            }
        };

        if let Some(role_arn) = self.role_arn {
            config.trust.role_arn = role_arn;
        }
        if let Some(external_id) = self.external_id {
            config.trust.external_id = external_id;
        }
        if let Some(region) = self.region {
            config.regions.home = region;
        }
        if !self.monitored_regions.is_empty() {
            config.regions.monitored = self.monitored_regions;
        }
        if self.compliance_recording {
            config.provisioning.compliance_recording = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision the target account and consume findings until Ctrl-C
    Onboard(TargetArgs),

    /// Send a synthetic API call event to an onboarded account's queue
    SendTestMessage(TargetArgs),

    /// Print the deterministic resource names for an account
    Names {
        /// 12-digit AWS account id
        #[arg(long)]
        account: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Reduce noise from the AWS SDK (show only warnings and errors)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                .add_directive("aws_config=warn".parse()?)
                .add_directive("aws_smithy_runtime=warn".parse()?),
        )
        .init();

    match args.command {
        Command::Onboard(target) => onboard(target.into_config()?).await?,

        Command::SendTestMessage(target) => {
            let config = target.into_config()?;
            let provider = AwsProvider::from_env(config.home_region()).await;
            let onboarding = Onboarding::new(&provider, &config, CancellationToken::new());
            let message_id = onboarding.send_test_message(&LogReporter::new()).await?;
            println!("{message_id}");
        }

        Command::Names { account } => {
            let names = ResourceNameSet::for_account(&account)?;
            println!("{}", serde_json::to_string_pretty(&names)?);
        }
    }

    Ok(())
}

async fn onboard(config: OnboardingConfig) -> Result<()> {
    let provider = AwsProvider::from_env(config.home_region()).await;
    let cancel = CancellationToken::new();
    let onboarding = Onboarding::new(&provider, &config, cancel.clone());

    let outcome = onboarding
        .onboard(&LogReporter::new(), LoggingFindingHandler)
        .await?;
    println!(
        "{}",
        serde_json::to_string_pretty(outcome.summary.queue_info.as_ref())?
    );
    for warning in &outcome.summary.warnings {
        eprintln!("warning: {warning}");
    }

    info!(
        created = outcome.summary.created(),
        "Consuming findings, press Ctrl-C to stop"
    );
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    cancel.cancel();
    let report = outcome.consumer.join().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
