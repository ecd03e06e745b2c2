use std::process::ExitCode;

use anyhow::{Context, Result};
use bollard::Docker;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pull_benchmark::{
    analyze::{analyze, AnalyzeOptions},
    cli::{AnalyzeArgs, Cli, ClusterArgs, Command, GenerateArgs, MeasureArgs, SuiteArgs},
    config::{Config, LogFormat},
    generate::{generate, GenerateOptions},
    k8s::K8sClient,
    measure::{run_suite, MeasureOptions, Measurer, SuiteOptions},
    store::{result_path, suite_path, write_json},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("unexpected error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load().context("could not load configuration")?;
    init_tracing(config.log_format);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    match cli.command {
        Command::Generate(args) => run_generate(&config, args, cancel).await,
        Command::Measure(args) => run_measure(&config, args, cancel).await,
        Command::Suite(args) => run_suite_command(&config, args, cancel).await,
        Command::Analyze(args) => run_analyze(args),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("could not listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("could not listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::warn!("Received shutdown signal, cancelling");
    cancel.cancel();
}

async fn run_generate(
    config: &Config,
    args: GenerateArgs,
    cancel: CancellationToken,
) -> Result<()> {
    let size = args
        .size()
        .context("either image size or layer size must be set")?;
    let options = GenerateOptions {
        image_name: args.image_name,
        layer_count: args.layer_count,
        size,
        base_image: config.base_image.clone(),
    };

    let docker = Docker::connect_with_local_defaults().context("could not connect to docker")?;
    generate(&docker, &options, &cancel)
        .await
        .with_context(|| format!("could not generate image {}", options.image_name))?;
    Ok(())
}

async fn connect(config: &Config, args: &ClusterArgs) -> Result<K8sClient> {
    let namespace = args.namespace.as_deref().unwrap_or(&config.namespace);
    let client = K8sClient::new(args.kubeconfig.as_deref(), namespace)
        .await
        .context("could not create kubernetes client")?;
    tracing::info!(namespace = client.namespace(), "using namespace");
    Ok(client)
}

async fn run_measure(config: &Config, args: MeasureArgs, cancel: CancellationToken) -> Result<()> {
    let client = connect(config, &args.cluster).await?;
    let measurer = Measurer::new(&client, MeasureOptions::from(config), cancel);

    let result = measurer.run(&args.images).await.context("measurement failed")?;
    let timestamp = result
        .metadata
        .as_ref()
        .map(|m| m.timestamp)
        .unwrap_or_else(chrono::Utc::now);
    write_json(&result_path(&args.output_dir, timestamp), &result)?;
    Ok(())
}

async fn run_suite_command(
    config: &Config,
    args: SuiteArgs,
    cancel: CancellationToken,
) -> Result<()> {
    let client = connect(config, &args.cluster).await?;
    let measurer = Measurer::new(&client, MeasureOptions::from(config), cancel);

    let options = SuiteOptions {
        name: args.name,
        registry: args.registry.unwrap_or_else(|| config.suite_registry.clone()),
        repository: args
            .repository
            .unwrap_or_else(|| config.suite_repository.clone()),
        pause: config.suite_pause(),
    };
    let suite = run_suite(&measurer, &options)
        .await
        .with_context(|| format!("suite {} failed", options.name))?;
    write_json(&suite_path(&args.output_dir, &options.name), &suite)?;
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let options = AnalyzeOptions::from(args);
    let written = analyze(&options).context("analysis failed")?;
    if written.is_empty() {
        tracing::warn!("no result files found to analyze");
    }
    Ok(())
}
