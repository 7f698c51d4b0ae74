use std::fs::OpenOptions;
use std::io::Write as _;
use std::os::unix::fs::OpenOptionsExt as _;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use kubenv::{gce, newest_kube_env, KubeConfig, KubeEnv};

/// Fetch a cluster's kube-env from its newest GCE instance template and
/// derive an `environment` file and a `kubeconfig` file from it.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Google Cloud project to list instance templates from
    project: String,

    /// Cluster name to match against the templates' cluster-name metadata
    cluster_name: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    info!(
        project = %cli.project,
        cluster_name = %cli.cluster_name,
        "getting kubeconfig"
    );

    let client = reqwest::blocking::Client::new();
    let token = gce::access_token(&client)?;
    let templates = gce::list_instance_templates(&client, &token, &cli.project)?;

    let selection = newest_kube_env(&templates, &cli.cluster_name, |template, err| {
        warn!(
            template = %template.name,
            timestamp = %template.creation_timestamp,
            "skipping template with unparseable creation timestamp: {err}"
        );
    })?;
    info!(template = %selection.template, created = %selection.created, "selected instance template");

    let kube_env = KubeEnv::parse(&selection.kube_env)?;
    let kube_config = KubeConfig::from_kube_env(&kube_env);

    write_output("environment", &kube_env.environment_text())?;
    write_output("kubeconfig", &kube_config.to_string())?;

    Ok(())
}

// Both artifacts carry credentials, so they stay owner-only. The mode only
// applies when the file is created; an existing file is truncated in place.
fn write_output(path: &str, contents: &str) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("Opening {path}"))?;

    file.write_all(contents.as_bytes())
        .with_context(|| format!("Writing {path}"))?;

    info!("wrote {path}");
    Ok(())
}
