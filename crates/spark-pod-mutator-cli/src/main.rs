use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use k8s_openapi::api::core::v1::{ConfigMap, Pod};
use serde::de::DeserializeOwned;
use snafu::{ResultExt, Snafu};
use spark_pod_mutator::{
    PatchSynthesizer,
    config_map::{ConfigMapReader, StaticConfigMaps},
    crd::SparkApplication,
    json_patch,
    options::MutationOptions,
    patch,
};

mod logging;

const APP_NAME: &str = "spark-pod-mutator";
const LOG_ENV_VAR: &str = "SPARK_POD_MUTATOR_LOG";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize logging"))]
    InitializeLogging { source: logging::Error },

    #[snafu(display("failed to read {path:?}"))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to parse {path:?}"))]
    ParseYaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to create Kubernetes client"))]
    CreateClient { source: kube::Error },

    #[snafu(display("failed to build JSON patch"))]
    BuildPatch { source: patch::Error },

    #[snafu(display("failed to write JSON patch"))]
    WritePatch { source: serde_json::Error },

    #[snafu(display("failed to write to stdout"))]
    WriteStdout { source: std::io::Error },
}

/// Computes the patch the Spark pod mutator applies to Spark driver and
/// executor pods.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prints the JSON patch for a pod.
    Render(RenderArguments),
}

#[derive(Debug, Args)]
struct RenderArguments {
    /// YAML file containing the pod.
    #[arg(long)]
    pod: PathBuf,

    /// YAML file containing the SparkApplication the pod belongs to.
    #[arg(long)]
    application: PathBuf,

    /// YAML file containing a ConfigMap the Spark ConfigMap is looked up in.
    /// Can be given multiple times.
    #[arg(long = "config-map", value_name = "FILE")]
    config_maps: Vec<PathBuf>,

    /// Looks up the Spark ConfigMap in the current Kubernetes cluster instead.
    #[arg(long, conflicts_with = "config_maps")]
    from_cluster: bool,

    /// Prints the patch as indented JSON.
    #[arg(long)]
    pretty: bool,

    #[command(flatten)]
    options: MutationOptions,
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    logging::initialize_logging(LOG_ENV_VAR, APP_NAME).context(InitializeLoggingSnafu)?;

    match cli.command {
        Command::Render(arguments) => {
            let json_patch = if arguments.from_cluster {
                let client = kube::Client::try_default()
                    .await
                    .context(CreateClientSnafu)?;
                render(client, &arguments).await?
            } else {
                let config_maps = arguments
                    .config_maps
                    .iter()
                    .map(|path| read_yaml::<ConfigMap>(path))
                    .collect::<Result<StaticConfigMaps, _>>()?;
                render(config_maps, &arguments).await?
            };

            let mut stdout = std::io::stdout().lock();
            if arguments.pretty {
                serde_json::to_writer_pretty(&mut stdout, &json_patch)
            } else {
                serde_json::to_writer(&mut stdout, &json_patch)
            }
            .context(WritePatchSnafu)?;
            writeln!(stdout).context(WriteStdoutSnafu)?;

            Ok(())
        }
    }
}

async fn render<R>(reader: R, arguments: &RenderArguments) -> Result<json_patch::Patch, Error>
where
    R: ConfigMapReader,
{
    let pod: Pod = read_yaml(&arguments.pod)?;
    let application: SparkApplication = read_yaml(&arguments.application)?;

    let synthesizer = PatchSynthesizer::new(reader, arguments.options.clone());
    let patch = synthesizer.synthesize(&pod, &application).await;
    tracing::info!(operations = patch.len(), "rendered pod patch");

    patch.into_json_patch().context(BuildPatchSnafu)
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let content = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
    serde_yaml::from_str(&content).context(ParseYamlSnafu { path })
}
