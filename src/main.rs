use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flowdeploy_config::{RunConfigDef, StorageDef};
use flowdeploy_registry::{CloudClient, CloudConfig, DEFAULT_API_URL, ErrorPolicy, FlowDeployment};
use flowdeploy_runner::{FlowRunner, RunnerConfig};
use flowdeploy_source::{SourceFilter, discover, extract_flow};
use flowdeploy_task::AwsCredentials;

/// Flowdeploy - discover, register and run flows
#[derive(Parser)]
#[command(name = "flowdeploy")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log filter, e.g. `info` or `flowdeploy_registry=debug` (default: RUST_LOG or info)
  #[arg(long, global = true)]
  log_level: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Register every flow under the flows directory
  Register(RegisterArgs),

  /// List the flow files that would be registered
  Discover {
    /// Root directory holding flow files
    #[arg(long, default_value = "./src/flows")]
    flows_path: PathBuf,
  },

  /// Run a flow locally
  Run {
    /// Path to the flow file (YAML or JSON)
    flow_file: PathBuf,

    /// AWS credentials as JSON: {"ACCESS_KEY": ..., "SECRET_ACCESS_KEY": ..., "SESSION_TOKEN": ...}
    #[arg(long, env = "FLOWDEPLOY_AWS_CREDENTIALS", hide_env_values = true)]
    aws_credentials: Option<String>,
  },
}

#[derive(Args)]
struct RegisterArgs {
  /// Deployment environment, e.g. Prod or Dev
  #[arg(long, env = "ENVIRONMENT")]
  environment: String,

  /// Project the flows are registered under
  #[arg(long, env = "PREFECT_PROJECT_NAME")]
  project_name: String,

  /// Bucket flow artifacts are uploaded to
  #[arg(long, env = "PREFECT_STORAGE_BUCKET")]
  storage_bucket: String,

  /// Container image flow runs start from
  #[arg(long, env = "PREFECT_IMAGE")]
  image: String,

  /// ECS task definition ARN for flow runs
  #[arg(long, env = "PREFECT_TASK_DEFINITION_ARN")]
  task_definition_arn: String,

  /// Optional YAML task definition attached to the run configuration
  #[arg(long)]
  task_definition_path: Option<PathBuf>,

  /// Root directory holding flow files
  #[arg(long, default_value = "./src/flows")]
  flows_path: PathBuf,

  /// Orchestration API endpoint
  #[arg(long, env = "PREFECT__CLOUD__API", default_value = DEFAULT_API_URL)]
  api_url: String,

  /// Orchestration API key
  #[arg(long, env = "PREFECT__CLOUD__API_KEY", hide_env_values = true)]
  api_key: Option<String>,

  /// Keep registering after a flow fails and report all failures at the end
  #[arg(long)]
  continue_on_error: bool,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.log_level.as_deref());

  match cli.command {
    Some(Commands::Register(args)) => block_on(register(args)),
    Some(Commands::Discover { flows_path }) => discover_flows(&flows_path),
    Some(Commands::Run {
      flow_file,
      aws_credentials,
    }) => block_on(run_flow(flow_file, aws_credentials)),
    None => {
      println!("flowdeploy - use --help to see available commands");
      Ok(())
    }
  }
}

fn init_tracing(log_level: Option<&str>) {
  let filter = match log_level {
    Some(level) => EnvFilter::new(level),
    None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(future)
}

async fn register(args: RegisterArgs) -> Result<()> {
  info!(
    environment = %args.environment,
    project = %args.project_name,
    flows_path = %args.flows_path.display(),
    "starting flow registration"
  );

  let mut run_config = RunConfigDef::ecs(
    vec![args.project_name.clone()],
    Some(args.image),
    Some(args.task_definition_arn),
  );
  if let (Some(path), RunConfigDef::Ecs { task_definition, .. }) =
    (&args.task_definition_path, &mut run_config)
  {
    *task_definition = Some(load_task_definition(path)?);
  }

  let client = CloudClient::new(CloudConfig {
    api_url: args.api_url,
    api_key: args.api_key,
  });

  let policy = if args.continue_on_error {
    ErrorPolicy::ContinueOnError
  } else {
    ErrorPolicy::FailFast
  };

  let deployment = FlowDeployment::new(
    args.project_name,
    StorageDef::s3(args.storage_bucket),
    run_config,
    client,
  )
  .with_error_policy(policy);

  let report = deployment
    .register_all_flows(&args.flows_path)
    .await
    .context("flow registration failed")?;

  println!("{}", serde_json::to_string_pretty(&report)?);

  if !report.is_success() {
    bail!("{} flow(s) failed to register", report.failed.len());
  }
  Ok(())
}

fn load_task_definition(path: &Path) -> Result<serde_json::Value> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read task definition: {}", path.display()))?;
  serde_yaml::from_str(&content)
    .with_context(|| format!("failed to parse task definition: {}", path.display()))
}

fn discover_flows(flows_path: &Path) -> Result<()> {
  let files = discover(flows_path, &SourceFilter::default())
    .with_context(|| format!("failed to discover flows in {}", flows_path.display()))?;

  let mut flows = Vec::new();
  for path in files {
    let flow = extract_flow(&path)?;
    flows.push(serde_json::json!({
      "path": path,
      "name": flow.name,
      "tasks": flow.tasks.len(),
    }));
  }

  println!("{}", serde_json::to_string_pretty(&flows)?);
  Ok(())
}

async fn run_flow(flow_file: PathBuf, aws_credentials: Option<String>) -> Result<()> {
  let flow = extract_flow(&flow_file)?;

  let credentials = aws_credentials
    .map(|raw| serde_json::from_str::<AwsCredentials>(&raw))
    .transpose()
    .context("failed to parse AWS credentials JSON")?;

  let cancel = CancellationToken::new();
  let on_signal = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_signal.cancel();
    }
  });

  let runner = FlowRunner::new(RunnerConfig { credentials });
  let result = runner
    .run(&flow, cancel)
    .await
    .with_context(|| format!("failed to run flow '{}'", flow.name))?;

  println!("{}", serde_json::to_string_pretty(&result)?);

  if !result.is_success() {
    bail!("flow run {} failed", result.flow_run_id);
  }
  Ok(())
}
