use clap::{Parser, Subcommand, ValueEnum};
use reflexion_tools::config::{Config, LoggingConfig};
use reflexion_tools::messages::{AssistantMessage, ToolCall};
use reflexion_tools::tools::{ReflexionTool, ToolNode};
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reflexion-tools", version, about = "Search tools for reflect-and-revise agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tool definitions handed to the model
    Tools,
    /// Dispatch a single tool call for the given queries
    Search {
        /// Tool name the call is addressed to
        #[arg(long, value_enum, default_value_t = ToolArg::AnswerQuestion)]
        tool: ToolArg,
        /// Search queries
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Dispatch every tool call in an assistant message (JSON file, or `-` for stdin)
    Dispatch { input: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum ToolArg {
    AnswerQuestion,
    ReviseAnswer,
}

impl From<ToolArg> for ReflexionTool {
    fn from(arg: ToolArg) -> Self {
        match arg {
            ToolArg::AnswerQuestion => ReflexionTool::AnswerQuestion,
            ToolArg::ReviseAnswer => ReflexionTool::ReviseAnswer,
        }
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", input.display(), e))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let calls = match cli.command {
        Command::Tools => {
            init_tracing(&LoggingConfig::default().filter);
            let definitions: Vec<_> = ReflexionTool::ALL.iter().map(ReflexionTool::definition).collect();
            println!("{}", serde_json::to_string_pretty(&definitions)?);
            return Ok(());
        }
        Command::Search { tool, queries } => {
            let tool = ReflexionTool::from(tool);
            vec![ToolCall::new(
                format!("call_{}", uuid::Uuid::new_v4().simple()),
                tool.name(),
                json!({ "search_queries": queries }),
            )]
        }
        Command::Dispatch { input } => {
            let message: AssistantMessage = serde_json::from_str(&read_input(&input)?)?;
            message.tool_calls()?
        }
    };

    // Load configuration
    let config = Config::from_env()?;
    init_tracing(&config.logging.filter);
    info!(
        max_results = config.search.max_results,
        max_concurrency = config.search.max_concurrency,
        tool_calls = calls.len(),
        "Configuration loaded"
    );

    let node = ToolNode::from_config(&config)?;
    let messages = node.invoke_all(&calls).await?;
    println!("{}", serde_json::to_string_pretty(&messages)?);

    Ok(())
}
