//! CLI entrypoint for code-weaver
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use weaver_application::{
    AgentInvoker, ContextProvider, ConversationLogger, EvaluateCodeUseCase, LlmGateway,
    NoConversationLogger, NoProgress, PipelineError, PipelineProgressNotifier, RefineCodeUseCase,
    RefineError, RequestContext, RouteQueryUseCase, RunPipelineUseCase,
};
use weaver_domain::{
    Attachment, CodeChange, ContextSnippet, GeneratedCode, OutputFormat, Query, SafetyGate,
};
use weaver_infrastructure::{
    CommandLlmGateway, ConfigLoader, FileConfig, JsonlConversationLogger, LocalContextProvider,
    ProcessTestRunner,
};
use weaver_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormatter, ProgressReporter, SimpleProgress,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("failed to load configuration: {}", e))?
    };

    let log_dir = cli.log_dir.clone().or_else(|| config.logging.log_dir.clone());
    let _log_guard = init_logging(cli.verbose, log_dir.as_deref())?;

    for issue in config.check()? {
        warn!("config: {}", issue);
    }

    let Some(command) = cli.command.clone() else {
        bail!("No command given. Run `code-weaver --help` for usage.");
    };

    if !config.output.color {
        colored::control::set_override(false);
    }
    let format = cli.output.or(config.output.format).unwrap_or_default();

    info!("Starting code-weaver");

    // === Dependency Injection ===
    let wiring = Wiring::from_config(&config, cli.repo.clone())?;

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the current request");
            interrupt.cancel();
        }
    });

    let progress: Arc<dyn PipelineProgressNotifier> = if cli.quiet {
        Arc::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    };

    let request_text = match &command {
        Command::Ask { query } | Command::Route { query } => query.clone(),
        Command::Evaluate { request, .. } | Command::Refine { request } => request.clone(),
    };
    let query = build_query(&request_text, &wiring.repo_root, &cli.attach)?;
    let ctx = RequestContext::new(query.id().clone())
        .with_cancellation(token)
        .with_progress(progress)
        .with_logger(wiring.logger.clone());

    let output = match command {
        Command::Ask { .. } => {
            let use_case = RunPipelineUseCase::new(
                wiring.gateway.clone(),
                wiring.context_provider.clone(),
                wiring.test_runner.clone(),
            )
            .with_models(wiring.invoker.models().clone())
            .with_params(wiring.invoker.params().clone())
            .with_policy(*wiring.evaluate.policy())
            .with_safety_gate(wiring.gate.clone());

            match use_case.execute_with_context(&query, &ctx).await {
                Ok(result) => ConsoleFormatter.render(&result, format),
                Err(PipelineError::Cancelled) => bail!("Request cancelled"),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Route { .. } => {
            let (route, _) = RouteQueryUseCase::new(wiring.invoker.clone())
                .with_safety_gate(wiring.gate.clone())
                .execute_with_context(&query, &ctx)
                .await;
            match format {
                OutputFormat::Json => ConsoleFormatter::format_json(&route),
                _ => ConsoleFormatter::format_route(&route),
            }
        }
        Command::Evaluate { request, files } => {
            let code = read_code_files(&files)?;
            let context = wiring.load_context(&query).await;
            match wiring.evaluate.execute(&request, &code, &context, &ctx).await {
                Ok(run) => match format {
                    OutputFormat::Json => ConsoleFormatter::format_json(&run.verdict),
                    _ => ConsoleFormatter::format_evaluation(&run.verdict),
                },
                Err(PipelineError::Cancelled) => bail!("Request cancelled"),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Refine { request } => {
            let context = wiring.load_context(&query).await;
            let refine = RefineCodeUseCase::new(wiring.invoker.clone(), wiring.test_runner.clone());
            match refine.execute(&request, &context, &ctx).await {
                Ok(run) => match format {
                    OutputFormat::Json => ConsoleFormatter::format_json(&run.session),
                    _ => {
                        let mut text = ConsoleFormatter::format_refinement(&run.session);
                        if let Some(code) = run.session.final_code() {
                            text.push('\n');
                            text.push_str(&code.render());
                        }
                        text
                    }
                },
                Err(RefineError::Cancelled) => bail!("Request cancelled"),
            }
        }
    };

    println!("{}", output);
    Ok(())
}

/// Adapters and use cases built from the merged configuration
struct Wiring {
    repo_root: PathBuf,
    gateway: Arc<dyn LlmGateway>,
    context_provider: Arc<dyn ContextProvider>,
    test_runner: Arc<ProcessTestRunner>,
    logger: Arc<dyn ConversationLogger>,
    invoker: AgentInvoker,
    evaluate: EvaluateCodeUseCase,
    gate: SafetyGate,
}

impl Wiring {
    fn from_config(config: &FileConfig, repo: Option<PathBuf>) -> Result<Self> {
        // `check()` already rejected error-level issues
        let (models, _) = config.models.to_model_config();
        let (params, _) = config.pipeline.to_execution_params();
        let (policy, _) = config.evaluation.to_policy();
        let (gate, _) = config.router.to_safety_gate();

        let repo_root = match repo {
            Some(path) => path,
            None => std::env::current_dir().context("cannot determine working directory")?,
        };

        let gateway: Arc<dyn LlmGateway> = Arc::new(CommandLlmGateway::new(
            config.gateway.command.clone(),
            config.gateway.args.clone(),
        )?);

        let test_runner = Arc::new(config.test_runner.to_runner());

        let logger: Arc<dyn ConversationLogger> = match &config.logging.conversation_log {
            Some(path) => Arc::new(JsonlConversationLogger::open(path).with_context(|| {
                format!("cannot open conversation log {}", path.display())
            })?),
            None => Arc::new(NoConversationLogger),
        };

        let invoker = AgentInvoker::new(gateway.clone(), models, params);
        let evaluate = EvaluateCodeUseCase::new(invoker.clone()).with_policy(policy);

        Ok(Self {
            context_provider: Arc::new(LocalContextProvider::new(repo_root.clone())),
            repo_root,
            gateway,
            test_runner,
            logger,
            invoker,
            evaluate,
            gate,
        })
    }

    /// Context for the standalone evaluate/refine commands; failures only warn
    async fn load_context(&self, query: &Query) -> Vec<ContextSnippet> {
        match self.context_provider.get_context(query).await {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!("Context unavailable: {}", e);
                Vec::new()
            }
        }
    }
}

/// Console logging by verbosity, plus a daily log file when a directory is given
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level));

    let Some(dir) = log_dir else {
        tracing_subscriber::registry().with(console).init();
        return Ok(None);
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("code-weaver")
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(EnvFilter::new(if verbose >= 3 { "trace" } else { "debug" }));

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(Some(guard))
}

/// Query with the repository root and every `--attach` file
fn build_query(text: &str, repo_root: &Path, attach: &[PathBuf]) -> Result<Query> {
    let mut query = Query::try_new(text)?.with_repository(repo_root.to_string_lossy());
    for path in attach {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read attachment {}", path.display()))?;
        query = query.with_attachment(Attachment::new(path.display().to_string(), content));
    }
    Ok(query)
}

/// Files passed to `evaluate --file`, keyed by the path as given
fn read_code_files(files: &[PathBuf]) -> Result<GeneratedCode> {
    let mut changes = Vec::with_capacity(files.len());
    for path in files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        changes.push(CodeChange::new(path.display().to_string(), content));
    }
    Ok(GeneratedCode::new(changes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weaver_application::ExecutionParams;

    #[test]
    fn test_build_query_reads_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("db.rs");
        std::fs::write(&file, "fn connect() {}").unwrap();

        let query = build_query("Add pooling", dir.path(), std::slice::from_ref(&file)).unwrap();
        assert_eq!(query.text(), "Add pooling");
        assert_eq!(query.repository(), Some(dir.path().to_string_lossy().as_ref()));
        assert_eq!(query.attachments()[0].content, "fn connect() {}");
    }

    #[test]
    fn test_build_query_missing_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_query("q", dir.path(), &[dir.path().join("missing.rs")]).unwrap_err();
        assert!(err.to_string().contains("cannot read attachment"));
    }

    #[test]
    fn test_empty_query_rejected() {
        assert!(build_query("  ", Path::new("."), &[]).is_err());
    }

    #[test]
    fn test_read_code_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.rs");
        std::fs::write(&a, "pub fn a() {}").unwrap();

        let code = read_code_files(std::slice::from_ref(&a)).unwrap();
        assert_eq!(code.len(), 1);
        assert_eq!(code.get(&a.display().to_string()), Some("pub fn a() {}"));
    }

    #[test]
    fn test_wiring_from_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let wiring = Wiring::from_config(&FileConfig::default(), Some(dir.path().to_path_buf()))
            .unwrap();
        assert_eq!(wiring.repo_root, dir.path());
        assert_eq!(wiring.invoker.params(), &ExecutionParams::default());
    }
}
