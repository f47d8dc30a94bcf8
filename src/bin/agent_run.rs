//! Runs an agent CLI against a prompt and prints its normalized output.

use anyhow::{bail, Context};
use clap::Parser;
use linear_agent_runner::{
    available_provider_keys, compose_prompt, parse_command, provider_for_key, system_look_path,
    AgentRunOptions, AgentSession, AgentSettings, LogSettings, LookPath, Provider, Runner,
    SessionUpdate, TemplateProvider,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "agent-run", version, about = "Run a coding agent against an issue")]
struct Cli {
    /// Built-in provider to run: cursor or claude.
    #[arg(long, conflicts_with = "command")]
    provider: Option<String>,

    /// A configured command name, or a template such as "claude {prompt}".
    #[arg(long)]
    command: Option<String>,

    /// Value substituted for {branch} in command templates.
    #[arg(long, default_value = "")]
    branch: String,

    /// Model passed to the provider.
    #[arg(long)]
    model: Option<String>,

    /// Sandbox policy passed to the provider.
    #[arg(long)]
    sandbox: Option<String>,

    /// Directory the agent runs in. Defaults to the configured workspace.
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// File holding the issue context handed to the agent.
    #[arg(long)]
    context_file: Option<PathBuf>,

    /// Settings file. Defaults to ~/.linear-tui/settings.json.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// List installed providers and configured commands, then exit.
    #[arg(long)]
    list: bool,

    /// The instruction for the agent.
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let settings = match cli.settings.clone().or_else(AgentSettings::default_path) {
        Some(path) => AgentSettings::load(&path)?,
        None => AgentSettings::default(),
    };
    let look_path = system_look_path();

    if cli.list {
        print_inventory(&settings, &look_path);
        return Ok(());
    }

    let prompt = cli
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
        .context("a prompt is required")?;
    let issue_context = match cli.context_file {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("read context file {}", path.display()))?,
        None => String::new(),
    };

    let provider = select_provider(&cli, &settings, look_path, prompt, &issue_context)?;
    let mut options = settings.run_options();
    if let Some(ref workspace) = cli.workspace {
        options = options.with_workspace(workspace.clone());
    }
    if let Some(ref model) = cli.model {
        options = options.with_model(model.as_str());
    }
    if let Some(ref sandbox) = cli.sandbox {
        options = options.with_sandbox(sandbox.as_str());
    }

    run(provider, prompt, issue_context, options).await
}

fn init_logging() -> anyhow::Result<()> {
    let settings = LogSettings::from_env()?;
    let Some(path) = settings.file else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(settings.level.as_tracing()).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();
    Ok(())
}

fn print_inventory(settings: &AgentSettings, look_path: &LookPath) {
    let installed = available_provider_keys(look_path);
    if installed.is_empty() {
        println!("providers: (none installed)");
    } else {
        println!("providers: {}", installed.join(", "));
    }
    println!("commands:");
    for command in &settings.agent_commands {
        println!("  {}: {}", command.name, command.command);
    }
}

fn select_provider(
    cli: &Cli,
    settings: &AgentSettings,
    look_path: LookPath,
    prompt: &str,
    issue_context: &str,
) -> anyhow::Result<Arc<dyn Provider>> {
    if let Some(ref command) = cli.command {
        let (name, template) = settings
            .command(command)
            .map_or(("custom", command.as_str()), |configured| {
                (configured.name.as_str(), configured.command.as_str())
            });
        let prompt = compose_prompt(prompt, issue_context);
        let resolved = parse_command(template, &prompt, &cli.branch)?;
        return Ok(Arc::new(TemplateProvider::new(name, resolved)));
    }

    let key = match cli.provider {
        Some(ref key) => key.clone(),
        None => match available_provider_keys(&look_path).first() {
            Some(key) => (*key).to_string(),
            None => bail!("no agent CLI installed; pass --command with a template"),
        },
    };
    Ok(provider_for_key(&key, look_path)?)
}

async fn run(
    provider: Arc<dyn Provider>,
    prompt: &str,
    issue_context: String,
    options: AgentRunOptions,
) -> anyhow::Result<()> {
    let mut session = AgentSession::new(Runner::new());
    let mut updates = session.start(provider, prompt, issue_context, options)?;
    let mut interrupted = false;

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else {
                    bail!("agent run ended without reporting an exit status");
                };
                if let SessionUpdate::Finished(result) = update {
                    return result.map_err(Into::into);
                }
                print_update(update);
            }
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                if let Err(err) = signal {
                    tracing::warn!(error = %err, "failed to listen for ctrl-c");
                }
                interrupted = true;
                session.cancel();
            }
        }
    }
}

fn print_update(update: SessionUpdate) {
    match update {
        SessionUpdate::Session {
            session_id,
            resume_command,
            ..
        } => {
            if let Some(resume) = resume_command {
                eprintln!("session {session_id} (resume with: {resume})");
            }
        }
        SessionUpdate::Lines(lines) => {
            for line in lines {
                println!("[{}] {}", line.kind, line.text);
            }
        }
        SessionUpdate::Output(line) => println!("{line}"),
        SessionUpdate::StreamError(err) => eprintln!("warning: {err}"),
        SessionUpdate::Done { final_text } => {
            if !final_text.is_empty() {
                println!();
                println!("{final_text}");
            }
        }
        SessionUpdate::Finished(_) => {}
    }
}
