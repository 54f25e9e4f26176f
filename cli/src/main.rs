use clap::CommandFactory;
use clap::Parser;
use clap_complete::Shell;
use clap_complete::generate;
use ragchat_cli::CliConfigOverrides;
use ragchat_cli::SessionArgs;
use ragchat_cli::chat::render_turn;
use ragchat_cli::chat::run_chat;
use ragchat_cli::debug::embed_report;
use ragchat_cli::debug::inspect_report;
use ragchat_cli::init_logging;
use ragchat_cli::load_config;
use ragchat_cli::load_embedder;
use ragchat_cli::start_session;
use ragchat_core::Secrets;
use tracing::info;

/// Ask questions about a text corpus stored in a vector database.
///
/// If no subcommand is specified, an interactive chat is started.
#[derive(Debug, Parser)]
#[clap(
    author,
    name = "ragchat",
    version = env!("CARGO_PKG_VERSION"),
    bin_name = "ragchat"
)]
struct MultitoolCli {
    #[clap(flatten)]
    config_overrides: CliConfigOverrides,

    #[clap(flatten)]
    session: SessionArgs,

    #[clap(subcommand)]
    subcommand: Option<Subcommand>,
}

#[derive(Debug, clap::Subcommand)]
enum Subcommand {
    /// Start an interactive chat (default).
    Chat,

    /// Answer a single question and exit.
    #[clap(visible_alias = "a")]
    Ask(AskCommand),

    /// Internal debugging commands.
    Debug(DebugArgs),

    /// Generate shell completion scripts.
    Completion(CompletionCommand),
}

#[derive(Debug, Parser)]
struct AskCommand {
    /// The question to answer.
    #[arg(value_name = "QUESTION", required = true, num_args = 1..)]
    question: Vec<String>,
}

#[derive(Debug, Parser)]
struct CompletionCommand {
    /// Shell to generate completions for
    #[clap(value_enum, default_value_t = Shell::Bash)]
    shell: Shell,
}

#[derive(Debug, Parser)]
struct DebugArgs {
    #[command(subcommand)]
    cmd: DebugCommand,
}

#[derive(Debug, clap::Subcommand)]
enum DebugCommand {
    /// Embed a text and print its dimension as JSON.
    Embed(EmbedArgs),

    /// Print the resolved endpoints and parameters as JSON without sending a request.
    Inspect,
}

#[derive(Debug, Parser)]
struct EmbedArgs {
    text: String,

    /// Also print the cosine similarity to this text.
    #[arg(long = "compare", value_name = "TEXT")]
    compare: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = MultitoolCli::parse();

    if let Some(Subcommand::Completion(completion_cli)) = &cli.subcommand {
        print_completion(completion_cli.shell);
        return Ok(());
    }

    let config = load_config(&cli.config_overrides, &cli.session)?;
    let _log_guard = init_logging(&config.log_dir(), cli.session.log_stderr)?;
    info!(home = %config.ragchat_home.display(), "ragchat starting");

    match cli.subcommand {
        None | Some(Subcommand::Chat) => {
            let mut session = start_session(&config, &cli.session).await?;
            run_chat(&mut session, &config.prompt.persona).await?;
        }
        Some(Subcommand::Ask(ask)) => {
            let mut session = start_session(&config, &cli.session).await?;
            let report = session.submit(&ask.question.join(" ")).await;
            println!("{}", render_turn(&report));
        }
        Some(Subcommand::Debug(debug_args)) => match debug_args.cmd {
            DebugCommand::Embed(args) => {
                let embedder = load_embedder(&config, cli.session.offline_embeddings).await?;
                let report = embed_report(embedder.as_ref(), &args.text, args.compare.as_deref())?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            DebugCommand::Inspect => {
                let secrets = Secrets::load(&config.ragchat_home).ok();
                let report = inspect_report(&config, secrets.as_ref())?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        },
        Some(Subcommand::Completion(_)) => {}
    }
    Ok(())
}

fn print_completion(shell: Shell) {
    let mut app = MultitoolCli::command();
    let name = "ragchat";
    generate(shell, &mut app, name, &mut std::io::stdout());
}
