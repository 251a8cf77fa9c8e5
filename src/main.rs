use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use hookprompt::iced_ui::{self, IcedUiLaunchConfig};
use hookprompt::notice::Notice;
use hookprompt::render::render_plain;
use hookprompt::services::{PromptInput, Session, WebhookConfig, WebhookTester};
use hookprompt::storage::{SqliteStorage, Storage};
use hookprompt::webhook::WebhookClient;
use hookprompt::{HookPromptError, Result};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("HOOKPROMPT_GIT_SHA"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "hookprompt", version = VERSION)]
#[command(about = "Send prompts to an n8n webhook and keep the last ten replies")]
struct Cli {
    /// SQLite file holding the webhook URL and prompt history.
    #[arg(
        long,
        env = "HOOKPROMPT_DB",
        default_value_t = hookprompt::runtime_paths::default_db_path()
    )]
    db: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the desktop window (the default).
    Ui,
    /// Show, save, or test the webhook URL.
    Webhook {
        #[command(subcommand)]
        action: WebhookAction,
    },
    /// Send a prompt to the saved webhook and record the reply.
    Send {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Print the recent prompts, newest first.
    History,
    /// Forget every recorded prompt.
    ClearHistory,
}

#[derive(Subcommand, Debug)]
enum WebhookAction {
    Show,
    Set { url: String },
    /// Send the test payload; defaults to the saved URL.
    Test { url: Option<String> },
}

fn main() -> ExitCode {
    hookprompt::logging::init_tracing("hookprompt");
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", Notice::error(err.user_message()));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open(&cli.db)?);

    match cli.command.unwrap_or(Command::Ui) {
        Command::Ui => iced_ui::launch_ui(IcedUiLaunchConfig { storage })
            .map_err(|err| HookPromptError::Runtime(err.to_string())),
        Command::Webhook { action } => run_webhook(storage, action),
        Command::Send { prompt } => {
            let prompt = prompt.join(" ");
            let mut session = Session::load(storage)?;
            let input = PromptInput::new(WebhookClient::new());
            let submission = block_on(session.send_prompt(&input, &prompt))??;
            if let Some(item) = session.history().items().first() {
                if let Some(reply) = item
                    .response
                    .as_ref()
                    .and_then(hookprompt::render::displayable_response)
                {
                    println!("{reply}");
                }
            }
            if submission.succeeded() {
                eprintln!("{}", submission.notice);
                Ok(())
            } else {
                Err(HookPromptError::Http(submission.notice.message))
            }
        }
        Command::History => {
            let session = Session::load(storage)?;
            let rendered = render_plain(session.history());
            if !rendered.is_empty() {
                println!("{rendered}");
            }
            Ok(())
        }
        Command::ClearHistory => {
            let mut session = Session::load(storage)?;
            println!("{}", session.clear_history()?);
            Ok(())
        }
    }
}

fn run_webhook(storage: Arc<dyn Storage>, action: WebhookAction) -> Result<()> {
    let mut config = WebhookConfig::load(storage)?;
    match action {
        WebhookAction::Show => {
            if config.url().is_empty() {
                println!("Webhook not configured");
            } else {
                println!("{}", config.url());
            }
            Ok(())
        }
        WebhookAction::Set { url } => {
            let saved = config.save(&url)?;
            println!("{}", saved.notice);
            Ok(())
        }
        WebhookAction::Test { url } => {
            let url = url.unwrap_or_else(|| config.url().to_string());
            let tester = WebhookTester::new(WebhookClient::new());
            let notice = block_on(tester.test(&url))??;
            println!("{notice}");
            Ok(())
        }
    }
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| HookPromptError::Runtime(e.to_string()))?;
    Ok(runtime.block_on(future))
}
