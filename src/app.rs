//! Session wiring: configuration, generation backend, browser tools and the
//! driver, plus the terminal loop that answers approval requests.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{info, warn};

use tabpilot_config::{ConfigError, ConfigHandle, ConfigLoader, ConfigWatcher};
use tabpilot_protocols::{ApprovalRequest, SessionError};
use tabpilot_provider_gemini::GeminiProvider;
use tabpilot_runtime::approval::parse_answer;
use tabpilot_runtime::{
    ChannelApprovalGate, PendingApproval, SessionDriver, SessionOutcome, TimeoutGate,
};
use tabpilot_tools_browser::{BrowserDispatcher, SurfaceRegistry};

use crate::cli::SessionArgs;

pub(crate) type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

type Input = Lines<BufReader<Stdin>>;

/// Load the configuration file, or defaults when it does not exist.
pub(crate) fn load_config(path: Option<PathBuf>) -> Result<ConfigHandle, ConfigError> {
    let path = path.unwrap_or_else(ConfigLoader::default_path);
    ConfigHandle::from_path(path)
}

/// Fold command-line overrides into the handle. Publishing through `update`
/// also validates the result.
fn apply_overrides(handle: &ConfigHandle, args: &SessionArgs) -> Result<(), ConfigError> {
    let mut config = (*handle.current()).clone();
    if args.auto_approve {
        config.approval.auto_approve = true;
    }
    if let Some(rounds) = args.max_rounds {
        config.session.max_rounds = rounds;
    }
    if let Some(model) = &args.model {
        config.provider.model = model.clone();
    }
    if let Some(key) = args.api_key.as_ref().filter(|k| !k.is_empty()) {
        config.provider.api_key = Some(key.clone());
    }
    handle.update(config)
}

/// One live session: the driver and the approval requests it raises.
pub(crate) struct Session {
    driver: SessionDriver,
    approvals: mpsc::Receiver<PendingApproval>,
    registry: Arc<SurfaceRegistry>,
    _watcher: Option<ConfigWatcher>,
}

impl Session {
    pub(crate) fn start(handle: ConfigHandle, args: &SessionArgs, watch: bool) -> AppResult<Self> {
        apply_overrides(&handle, args)?;
        let config = handle.current();

        let api_key = config
            .provider
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or("No API key configured: set provider.api_key or GEMINI_API_KEY")?;
        let provider = GeminiProvider::new(
            api_key,
            config.provider.base_url.clone(),
            Duration::from_secs(config.provider.request_timeout_secs),
        )?;

        let (tools, registry) = BrowserDispatcher::for_chrome(&handle);
        let (gate, approvals) = ChannelApprovalGate::channel(1);
        let gate = TimeoutGate::new(gate, Duration::from_secs(config.approval.timeout_secs));

        // Overrides would be lost on reload, so only watch an untouched file.
        let watcher = if watch && !args.overrides_config() && handle.source().is_some_and(|p| p.exists()) {
            match ConfigWatcher::start(handle.clone()) {
                Ok(w) => Some(w),
                Err(e) => {
                    warn!("Config hot reload disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        info!(
            model = %config.provider.model,
            max_rounds = config.session.max_rounds,
            auto_approve = config.approval.auto_approve,
            "Session started"
        );

        let driver = SessionDriver::new(Arc::new(provider), Arc::new(tools), Arc::new(gate), handle);
        Ok(Self {
            driver,
            approvals,
            registry,
            _watcher: watcher,
        })
    }

    /// Run one prompt, answering approval requests from `input` while the
    /// turn is in flight.
    async fn run_prompt(
        &mut self,
        prompt: &str,
        input: &mut Input,
    ) -> Result<SessionOutcome, SessionError> {
        let turn = self.driver.run_turn(prompt);
        tokio::pin!(turn);
        loop {
            tokio::select! {
                result = &mut turn => return result,
                Some(pending) = self.approvals.recv() => {
                    let approved = ask_approval(&pending.request, input).await;
                    let _ = pending.reply.send(approved);
                }
            }
        }
    }

    /// `tabpilot ask`: one prompt, answer on stdout.
    pub(crate) async fn ask(mut self, prompt: &str) -> AppResult<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let result = self.run_prompt(prompt, &mut input).await;
        self.close().await;
        match result {
            Ok(outcome) => {
                print_outcome(&outcome);
                Ok(())
            }
            Err(SessionError::Declined) => {
                println!("{}", SessionError::Declined.user_message());
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", e.user_message());
                Err(e.into())
            }
        }
    }

    /// `tabpilot chat`: read prompts until EOF or `/exit`.
    pub(crate) async fn chat(mut self) -> AppResult<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();
        println!("tabpilot chat. /clear forgets the conversation, /exit quits.");
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let Some(line) = input.next_line().await? else {
                break;
            };
            match line.trim() {
                "" => continue,
                "/exit" | "/quit" => break,
                "/clear" => {
                    self.driver.clear_history();
                    println!("Conversation cleared.");
                }
                prompt => match self.run_prompt(prompt, &mut input).await {
                    Ok(outcome) => print_outcome(&outcome),
                    Err(e) => {
                        warn!("Turn failed: {}", e);
                        println!("{}", e.user_message());
                    }
                },
            }
        }
        self.close().await;
        Ok(())
    }

    async fn close(&self) {
        if let Err(e) = self.registry.close().await {
            warn!("Failed to close browser connection: {}", e);
        }
    }
}

async fn ask_approval(request: &ApprovalRequest, input: &mut Input) -> bool {
    eprintln!("The assistant wants to run:\n{}", request.describe());
    eprint!("Run these actions? [y/N] ");
    match input.next_line().await {
        Ok(Some(line)) => parse_answer(&line),
        Ok(None) => false,
        Err(e) => {
            warn!("Failed to read approval answer: {}", e);
            false
        }
    }
}

fn print_outcome(outcome: &SessionOutcome) {
    info!(
        rounds = outcome.rounds,
        tool_calls = outcome.tool_calls_executed,
        forced_final = outcome.forced_final,
        "Turn finished"
    );
    println!("{}", outcome.answer);
}
