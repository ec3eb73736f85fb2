//! Prizma Mini App CLI - main entry point
//!
//! Runs the Mini App flow from a terminal, or inside a Telegram host that
//! speaks the Web App event protocol over stdin/stdout.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use prizma_miniapp::bridge::{self, HostEnvironment, StdoutTransport, TerminalShell};
use prizma_miniapp::models::{Gender, ReportTier, UserProfile};
use prizma_miniapp::pages::{self, question};
use prizma_miniapp::polling::{PaymentMonitor, ReportPoller, UnmatchedPolicy};
use prizma_miniapp::{metrics, policy, App, Config, Landing, LocalStorage, Page, Session};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "prizma_miniapp")]
#[command(about = "Prizma Mini App client", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config.yml
    #[arg(long, env = "PRIZMA_CONFIG")]
    config: Option<PathBuf>,

    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    /// Store a test user id used outside Telegram
    #[arg(long)]
    user_id: Option<i64>,

    /// URL the app was launched with (carries tgWebApp* parameters)
    #[arg(long, env = "PRIZMA_LAUNCH_URL")]
    launch_url: Option<String>,

    #[arg(long, env = "PRIZMA_USER_AGENT")]
    user_agent: Option<String>,

    #[arg(long, env = "PRIZMA_REFERRER")]
    referrer: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a page and follow its redirects
    Open {
        /// Page name or file name (e.g. price-offer, login.html)
        #[arg(default_value = "index")]
        page: String,

        /// Bot start parameter (payment_success, payment_failed)
        #[arg(long)]
        start_param: Option<String>,
    },

    /// Show the report status and the routing decision for it
    Status,

    /// Poll report readiness until the policy decides
    Poll {
        /// Stop after this many status checks
        #[arg(long)]
        max_rounds: Option<usize>,
    },

    /// Show or update the user profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show the current question
    Question,

    /// Answer the current question
    Answer {
        /// Answer text
        #[arg(required_unless_present = "file")]
        text: Option<String>,

        /// Read the answer from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Start premium checkout
    Pay {
        /// Wait for the payment to settle
        #[arg(long, default_value_t = false)]
        watch: bool,
    },

    /// Show the special offer countdown
    Timer {
        /// Restart the offer timer
        #[arg(long, default_value_t = false)]
        reset: bool,
    },

    /// Download a report PDF
    Download {
        /// free or premium
        tier: String,

        /// Output file; defaults to the suggested report name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Discard all answers and start over
    ResetTest,

    /// Stop a running report generation
    StopReport,
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Set {
        #[arg(long)]
        name: String,

        #[arg(long)]
        age: u32,

        /// male or female
        #[arg(long)]
        gender: String,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Open { .. } => "open",
            Commands::Status => "status",
            Commands::Poll { .. } => "poll",
            Commands::Profile { .. } => "profile",
            Commands::Question => "question",
            Commands::Answer { .. } => "answer",
            Commands::Pay { .. } => "pay",
            Commands::Timer { .. } => "timer",
            Commands::Download { .. } => "download",
            Commands::ResetTest => "reset_test",
            Commands::StopReport => "stop_report",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries host events
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("prizma_miniapp=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let session = build_session(&cli)?;

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(cli.command, session).await;

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    result
}

fn build_session(cli: &Cli) -> anyhow::Result<Session> {
    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::new(),
    };

    let env = HostEnvironment {
        launch_url: cli.launch_url.clone(),
        user_agent: cli.user_agent.clone(),
        referrer: cli.referrer.clone(),
    };
    let bridge = bridge::connect(&env, Box::new(StdoutTransport), Box::new(TerminalShell));
    let storage = LocalStorage::open(&config.storage_path)?;

    let session = Session::new(config, bridge, storage)?;
    if let Some(user_id) = cli.user_id {
        session.set_test_user_id(user_id)?;
        info!(user_id, "Test user id stored");
    }
    Ok(session)
}

async fn execute_command(command: Commands, session: Session) -> anyhow::Result<()> {
    let user_id = session.user_id();
    let api = session.api().clone();

    match command {
        Commands::Open { page, start_param } => {
            let page = Page::from_filename(&page)
                .with_context(|| format!("Unknown page: {}", page))?;
            let target = start_param
                .as_deref()
                .and_then(prizma_miniapp::routing::page_for_start_param)
                .unwrap_or(page);
            let mut app = App::new(session);
            print_landing(&app.start(target).await?);
        }
        Commands::Status => {
            let status = api.reports_status(user_id).await?;
            let decision = policy::Policy::from_config(session.config()).decide(&status);
            println!("{}", serde_json::to_string_pretty(&status)?);
            println!("rule: {}", decision.rule.as_str());
            println!("action: {:?}", decision.action);
        }
        Commands::Poll { max_rounds } => {
            let mut poller = ReportPoller::new(&session).on_unmatched(UnmatchedPolicy::Stop);
            if let Some(rounds) = max_rounds {
                poller = poller.max_rounds(rounds);
            }
            println!("{:?}", poller.run().await?);
        }
        Commands::Profile { action } => match action {
            ProfileAction::Show => {
                let profile = api.get_profile(user_id).await?;
                println!("{}", serde_json::to_string_pretty(&profile)?);
            }
            ProfileAction::Set { name, age, gender } => {
                let gender = Gender::parse(&gender)
                    .with_context(|| format!("Unknown gender: {}", gender))?;
                let form = pages::ProfileForm::new(name, age, gender);
                let profile: UserProfile = form.validate()?;
                api.save_profile(user_id, &profile).await?;
                println!("Profile saved for user {}", user_id);
            }
        },
        Commands::Question => {
            let mut app = App::new(session);
            print_landing(&app.open(Page::Question).await?);
        }
        Commands::Answer { text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("answer text or --file is required"),
            };
            let mut app = App::new(session.clone());
            let landing = app.open(Page::Question).await?;
            if landing.page() != Some(Page::Question) {
                print_landing(&landing);
                return Ok(());
            }
            let outcome = question::submit_answer(&session, &text).await?;
            print_landing(&app.follow(outcome).await?);
        }
        Commands::Pay { watch } => {
            let payment = api.start_premium_payment(user_id).await?;
            match payment.link() {
                Some(link) => println!("{}", link),
                None => anyhow::bail!(
                    "{}",
                    payment.message.as_deref().unwrap_or(pages::PAYMENT_ERROR)
                ),
            }
            if watch {
                let outcome = PaymentMonitor::new(&session).run().await;
                println!("{:?}", outcome);
            }
        }
        Commands::Timer { reset } => {
            if reset {
                api.reset_special_offer_timer(user_id).await?;
            }
            let timer = api.special_offer_timer(user_id).await?;
            match prizma_miniapp::offer::OfferView::from_timer(&timer, true) {
                Some(view) => {
                    println!("{}", view.time);
                    if let Some(price) = view.price {
                        match price.original {
                            Some(original) => println!("{} (instead of {})", price.current, original),
                            None => println!("{}", price.current),
                        }
                    }
                }
                None => println!("No active offer"),
            }
        }
        Commands::Download { tier, output } => {
            let tier = ReportTier::parse(&tier)
                .with_context(|| format!("Unknown report tier: {}", tier))?;
            let bytes = api.fetch_report(user_id, tier).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(pages::report_filename(user_id, tier)));
            std::fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Saved {} bytes to {}", bytes.len(), path.display());
        }
        Commands::ResetTest => {
            let response = api.reset_test(user_id).await?;
            println!("{}", response.message.as_deref().unwrap_or("Test reset"));
        }
        Commands::StopReport => {
            let response = api.stop_report_generation(user_id).await?;
            println!(
                "{}",
                response.message.as_deref().unwrap_or("Report generation stopped")
            );
        }
    }

    Ok(())
}

fn print_landing(landing: &Landing) {
    match landing {
        Landing::Shown { page, view } => println!("{}: {:#?}", page, view),
        Landing::Unchanged { page } => println!("{}", page),
        Landing::External { page, url } => println!("{} -> {}", page, url),
        Landing::Closed => println!("closed"),
    }
}
