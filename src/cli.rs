use bakpdl::adapters::CsvMemberStore;
use bakpdl::config::{
    AppConfig, ChatConfig, DEFAULT_DISCORD_API_URL, DEFAULT_ZWIFT_API_URL, DEFAULT_ZWIFTPOWER_URL,
    NotifySettings, ZwiftConfig, parse_utc_offset,
};
use bakpdl::notify::SchedulePolicy;
use bakpdl::ports::TrackedMembers;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Lookup(AppConfig, Vec<String>),
    Event(AppConfig, String),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };

    match cli.command {
        None => RunOutcome::Serve(config),
        Some(Command::Zwiftid { queries }) => RunOutcome::Lookup(config, queries),
        Some(Command::Event { event }) => RunOutcome::Event(config, event),
        Some(Command::Signups { action }) => {
            let store = CsvMemberStore::new(&config.tracked_file);
            RunOutcome::Exit(run_signups(&store, action))
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "bakpdl",
    version,
    about = "Posts upcoming Zwift event signups of tracked riders to a chat channel"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "BAKPDL_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,
    #[arg(long, env = "BAKPDL_TRACKED_FILE", default_value = "user_signups.csv")]
    tracked_file: PathBuf,
    #[arg(long, env = "BAKPDL_UTC_OFFSET", default_value = "+01:00")]
    utc_offset: String,
    #[arg(long, env = "BAKPDL_LOOKAHEAD_HOURS", default_value_t = 4)]
    lookahead_hours: i64,
    #[arg(long, env = "BAKPDL_TEAM_ID", default_value_t = 13264)]
    team_id: u64,
    #[arg(long, env = "BAKPDL_COMMUNITY", default_value = "Backpedal")]
    community: String,
    #[arg(long, env = "BAKPDL_REFERENCE")]
    reference: Option<PathBuf>,
    #[arg(long, env = "BAKPDL_WEBHOOK_URL")]
    webhook_url: Option<String>,
    #[arg(long, env = "BAKPDL_BOT_TOKEN")]
    bot_token: Option<String>,
    #[arg(long, env = "BAKPDL_GUILD_ID")]
    guild_id: Option<u64>,
    #[arg(long, env = "BAKPDL_DISCORD_API_URL", default_value = DEFAULT_DISCORD_API_URL)]
    discord_api_url: String,
    #[arg(long, env = "BAKPDL_ZWIFTPOWER_URL", default_value = DEFAULT_ZWIFTPOWER_URL)]
    zwiftpower_url: String,
    #[arg(long, env = "BAKPDL_ZWIFTPOWER_COOKIE")]
    zwiftpower_cookie: Option<String>,
    #[arg(long, env = "BAKPDL_ZWIFT_API_URL", default_value = DEFAULT_ZWIFT_API_URL)]
    zwift_api_url: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Looks up rider ids by id, chat member or team roster name.
    Zwiftid {
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Renders the message for one event link or id.
    Event { event: String },
    /// Manages the riders whose signups are checked.
    Signups {
        #[command(subcommand)]
        action: SignupsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SignupsCommand {
    List,
    Add { rider_id: u64 },
    Del { rider_id: u64 },
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, String> {
    let offset = parse_utc_offset(&cli.utc_offset)?;
    if cli.lookahead_hours <= 0 {
        return Err("lookahead hours must be greater than 0".to_string());
    }
    if cli.community.trim().is_empty() {
        return Err("community name cannot be empty".to_string());
    }
    if let Some(url) = cli.webhook_url.as_deref()
        && url.trim().is_empty()
    {
        return Err("webhook url cannot be empty".to_string());
    }

    Ok(AppConfig {
        addr: cli.addr,
        tracked_file: cli.tracked_file.clone(),
        reference: cli.reference.clone(),
        notify: NotifySettings {
            policy: SchedulePolicy::new(offset),
            lookahead_hours: cli.lookahead_hours,
            team_id: cli.team_id,
            community: cli.community.trim().to_string(),
        },
        zwift: ZwiftConfig {
            api_url: cli.zwift_api_url.clone(),
            zwiftpower_url: cli.zwiftpower_url.clone(),
            zwiftpower_cookie: cli.zwiftpower_cookie.clone(),
        },
        chat: ChatConfig {
            api_url: cli.discord_api_url.clone(),
            webhook_url: cli.webhook_url.clone(),
            bot_token: cli.bot_token.clone(),
            guild_id: cli.guild_id,
        },
    })
}

fn run_signups(store: &CsvMemberStore, action: SignupsCommand) -> i32 {
    let result = match action {
        SignupsCommand::List => store.load().map(|ids| {
            let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
            println!("Zwiftids Signup Check: {}", ids.join(", "));
        }),
        SignupsCommand::Add { rider_id } => store.add(rider_id).map(|()| {
            println!("Added {rider_id} to check_signups list");
        }),
        SignupsCommand::Del { rider_id } => store.remove(rider_id).map(|removed| {
            if removed {
                println!("Removed {rider_id} from check_signups list");
            } else {
                println!("{rider_id} was not on the check_signups list");
            }
        }),
    };
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

pub(crate) async fn print_event(config: &AppConfig, input: &str) -> i32 {
    let message = match bakpdl::show_event(config, input).await {
        Ok(message) => message,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    match serde_json::to_string_pretty(&message) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(err) => {
            eprintln!("error: failed to encode message: {err}");
            1
        }
    }
}
