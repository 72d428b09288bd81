use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use whatsupbot::client::TwitterClient;
use whatsupbot::config::{Config, Credentials};
use whatsupbot::{Check, Plan};

#[derive(Parser, Debug)]
#[command(name = "whatsupbot", version)]
#[command(about = "Checks whether your bots are still tweeting")]
struct Args {
    /// Screen name to check
    #[arg(long)]
    screen_name: Option<String>,

    /// Gaps of this many hours are a problem
    #[arg(long, default_value_t = 24)]
    hours: i64,

    /// User to notify when a bot is down
    #[arg(long = "notify", value_name = "USER")]
    recipient: Option<String>,

    /// Identity reports are written as; first-person wording when it
    /// matches the checked account
    #[arg(long)]
    sender: Option<String>,

    /// Report on healthy accounts too
    #[arg(long)]
    confirm: bool,

    /// Bots config file (json or yaml); all bots in the file will be checked
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Access token
    #[arg(long)]
    key: Option<String>,

    /// Access token secret
    #[arg(long)]
    secret: Option<String>,

    /// Consumer key (aka consumer token)
    #[arg(long, value_name = "KEY")]
    consumer_key: Option<String>,

    /// Consumer secret
    #[arg(long, value_name = "SECRET")]
    consumer_secret: Option<String>,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "whatsupbot=debug"
    } else {
        "whatsupbot=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// CLI credential flags win when all four are present; otherwise the
/// first config account with a complete set supplies them.
fn resolve_credentials(args: &Args, config: Option<&Config>) -> Result<Credentials> {
    if let (Some(consumer_key), Some(consumer_secret), Some(key), Some(secret)) = (
        &args.consumer_key,
        &args.consumer_secret,
        &args.key,
        &args.secret,
    ) {
        return Ok(Credentials {
            consumer_key: consumer_key.clone(),
            consumer_secret: consumer_secret.clone(),
            access_key: key.clone(),
            access_secret: secret.clone(),
        });
    }

    config.and_then(Config::credentials).ok_or_else(|| {
        anyhow!(
            "no usable credentials: pass --consumer-key/--consumer-secret/--key/--secret \
             or a config file that carries them"
        )
    })
}

fn build_checks(args: &Args, config: Option<&Config>) -> Result<Vec<Check>> {
    if let Some(config) = config {
        return Ok(config
            .users
            .iter()
            .filter(|(_, settings)| !settings.whatsupbot.disabled())
            .map(|(name, settings)| Check {
                screen_name: name.clone(),
                // config threshold wins over --hours when present
                hours: settings.whatsupbot.hours().unwrap_or(args.hours),
            })
            .collect());
    }

    let screen_name = args
        .screen_name
        .clone()
        .ok_or_else(|| anyhow!("pass --screen-name or --config"))?;
    Ok(vec![Check {
        screen_name,
        hours: args.hours,
    }])
}

async fn try_main(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Some(Config::load(path)?),
        None => None,
    };

    let credentials = resolve_credentials(&args, config.as_ref())?;
    let checks = build_checks(&args, config.as_ref())?;
    let plan = Plan {
        checks,
        sender: args.sender.clone().unwrap_or_default(),
        recipient: args.recipient.clone(),
        confirm: args.confirm,
    };

    let client = TwitterClient::new(credentials);
    whatsupbot::run(&client, &plan).await;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = try_main(args).await {
        error!("{err:#}");
        std::process::exit(1);
    }
}
