pub mod client;
pub mod config;
pub mod status;

use chrono::Utc;
use tracing::{debug, error, warn};

use client::StatusClient;
use status::Elapsed;

/// One account to check, with its resolved alert threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub screen_name: String,
    pub hours: i64,
}

/// Everything one run needs besides the client: the accounts to check,
/// the identity reports are written as, where the report goes, and
/// whether healthy accounts are reported too.
#[derive(Debug, Clone)]
pub struct Plan {
    pub checks: Vec<Check>,
    pub sender: String,
    pub recipient: Option<String>,
    pub confirm: bool,
}

/// Check every account in the plan and aggregate the per-account lines
/// into one report. A failed timeline read downgrades that account to
/// the unknown status; it never stops the run.
pub async fn check_accounts(client: &dyn StatusClient, plan: &Plan) -> String {
    let mut messages = Vec::with_capacity(plan.checks.len());

    for check in &plan.checks {
        let elapsed = match client.last_post_time(&check.screen_name).await {
            Ok(last_post) => Elapsed::since(last_post, Utc::now()),
            Err(err) => {
                warn!(screen_name = %check.screen_name, "could not read timeline: {err}");
                Elapsed::Unknown
            }
        };

        debug!(screen_name = %check.screen_name, ?elapsed, hours = check.hours, "checked");
        messages.push(status::compose(
            &check.screen_name,
            &plan.sender,
            elapsed,
            check.hours,
            plan.confirm,
        ));
    }

    status::aggregate(messages)
}

/// Run the plan end to end: check, aggregate, then deliver the report
/// as a direct message to the recipient, or print it when no recipient
/// is set. An empty report is delivered nowhere.
pub async fn run(client: &dyn StatusClient, plan: &Plan) {
    let report = check_accounts(client, plan).await;
    if report.is_empty() {
        debug!("nothing to report");
        return;
    }

    match &plan.recipient {
        Some(recipient) => deliver(client, recipient, &report).await,
        None => println!("{report}"),
    }
}

/// Delivery failures are logged, never propagated; the exit status only
/// reflects setup preconditions.
async fn deliver(client: &dyn StatusClient, recipient: &str, report: &str) {
    let recipient_id = match client.lookup_user_id(recipient).await {
        Ok(id) => id,
        Err(err) => {
            error!("could not resolve @{recipient}: {err:#}");
            return;
        }
    };

    if let Err(err) = client.send_direct_message(&recipient_id, report).await {
        error!("direct message to @{recipient} failed: {err:#}");
    }
}
