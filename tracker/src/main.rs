use clap::Parser;
use common::TicketKey;
use tracker::{check::ConnectionCheck, JiraClient, Resolver, TrackerConfig};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "tracker-check")]
#[command(about = "Checks that test results can be posted to the issue tracker")]
struct Args {
    /// Project that must be accessible
    #[arg(short, long, default_value = "KAN")]
    project: String,

    /// Issue keys to look up (repeatable)
    #[arg(short, long = "issue", default_values = ["KAN-1", "KAN-2", "KAN-3"])]
    issues: Vec<TicketKey>,

    /// Post a test comment on the first issue found
    #[arg(long)]
    comment: bool,

    /// Override the tracker base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() {
    tracker::init_tracing();
    let args = Args::parse();

    let mut config = match TrackerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "configuration error");
            std::process::exit(2);
        }
    };
    if let Some(base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }

    let client = match JiraClient::connect(&config) {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "failed to create tracker client");
            std::process::exit(1);
        }
    };

    let check = ConnectionCheck {
        project: args.project,
        issues: args.issues,
        comment: args.comment,
    };

    let report = check.run(&client, &Resolver::default()).await;
    println!(
        "{} of {} issues found: {}",
        report.issues_found.len(),
        report.issues_expected,
        report.verdict()
    );
}
