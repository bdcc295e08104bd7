use tracing::{error, info, warn};
use tracing_teams_webhook::init::{init_teams_notifier, NotifierConfig};
use tracing_teams_webhook::record::Severity;

fn main() {
    let mut config = NotifierConfig::from_env();
    config.min_severity = Severity::Warning;
    config.title = "Demo service".to_string();
    config.subject = "Incident".to_string();

    if let Err(e) = init_teams_notifier(config) {
        eprintln!("notifier misconfigured: {}", e);
        std::process::exit(1);
    }

    info!("starting service");

    warn!(queue_depth = 120, "queue falling behind");

    error!(
        user_id = 42,
        reason = "invalid password",
        "authentication failed"
    );
}
