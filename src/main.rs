use std::process::ExitCode;
use std::time::Duration;

use hearthboard::access;
use hearthboard::error::DashboardError;
use hearthboard::firestore::Firestore;
use hearthboard::services::dashboard::run_render_cycle;
use hearthboard::state;
use hearthboard::types::{
    ActivityView, AppointmentsView, ChecklistView, DashboardData, RangeMode, Scope, UserFilter,
};

const USAGE: &str = "\
hearthboard — read-only family planner dashboard

USAGE:
    hearthboard [OPTIONS]

OPTIONS:
    --range <today|week|all>   Time range for the activity feed (default: today)
    --user <name|everyone>     Only show activity from one family member
    --json                     Emit the display payload as JSON instead of text
    --watch                    Re-render on the configured poll interval
    --help                     Show this message
";

struct CliArgs {
    scope: Scope,
    json: bool,
    watch: bool,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut scope = Scope::default();
    let mut json = false;
    let mut watch = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--range" => {
                let value = args.next().ok_or("--range needs a value")?;
                scope.range = RangeMode::from_arg(&value)
                    .ok_or_else(|| format!("unknown range '{}'", value))?;
            }
            "--user" => {
                let value = args.next().ok_or("--user needs a value")?;
                scope.user = UserFilter::from_arg(&value);
            }
            "--json" => json = true,
            "--watch" => watch = true,
            "--help" | "-h" => {
                print!("{}", USAGE);
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    Ok(CliArgs { scope, json, watch })
}

fn render_terminal(data: &DashboardData, scope: &Scope, viewer: &str) {
    println!("{}", data.overview.title);
    println!(
        "{} · as {} · range {} · user {}",
        data.overview.date, viewer, scope.range, scope.user
    );
    println!();

    println!("✅ Today's Checklist");
    match &data.checklist {
        ChecklistView::Ready {
            entries,
            completed_count,
            total_count,
            completion_ratio,
        } => {
            let filled = (completion_ratio * 10.0).round() as usize;
            println!(
                "  [{}{}] {}/{} done",
                "#".repeat(filled),
                "-".repeat(10 - filled.min(10)),
                completed_count,
                total_count
            );
            for entry in entries {
                println!("  {}", entry.display);
            }
        }
        ChecklistView::Empty { message } => println!("  {}", message),
    }
    println!();

    println!("🩺 Appointments (upcoming)");
    match &data.appointments {
        AppointmentsView::Ready { entries } => {
            for entry in entries {
                println!("  {}", entry.display);
            }
        }
        AppointmentsView::Empty { message } => println!("  {}", message),
    }
    println!();

    println!("📊 Activity (latest)");
    match &data.activity {
        ActivityView::Ready { entries } => {
            for entry in entries {
                println!("  {}", entry.display);
            }
        }
        ActivityView::Empty { message } => println!("  {}", message),
    }
}

fn fail(err: &DashboardError) -> ExitCode {
    eprintln!("{}", err);
    eprintln!("{}", err.recovery_suggestion());
    ExitCode::FAILURE
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            eprint!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    // Config and access gate run before any fetch. A denied viewer or a
    // broken config stops the cycle with one message, never a partial view.
    let config = match state::load_config() {
        Ok(config) => config,
        Err(err) => return fail(&err),
    };

    let viewer = match state::detect_viewer_email() {
        Some(email) => email,
        None => {
            return fail(&DashboardError::Configuration(
                "No authenticated account found in the stored token".to_string(),
            ))
        }
    };
    if let Err(err) = access::check_access(&viewer, &config.allowed_emails) {
        return fail(&err);
    }

    let store = Firestore::global();

    loop {
        match run_render_cycle(store, &config, &args.scope).await {
            Ok(data) => {
                if args.json {
                    match serde_json::to_string_pretty(&data) {
                        Ok(payload) => println!("{}", payload),
                        Err(e) => {
                            eprintln!("Failed to serialize payload: {}", e);
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    render_terminal(&data, &args.scope, &viewer);
                }
            }
            Err(err) => return fail(&err),
        }

        if !args.watch {
            return ExitCode::SUCCESS;
        }
        log::info!(
            "next refresh in {} minute(s)",
            config.poll_interval_minutes
        );
        tokio::time::sleep(Duration::from_secs(config.poll_interval_minutes * 60)).await;
        println!();
    }
}
