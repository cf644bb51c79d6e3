use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rops_model::{StepTable, TableKind};
use rops_navigator::{NavigatorConfig, StepFailure, TourNavigator};
use rops_pages::SimulatedBrowser;
use rops_store::{DemoStore, FileStorage, MemoryStorage, StateStorage};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let table = Arg::new("table")
        .long("table")
        .default_value("enterprise")
        .help("Built-in step table: basic or enterprise");
    let tour = Arg::new("tour")
        .long("tour")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Load steps from a YAML or JSON tour file instead of a built-in table");

    Command::new("rops-tour")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Research Ops guided tour runner")
        .subcommand(
            Command::new("run")
                .about("Run a tour against the simulated browser")
                .arg(table.clone())
                .arg(tour.clone())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .help("Navigator settings (TOML)"),
                )
                .arg(
                    Arg::new("state-dir")
                        .long("state-dir")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Persist the tour position here and resume from it"),
                )
                .arg(
                    Arg::new("realtime")
                        .long("realtime")
                        .action(ArgAction::SetTrue)
                        .help("Keep read, settle and work delays instead of running instantly"),
                ),
        )
        .subcommand(
            Command::new("steps")
                .about("List the steps of a tour")
                .arg(table)
                .arg(tour)
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Parse a tour file and report unrecognised actions")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("run", args)) => {
            let outcome = run(args).await?;
            Ok(outcome.exit_code())
        }
        Some(("steps", args)) => {
            steps(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(("validate", args)) => {
            validate(args)?;
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            cli().print_help()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// How a `run` ended
#[derive(Debug)]
enum RunOutcome {
    Finished { completed: usize },
    Failed(StepFailure),
    Interrupted,
}

impl RunOutcome {
    fn exit_code(&self) -> ExitCode {
        match self {
            RunOutcome::Finished { .. } => ExitCode::SUCCESS,
            RunOutcome::Failed(_) => ExitCode::FAILURE,
            RunOutcome::Interrupted => ExitCode::from(130),
        }
    }
}

fn load_table(args: &ArgMatches) -> Result<StepTable> {
    if let Some(path) = args.get_one::<PathBuf>("tour") {
        return StepTable::load(path).with_context(|| format!("loading tour {}", path.display()));
    }
    let kind: TableKind = args
        .get_one::<String>("table")
        .map_or("enterprise", String::as_str)
        .parse()?;
    Ok(StepTable::builtin(kind))
}

fn navigator_config(args: &ArgMatches) -> Result<NavigatorConfig> {
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => NavigatorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => NavigatorConfig::default(),
    };
    if args.get_flag("realtime") {
        return Ok(config);
    }
    // delays go, verification bounds stay
    Ok(NavigatorConfig {
        max_nav_attempts: config.max_nav_attempts,
        content_attempts: config.content_attempts,
        min_content_chars: config.min_content_chars,
        heavy_pages: config.heavy_pages,
        ..NavigatorConfig::instant()
    })
}

async fn run(args: &ArgMatches) -> Result<RunOutcome> {
    let table = load_table(args)?;
    let config = navigator_config(args)?;
    let storage: Arc<dyn StateStorage> = match args.get_one::<PathBuf>("state-dir") {
        Some(dir) => Arc::new(FileStorage::new(dir)),
        None => Arc::new(MemoryStorage::new()),
    };

    let store = Arc::new(DemoStore::new(table, storage));
    let browser = Arc::new(SimulatedBrowser::new(store.clone()));
    let navigator = TourNavigator::new(store.clone(), browser.clone(), config);
    let mut status = navigator.watch_status();
    let driver = navigator.spawn();

    if store.read(|s| s.is_demo_mode) {
        tracing::info!(step = navigator.current_step(), "resuming saved tour");
        navigator.resume();
    } else {
        navigator.start_demo();
    }

    let mut printed = HashSet::new();
    let outcome = loop {
        print_completed(&store, &mut printed);

        let current = status.borrow_and_update().clone();
        if let Some(failure) = current.failure {
            break RunOutcome::Failed(failure);
        }
        if store.read(|s| s.is_last_step() && s.current().completed) {
            break RunOutcome::Finished {
                completed: printed.len(),
            };
        }

        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break RunOutcome::Interrupted;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("interrupted");
                break RunOutcome::Interrupted;
            }
        }
    };

    navigator.shutdown();
    driver.await.context("navigator task panicked")?;

    match &outcome {
        RunOutcome::Finished { completed } => {
            println!("Tour finished: {completed} steps, ended at {}", browser.location());
        }
        RunOutcome::Failed(failure) => {
            eprintln!(
                "Step {} ({}) failed after {} attempt(s): {}",
                failure.step_index + 1,
                failure.step_id,
                failure.attempts,
                failure.message
            );
        }
        RunOutcome::Interrupted => {
            eprintln!("Tour interrupted at step {}", navigator.status().progress_label());
        }
    }
    Ok(outcome)
}

fn print_completed(store: &DemoStore, printed: &mut HashSet<String>) {
    store.read(|s| {
        let total = s.step_count();
        for (index, step) in s.steps.iter().enumerate() {
            if step.completed && printed.insert(step.id.clone()) {
                println!("[{:>2}/{total}] {} - {}", index + 1, step.id, step.title);
            }
        }
    });
}

fn steps(args: &ArgMatches) -> Result<()> {
    let table = load_table(args)?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(table.steps())?);
        return Ok(());
    }

    for (index, step) in table.steps().iter().enumerate() {
        println!(
            "{:>2}. {:<30} {:<26} {}",
            index + 1,
            step.id,
            step.action.tag(),
            step.expected_path.as_deref().unwrap_or("-")
        );
        println!("    {}", step.title);
    }
    Ok(())
}

fn validate(args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<PathBuf>("file")
        .context("missing tour file")?;
    let table = StepTable::load(path).with_context(|| format!("invalid tour {}", path.display()))?;

    println!("{}: {} steps", path.display(), table.len());
    let unknown = table.unknown_actions();
    for (step_id, tag) in &unknown {
        println!("  warning: step {step_id} has unrecognised action `{tag}`; it will pass through");
    }
    if unknown.is_empty() {
        println!("  all actions recognised");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn matches(argv: &[&str]) -> ArgMatches {
        let matches = cli().try_get_matches_from(argv).unwrap();
        let (_, args) = matches.subcommand().unwrap();
        args.clone()
    }

    const TOUR: &str = r"
- id: board
  title: Board
  description: The requests board
  action: navigate_to_requests
  expectedPath: /requests
- id: wave
  title: Wave
  description: Not a real action
  action: wave_hello
- id: done
  title: Done
  description: Finished
  action: demo_complete
";

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn instant_unless_realtime() {
        let config = navigator_config(&matches(&["rops-tour", "run"])).unwrap();
        assert_eq!(config.read_delay(), Duration::ZERO);
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(config.max_nav_attempts, 3);

        let config = navigator_config(&matches(&["rops-tour", "run", "--realtime"])).unwrap();
        assert_eq!(config, NavigatorConfig::default());
    }

    #[test]
    fn config_file_bounds_survive_instant_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nav.toml");
        std::fs::write(&path, "max_nav_attempts = 5\nread_delay_ms = 900\n").unwrap();

        let config = navigator_config(&matches(&[
            "rops-tour",
            "run",
            "--config",
            path.to_str().unwrap(),
        ]))
        .unwrap();
        assert_eq!(config.max_nav_attempts, 5);
        assert_eq!(config.read_delay(), Duration::ZERO);
    }

    #[test]
    fn table_selection() {
        assert_eq!(load_table(&matches(&["rops-tour", "steps"])).unwrap().len(), 16);
        assert_eq!(
            load_table(&matches(&["rops-tour", "steps", "--table", "basic"]))
                .unwrap()
                .len(),
            11
        );
        assert!(load_table(&matches(&["rops-tour", "steps", "--table", "tiny"])).is_err());
    }

    #[test]
    fn shipped_samples_parse() {
        let table = StepTable::from_yaml_str(include_str!("../../../tours/quickstart.yaml")).unwrap();
        assert_eq!(table.len(), 5);
        assert!(table.unknown_actions().is_empty());

        let config = NavigatorConfig::from_toml_str(include_str!("../../../tours/navigator.toml")).unwrap();
        assert_eq!(config, NavigatorConfig::default());
    }

    #[test]
    fn validate_accepts_unknown_actions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tour.yaml");
        std::fs::write(&path, TOUR).unwrap();

        validate(&matches(&["rops-tour", "validate", path.to_str().unwrap()])).unwrap();
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tour.yaml");
        let duplicated = format!("{TOUR}- id: board\n  title: Again\n  description: Dup\n  action: demo_complete\n");
        std::fs::write(&path, duplicated).unwrap();

        assert!(validate(&matches(&["rops-tour", "validate", path.to_str().unwrap()])).is_err());
    }

    #[tokio::test]
    async fn run_basic_table_to_the_end() {
        let outcome = run(&matches(&["rops-tour", "run", "--table", "basic"]))
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Finished { completed: 11 }));
    }

    #[tokio::test]
    async fn run_custom_tour_with_unknown_action() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tour.yaml");
        std::fs::write(&path, TOUR).unwrap();

        let outcome = run(&matches(&["rops-tour", "run", "--tour", path.to_str().unwrap()]))
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Finished { completed: 3 }));
    }

    #[tokio::test]
    async fn run_fails_on_unroutable_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tour.yaml");
        std::fs::write(
            &path,
            "- id: lost\n  title: Lost\n  description: Nowhere\n  action: navigate_to_sources\n  expectedPath: /nowhere\n",
        )
        .unwrap();

        let outcome = run(&matches(&["rops-tour", "run", "--tour", path.to_str().unwrap()]))
            .await
            .unwrap();
        match outcome {
            RunOutcome::Failed(failure) => {
                assert_eq!(failure.step_id, "lost");
                assert_eq!(failure.attempts, 3);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_resumes_from_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().to_str().unwrap();

        let outcome = run(&matches(&["rops-tour", "run", "--table", "basic", "--state-dir", state_dir]))
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Finished { .. }));

        // the saved position is the last step, so only it runs again
        let outcome = run(&matches(&["rops-tour", "run", "--table", "basic", "--state-dir", state_dir]))
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Finished { completed: 1 }));
    }
}
