use std::path::Path;
use std::process::ExitCode;

use newsweek::config::NewsWeekConfig;
use newsweek::news::{ActionOutcome, NewsWeek, SyncOutcome, TemplateOutcome};
use newsweek::options::{SelectionState, ToolOption};
use newsweek::workspace::Workspace;

const USAGE: &str =
    "usage: newsweek [help | init | weeks | run [--offset N] [new-news] [dynamic-template] [topics]]";

enum Command {
    Help,
    Init,
    Weeks,
    Run { offset: i32, options: Vec<ToolOption> },
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut rest = args.iter().skip(1);
    match rest.next().map(String::as_str) {
        Some("help" | "--help" | "-h") => Ok(Command::Help),
        Some("init") => Ok(Command::Init),
        Some("weeks") => Ok(Command::Weeks),
        None | Some("run") => {
            let mut offset = 0;
            let mut options = Vec::new();
            while let Some(arg) = rest.next() {
                if arg == "--offset" {
                    let value = rest.next().ok_or("--offset needs a value")?;
                    offset = value
                        .parse()
                        .map_err(|_| format!("invalid offset: {}", value))?;
                } else if let Some(option) = ToolOption::from_id(arg) {
                    options.push(option);
                } else {
                    return Err(format!("unknown option: {}", arg));
                }
            }
            if options.is_empty() {
                options.push(ToolOption::NewNews);
            }
            Ok(Command::Run { offset, options })
        }
        Some(other) => Err(format!("unknown command: {}", other)),
    }
}

fn usage() -> String {
    let mut text = format!("{}\n\noptions:", USAGE);
    for option in ToolOption::ALL {
        text.push_str(&format!(
            "\n  {:<18} {}: {}",
            option.id(),
            option.name(),
            option.description()
        ));
    }
    text
}

fn init_logging(config: &NewsWeekConfig) {
    // Log to the systemd user journal (`journalctl --user -t newsweek -f`).
    // Wrapper filters: newsweek crate at info/debug (per config), everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("newsweek") {
                let max = if newsweek::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    newsweek::set_debug_logging(config.debug_logging);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("newsweek".to_string()),
        Err(e) => {
            eprintln!("journal unavailable, logging disabled: {}", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn describe(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::NewsWeek(report) => {
            let template = match report.template {
                TemplateOutcome::Applied { blocks } => {
                    format!("template applied ({} blocks)", blocks)
                }
                TemplateOutcome::AlreadyTemplated => "template already present".to_string(),
            };
            let sync = match report.sync {
                SyncOutcome::Rewritten(n) => format!("{} days dated", n),
                SyncOutcome::AlreadySynchronized => "dates already up to date".to_string(),
            };
            format!("{}: {}, {}", report.page.name, template, sync)
        }
        ActionOutcome::DatesFixed { page, rewritten } => {
            format!("{}: {} days dated", page.name, rewritten)
        }
        ActionOutcome::Topics => "topics: not available yet".to_string(),
    }
}

/// Write the effective config so it can be edited; an existing file is kept.
fn write_config(config: &NewsWeekConfig, path: &Path) -> ExitCode {
    if path.exists() {
        println!("{} already exists", path.display());
        return ExitCode::SUCCESS;
    }
    match config.save(path) {
        Ok(()) => {
            println!("wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write {}: {}", path.display(), e);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = NewsWeekConfig::default_path();
    let config = NewsWeekConfig::load(&config_path);
    init_logging(&config);

    let args: Vec<String> = std::env::args().collect();
    let command = match parse_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}\n{}", e, usage());
            return ExitCode::from(2);
        }
    };

    match command {
        Command::Help => {
            println!("{}", usage());
            return ExitCode::SUCCESS;
        }
        Command::Init => return write_config(&config, &config_path),
        Command::Weeks | Command::Run { .. } => {}
    }

    let workspace = match Workspace::load(&config.workspace_path) {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let news = NewsWeek::new(workspace, config);

    match command {
        Command::Help | Command::Init => ExitCode::SUCCESS,
        Command::Weeks => {
            for option in news.week_options() {
                let marker = if option.is_current { "*" } else { " " };
                println!("{} {:>3}  {}", marker, option.offset, option.label);
            }
            ExitCode::SUCCESS
        }
        Command::Run { offset, options } => {
            let selection = match SelectionState::from_active(&options) {
                Ok(s) => s,
                Err((a, b)) => {
                    eprintln!("error: {} cannot run together with {}", a.name(), b.name());
                    return ExitCode::from(2);
                }
            };

            let result = news.run_selection(&selection, offset).await;
            // Earlier writes in a failed run stay; save them either way.
            if let Err(e) = news.host().save() {
                eprintln!("error: failed to save workspace: {}", e);
                return ExitCode::FAILURE;
            }

            match result {
                Ok(outcomes) => {
                    for outcome in &outcomes {
                        println!("{}", describe(outcome));
                    }
                    if let Some(ActionOutcome::NewsWeek(report)) = outcomes.first() {
                        if let Err(e) = news.open_page(&report.page).await {
                            log::warn!("Could not open {}: {}", report.page.name, e);
                        }
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    log::error!("Run failed: {}", e);
                    eprintln!("error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("newsweek").chain(list.iter().copied()).map(String::from).collect()
    }

    #[test]
    fn default_run_creates_current_week() {
        match parse_args(&args(&[])).unwrap() {
            Command::Run { offset, options } => {
                assert_eq!(offset, 0);
                assert_eq!(options, [ToolOption::NewNews]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_accepts_offset_and_options() {
        match parse_args(&args(&["run", "--offset", "-2", "dynamic-template", "topics"])).unwrap() {
            Command::Run { offset, options } => {
                assert_eq!(offset, -2);
                assert_eq!(options, [ToolOption::DynamicTemplate, ToolOption::Topics]);
            }
            _ => panic!("expected run"),
        }
        assert!(parse_args(&args(&["run", "--offset"])).is_err());
        assert!(parse_args(&args(&["run", "weather"])).is_err());
        assert!(matches!(parse_args(&args(&["weeks"])), Ok(Command::Weeks)));
        assert!(matches!(parse_args(&args(&["init"])), Ok(Command::Init)));
        assert!(matches!(parse_args(&args(&["--help"])), Ok(Command::Help)));
    }

    #[test]
    fn init_writes_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("newsweek").join("config.json");
        let config = NewsWeekConfig {
            week_range: 3,
            ..NewsWeekConfig::default()
        };
        assert_eq!(write_config(&config, &path), ExitCode::SUCCESS);
        assert_eq!(NewsWeekConfig::load(&path), config);

        assert_eq!(write_config(&NewsWeekConfig::default(), &path), ExitCode::SUCCESS);
        assert_eq!(NewsWeekConfig::load(&path).week_range, 3);
    }

    #[test]
    fn usage_lists_every_option() {
        let text = usage();
        for option in ToolOption::ALL {
            assert!(text.contains(option.id()));
            assert!(text.contains(option.description()));
        }
    }
}
