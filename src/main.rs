mod app;
mod catalog;
mod config;
mod error;
mod highlight;
mod logging;
mod ui;
mod view;

use std::fmt::Write as _;
use std::path::Path;
use std::{env, io};

use tracing::{info, warn};

use crate::catalog::{Catalog, Topic};
use crate::config::Config;
use crate::error::AppResult;
use crate::highlight::Highlighter;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("browse");

    let result = match command {
        "browse" | "list" | "show" => run_with_catalog(command, args.get(1..).unwrap_or(&[])),
        "schema" => run_schema(),
        "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command.");
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(err) = result {
        eprintln!("javarecall: {}", err);
        std::process::exit(1);
    }
}

fn print_usage() {
    eprintln!(
        "Usage:\n  javarecall [browse]\n  javarecall list [query]\n  javarecall show <id>\n  javarecall schema"
    );
}

fn run_with_catalog(command: &str, rest: &[String]) -> AppResult<()> {
    let config = config::load_config()?;
    let home = config::home_dir();
    if logging::init(config.log_file(home.as_deref()).as_deref(), &config.log.level)? {
        info!(command, "javarecall starting");
    }

    let catalog = load_catalog(&config, home.as_deref())?;
    let language = config
        .catalog
        .language
        .clone()
        .unwrap_or_else(|| catalog.language().to_string());

    match command {
        "list" => {
            print!("{}", format_listing(&catalog, &rest.join(" ")));
            Ok(())
        }
        "show" => {
            let Some(id) = rest.first() else {
                print_usage();
                std::process::exit(2);
            };
            let topic = view::resolve_selected(catalog.all(), id)?;
            if catalog.get(id).is_none() {
                info!(requested = %id, resolved = %topic.id, "unknown topic id, showing first topic");
            }
            print!("{}", format_topic(topic, &language));
            Ok(())
        }
        _ => {
            ensure_tty_stdin()?;
            let mut highlighter = Highlighter::new(&config.highlight, &language);
            ui::run(&catalog, &mut highlighter, &language)
        }
    }
}

fn load_catalog(config: &Config, home: Option<&Path>) -> AppResult<Catalog> {
    let catalog = match config.catalog_path(home) {
        Some(path) => {
            info!(path = %path.display(), "loading catalog file");
            Catalog::load(&path)?
        }
        None => Catalog::builtin()?,
    };
    if catalog.is_empty() {
        warn!("catalog contains no topics");
    } else {
        info!(
            topics = catalog.len(),
            language = catalog.language(),
            "catalog ready"
        );
    }
    Ok(catalog)
}

fn run_schema() -> AppResult<()> {
    println!("{}", catalog::json_schema()?);
    Ok(())
}

fn format_listing(catalog: &Catalog, query: &str) -> String {
    let filtered = view::filter(catalog.all(), query);
    let groups = view::group_by_category(&filtered);
    if groups.is_empty() {
        return "No topics found\n".to_string();
    }

    let width = filtered
        .iter()
        .map(|topic| topic.id.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for group in &groups {
        let _ = writeln!(out, "{}", group.category);
        for topic in &group.topics {
            let _ = writeln!(out, "  {:<width$}  {}", topic.id, topic.title);
        }
    }
    out
}

fn format_topic(topic: &Topic, language: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", topic.title);
    let _ = writeln!(out, "[{}]", topic.category);
    if !topic.description.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", topic.description);
    }
    if !topic.code.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "--- {} ---", ui::code_file_name(language));
        let _ = writeln!(out, "{}", topic.code);
    }
    out
}

fn ensure_tty_stdin() -> AppResult<()> {
    #[cfg(unix)]
    {
        use std::io::IsTerminal;
        use std::os::unix::io::AsRawFd;

        if io::stdin().is_terminal() {
            return Ok(());
        }

        let tty = std::fs::File::open("/dev/tty")?;
        let result = unsafe { libc::dup2(tty.as_raw_fd(), libc::STDIN_FILENO) };
        if result == -1 {
            return Err(io::Error::last_os_error().into());
        }
    }
    Ok(())
}
