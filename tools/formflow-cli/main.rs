use clap::Parser;
use formflow::navigation::{Navigator, Transition};
use formflow::options::resolve_options;
use formflow::prelude::{Field, Workflow};
use formflow::schema::{FieldKind, InputKind};
use formflow::session::{FileSessionStore, MemorySessionStore, SessionSnapshot, SessionStore};
use formflow::value::{self, ValueSet};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runs a JSON workflow in the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workflow JSON file
    workflow_path: Option<String>,
    /// Optional path to a JSON object of answers to apply before running
    values_path: Option<String>,

    /// Locale for labels and messages
    #[arg(short, long, default_value = "en")]
    locale: String,

    /// Session key the run is persisted under
    #[arg(short, long, default_value = formflow::session::DEFAULT_SESSION_KEY)]
    key: String,

    /// Directory to persist the session in, so a run can be resumed
    #[arg(short, long)]
    session_dir: Option<PathBuf>,

    /// Discard any persisted session before starting
    #[arg(long)]
    fresh: bool,

    /// Run in interactive mode to be prompted for answers
    #[arg(short = 'i', long, help = "Walk the wizard interactively")]
    human: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.session_dir.clone() {
        Some(dir) => run(cli, FileSessionStore::new(dir)),
        None => run(cli, MemorySessionStore::new()),
    }
}

fn run<S: SessionStore>(cli: Cli, store: S) {
    let workflow_path = match cli.workflow_path.clone() {
        Some(path) => path,
        None if cli.human => prompt_for_input("Enter workflow path", Some("data/workflows/login.json")),
        None => exit_with_error("Workflow path is required in non-interactive mode."),
    };

    let json = fs::read_to_string(&workflow_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read workflow file '{}': {}",
            workflow_path, e
        ))
    });
    let workflow = Workflow::from_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workflow: {}", e)));

    let diagnostics = workflow.diagnostics();
    if !diagnostics.is_empty() {
        println!("--- Workflow Diagnostics ---");
        for diagnostic in &diagnostics {
            println!("  ! {}", diagnostic);
        }
        println!();
    }

    if cli.fresh {
        if let Err(e) = SessionSnapshot::clear(&store, &cli.key) {
            exit_with_error(&format!("Failed to clear session '{}': {}", cli.key, e));
        }
    }

    let mut nav = Navigator::builder(workflow, store)
        .with_session_key(cli.key.clone())
        .with_locale(cli.locale.clone())
        .build();

    if let Some(values_path) = &cli.values_path {
        let answers = load_values(values_path);
        for (identifier, answer) in answers.iter() {
            nav.set_value(identifier.clone(), answer.clone());
        }
    }

    if cli.human {
        run_interactive(&mut nav);
    } else {
        run_non_interactive(&mut nav);
    }
}

fn load_values(path: &str) -> ValueSet {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read values file '{}': {}", path, e)));
    serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Values file must be a JSON object: {}", e)))
}

/// Advances as far as the supplied answers allow, printing every step on the way.
fn run_non_interactive<S: SessionStore>(nav: &mut Navigator<S>) {
    let mut visited = HashSet::new();
    loop {
        print_step(nav);
        if !visited.insert(nav.index()) {
            println!("\nStep '{}' was already visited, stopping.", step_name(nav));
            return;
        }
        match nav.advance() {
            Transition::Moved { from, to } => {
                println!("\n-> Moved from step {} to step {}", from + 1, to + 1);
            }
            Transition::Blocked { first_error } => {
                println!("\n-> Blocked on '{}'", step_name(nav));
                print_errors(nav);
                if let Some(field) = first_error {
                    println!("  First field to fix: {}", field);
                }
                return;
            }
            Transition::Stayed => {
                println!("\n-> Stayed on '{}' (next step does not exist)", step_name(nav));
                return;
            }
            Transition::Completed(submission) => {
                print_submission(&submission);
                return;
            }
        }
    }
}

/// Walks the wizard on stdin/stdout.
fn run_interactive<S: SessionStore>(nav: &mut Navigator<S>) {
    println!("--- formflow Interactive Mode ---");
    loop {
        print_step(nav);
        let fields: Vec<Field> = nav.visible_fields().into_iter().cloned().collect();
        for field in &fields {
            // Visibility can change as answers come in.
            let still_visible = nav
                .visible_fields()
                .iter()
                .any(|f| f.identifier == field.identifier);
            if still_visible {
                prompt_field(nav, field);
            }
        }

        let back = if nav.can_retreat() { ", b = back" } else { "" };
        let choice = prompt_for_input(
            &format!("[enter] = {}{}, r = restart, q = quit", nav.advance_label(), back),
            None,
        );
        let transition = match choice.as_str() {
            "q" => return,
            "r" => {
                nav.restart();
                continue;
            }
            "b" => nav.retreat(),
            _ => nav.advance(),
        };
        match transition {
            Transition::Moved { .. } => {}
            Transition::Blocked { .. } => {
                println!("\nPlease complete the required fields to continue.");
                print_errors(nav);
            }
            Transition::Stayed => println!("\nNothing to move to from here."),
            Transition::Completed(submission) => {
                print_submission(&submission);
                return;
            }
        }
    }
}

fn prompt_field<S: SessionStore>(nav: &mut Navigator<S>, field: &Field) {
    let label = field.label_text(nav.locale()).to_string();
    let current = nav.values().get(&field.identifier).cloned();
    let shown = current.as_ref().map(|v| value::stringify(Some(v)));

    match field.kind {
        FieldKind::Checkbox => {
            let answer = prompt_for_input(&format!("{} (y/n)", label), shown.as_deref());
            nav.set_value(field.identifier.clone(), matches!(answer.as_str(), "y" | "yes" | "true"));
        }
        FieldKind::ListCellOptions => {
            let options = resolve_options(field.options.as_ref());
            for (i, option) in options.iter().enumerate() {
                println!("    {}: {} ({})", i + 1, option.label, option.id);
            }
            let answer = prompt_for_input(&label, shown.as_deref());
            let picked = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i))
                .map(|option| option.id.clone())
                .unwrap_or(answer);
            set_answer(nav, field, picked);
        }
        FieldKind::Input => {
            let prompt = match &field.input.placeholder {
                Some(placeholder) => format!("{} (e.g. {})", label, placeholder),
                None => label,
            };
            let answer = prompt_for_input(&prompt, shown.as_deref());
            if field.input.kind == Some(InputKind::Number) {
                let number = value::parse_number(&answer);
                if !answer.is_empty() && number.is_finite() {
                    if let Some(n) = serde_json::Number::from_f64(number) {
                        nav.set_value(field.identifier.clone(), Value::Number(n));
                        return;
                    }
                }
            }
            set_answer(nav, field, answer);
        }
    }
}

fn set_answer<S: SessionStore>(nav: &mut Navigator<S>, field: &Field, answer: String) {
    if answer.is_empty() {
        nav.clear_value(&field.identifier);
    } else {
        nav.set_value(field.identifier.clone(), answer);
    }
}

fn step_name<S: SessionStore>(nav: &Navigator<S>) -> String {
    nav.current_step()
        .map(|step| step.title_text(nav.locale()).to_string())
        .unwrap_or_default()
}

fn print_step<S: SessionStore>(nav: &Navigator<S>) {
    let labels = nav.step_labels();
    println!(
        "\n=== {} (step {} of {}, {}%) ===",
        step_name(nav),
        nav.index() + 1,
        labels.len(),
        nav.progress()
    );
    for field in nav.visible_fields() {
        let current = nav.values().get(&field.identifier);
        let required = if formflow::validation::is_required(field) { "*" } else { " " };
        println!(
            "  {} {:<20} = {}",
            required,
            field.label_text(nav.locale()),
            if value::is_empty(current) {
                "-".to_string()
            } else {
                value::stringify(current)
            }
        );
    }
}

fn print_errors<S: SessionStore>(nav: &Navigator<S>) {
    for field in nav.visible_fields() {
        if let Some(message) = nav.field_error(&field.identifier) {
            println!("  x {}: {}", field.label_text(nav.locale()), message);
        }
    }
}

fn print_submission(submission: &ValueSet) {
    println!("\n--- Submission ---");
    match serde_json::to_string_pretty(submission) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to render submission: {}", e)),
    }
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    io::stdout().flush().unwrap();

    io::stdin()
        .read_line(&mut line)
        .expect("Failed to read line");
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
