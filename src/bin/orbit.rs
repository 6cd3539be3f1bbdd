//! Orbit - terminal study assistant

use anyhow::Context;
use clap::{Parser, Subcommand};
use orbit::study::{entropy, DIFFICULTY_LEVELS, MAX_ARCHIVED_SESSIONS};
use orbit::{load_settings, GeminiClient, StudyApp};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type App = StudyApp<GeminiClient>;
type Input = Lines<BufReader<Stdin>>;

/// Orbit - your personal academic weapon 🛰️
#[derive(Parser, Debug)]
#[command(name = "orbit")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Settings file (overrides the default search paths)
    #[arg(short, long, env = "ORBIT_SETTINGS_PATH")]
    config: Option<String>,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat (default). `/new` archives the chat, `/quit` exits.
    Chat,

    /// Ask a single question in the current chat
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// List archived chats, or show one
    History {
        /// 1-based archive number
        index: Option<usize>,
    },

    /// Roll a quiz on a random loaded unit
    Quiz,

    /// Manage the unit loadout
    Units {
        #[command(subcommand)]
        action: Option<UnitsAction>,
    },

    /// Show or set the difficulty level
    Difficulty {
        /// Level number (1-4) or name
        level: Option<String>,
    },

    /// Show or set interests (comma-separated)
    Interests { text: Option<String> },

    /// Show the profile
    Profile,

    /// List models available to the active key
    Models,
}

#[derive(Subcommand, Debug)]
enum UnitsAction {
    /// Units currently loaded
    List,

    /// Years, semesters and units on offer
    Inventory,

    /// Add units from the inventory
    Add {
        year: String,

        #[arg(short, long)]
        semester: Option<String>,

        /// Units to add; all units of the year/semester when omitted
        units: Vec<String>,
    },

    /// Drop a loaded unit
    Drop { unit: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    let mut app = StudyApp::connect(&settings)
        .await
        .context("failed to start Orbit")?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match args.command.unwrap_or(Command::Chat) {
        Command::Chat => chat(&mut app, &mut input).await?,
        Command::Ask { question } => ask(&mut app, &question.join(" ")).await,
        Command::History { index } => history(&app, index)?,
        Command::Quiz => quiz(&mut app, &mut input).await?,
        Command::Units { action } => units(&mut app, action.unwrap_or(UnitsAction::List)).await?,
        Command::Difficulty { level } => match level {
            Some(level) => {
                if app.set_difficulty(&level).await? {
                    println!("Difficulty set to {}", app.document().difficulty);
                } else {
                    println!("Difficulty unchanged");
                }
            }
            None => {
                let current = app.document().difficulty_index();
                for (i, level) in DIFFICULTY_LEVELS.iter().enumerate() {
                    let mark = if i == current { "*" } else { " " };
                    println!("{} {}. {}", mark, i + 1, level);
                }
            }
        },
        Command::Interests { text } => {
            if let Some(text) = text {
                app.set_interests(&text).await;
            }
            println!("Interests: {}", app.document().interests.join(", "));
        }
        Command::Profile => profile(&mut app).await,
        Command::Models => {
            for model in app.catalog().await? {
                let mark = if model.can_generate() { "" } else { " (no generateContent)" };
                println!("{}{}", model.name, mark);
            }
        }
    }

    Ok(())
}

async fn read_line(input: &mut Input, prompt: &str) -> anyhow::Result<Option<String>> {
    use std::io::Write;
    print!("{}", prompt);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

async fn ask(app: &mut App, question: &str) {
    match app.ask(question).await {
        Some(reply) => println!("🛰️ {}\n", reply),
        None => eprintln!("⚠️ Connection Interrupted.\n"),
    }
}

async fn chat(app: &mut App, input: &mut Input) -> anyhow::Result<()> {
    println!("🧠 Neural Link. /new archives this chat, /quit exits.\n");
    for msg in app.session() {
        println!("{}: {}", msg.role.as_str(), msg.content);
    }

    while let Some(line) = read_line(input, "👤 ").await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                if app.new_chat().await {
                    println!("Chat archived. Starting fresh.\n");
                } else {
                    println!("Nothing to archive.\n");
                }
            }
            question => ask(app, question).await,
        }
    }
    Ok(())
}

fn history(app: &App, index: Option<usize>) -> anyhow::Result<()> {
    let archives = app.archives();
    if archives.is_empty() {
        println!("No archives found. Finish a chat and run /new to file it here.");
        return Ok(());
    }

    match index {
        None => {
            println!("Last {} completed sessions:", MAX_ARCHIVED_SESSIONS);
            for (i, session) in archives.iter().enumerate() {
                println!("{:>2}. 📅 {} | 📝 {}", i + 1, session.timestamp, session.summary);
            }
        }
        Some(n) => {
            let session = n
                .checked_sub(1)
                .and_then(|i| archives.get(i))
                .with_context(|| format!("no archive #{}", n))?;
            println!("📅 {} | 📝 {}\n", session.timestamp, session.summary);
            for msg in &session.messages {
                println!("{}: {}\n", msg.role.as_str(), msg.content);
            }
        }
    }
    Ok(())
}

async fn quiz(app: &mut App, input: &mut Input) -> anyhow::Result<()> {
    let plan = app.plan_quiz(entropy())?;
    println!("🎲 Generating {} question(s) on {}...", plan.question_count, plan.unit);

    let quiz = app.generate_quiz(&plan).await?;
    println!("Unit: {} | Questions: {}\n", quiz.unit, quiz.len());

    let mut answers = Vec::with_capacity(quiz.len());
    for (i, q) in quiz.questions.iter().enumerate() {
        println!("{}. {}", i + 1, q.question);
        for (j, option) in q.options.iter().enumerate() {
            println!("   {}) {}", j + 1, option);
        }

        let choice = read_line(input, "> ").await?.and_then(|line| {
            let line = line.trim();
            line.parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|n| q.options.get(n).cloned())
                .or_else(|| (!line.is_empty()).then(|| line.to_string()))
        });
        answers.push(choice);
        println!();
    }

    let report = quiz.grade(&answers);
    for (i, result) in report.results.iter().enumerate() {
        if result.correct {
            println!("Q{}: Correct! ✅", i + 1);
        } else {
            println!("Q{}: Wrong. Correct: {}", i + 1, result.answer);
            println!("   ℹ️ {}", result.explanation);
        }
    }
    println!("\nFinal Score: {}/{}", report.score, report.total);
    if report.is_perfect() {
        println!("🎉 Perfect score!");
    }
    Ok(())
}

async fn units(app: &mut App, action: UnitsAction) -> anyhow::Result<()> {
    match action {
        UnitsAction::List => {
            println!("🎯 Active Loadout");
            for unit in &app.document().current_units {
                println!("  • {}", unit);
            }
        }
        UnitsAction::Inventory => {
            let doc = app.document();
            for year in doc.years() {
                println!("{}", year);
                let semesters = doc.semesters(year)?;
                if semesters.is_empty() {
                    for unit in doc.available_units(year, None)? {
                        println!("  • {}", unit);
                    }
                }
                for semester in semesters {
                    println!("  {}", semester);
                    for unit in doc.available_units(year, Some(semester))? {
                        println!("    • {}", unit);
                    }
                }
            }
        }
        UnitsAction::Add {
            year,
            semester,
            units,
        } => {
            let available = app.document().available_units(&year, semester.as_deref())?;
            let picks = if units.is_empty() {
                available
            } else {
                if let Some(missing) = units.iter().find(|u| !available.contains(u)) {
                    anyhow::bail!("{} is not offered in {}", missing, year);
                }
                units
            };

            if app.add_units(&picks).await {
                println!("Loadout: {}", app.document().current_units.join(", "));
            } else {
                println!("Nothing new to add");
            }
        }
        UnitsAction::Drop { unit } => {
            if app.drop_unit(&unit).await {
                println!("Dropped {}", unit);
            } else {
                println!("{} is not loaded", unit);
            }
        }
    }
    Ok(())
}

async fn profile(app: &mut App) {
    let model = app.model_name().await;
    let doc = app.document();
    let stats = app.dispatcher().stats();

    println!("👤 {}", doc.user_name);
    println!("Difficulty: {}", doc.difficulty);
    println!("Units: {}", doc.current_units.join(", "));
    println!("Interests: {}", doc.interests.join(", "));
    println!("Archived chats: {}", doc.archived_sessions.len());
    println!(
        "Model: {} | Keys: {} (active #{})",
        model,
        stats.total_keys,
        stats.cursor + 1
    );
}
