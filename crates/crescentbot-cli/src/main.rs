//! Crescentbot chat REPL.
//!
//! A thin presentation layer over `crescentbot-core`: it owns the session
//! state (conversation history, filter selection) and renders what the
//! engine returns. No retrieval logic lives here.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crescentbot_core::spell::CorrectionMode;
use crescentbot_core::{
    ChatTurn, Corpus, EngineConfig, FilterCriteria, FilterField, LocalEmbedder, OpenAiChat,
    Outcome, RetrievalEngine,
};

#[derive(Debug, Parser)]
#[command(name = "crescentbot", version, about = "University Q/A assistant")]
struct Args {
    /// Path to the Q/A corpus JSON file.
    #[arg(long, default_value = "data/qa_dataset.json")]
    data: PathBuf,

    /// Restrict answers to these faculties (repeatable).
    #[arg(long)]
    faculty: Vec<String>,

    /// Restrict answers to these departments (repeatable).
    #[arg(long)]
    department: Vec<String>,

    /// Restrict answers to these levels (repeatable).
    #[arg(long)]
    level: Vec<String>,

    /// Restrict answers to these semesters (repeatable).
    #[arg(long)]
    semester: Vec<String>,

    /// Print the filter values present in the corpus and exit.
    #[arg(long)]
    list_filters: bool,

    /// Confidence threshold for trusting a local match.
    #[arg(long)]
    threshold: Option<f32>,

    /// Model identifier for the generative fallback.
    #[arg(long)]
    model: Option<String>,

    /// Persist the full-corpus question index at this path.
    #[arg(long)]
    index_cache: Option<PathBuf>,

    /// Use compound (whole-phrase) spelling correction.
    #[arg(long)]
    compound: bool,
}

fn print_filter_values(corpus: &Corpus) {
    let fields = [
        ("Faculty", FilterField::Faculty),
        ("Department", FilterField::Department),
        ("Level", FilterField::Level),
        ("Semester", FilterField::Semester),
    ];
    for (label, field) in fields {
        println!("{}", label.bold());
        for value in corpus.distinct_values(field) {
            println!("  {value}");
        }
    }
}

fn criteria_from_args(args: &Args) -> FilterCriteria {
    let mut criteria = FilterCriteria::default();
    criteria.faculty.extend(args.faculty.iter().cloned());
    criteria.department.extend(args.department.iter().cloned());
    criteria.level.extend(args.level.iter().cloned());
    criteria.semester.extend(args.semester.iter().cloned());
    criteria
}

fn render(answer: &crescentbot_core::Answer) {
    match answer.outcome {
        Outcome::Fallback | Outcome::FallbackUnavailable => {
            println!("{} {}", "bot>".yellow().bold(), answer.text);
        }
        _ => {
            println!("{} {}", "bot>".green().bold(), answer.text);
        }
    }
    if let Some(category) = &answer.category {
        println!("     {}", format!("Department: {category}").italic().dimmed());
    }
    if !answer.related.is_empty() {
        println!("     {}", "You might also ask:".bold());
        for question in &answer.related {
            println!("       - {question}");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let corpus = Corpus::load_json(&args.data)
        .with_context(|| format!("loading corpus from {}", args.data.display()))?;

    if args.list_filters {
        print_filter_values(&corpus);
        return Ok(());
    }

    let mut config = EngineConfig {
        index_cache: args.index_cache.clone(),
        ..EngineConfig::default()
    };
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(model) = &args.model {
        config.fallback_model = model.clone();
    }
    if args.compound {
        config.correction = CorrectionMode::Compound;
    }

    println!("{}", "Loading the embedding model and indexing the corpus...".dimmed());
    let engine = RetrievalEngine::new(
        corpus,
        Arc::new(LocalEmbedder::new()),
        Arc::new(OpenAiChat::from_env()),
        config,
    )
    .await
    .context("building the retrieval engine")?;
    tracing::info!(entries = engine.corpus().len(), "corpus loaded and indexed");

    let criteria = criteria_from_args(&args);
    if !criteria.is_unconstrained() {
        engine
            .set_filters(&criteria)
            .await
            .context("applying filters")?;
        println!(
            "{}",
            format!("Filters active: {} of {} entries in scope.",
                engine.active_len(),
                engine.corpus().len())
            .dimmed()
        );
    }

    println!(
        "{}",
        "Ask me anything about Crescent University. Type 'quit' to leave, 'clear' to reset."
            .bold()
    );

    let stdin = std::io::stdin();
    let mut history: Vec<ChatTurn> = Vec::new();

    loop {
        print!("{} ", "you>".blue().bold());
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "" => continue,
            "quit" | "exit" => break,
            "clear" => {
                history.clear();
                println!("{}", "Conversation cleared.".dimmed());
                continue;
            }
            _ => {}
        }

        let answer = engine.answer_with_history(line, &history).await;
        render(&answer);

        history.push(ChatTurn::user(line));
        history.push(ChatTurn::assistant(answer.text.clone()));
    }

    Ok(())
}
