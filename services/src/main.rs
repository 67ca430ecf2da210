use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use marker::Evaluator;
use similarity::WeightFile;
use std::path::PathBuf;
use util::execution_config::ExecutionConfig;

#[derive(Parser, Debug)]
#[command(name = "grader", version, about = "Experiment autograder and weight-similarity checker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a single entry script and print the result as JSON
    Evaluate {
        #[arg(long)]
        script: PathBuf,
        /// Ground-truth CSV; searched for near the script when omitted
        #[arg(long)]
        labels: Option<PathBuf>,
        /// Experiment whose config/*.json to use
        #[arg(long)]
        experiment: Option<i64>,
    },
    /// Grade every submission of an experiment and store the grades
    Grade {
        #[arg(long)]
        experiment: i64,
    },
    /// Run the weight-file similarity check for an experiment
    Check {
        #[arg(long)]
        experiment: i64,
        /// Print the ranking as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Compare loose weight files given as `student=path`
    CheckFiles {
        #[arg(required = true)]
        files: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = common::logger::init_logging();

    let args = Args::parse();
    match args.command {
        Command::Evaluate {
            script,
            labels,
            experiment,
        } => {
            let config = match experiment {
                Some(id) => services::load_config(id)?,
                None => ExecutionConfig::default_config(),
            };
            let mut evaluator = Evaluator::new(config);
            if let Some(labels) = labels {
                evaluator = evaluator.with_label_file(labels);
            }
            let result = evaluator.evaluate(&script).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Grade { experiment } => {
            let config = services::load_config(experiment)?;
            let db = db::connect_and_migrate()
                .await
                .context("failed to open database")?;
            let report = services::grading::run_experiment_evaluation(
                &db,
                &config,
                experiment,
                util::config::grader_id(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Check { experiment, json } => {
            let config = services::load_config(experiment)?;
            let db = db::connect_and_migrate()
                .await
                .context("failed to open database")?;
            let records =
                services::plagiarism::run_similarity_check(&db, &config, experiment).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_ranking(&records);
            }
        }
        Command::CheckFiles { files } => {
            let files = files
                .iter()
                .map(|arg| parse_weight_arg(arg))
                .collect::<Result<Vec<_>>>()?;
            let records = similarity::check(&files, &ExecutionConfig::default_config().similarity);
            print_ranking(&records);
        }
    }

    Ok(())
}

fn parse_weight_arg(arg: &str) -> Result<WeightFile> {
    let Some((student, path)) = arg.split_once('=') else {
        bail!("expected student=path, got {arg:?}");
    };
    if student.is_empty() || path.is_empty() {
        bail!("expected student=path, got {arg:?}");
    }
    Ok(WeightFile::new(student, path))
}

fn print_ranking(records: &[similarity::SimilarityRecord]) {
    println!("{:<20} {:<20} {:>10}  RISK", "STUDENT", "MOST SIMILAR", "SIMILARITY");
    for r in records {
        println!(
            "{:<20} {:<20} {:>9.2}%  {}",
            r.student_id,
            r.most_similar_student.as_deref().unwrap_or("-"),
            r.similarity,
            r.risk
        );
    }
}
