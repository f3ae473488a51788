//! Command-line front end.
//!
//! Every command prints JSON on success and a plain message on failure,
//! wrapped in a [`CliResult`] carrying the process exit code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::assessment::{
    analyze_symptoms, combine, default_rules, pain_impact_questionnaire, Answer, AnswerValue,
    AssessmentHistory, AssessmentResult, PainImpactCalculator, Questionnaire,
};
use crate::config::Config;
use crate::error::{AppError, AppResult, AssessmentError};
use crate::storage::{KeyValueStore, NamespacedStorage, TieredSessionStore};
use crate::tracker::{
    cycle_status, pain_trend, PainEntry, PainLevel, PainTracker, DEFAULT_CYCLE_LENGTH,
};
use crate::triage::{
    period_pain_triage, validate_tree, Choice, DecisionTreeNode, DecisionTreeWalker, TRIAGE_START,
};

/// Period-health assessment engine.
#[derive(Parser, Debug)]
#[command(name = "periodhub", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Score a pain-impact assessment from a JSON answers file
    Score {
        /// JSON object mapping question ids to answers
        #[arg(long)]
        answers: PathBuf,
    },

    /// Analyze selected symptoms
    Symptoms {
        /// Catalog symptom ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Pain-impact answers file, to merge into a comprehensive view
        #[arg(long)]
        answers: Option<PathBuf>,
    },

    /// Walk the triage tree
    Triage {
        /// Node to start from
        #[arg(long, default_value = TRIAGE_START)]
        start: String,

        /// Comma-separated yes/no decisions
        #[arg(long, value_delimiter = ',')]
        choices: Vec<Choice>,

        /// Tree JSON file instead of the built-in tree
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Validate a triage tree
    ValidateTree {
        /// Tree JSON file instead of the built-in tree
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show completed assessments, newest first
    History {
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Discard the in-progress pain-impact session
    Reset,

    /// Show the current cycle phase
    Phase {
        /// First day of the last period (YYYY-MM-DD)
        #[arg(long)]
        last_period: NaiveDate,

        /// Cycle length in days (21-45)
        #[arg(long, default_value_t = DEFAULT_CYCLE_LENGTH)]
        cycle_length: u32,

        /// Day to evaluate, defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Record a pain level and show the trend
    Pain {
        /// Pain level from 0 to 10
        level: u8,

        /// Day of the entry, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Pain location, repeatable
        #[arg(long = "location")]
        locations: Vec<String>,
    },
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }

    fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::success(text),
            Err(e) => Self::error(format!("Failed to encode output: {}", e)),
        }
    }
}

impl From<AppResult<CliResult>> for CliResult {
    fn from(result: AppResult<CliResult>) -> Self {
        result.unwrap_or_else(|e| CliResult::error(e.to_string()))
    }
}

/// Stores and settings shared by the commands.
pub struct CliContext {
    pub config: Config,
    /// Durable store.
    pub primary: Arc<dyn KeyValueStore>,
    /// Short-lived store used as the second session tier.
    pub secondary: Arc<dyn KeyValueStore>,
}

impl CliContext {
    pub fn new(config: Config, primary: Arc<dyn KeyValueStore>, secondary: Arc<dyn KeyValueStore>) -> Self {
        Self {
            config,
            primary,
            secondary,
        }
    }

    fn storage(&self) -> NamespacedStorage {
        NamespacedStorage::new(Arc::clone(&self.primary), self.config.storage.namespace.clone())
    }

    fn history(&self) -> AssessmentHistory {
        AssessmentHistory::new(self.storage(), self.config.assessment.history_limit)
    }

    async fn calculator(&self) -> AppResult<PainImpactCalculator> {
        let store = TieredSessionStore::new(Arc::clone(&self.primary), Arc::clone(&self.secondary));
        Ok(PainImpactCalculator::load_or_start(
            pain_impact_questionnaire(),
            store,
            &self.config.assessment.user_id,
            self.config.assessment.locale,
        )
        .await?
        .with_history(self.history()))
    }
}

/// Execute a CLI command.
pub async fn execute_command(command: Commands, ctx: &CliContext) -> CliResult {
    debug!(?command, "Executing command");
    let result = match command {
        Commands::Score { answers } => execute_score(ctx, &answers).await,
        Commands::Symptoms { ids, answers } => execute_symptoms(&ids, answers.as_deref()).await,
        Commands::Triage {
            start,
            choices,
            file,
        } => execute_triage(&start, &choices, file.as_deref()).await,
        Commands::ValidateTree { file } => execute_validate_tree(file.as_deref()).await,
        Commands::History { page } => execute_history(ctx, page).await,
        Commands::Reset => execute_reset(ctx).await,
        Commands::Phase {
            last_period,
            cycle_length,
            today,
        } => execute_phase(last_period, cycle_length, today),
        Commands::Pain {
            level,
            date,
            locations,
        } => execute_pain(ctx, level, date, locations).await,
    };
    result.into()
}

async fn read_answers(path: &Path) -> AppResult<BTreeMap<String, AnswerValue>> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| AppError::Config {
        message: format!("Cannot read {}: {}", path.display(), e),
    })?;
    serde_json::from_str(&raw).map_err(|e| AppError::Config {
        message: format!("Invalid answers file {}: {}", path.display(), e),
    })
}

async fn load_tree(file: Option<&Path>) -> AppResult<DecisionTreeNode> {
    let Some(path) = file else {
        return Ok(period_pain_triage());
    };
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| AppError::Config {
        message: format!("Cannot read {}: {}", path.display(), e),
    })?;
    DecisionTreeNode::from_json(&raw).map_err(|e| AppError::Config {
        message: format!("Invalid tree file {}: {}", path.display(), e),
    })
}

/// Answers from `path`, each checked against `questionnaire`.
async fn read_valid_answers(questionnaire: &Questionnaire, path: &Path) -> AppResult<Vec<Answer>> {
    read_answers(path)
        .await?
        .into_iter()
        .map(|(question_id, value)| -> AppResult<Answer> {
            let question = questionnaire.question(&question_id).ok_or_else(|| {
                AssessmentError::UnknownQuestion {
                    question_id: question_id.clone(),
                }
            })?;
            question.validate_answer(&value)?;
            Ok(Answer::new(question_id, value))
        })
        .collect()
}

async fn execute_score(ctx: &CliContext, answers: &Path) -> AppResult<CliResult> {
    let answers = read_valid_answers(&pain_impact_questionnaire(), answers).await?;
    let mut calculator = ctx.calculator().await?;
    calculator.reset().await?;

    let mut tier = None;
    for answer in answers {
        tier = Some(calculator.answer_question(&answer.question_id, answer.value).await?);
    }
    let result = calculator.complete_assessment().await?;
    info!(session_id = %calculator.session().id, severity = %result.severity, "Scored assessment");

    Ok(CliResult::json(&json!({
        "session_id": calculator.session().id,
        "saved_to": tier,
        "result": result,
    })))
}

async fn execute_symptoms(ids: &[String], answers: Option<&Path>) -> AppResult<CliResult> {
    let analysis = analyze_symptoms(ids);
    let Some(path) = answers else {
        return Ok(CliResult::json(&analysis));
    };

    let questionnaire = pain_impact_questionnaire();
    let answers = read_valid_answers(&questionnaire, path).await?;
    let pain = AssessmentResult::evaluate(&questionnaire, &answers, &default_rules());
    Ok(CliResult::json(&combine(&pain, &analysis)))
}

async fn execute_triage(start: &str, choices: &[Choice], file: Option<&Path>) -> AppResult<CliResult> {
    let tree = load_tree(file).await?;
    let mut walker = DecisionTreeWalker::starting_at(&tree, start)?;
    let node = walker.walk(choices)?;

    Ok(CliResult::json(&json!({
        "current_node": node.id,
        "question": node.question,
        "completed": walker.is_completed(),
        "result": walker.result(),
        "path": walker.path(),
    })))
}

async fn execute_validate_tree(file: Option<&Path>) -> AppResult<CliResult> {
    let tree = load_tree(file).await?;
    let validation = validate_tree(&tree);
    let mut result = CliResult::json(&validation);
    if !validation.is_valid {
        result.exit_code = 1;
    }
    Ok(result)
}

async fn execute_history(ctx: &CliContext, page: usize) -> AppResult<CliResult> {
    let page = ctx
        .history()
        .page(page, ctx.config.assessment.history_page_size)
        .await;
    Ok(CliResult::json(&page))
}

async fn execute_reset(ctx: &CliContext) -> AppResult<CliResult> {
    let mut calculator = ctx.calculator().await?;
    calculator.reset().await?;
    Ok(CliResult::success(format!(
        "Session reset for {}",
        calculator.storage_key()
    )))
}

fn execute_phase(last_period: NaiveDate, cycle_length: u32, today: Option<NaiveDate>) -> AppResult<CliResult> {
    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    let status = cycle_status(last_period, today, cycle_length)?;
    Ok(CliResult::json(&status))
}

async fn execute_pain(
    ctx: &CliContext,
    level: u8,
    date: Option<NaiveDate>,
    locations: Vec<String>,
) -> AppResult<CliResult> {
    let level = PainLevel::new(level)?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let tracker = PainTracker::new(&ctx.storage());

    let outcome = tracker
        .add_entry(PainEntry::new(date, level).with_locations(locations))
        .await;
    let entries = tracker.entries().await;

    Ok(CliResult::json(&json!({
        "stored": outcome.is_stored(),
        "advice": level.advice_key(),
        "severity": level.severity(),
        "statistics": crate::tracker::pain_statistics(&entries),
        "trend": pain_trend(&entries, ctx.config.assessment.chart_max_points),
    })))
}
