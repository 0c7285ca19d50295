//! `widthplan`: a thin CLI wrapper around the search engine.
//!
//! PDDL parsing and grounded-problem construction are out of scope for this
//! workspace (see `widthplan_fixtures`), so `--domain`/`--problem` here
//! select one of the hand-built fixture problems rather than reading PDDL
//! files from disk.

use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use widthplan_fixtures::blocksworld::Sussman;
use widthplan_fixtures::corridor::Corridor;
use widthplan_kernel::model::problem::StripsProblem;
use widthplan_search::driver::{SearchDriver, SearchOutcome};
use widthplan_search::evaluator::CompositeEvaluator;
use widthplan_search::features::underscore_prefix_splitter;
use widthplan_search::landmarks::GoalCountLandmarks;
use widthplan_search::novelty::NoveltyTable;
use widthplan_search::open_list::comparator::Comparator;
use widthplan_search::policy::{FeatureScope, OpenListKind, SearchPolicy};
use widthplan_search::relaxed_plan::DeleteRelaxationOracle;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Domain {
    Corridor,
    Blocksworld,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OpenListArg {
    Standard,
    BoundedRandom,
    DoubleHeap,
    Pruned,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeatureScopeArg {
    Global,
    Partitioned,
}

impl From<FeatureScopeArg> for FeatureScope {
    fn from(value: FeatureScopeArg) -> Self {
        match value {
            FeatureScopeArg::Global => FeatureScope::Global,
            FeatureScopeArg::Partitioned => FeatureScope::Partitioned,
        }
    }
}

impl From<OpenListArg> for OpenListKind {
    fn from(value: OpenListArg) -> Self {
        match value {
            OpenListArg::Standard => OpenListKind::Standard,
            OpenListArg::BoundedRandom => OpenListKind::BoundedRandom,
            OpenListArg::DoubleHeap => OpenListKind::DoubleHeap,
            OpenListArg::Pruned => OpenListKind::Pruned,
        }
    }
}

#[derive(Parser)]
#[command(name = "widthplan", about = "width-based best-first STRIPS planner")]
struct Cli {
    /// Which fixture domain to plan over.
    #[arg(long, value_enum)]
    domain: Domain,

    /// Domain-specific instance selector: a room count for `corridor`
    /// (e.g. "8"), ignored for `blocksworld` (always the Sussman anomaly).
    #[arg(long, default_value = "8")]
    problem: String,

    /// Novelty tuple arity (1 or 2).
    #[arg(long, default_value_t = 1)]
    max_novelty: u8,

    /// Wall-clock budget in seconds.
    #[arg(long)]
    time_budget: Option<u64>,

    /// Resident-memory budget in MB.
    #[arg(long)]
    memory_budget: Option<u64>,

    /// Open-list variant to drive the search with.
    #[arg(long, value_enum, default_value = "standard")]
    open_list: OpenListArg,

    /// Whether the canonical lifted-feature table is shared globally or
    /// kept one-per-partition.
    #[arg(long, value_enum, default_value = "global")]
    feature_scope: FeatureScopeArg,

    /// Append per-run statistics to this file instead of stderr only.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the resulting plan (one action signature per line) here.
    #[arg(long)]
    plan_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn build_policy(cli: &Cli) -> Result<SearchPolicy> {
    if cli.max_novelty == 0 || cli.max_novelty > 2 {
        bail!("--max_novelty must be 1 or 2, got {}", cli.max_novelty);
    }
    let policy = SearchPolicy {
        time_budget: cli.time_budget.map(Duration::from_secs),
        memory_budget_mb: cli.memory_budget,
        novelty_arity: cli.max_novelty,
        open_list_kind: cli.open_list.into(),
        comparator: Comparator::TripleH,
        feature_scope: cli.feature_scope.into(),
        ..SearchPolicy::default()
    };
    policy.validate().context("invalid search policy")?;
    Ok(policy)
}

fn run_on(problem: &dyn StripsProblem, policy: SearchPolicy) -> Result<SearchOutcome> {
    let feature_scope = policy.feature_scope;
    let mut driver = SearchDriver::new(policy).context("failed to construct search driver")?;
    let mut evaluator = CompositeEvaluator::with_feature_scope(
        problem,
        Box::new(GoalCountLandmarks::from_problem(problem)),
        Box::new(DeleteRelaxationOracle),
        NoveltyTable::new(problem.num_fluents(), 1, 512.0),
        &underscore_prefix_splitter,
        true,
        feature_scope,
    );
    driver
        .run(problem, &mut evaluator)
        .context("search driver failed")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let policy = match build_policy(&cli) {
        Ok(policy) => policy,
        Err(err) => {
            eprintln!("bad input: {err:#}");
            std::process::exit(3);
        }
    };

    let problem: Box<dyn StripsProblem> = match cli.domain {
        Domain::Corridor => {
            let rooms: usize = cli
                .problem
                .parse()
                .context("--problem must be a room count for the corridor domain")?;
            Box::new(Corridor::new(rooms))
        }
        Domain::Blocksworld => Box::new(Sussman::new()),
    };

    let outcome = match run_on(problem.as_ref(), policy) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("planner error: {err:#}");
            std::process::exit(3);
        }
    };

    match outcome {
        SearchOutcome::Solved { plan, stats } => {
            tracing::info!(
                expansions = stats.expansions,
                generated = stats.generated,
                dead_ends = stats.dead_ends,
                reopened = stats.reopened,
                cost = plan.cost,
                "plan found"
            );
            let signatures: Vec<&str> = plan
                .actions
                .iter()
                .map(|&action| problem.action(action).signature())
                .collect();
            if let Some(path) = &cli.plan_file {
                let mut file = fs::File::create(path)
                    .with_context(|| format!("failed to create plan file {}", path.display()))?;
                for signature in &signatures {
                    writeln!(file, "{signature}")?;
                }
            } else {
                for signature in &signatures {
                    println!("{signature}");
                }
            }
            Ok(())
        }
        SearchOutcome::Infeasible { stats } => {
            tracing::warn!(expansions = stats.expansions, "no plan: open list exhausted");
            eprintln!("no plan found (infeasible)");
            std::process::exit(1);
        }
        SearchOutcome::TimedOut { stats } => {
            tracing::warn!(expansions = stats.expansions, "aborted: time budget exceeded");
            eprintln!("aborted: time budget exceeded");
            std::process::exit(2);
        }
        SearchOutcome::OutOfMemory { stats } => {
            tracing::warn!(expansions = stats.expansions, "aborted: memory budget exceeded");
            eprintln!("aborted: memory budget exceeded");
            std::process::exit(2);
        }
    }
}
