use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ppl_grounder::{ground_full, ground_partial};
use ppl_pddl::{parse_domain_str, parse_problem_str};
use ppl_planners::{heuristic_plan, HeuristicKind};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeuristicArg {
    Landmark,
    Ff,
}

impl From<HeuristicArg> for HeuristicKind {
    fn from(a: HeuristicArg) -> Self {
        match a {
            HeuristicArg::Landmark => HeuristicKind::Landmark,
            HeuristicArg::Ff => HeuristicKind::Ff,
        }
    }
}

/// Heuristic forward-search STRIPS planner: weighted A* driven by a landmark or
/// relaxed-planning-graph (FF) heuristic.
#[derive(Parser, Debug)]
#[command(name = "hplan")]
struct Opt {
    #[arg(long)]
    domain_file: PathBuf,
    #[arg(long)]
    problem_file: PathBuf,
    /// Ground via goal-regression partial grounding instead of full grounding.
    #[arg(long)]
    partial_grounding: bool,
    #[arg(long, default_value_t = 5)]
    weight: u32,
    #[arg(long, value_enum, default_value_t = HeuristicArg::Landmark)]
    heuristic: HeuristicArg,
    #[arg(long)]
    output_file: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let opt = Opt::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&opt.log_level))
        .init();

    match run(&opt) {
        Ok(plan_lines) => {
            let text = plan_lines.join("\n");
            if let Some(path) = &opt.output_file {
                if let Err(e) = fs::write(path, &text) {
                    eprintln!("error: could not write output file: {e}");
                    return ExitCode::FAILURE;
                }
            } else {
                println!("{text}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(opt: &Opt) -> Result<Vec<String>> {
    let domain_src = fs::read_to_string(&opt.domain_file).context("reading domain file")?;
    let problem_src = fs::read_to_string(&opt.problem_file).context("reading problem file")?;
    let domain = parse_domain_str(&domain_src).context("parsing domain")?;
    let problem = parse_problem_str(&problem_src).context("parsing problem")?;

    let task = if opt.partial_grounding {
        ground_partial(&domain, &problem).context("grounding task (partial)")?
    } else {
        ground_full(&domain, &problem).context("grounding task")?
    };

    let weight = opt.weight.max(1);
    let plan = heuristic_plan(&task, opt.heuristic.into(), weight).context("searching for a plan")?;
    task.validate_plan(&plan).context("validating extracted plan")?;

    Ok(plan.into_iter().map(|id| task.operator(id).name.clone()).collect())
}
