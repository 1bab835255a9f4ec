use anyhow::{Context, Result};
use clap::Parser;
use ppl_grounder::ground_full;
use ppl_pddl::{parse_domain_str, parse_problem_str};
use ppl_planners::sat_plan;
use ppl_sat::DpllSolver;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// SAT-based STRIPS planner: encodes bounded-horizon plan existence and extends the
/// horizon until a plan is found or `max_horizon` is exhausted.
#[derive(Parser, Debug)]
#[command(name = "satplan")]
struct Opt {
    #[arg(long)]
    domain_file: PathBuf,
    #[arg(long)]
    problem_file: PathBuf,
    #[arg(long, default_value_t = 0)]
    min_horizon: u32,
    #[arg(long, default_value_t = 10)]
    max_horizon: u32,
    #[arg(long)]
    output_file: Option<PathBuf>,
    /// `RUST_LOG`-style filter, e.g. "debug" or "ppl_grounder=debug".
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
    let task = ground_full(&domain, &problem).context("grounding task")?;

    let solver = DpllSolver::new();
    let plan = sat_plan(&task, &solver, opt.min_horizon, opt.max_horizon).context("searching for a plan")?;
    task.validate_plan(&plan).context("validating extracted plan")?;

    Ok(plan.into_iter().map(|id| task.operator(id).name.clone()).collect())
}
