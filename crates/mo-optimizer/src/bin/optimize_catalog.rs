use anyhow::Context;
use mo_optimizer::{ModuleOptimizer, OptimizeRequest, OptimizerConfig, DEFAULT_TOP_N};
use mo_types::{parse_attribute_list, Category, Module};

/// Build the request from `MO_CATEGORY`, `MO_TARGETS`, `MO_EXCLUDES`,
/// `MO_TOP_N` and `MO_ENUM`.
fn request_from(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<OptimizeRequest> {
    let category: Category = var("MO_CATEGORY").unwrap_or_default().parse()?;
    let targets = parse_attribute_list(&var("MO_TARGETS").unwrap_or_default())
        .context("MO_TARGETS")?;
    let excludes = parse_attribute_list(&var("MO_EXCLUDES").unwrap_or_default())
        .context("MO_EXCLUDES")?;
    let top_n = match var("MO_TOP_N") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("MO_TOP_N is not a count: {raw}"))?,
        None => DEFAULT_TOP_N,
    };

    let mut request = OptimizeRequest::new(category)
        .with_targets(targets)
        .with_excludes(excludes)
        .with_top_n(top_n);
    if let Some(flag) = var("MO_ENUM") {
        if matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes") {
            request = request.enumeration_only();
        }
    }
    Ok(request)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let path = std::env::var("MO_CATALOG").context("MO_CATALOG must name a JSON module catalog")?;
    let request = request_from(|name| std::env::var(name).ok())?;

    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let modules: Vec<Module> =
        serde_json::from_str(&raw).with_context(|| format!("parsing module catalog {path}"))?;

    let optimizer = ModuleOptimizer::new(OptimizerConfig::default())?;
    let report = optimizer.optimize_with_report(&modules, &request)?;

    println!(
        "{} solutions for {} from {} modules ({} ms)",
        report.solutions.len(),
        report.category,
        report.filtered_size,
        report.elapsed_ms()
    );
    for (i, solution) in report.solutions.iter().enumerate() {
        println!("{}", solution.report(i + 1));
    }
    Ok(())
}
