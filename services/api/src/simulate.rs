use clap::Args;
use pricing_governance::config::AppConfig;
use pricing_governance::error::AppError;
use pricing_governance::workflows::simulation::{
    EconomicsSummary, SimulationReport, SimulationScenario, UsageFeed,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct SimulateArgs {
    /// Scenario JSON: candidate snapshot, value units, optional baseline and run settings
    #[arg(long)]
    pub(crate) scenario: PathBuf,
    /// Usage-event export (.json array or .csv). Defaults to APP_USAGE_EVENTS_PATH.
    #[arg(long)]
    pub(crate) events: Option<PathBuf>,
    /// Print the full report as JSON instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_simulation(args: SimulateArgs) -> Result<(), AppError> {
    let SimulateArgs {
        scenario,
        events,
        json,
    } = args;

    let events = match events {
        Some(path) => path,
        None => AppConfig::load()?.data.usage_events_path,
    };
    let scenario = load_scenario(&scenario)?;
    let feed = UsageFeed::from_path(&events)?;
    let report = scenario.run(feed.events())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let in_scope = feed.scoped(&report.parameters.filters).len();
        println!(
            "Usage events: {} ({}), {} in scope",
            feed.len(),
            events.display(),
            in_scope
        );
        for line in report_lines(&report) {
            println!("{line}");
        }
    }

    Ok(())
}

pub(crate) fn load_scenario(path: &Path) -> Result<SimulationScenario, AppError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub(crate) fn report_lines(report: &SimulationReport) -> Vec<String> {
    let params = &report.parameters;
    let output = &report.output;
    let mut lines = vec![
        "Pricing simulation".to_string(),
        format!(
            "Window {} days | mode {} ({}) | commit semantics {} | {} customer(s)",
            params.historical_window_days,
            params.pricing_mode.label(),
            params.pricing_mode.as_str(),
            params.commit_semantics.as_str(),
            params.segment_customer_count
        ),
        format!(
            "Result: {} ({})",
            report.completeness_result.label(),
            serde_label(&report.completeness_result)
        ),
    ];

    lines.push(String::new());
    lines.push("Economics".to_string());
    lines.extend(economics_lines(&output.economics_summary));
    if let Some(assumptions) = &output.economics_summary.assumptions {
        lines.push(format!(
            "- Churn {:.1}%/yr ({:.4}/mo) over {} months",
            assumptions.annual_churn_rate * 100.0,
            assumptions.monthly_churn_rate,
            assumptions.churn_horizon_months
        ));
    }

    lines.push(String::new());
    if output.pool_breakdown.is_empty() {
        lines.push("Pools: none priced".to_string());
    } else {
        lines.push("Pools".to_string());
        for pool in &output.pool_breakdown {
            lines.push(format!(
                "- {} ({}): {:.2} units, {:.2} included, {:.2} overage | billed ${:.2} | cost ${:.2} | {}",
                pool.pool_id.0,
                pool.value_unit_id.0,
                pool.total_units,
                pool.included_units,
                pool.overage_units,
                pool.revenue_billed_usd,
                pool.cost_usd,
                pool.pricing_mode_used.as_str()
            ));
        }
    }

    push_section(&mut lines, "Risks", &output.risks);
    push_section(&mut lines, "Blocking issues", &output.blocking_issues);

    if output.exploration_summary.enabled {
        lines.push(format!(
            "\nExploration depth: {}",
            output.lens_metrics.exploration_depth
        ));
    }

    if let Some(comparison) = output.baseline_comparison() {
        lines.push(String::new());
        lines.push("Versus baseline".to_string());
        lines.push(format!(
            "- Billed revenue {:+.2} | cost {:+.2}",
            comparison.revenue_delta_usd, comparison.cost_delta_usd
        ));
        lines.push(format!(
            "- Annualized revenue {:+.2} | churn-adjusted {:+.2}",
            comparison.revenue_annualized_delta_usd, comparison.revenue_churn_adjusted_delta_usd
        ));
        match comparison.margin_delta {
            Some(delta) => lines.push(format!("- Margin {:+.1} pts", delta * 100.0)),
            None => lines.push("- Margin: n/a".to_string()),
        }
    }

    lines
}

fn economics_lines(summary: &EconomicsSummary) -> Vec<String> {
    vec![
        format!(
            "- Billed ${:.2} (usage ${:.2}, overage ${:.2}, commit floor ${:.2})",
            summary.revenue_billed_usd,
            summary.revenue_usage_total_usd,
            summary.revenue_usage_overage_usd,
            summary.revenue_commit_floor_usd_total
        ),
        format!("- Cost ${:.2}", summary.cost_usd),
        format!(
            "- Margin {} | commit-floor margin {}",
            percent(summary.margin),
            percent(summary.margin_commit_floor)
        ),
        format!(
            "- Annualized ${:.2} | 12-month churn-adjusted ${:.2}",
            summary.revenue_annualized_usd, summary.revenue_12mo_churn_adjusted_usd
        ),
    ]
}

fn push_section(lines: &mut Vec<String>, title: &str, entries: &[String]) {
    if entries.is_empty() {
        lines.push(format!("\n{title}: none"));
    } else {
        lines.push(format!("\n{title}"));
        lines.extend(entries.iter().map(|entry| format!("- {entry}")));
    }
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|ratio| format!("{:.1}%", ratio * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn serde_label<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}
