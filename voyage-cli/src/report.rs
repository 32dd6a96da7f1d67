use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use voyage_estimator::{ExtendLevelResult, SimulationConfig, SimulationResult, SkillInputs};

/// Everything a report needs about one estimator run.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub seed: u64,
    pub skills: &'a SkillInputs,
    pub config: &'a SimulationConfig,
    pub result: &'a SimulationResult,
    pub summary: String,
}

impl<'a> RunReport<'a> {
    pub fn new(
        seed: u64,
        skills: &'a SkillInputs,
        config: &'a SimulationConfig,
        result: &'a SimulationResult,
    ) -> Self {
        Self {
            seed,
            skills,
            config,
            result,
            summary: summary_sentence(result),
        }
    }
}

/// Render fractional hours as `7h 05m`.
pub fn format_hours(hours: f64) -> String {
    if !hours.is_finite() || hours <= 0.0 {
        return "0h 00m".to_string();
    }
    let total_minutes = (hours * 60.0).round();
    let whole_hours = (total_minutes / 60.0).floor();
    let minutes = total_minutes - whole_hours * 60.0;
    format!("{whole_hours:.0}h {minutes:02.0}m")
}

/// One-paragraph, human-readable estimate built from levels 0 and 1.
pub fn summary_sentence(result: &SimulationResult) -> String {
    let Some(first) = result.level(0).filter(|level| level.is_reached()) else {
        return "No simulated voyage ran out of antimatter; the crew outlasts the simulation window."
            .to_string();
    };

    let mut summary = format!(
        "Estimated voyage length of {} (99% worst case {}). {}% chance to reach the {}h dilemma.",
        format_hours(first.median_hours),
        format_hours(first.safer_hours),
        first.milestone_confidence_pct,
        first.last_milestone_hours,
    );
    if let Some(refill) = result.level(1).filter(|level| level.is_reached()) {
        summary.push_str(&format!(
            " A refill with {} dilithium gives a {}% chance to reach the {}h dilemma.",
            refill.average_refill_cost, refill.milestone_confidence_pct, refill.last_milestone_hours,
        ));
    }
    if result.avg_20h_refill_count > 0 {
        summary.push_str(&format!(
            " Reaching 20 hours takes about {} refills ({} dilithium).",
            result.avg_20h_refill_count, result.avg_20h_refill_cost,
        ));
    }
    summary
}

fn level_label(level: &ExtendLevelResult) -> String {
    if level.level == 0 {
        "initial".to_string()
    } else {
        format!("extend {}", level.level)
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    report: &RunReport<'_>,
    duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "🚀 Voyage Estimate".bright_cyan().bold())?;
    writeln!(out, "{}", "==================".cyan())?;
    writeln!(out, "{}", report.summary)?;
    writeln!(out)?;

    for level in &report.result.extends {
        let label = level_label(level);
        if !level.is_reached() {
            writeln!(out, "{} {}", label.bold(), "not reached".yellow())?;
            continue;
        }
        writeln!(
            out,
            "{}  median {}  safe {}  safer {}",
            label.bold(),
            format_hours(level.median_hours).green(),
            format_hours(level.safe_hours),
            format_hours(level.safer_hours).red(),
        )?;
        writeln!(
            out,
            "   {}h dilemma at {}% • refill cost {} • {} samples",
            level.last_milestone_hours,
            level.milestone_confidence_pct,
            level.average_refill_cost,
            level.samples
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Trials: {} • Seed: {} • Time: {duration:?}",
        report.result.trials_run, report.seed
    )?;
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, report: &RunReport<'_>) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &RunReport<'_>) -> Result<()> {
    writeln!(out, "# Voyage Estimate\n")?;
    writeln!(out, "{}\n", report.summary)?;
    writeln!(
        out,
        "| Level | Median | Safe (10%) | Safer (1%) | Dilemma | Confidence | Refill cost | Samples |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|")?;
    for level in &report.result.extends {
        if level.is_reached() {
            writeln!(
                out,
                "| {} | {} | {} | {} | {}h | {}% | {} | {} |",
                level_label(level),
                format_hours(level.median_hours),
                format_hours(level.safe_hours),
                format_hours(level.safer_hours),
                level.last_milestone_hours,
                level.milestone_confidence_pct,
                level.average_refill_cost,
                level.samples
            )?;
        } else {
            writeln!(out, "| {} | - | - | - | - | - | - | 0 |", level_label(level))?;
        }
    }
    writeln!(out)?;
    writeln!(
        out,
        "- **Trials**: {}\n- **Seed**: {}",
        report.result.trials_run, report.seed
    )?;
    Ok(())
}
