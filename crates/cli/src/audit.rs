//! `mroute` commands: load both exports, run the engine, render.

use std::path::{Path, PathBuf};

use meterroute_io::{discover_period_files, read_file_as_utf8, read_period_pair};
use meterroute_recon::divergence::{divergence_totals, filter_divergences};
use meterroute_recon::query::{distinct_reasons, distinct_routes};
use meterroute_recon::recurrence::{filter_by_reason, recurring_reasons};
use meterroute_recon::{
    compare_with, narrate_or_placeholder, AnalysisResult, AuditConfig, GdFilter, MicroGeneration, SortDirection,
    UnitQuery, UnitSortKey,
};
use serde::Serialize;
use serde_json::json;

use crate::exit_codes::{EXIT_ERROR, EXIT_INCONSISTENT, EXIT_IO};
use crate::narrator::CommandNarrator;
use crate::{CliError, FlagArg, GdArg, InputArgs, SortArg};

impl From<GdArg> for GdFilter {
    fn from(arg: GdArg) -> Self {
        match arg {
            GdArg::All => GdFilter::All,
            GdArg::Gd => GdFilter::Gd,
            GdArg::Normal => GdFilter::Normal,
        }
    }
}

impl From<SortArg> for UnitSortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Unit => UnitSortKey::UnitCode,
            SortArg::Consumer => UnitSortKey::ConsumerName,
            SortArg::Route => UnitSortKey::RouteCode,
            SortArg::Variance => UnitSortKey::ConsumptionVariance,
            SortArg::InjectionVariance => UnitSortKey::InjectionVariance,
            SortArg::Consumption => UnitSortKey::CurrentConsumption,
            SortArg::PriorConsumption => UnitSortKey::PriorConsumption,
            SortArg::Injected => UnitSortKey::InjectedCurrent,
            SortArg::InjectedPrior => UnitSortKey::InjectedPrior,
        }
    }
}

impl From<FlagArg> for MicroGeneration {
    fn from(arg: FlagArg) -> Self {
        match arg {
            FlagArg::S => MicroGeneration::Generator,
            FlagArg::P => MicroGeneration::Participant,
            FlagArg::X => MicroGeneration::Linked,
            FlagArg::N => MicroGeneration::Normal,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<AuditConfig, CliError> {
    let Some(path) = path else {
        return Ok(AuditConfig::default());
    };
    let text = read_file_as_utf8(path)?;
    let config = AuditConfig::from_toml(&text)
        .map_err(|e| CliError::from(e).with_hint(format!("config file: {}", path.display())))?;
    tracing::info!(path = %path.display(), "loaded config");
    Ok(config)
}

fn resolve_inputs(input: &InputArgs) -> Result<(PathBuf, PathBuf), CliError> {
    match (&input.dir, &input.current, &input.previous) {
        (Some(dir), _, _) => {
            let files = discover_period_files(dir)?;
            Ok((files.current, files.previous))
        }
        (None, Some(current), Some(previous)) => Ok((current.clone(), previous.clone())),
        _ => Err(CliError::usage("pass --current and --previous, or --dir")),
    }
}

/// Read both exports and run the comparison.
fn load(input: &InputArgs) -> Result<(AnalysisResult, AuditConfig), CliError> {
    let config = load_config(input.config.as_deref())?;
    let (current, previous) = resolve_inputs(input)?;
    tracing::info!(current = %current.display(), previous = %previous.display(), "reading exports");

    let (current_text, previous_text) = read_period_pair(&current, &previous)?;
    let result = compare_with(&current_text, &previous_text, &config)?;
    Ok((result, config))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn emit_json<T: Serialize + ?Sized>(value: &T, stdout: bool, output: Option<&Path>) -> Result<(), CliError> {
    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    if let Some(path) = output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::new(EXIT_IO, format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    if stdout {
        println!("{json_str}");
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn cmd_compare(
    input: &InputArgs,
    json_output: bool,
    output_file: Option<PathBuf>,
    fail_on_inconsistency: bool,
) -> Result<(), CliError> {
    let (result, _config) = load(input)?;
    emit_json(&result, json_output, output_file.as_deref())?;

    // Human summary to stderr
    eprintln!("{:<28} {:>8} {:>8} {:>7} {:>9}  tag", "route", "prior", "current", "diff", "var%");
    for row in &result.comparison {
        eprintln!(
            "{:<28} {:>8} {:>8} {:>7} {:>9.2}  {}",
            truncate(&row.route_label, 28),
            row.count_prior,
            row.count_current,
            row.difference,
            row.percent_variance,
            row.anomaly_tag.map(|t| t.to_string()).unwrap_or_default(),
        );
    }
    eprintln!(
        "{} unit(s) this period, {} last period; {} route(s), {} inconsistent",
        result.current_month.len(),
        result.previous_month.len(),
        result.comparison.len(),
        result.inconsistencies.len(),
    );

    if fail_on_inconsistency && result.has_inconsistencies() {
        return Err(CliError::new(
            EXIT_INCONSISTENT,
            format!("{} inconsistent route(s)", result.inconsistencies.len()),
        ));
    }
    Ok(())
}

pub fn cmd_routes(input: &InputArgs, json_output: bool) -> Result<(), CliError> {
    let (result, _config) = load(input)?;
    let summary = result.route_summary();

    if json_output {
        return emit_json(&summary, true, None);
    }
    println!("{:<20} {:>9} {:>9} {:>7}", "route", "previous", "current", "diff");
    for row in &summary {
        println!(
            "{:<20} {:>9} {:>9} {:>+7}",
            truncate(&row.route, 20),
            row.total_previous,
            row.total_current,
            row.diff
        );
    }
    Ok(())
}

pub fn cmd_units(
    input: &InputArgs,
    gd: GdArg,
    route: Option<String>,
    reason: Option<String>,
    sort: Option<SortArg>,
    desc: bool,
    json_output: bool,
) -> Result<(), CliError> {
    let (result, _config) = load(input)?;

    let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
    let routes = distinct_routes(&result.current_month);
    let reasons = distinct_reasons(&result.current_month, route.as_deref());
    let query = UnitQuery {
        gd: gd.into(),
        route,
        reason,
        sort: sort.map(|key| (key.into(), direction)),
    };
    let units = query.apply(&result.current_month);

    if json_output {
        return emit_json(&json!({ "units": units, "routes": routes, "reasons": reasons }), true, None);
    }

    println!(
        "{:<12} {:<24} {:<8} {:<12} {:>10} {:>10} {:>9} {:>9}  reason",
        "unit", "consumer", "route", "mg", "current", "prior", "var%", "inj var%"
    );
    for u in &units {
        println!(
            "{:<12} {:<24} {:<8} {:<12} {:>10.2} {:>10.2} {:>9.2} {:>9.2}  {}",
            truncate(&u.unit.unit_code, 12),
            truncate(&u.unit.consumer_name, 24),
            truncate(&u.unit.route_code, 8),
            u.unit.micro_generation_flag.label(),
            u.unit.current_consumption,
            u.prior_consumption_resolved,
            u.consumption_variance_pct,
            u.injection_variance_pct,
            u.unit.non_read_reason,
        );
    }
    eprintln!("{} of {} unit(s)", units.len(), result.current_month.len());
    eprintln!("routes: {}", routes.join(", "));
    Ok(())
}

pub fn cmd_divergences(
    input: &InputArgs,
    route: Option<String>,
    mg: Option<FlagArg>,
    json_output: bool,
) -> Result<(), CliError> {
    let (result, config) = load(input)?;
    let all = result.divergences(&config);
    let entries = filter_divergences(&all, route.as_deref(), mg.map(MicroGeneration::from));
    let totals = divergence_totals(&entries);

    if json_output {
        return emit_json(&json!({ "entries": entries, "totals": totals }), true, None);
    }

    println!(
        "{:<8} {:<8} {:<12} {:<24} {:<12} {:<12}  address",
        "status", "route", "unit", "consumer", "mg", "connection"
    );
    for e in &entries {
        println!(
            "{:<8} {:<8} {:<12} {:<24} {:<12} {:<12}  {}",
            e.status.to_string(),
            truncate(&e.route_code, 8),
            truncate(&e.unit_code, 12),
            truncate(&e.consumer_name, 24),
            e.micro_generation_flag.label(),
            truncate(&e.connection_status, 12),
            e.address,
        );
    }
    eprintln!("{} missing, {} new", totals.missing, totals.new);
    Ok(())
}

pub fn cmd_recurring(input: &InputArgs, reason: Option<String>, json_output: bool) -> Result<(), CliError> {
    let (result, config) = load(input)?;
    let found = result.recurring(&config);
    let reasons = recurring_reasons(&found);
    let occurrences = match reason.as_deref() {
        Some(r) => filter_by_reason(&found, r),
        None => found,
    };

    if json_output {
        return emit_json(&json!({ "occurrences": occurrences, "reasons": reasons }), true, None);
    }

    println!("{:<12} {:<28} {:<8}  reason", "unit", "consumer", "route");
    for o in &occurrences {
        println!(
            "{:<12} {:<28} {:<8}  {}",
            truncate(&o.unit_code, 12),
            truncate(&o.consumer_name, 28),
            truncate(&o.route_code, 8),
            o.reason_text,
        );
    }
    eprintln!("{} recurring unit(s); reasons: {}", occurrences.len(), reasons.join(", "));
    Ok(())
}

pub fn cmd_brief(input: &InputArgs, narrate_with: Option<String>, json_output: bool) -> Result<(), CliError> {
    let (result, config) = load(input)?;
    let brief = result.brief(&config);
    let narrative = narrate_with.map(|cmd| narrate_or_placeholder(&CommandNarrator::new(cmd), &brief));

    if json_output {
        return emit_json(&json!({ "brief": brief, "narrative": narrative }), true, None);
    }

    println!(
        "consumption: {:.2} (previous {:.2})",
        brief.total_consumption_current, brief.total_consumption_prior
    );
    println!(
        "injected:    {:.2} (previous {:.2})",
        brief.total_injected_current, brief.total_injected_prior
    );
    if brief.route_highlights.is_empty() {
        println!("no active route above {}% variance", config.thresholds.attention_variance_pct);
    } else {
        println!("routes needing attention:");
        for h in &brief.route_highlights {
            println!("  {:<28} {:>8} units {:>+9.2}%", truncate(&h.route_label, 28), h.count_current, h.percent_variance);
        }
    }
    if let Some(text) = narrative {
        println!();
        println!("{text}");
    }
    Ok(())
}

pub fn cmd_config_validate(file: &Path) -> Result<(), CliError> {
    let config = load_config(Some(file))?;
    let t = &config.thresholds;
    eprintln!(
        "config ok: critical > {}%, attention > {}% (top {}), duplicates {:?}",
        t.critical_variance_pct, t.attention_variance_pct, t.attention_top_n, config.lookup.duplicates
    );
    Ok(())
}
