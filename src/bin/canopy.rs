/// Canopy command-line explorer
///
/// Loads one delimited file or workbook, applies a selection, checklist, ranges and search
/// given as flags, and prints the resulting frequency table and summary.
/// The configured chart style and percentage toggle shape the output.
/// Optionally writes the filtered records to a file.

use canopy::{AggregationResult, ChartKind, Explorer, ExplorerConfig, ExportService, NumericRange, Source};
use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "canopy")]
#[command(version)]
#[command(about = "Explore a delimited dataset by category", long_about = None)]
struct Cli {
    /// Data file (.csv, .tsv, .txt, or .xlsx/.xls/.ods with the `excel` feature)
    path: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Category value to select, repeatable (replaces the default selection)
    #[arg(long)]
    select: Vec<String>,

    /// Checklist labels; when present they take precedence over --select
    #[arg(long)]
    check: Vec<String>,

    /// Search text narrowing the listed category options
    #[arg(long)]
    search: Option<String>,

    /// Numeric range as column=min:max, repeatable
    #[arg(long, value_parser = parse_range)]
    range: Vec<(String, NumericRange)>,

    /// Write the filtered records here
    #[arg(long, num_args = 0..=1, default_missing_value = canopy::config::DEFAULT_EXPORT_FILE)]
    export: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_range(arg: &str) -> Result<(String, NumericRange), String> {
    let (column, bounds) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected column=min:max, got '{}'", arg))?;
    let (min, max) = bounds
        .split_once(':')
        .ok_or_else(|| format!("expected min:max, got '{}'", bounds))?;
    let min: f64 = min.trim().parse().map_err(|e| format!("bad minimum '{}': {}", min, e))?;
    let max: f64 = max.trim().parse().map_err(|e| format!("bad maximum '{}': {}", max, e))?;
    Ok((column.trim().to_string(), NumericRange::new(min, max)))
}

/// Widest bar drawn for the largest group
const BAR_WIDTH: usize = 40;

/// Groups as JSON; the `percentage` field is left out when percentages are hidden.
fn groups_json(aggregation: &AggregationResult, show_percent: bool) -> Value {
    aggregation
        .groups
        .iter()
        .map(|g| {
            if show_percent {
                json!({ "category": g.category, "count": g.count, "percentage": g.percentage })
            } else {
                json!({ "category": g.category, "count": g.count })
            }
        })
        .collect()
}

/// Text rendering of the frequency table in the configured chart style.
fn render_groups(aggregation: &AggregationResult, chart: ChartKind, show_percent: bool) -> String {
    let max = aggregation.groups.iter().map(|g| g.count).max().unwrap_or(0);
    let total = aggregation.counted();
    let label = aggregation
        .groups
        .iter()
        .map(|g| g.category.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for g in &aggregation.groups {
        let percent = if show_percent {
            format!(" {:>5.1}%", g.percentage)
        } else {
            String::new()
        };
        let line = match chart {
            ChartKind::Table => format!("{:>8}{}  {}", g.count, percent, g.category),
            ChartKind::Bar => {
                let width = if max == 0 { 0 } else { (g.count * BAR_WIDTH).div_ceil(max) };
                format!("{:<label$} {} {}{}", g.category, "#".repeat(width), g.count, percent)
            }
            ChartKind::Pie => {
                let degrees = if total == 0 { 0.0 } else { g.count as f64 / total as f64 * 360.0 };
                format!("{:<label$} {:>6.1}deg {}{}", g.category, degrees, g.count, percent)
            }
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ExplorerConfig::from_path(path)?,
        None => ExplorerConfig::default(),
    };

    let mut explorer = Explorer::open(Source::path(&cli.path), config)?;
    if !cli.select.is_empty() {
        explorer.select(cli.select.iter().map(|s| s.trim().to_string()));
    }
    for label in &cli.check {
        if !explorer.add_to_checklist(label) {
            log::warn!("ignored checklist label '{}'", label);
        }
    }
    for (column, range) in &cli.range {
        explorer.set_range(column, Some(*range))?;
    }
    if let Some(text) = &cli.search {
        explorer.set_search(text);
    }

    let snapshot = explorer.snapshot();
    let config = explorer.config();
    if cli.json {
        let output = json!({
            "dataset": explorer.dataset().name(),
            "rows": explorer.dataset().len(),
            "options": explorer.options(),
            "criteria": snapshot.criteria,
            "chart": config.chart,
            "groups": groups_json(&snapshot.aggregation, config.show_percent),
            "summary": snapshot.aggregation.summary,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{}: {} of {} records ({:?} selection)",
            explorer.dataset().name(),
            snapshot.view.len(),
            explorer.dataset().len(),
            snapshot.criteria.source
        );
        if cli.search.is_some() {
            println!("options: {}", explorer.options().join(", "));
        }
        print!("{}", render_groups(&snapshot.aggregation, config.chart, config.show_percent));
        for (column, mean) in &snapshot.aggregation.summary.means {
            match mean {
                Some(mean) => println!("mean {}: {:.2}", column, mean),
                None => println!("mean {}: -", column),
            }
        }
    }

    if let Some(path) = &cli.export {
        ExportService::write_to(&snapshot.view, path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy::{AggregationEngine, FilterCriteria, FilterEngine};
    use std::rc::Rc;

    fn aggregation() -> AggregationResult {
        let csv = "Common Name,Year Planted\nOak,1990\nOak,1991\nOak,1992\nElm,1993\n";
        let roles = canopy::ColumnRoles::default().normalized();
        let dataset = Rc::new(canopy::parse_delimited(csv.as_bytes(), "t", &roles, b',').unwrap());
        let view = FilterEngine::apply(&dataset, &FilterCriteria::selecting(["Oak", "Elm"]));
        AggregationEngine::default().counts(&view)
    }

    #[test]
    fn test_hidden_percentages_omitted() {
        let agg = aggregation();
        let shown = render_groups(&agg, ChartKind::Table, true);
        let hidden = render_groups(&agg, ChartKind::Table, false);
        assert!(shown.contains("75.0%"));
        assert!(!hidden.contains('%'));

        let json = groups_json(&agg, false);
        assert_eq!(json[0], json!({ "category": "Oak", "count": 3 }));
        assert_eq!(groups_json(&agg, true)[0]["percentage"], 75.0);
    }

    #[test]
    fn test_chart_styles() {
        let agg = aggregation();
        let bars = render_groups(&agg, ChartKind::Bar, false);
        let lines: Vec<&str> = bars.lines().collect();
        assert_eq!(lines[0], format!("Oak {} 3", "#".repeat(BAR_WIDTH)));
        assert_eq!(lines[1], format!("Elm {} 1", "#".repeat(14)));

        let pie = render_groups(&agg, ChartKind::Pie, false);
        assert!(pie.starts_with("Oak  270.0deg 3"));
    }

    #[test]
    fn test_range_argument() {
        let (column, range) = parse_range("Year Planted=2010:1990").unwrap();
        assert_eq!(column, "Year Planted");
        assert_eq!(range, NumericRange::new(1990.0, 2010.0));
        assert!(parse_range("height").is_err());
    }

    #[test]
    fn test_select_keeps_commas() {
        let cli = Cli::try_parse_from(["canopy", "trees.csv", "--select", "Plane, London", "--select", "Elm"]).unwrap();
        assert_eq!(cli.select, vec!["Plane, London".to_string(), "Elm".to_string()]);
    }
}
