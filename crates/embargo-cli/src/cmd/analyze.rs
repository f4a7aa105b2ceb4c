//! `embargo analyze` — run one analysis request: build the filtered country
//! graph, compute centrality metrics, and lay the graph out.

use std::io::Write;
use std::path::Path;

use clap::Args;

use embargo_core::store::open_store;
use embargo_graph::report::{AnalysisConfig, AnalysisResult, analyze};

use crate::cmd::FilterArgs;
use crate::output::{OutputMode, render};

/// Arguments for `embargo analyze`.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// PageRank damping factor.
    #[arg(long, default_value_t = 0.85)]
    pub damping: f64,
}

/// Execute `embargo analyze`.
pub fn run_analyze(args: &AnalyzeArgs, output: OutputMode, db: &Path) -> anyhow::Result<()> {
    let conn = open_store(db)?;

    let mut config = AnalysisConfig::default();
    config.centrality.pagerank.damping = args.damping;

    let result = analyze(&conn, &args.filter.to_filter(), &config)?;

    render(output, &result, |r, w| render_analysis_human(r, w))
}

fn render_analysis_human(result: &AnalysisResult, w: &mut dyn Write) -> std::io::Result<()> {
    if result.is_empty() {
        return writeln!(w, "no relations match the filter");
    }

    writeln!(
        w,
        "{} countries, {} directed edges",
        result.layout.len(),
        result.edges_render.len()
    )?;

    writeln!(
        w,
        "\n{:<8} {:>7} {:>7} {:>7} {:>9} {:>11} {:>9} {:>9} {:>8}",
        "country", "deg", "in", "out", "close", "between", "clust", "pr", "eigen"
    )?;
    for row in &result.centralities {
        writeln!(
            w,
            "{:<8} {:>7.2} {:>7.2} {:>7.2} {:>9} {:>11.2} {:>9.2} {:>9.2} {:>8}",
            row.country,
            row.degree,
            row.in_degree,
            row.out_degree,
            optional(row.closeness),
            row.betweenness,
            row.clustering,
            row.pagerank,
            optional(row.eigenvector),
        )?;
    }

    writeln!(w, "\nheaviest edges:")?;
    let mut edges: Vec<_> = result.edges_render.iter().collect();
    edges.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| {
        (&a.source, &a.target).cmp(&(&b.source, &b.target))
    }));
    for edge in edges.iter().take(10) {
        writeln!(
            w,
            "  {} -> {}  weight {} (visual {:.2})",
            edge.source, edge.target, edge.weight, edge.visual_weight
        )?;
    }

    Ok(())
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
