use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use canopy::{SummaryOutput, SummaryRow};

#[derive(Parser, Debug)]
#[command(name = "canopy", about = "Maximum-entropy summary trees for weighted hierarchies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plan summaries with the fast greedy heuristic.
    Greedy {
        /// Tree file (`<id>\t<parent>\t<weight>\t<label>` per line, parent 0 = root).
        input: PathBuf,
        /// Largest summary size to plan for.
        #[arg(long, default_value_t = 20)]
        budget: usize,
    },
    /// Plan entropy-optimal summaries with the dynamic program.
    Optimal {
        /// Tree file (`<id>\t<parent>\t<weight>\t<label>` per line, parent 0 = root).
        input: PathBuf,
        /// Largest summary size to plan for.
        #[arg(long, default_value_t = 20)]
        budget: usize,
        /// Approximation slack in nats; 0 runs the exact solver.
        #[arg(long, default_value_t = 0.0)]
        epsilon: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Greedy { input, budget } => {
            let tree = read_tree_file(&input)?;
            let out = canopy::greedy(&tree.ids, &tree.parents, &tree.weights, &tree.labels, budget)
                .context("greedy planning failed")?;
            print_output(&out);
        }
        Commands::Optimal {
            input,
            budget,
            epsilon,
        } => {
            let tree = read_tree_file(&input)?;
            let out = canopy::optimal(
                &tree.ids,
                &tree.parents,
                &tree.weights,
                &tree.labels,
                budget,
                epsilon,
            )
            .context("optimal planning failed")?;
            print_output(&out);
        }
    }

    Ok(())
}

struct TreeInput {
    ids: Vec<u64>,
    parents: Vec<u64>,
    weights: Vec<f64>,
    labels: Vec<String>,
}

fn read_tree_file(path: &PathBuf) -> Result<TreeInput> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open tree file {}", path.display()))?,
    );

    let mut tree = TreeInput {
        ids: Vec::new(),
        parents: Vec::new(),
        weights: Vec::new(),
        labels: Vec::new(),
    };

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.splitn(4, '\t');
        let id_str = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing id on line {}", line_no + 1))?;
        let parent_str = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing parent on line {}", line_no + 1))?;
        let weight_str = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing weight on line {}", line_no + 1))?;
        let label = fields.next().unwrap_or(id_str).trim().to_string();

        let id: u64 = id_str
            .trim()
            .parse()
            .with_context(|| format!("invalid id '{}' on line {}", id_str.trim(), line_no + 1))?;
        let parent: u64 = parent_str.trim().parse().with_context(|| {
            format!(
                "invalid parent '{}' on line {}",
                parent_str.trim(),
                line_no + 1
            )
        })?;
        let weight: f64 = weight_str.trim().parse().with_context(|| {
            format!(
                "invalid weight '{}' on line {}",
                weight_str.trim(),
                line_no + 1
            )
        })?;

        tree.ids.push(id);
        tree.parents.push(parent);
        tree.weights.push(weight);
        tree.labels.push(label);
    }

    Ok(tree)
}

fn print_output(out: &SummaryOutput) {
    println!("k\tentropy (nats)");
    for (k, h) in &out.entropies {
        println!("{k}\t{h:.6}");
    }

    if let Some(largest) = out.summaries.last() {
        println!();
        println!("summary for k = {}:", largest.len());
        for (idx, row) in largest.rows().iter().enumerate() {
            print_row(idx, row);
        }
    }
}

fn print_row(idx: usize, row: &SummaryRow) {
    let parent = row
        .parent
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    let node = row
        .node
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{idx}\tnode={node}\tparent_row={parent}\tweight={:.3}\tkind={}\t{}",
        row.weight,
        row.kind.code(),
        row.label
    );
}
