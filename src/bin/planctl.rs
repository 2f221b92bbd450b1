use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};

use joinplan::plan::{JoinDistributionType, JoinNode, PlanNode, PlanPrinter, PrinterConfig, codec};
use joinplan::PlanNodeId;

#[derive(Parser)]
#[command(author, version, about = "planctl - inspect and rewrite serialized join plans")]
struct Cli {
    /// Spaces per nesting level in printed plans
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Hide plan node ids in printed plans
    #[arg(long)]
    no_ids: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a JSON plan is well formed
    Validate {
        /// Plan file (JSON)
        file: PathBuf,
    },

    /// Print a JSON plan as an indented tree
    Explain {
        file: PathBuf,
    },

    /// Swap the inputs of a join and print the resulting plan as JSON
    Flip {
        file: PathBuf,

        /// Join to flip; defaults to the root
        #[arg(long)]
        node: Option<String>,
    },

    /// Attach a distribution type to a join and print the plan as JSON
    Distribute {
        file: PathBuf,

        /// partitioned or replicated
        distribution: JoinDistributionType,

        /// Join to change; defaults to the root
        #[arg(long)]
        node: Option<String>,
    },

    /// Print the wire encoding of a JSON plan as hex
    Encode {
        file: PathBuf,
    },

    /// Decode hex wire bytes and print the plan as JSON
    Decode {
        hex: String,
    },
}

fn load_plan(path: &Path) -> Result<PlanNode> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let plan = codec::from_json(&text).with_context(|| format!("Invalid plan in {}", path.display()))?;
    Ok(plan)
}

/// Rebuild `plan` with the join `target` (or the root) replaced by
/// `rewrite(join)`. Untouched subtrees are shared with the input.
fn rewrite_join<F>(plan: &Arc<PlanNode>, target: Option<&PlanNodeId>, rewrite: &F) -> Result<Option<Arc<PlanNode>>>
where
    F: Fn(&JoinNode) -> Result<JoinNode>,
{
    let is_target = match target {
        Some(id) => plan.id() == id,
        None => true,
    };
    if is_target {
        let join = plan
            .as_join()
            .ok_or_else(|| anyhow!("Plan node {} is not a join", plan.id()))?;
        return Ok(Some(Arc::new(PlanNode::Join(rewrite(join)?))));
    }

    let sources = plan.sources();
    let mut changed = false;
    let mut new_sources = Vec::with_capacity(sources.len());
    for source in &sources {
        match rewrite_join(source, target, rewrite)? {
            Some(rewritten) => {
                changed = true;
                new_sources.push(rewritten);
            }
            None => new_sources.push(Arc::clone(source)),
        }
    }

    if changed {
        Ok(Some(Arc::new(plan.replace_children(new_sources)?)))
    } else {
        Ok(None)
    }
}

fn rewrite_and_print<F>(file: &Path, node: Option<String>, rewrite: F) -> Result<()>
where
    F: Fn(&JoinNode) -> Result<JoinNode>,
{
    let plan = Arc::new(load_plan(file)?);
    let target = node.map(PlanNodeId::new);
    let rewritten = match rewrite_join(&plan, target.as_ref(), &rewrite)? {
        Some(rewritten) => rewritten,
        None => bail!("No plan node with id {}", target.map(|id| id.to_string()).unwrap_or_default()),
    };
    println!("{}", codec::to_json(&rewritten)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer_config = PrinterConfig {
        indent_width: cli.indent,
        show_ids: !cli.no_ids,
        ..PrinterConfig::default()
    };

    match cli.command {
        Commands::Validate { file } => {
            let plan = load_plan(&file)?;
            println!("Plan {} is valid", plan.id());
        }
        Commands::Explain { file } => {
            let plan = load_plan(&file)?;
            print!("{}", PlanPrinter::print(&plan, printer_config));
        }
        Commands::Flip { file, node } => {
            rewrite_and_print(&file, node, |join| Ok(join.flip_children()?))?;
        }
        Commands::Distribute { file, distribution, node } => {
            rewrite_and_print(&file, node, |join| Ok(join.with_distribution_type(distribution)?))?;
        }
        Commands::Encode { file } => {
            let plan = load_plan(&file)?;
            println!("{}", hex::encode(codec::encode(&plan)?));
        }
        Commands::Decode { hex } => {
            let bytes = hex::decode(hex.trim()).context("Input is not valid hex")?;
            let plan = codec::decode(&bytes)?;
            println!("{}", codec::to_json(&plan)?);
        }
    }

    Ok(())
}
