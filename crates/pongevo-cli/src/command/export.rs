use std::path::PathBuf;

use super::ModelArg;
use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ExportArg {
    #[clap(flatten)]
    model: ModelArg,
    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ExportArg) -> anyhow::Result<()> {
    let ExportArg { model, output } = arg;
    let record = model.store().best_agent(&model.name);
    Output::save_json(&record, output.clone())?;

    eprintln!("Exported model {:?}", model.name);
    if let Some(path) = output {
        eprintln!("  Path:       {}", path.display());
    }
    if let Some(trained_at) = record.trained_at {
        eprintln!("  Trained at: {trained_at}");
    }
    eprintln!("  Fitness:    {:.3}", record.fitness);
    Ok(())
}
