//! The `exam export` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use exam_core::export;
use services::load_paper;

pub async fn execute(paper_path: PathBuf, answer_key: bool, output: Option<PathBuf>) -> Result<()> {
    let paper = load_paper(&paper_path)
        .await
        .with_context(|| format!("loading {}", paper_path.display()))?;

    let text = if answer_key {
        export::answer_key(&paper)
    } else {
        export::question_paper(&paper)
    };

    match output {
        Some(path) => {
            tokio::fs::write(&path, text)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
