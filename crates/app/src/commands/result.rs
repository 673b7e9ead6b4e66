//! The `exam result` command.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use exam_core::model::CandidateId;
use exam_core::report;
use services::load_paper;

use crate::StorageArgs;

pub async fn execute(paper_path: PathBuf, candidate_id: String, storage: StorageArgs) -> Result<()> {
    let candidate = CandidateId::parse(&candidate_id)?;
    let paper = load_paper(&paper_path)
        .await
        .with_context(|| format!("loading {}", paper_path.display()))?;

    let config = super::load_config(&storage, None)?;
    let services = super::open_services(config).await?;

    let Some(submission) = services.sessions().stored_submission(&candidate).await? else {
        bail!("no submitted exam for candidate {candidate}");
    };
    if submission.result.questions.len() != paper.len() {
        bail!(
            "stored result has {} questions but {} has {}",
            submission.result.questions.len(),
            paper_path.display(),
            paper.len()
        );
    }

    println!("Submitted: {} ({})", submission.submitted_at.to_rfc3339(), submission.reason.as_str());
    print!("{}", report::render(&paper, &submission.result));
    Ok(())
}
