//! The `exam take` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use exam_core::model::{Candidate, ExamPaper};
use exam_core::report;
use services::{SessionHandle, SessionServiceError, load_paper};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::StorageArgs;
use crate::terminal::{HELP, Input, parse_line, render_question};

pub async fn execute(
    paper_path: PathBuf,
    candidate_id: String,
    name: String,
    sink_url: Option<String>,
    storage: StorageArgs,
) -> Result<()> {
    let config = super::load_config(&storage, sink_url.as_deref())?;
    let paper = load_paper(&paper_path)
        .await
        .with_context(|| format!("loading {}", paper_path.display()))?;
    let paper = Arc::new(paper);
    let candidate = Candidate::new(&candidate_id, &name)?;

    let services = super::open_services(config).await?;
    let (handle, task) = services.sessions().start(Arc::clone(&paper), candidate).await;

    let outcome = run_screen(&paper, &handle).await;
    // Fails only if the driver is already gone; the task result covers that.
    let _ = handle.shutdown().await;
    drop(handle);
    let last = task.await.context("session driver failed")?;
    outcome?;

    match &last.submission {
        Some(submission) => {
            println!();
            print!("{}", report::render(&paper, &submission.result));
        }
        None => {
            println!(
                "Progress saved with {} remaining. Run the same command today to resume.",
                last.clock()
            );
        }
    }
    Ok(())
}

/// Read commands until the candidate submits, quits, or time runs out.
async fn run_screen(paper: &ExamPaper, handle: &SessionHandle) -> Result<()> {
    let mut progress = handle.snapshot().await?;
    if progress.is_submitted() {
        println!("This exam has already been submitted.");
        return Ok(());
    }

    println!("{}", paper.title());
    println!("Type h for help.");
    println!();
    print!("{}", render_question(paper, &progress));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading input")?,
            submitted = handle.wait_submitted() => {
                if submitted {
                    println!();
                    println!("Time is up. Your answers have been submitted.");
                }
                return Ok(());
            }
        };
        // End of input leaves without submitting.
        let Some(line) = line else {
            return Ok(());
        };

        let input = match parse_line(&line, paper, progress.current_index) {
            Ok(input) => input,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };

        match input {
            Input::Quit => return Ok(()),
            Input::Help => println!("{HELP}"),
            Input::Show => {
                progress = handle.snapshot().await?;
                print!("{}", render_question(paper, &progress));
            }
            Input::Commands(commands) => {
                for command in commands {
                    match handle.apply(command).await {
                        Ok(next) => progress = next,
                        Err(SessionServiceError::Domain(err)) => eprintln!("{err}"),
                        Err(err) => return Err(err.into()),
                    }
                }
                if progress.is_submitted() {
                    println!("Exam submitted.");
                    return Ok(());
                }
                print!("{}", render_question(paper, &progress));
            }
        }
    }
}
