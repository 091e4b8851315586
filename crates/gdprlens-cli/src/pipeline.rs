//! Batch annotation: scan a case directory, annotate each file, write records next to the inputs.

use std::path::Path;
use std::time::Instant;

use futures::{future, stream, StreamExt};
use gdprlens_ai::Annotate;
use gdprlens_core::{AnnotationRecord, CaseFile};
use gdprlens_store::{scan, write_record, StoreError};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::cancel::CancellationToken;

pub struct RunOptions {
    /// Maximum annotation calls in flight. 1 processes files strictly in scan order.
    pub concurrency: usize,
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            show_progress: false,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub discovered: usize,
    /// Records written, whether or not the annotation itself succeeded.
    pub written: usize,
    /// Records written that carry an error-shaped annotation.
    pub annotation_errors: usize,
    /// Files that could not be read or whose record could not be written.
    pub failed: usize,
    /// Files never started because the run was cancelled.
    pub cancelled: usize,
    pub elapsed_secs: f64,
}

enum FileOutcome {
    Written { annotated: bool },
    Failed,
}

/// Annotate every case file under `dir`.
///
/// Only an invalid input directory fails the run. Per-file read, annotation,
/// and write failures are logged (annotation failures also land in the
/// record) and processing moves on to the next file.
pub async fn run(
    dir: &Path,
    annotator: &dyn Annotate,
    options: &RunOptions,
    cancel: &CancellationToken,
) -> Result<RunSummary, StoreError> {
    let start = Instant::now();
    let cases = scan(dir)?;
    let mut summary = RunSummary {
        discovered: cases.len(),
        ..RunSummary::default()
    };

    let progress = progress_bar(cases.len(), options.show_progress);

    let outcomes: Vec<FileOutcome> = stream::iter(cases.iter())
        .take_while(|_| future::ready(!cancel.is_cancelled()))
        .map(|case| process_case(case, annotator))
        .buffer_unordered(options.concurrency.max(1))
        .inspect(|_| progress.inc(1))
        .collect()
        .await;
    progress.finish_and_clear();

    for outcome in &outcomes {
        match outcome {
            FileOutcome::Written { annotated } => {
                summary.written += 1;
                if !annotated {
                    summary.annotation_errors += 1;
                }
            }
            FileOutcome::Failed => summary.failed += 1,
        }
    }
    summary.cancelled = summary.discovered - outcomes.len();
    summary.elapsed_secs = start.elapsed().as_secs_f64();

    if summary.cancelled > 0 {
        warn!(skipped = summary.cancelled, "run cancelled before all files were started");
    }
    info!(
        discovered = summary.discovered,
        written = summary.written,
        annotation_errors = summary.annotation_errors,
        failed = summary.failed,
        elapsed_secs = summary.elapsed_secs,
        "annotation run finished"
    );
    Ok(summary)
}

// File reads and record writes run on the blocking pool so a slow disk does
// not stall the other in-flight annotation calls.
async fn process_case(case: &CaseFile, annotator: &dyn Annotate) -> FileOutcome {
    let reading = case.clone();
    let text = match tokio::task::spawn_blocking(move || reading.read_text()).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            error!(file = %case.path.display(), error = %e, "could not read case file");
            return FileOutcome::Failed;
        }
        Err(e) => {
            error!(file = %case.path.display(), error = %e, "case file read task failed");
            return FileOutcome::Failed;
        }
    };

    let annotations = annotator.annotate(&text).await;
    let annotated = annotations.is_ok();
    if let Some(reason) = annotations.error_message() {
        warn!(file = %case.path.display(), %reason, "annotation failed");
    }

    let record = AnnotationRecord::new(case, &text, annotations);
    let writing = case.clone();
    match tokio::task::spawn_blocking(move || write_record(&writing, &record)).await {
        Ok(Ok(output)) => {
            info!(source = %case.path.display(), output = %output.display(), "processed");
            FileOutcome::Written { annotated }
        }
        Ok(Err(e)) => {
            error!(file = %case.path.display(), error = %e, "could not write record");
            FileOutcome::Failed
        }
        Err(e) => {
            error!(file = %case.path.display(), error = %e, "record write task failed");
            FileOutcome::Failed
        }
    }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(len as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    progress.set_message("Annotating cases...");
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use gdprlens_core::{AnnotationResult, FailureKind};
    use serde_json::{json, Map, Value};

    /// Deterministic annotator: echoes the text length, fails on texts containing "fail".
    #[derive(Default)]
    struct EchoAnnotator {
        seen: Mutex<Vec<String>>,
        cancel_on_call: Option<CancellationToken>,
    }

    #[async_trait]
    impl Annotate for EchoAnnotator {
        async fn annotate(&self, text: &str) -> AnnotationResult {
            self.seen.lock().unwrap().push(text.to_string());
            if let Some(token) = &self.cancel_on_call {
                token.cancel();
            }
            if text.contains("fail") {
                return AnnotationResult::failed(FailureKind::ExhaustedRetries, "Max retries exceeded", "");
            }
            let mut fields = Map::new();
            fields.insert("country".into(), json!("Ireland"));
            fields.insert("length".into(), json!(text.len()));
            AnnotationResult::Fields(fields)
        }
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn processes_in_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("10.txt"), "ten").unwrap();
        fs::write(dir.path().join("2.txt"), "two").unwrap();
        fs::write(dir.path().join("1.txt"), "one").unwrap();

        let annotator = EchoAnnotator::default();
        let summary = run(dir.path(), &annotator, &RunOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*annotator.seen.lock().unwrap(), vec!["one", "two", "ten"]);
        assert_eq!(summary.discovered, 3);
        assert_eq!(summary.written, 3);
        assert_eq!(summary.failed, 0);

        let record = read_json(&dir.path().join("10.json"));
        assert_eq!(
            record,
            json!({
                "metadata": {"source_file": "10.txt", "text_length": 3},
                "annotations": {"country": "Ireland", "length": 3}
            })
        );
    }

    #[tokio::test]
    async fn unreadable_file_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.txt"), "first").unwrap();
        fs::write(dir.path().join("2.txt"), [0xffu8, 0xfe, 0xfd]).unwrap();
        fs::write(dir.path().join("3.txt"), "third").unwrap();

        let annotator = EchoAnnotator::default();
        let summary = run(dir.path(), &annotator, &RunOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(dir.path().join("1.json").exists());
        assert!(!dir.path().join("2.json").exists());
        assert!(dir.path().join("3.json").exists());
        assert_eq!(summary.written, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(*annotator.seen.lock().unwrap(), vec!["first", "third"]);
    }

    #[tokio::test]
    async fn failed_annotation_is_written_as_error_record() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("5.txt"), "this one will fail").unwrap();

        let summary = run(
            dir.path(),
            &EchoAnnotator::default(),
            &RunOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(summary.annotation_errors, 1);
        let record = read_json(&dir.path().join("5.json"));
        assert_eq!(
            record["annotations"],
            json!({"error": "Max retries exceeded", "raw_output": ""})
        );
    }

    #[tokio::test]
    async fn rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.txt"), "Datenschutzbehörde case").unwrap();
        fs::write(dir.path().join("2.txt"), "to fail").unwrap();

        let options = RunOptions::default();
        let token = CancellationToken::new();
        run(dir.path(), &EchoAnnotator::default(), &options, &token).await.unwrap();
        let first = (
            fs::read(dir.path().join("1.json")).unwrap(),
            fs::read(dir.path().join("2.json")).unwrap(),
        );
        run(dir.path(), &EchoAnnotator::default(), &options, &token).await.unwrap();
        let second = (
            fs::read(dir.path().join("1.json")).unwrap(),
            fs::read(dir.path().join("2.json")).unwrap(),
        );
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn cancelled_before_start_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.txt"), "a").unwrap();
        fs::write(dir.path().join("2.txt"), "b").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let summary = run(dir.path(), &EchoAnnotator::default(), &RunOptions::default(), &token)
            .await
            .unwrap();

        assert_eq!(summary.cancelled, 2);
        assert_eq!(summary.written, 0);
        assert!(!dir.path().join("1.json").exists());
    }

    #[tokio::test]
    async fn cancellation_between_files_keeps_finished_records() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=3 {
            fs::write(dir.path().join(format!("{n}.txt")), format!("case {n}")).unwrap();
        }

        let token = CancellationToken::new();
        let annotator = EchoAnnotator {
            cancel_on_call: Some(token.clone()),
            ..EchoAnnotator::default()
        };
        let summary = run(dir.path(), &annotator, &RunOptions::default(), &token)
            .await
            .unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(summary.cancelled, 2);
        assert_eq!(read_json(&dir.path().join("1.json"))["metadata"]["source_file"], "1.txt");
        assert!(!dir.path().join("2.json").exists());
    }

    #[tokio::test]
    async fn bounded_concurrency_processes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=6 {
            fs::write(dir.path().join(format!("case_{n}.txt")), format!("case {n}")).unwrap();
        }

        let options = RunOptions {
            concurrency: 3,
            show_progress: false,
        };
        let summary = run(dir.path(), &EchoAnnotator::default(), &options, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.written, 6);
        for n in 1..=6 {
            assert!(dir.path().join(format!("case_{n}.json")).exists());
        }
    }

    #[tokio::test]
    async fn unwritable_record_is_counted_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.txt"), "first").unwrap();
        fs::write(dir.path().join("2.txt"), "second").unwrap();
        // A directory in the way of the output path makes the rename fail.
        fs::create_dir(dir.path().join("1.json")).unwrap();

        let annotator = EchoAnnotator::default();
        let summary = run(dir.path(), &annotator, &RunOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.written, 1);
        assert!(dir.path().join("1.json").is_dir());
        assert_eq!(read_json(&dir.path().join("2.json"))["metadata"]["source_file"], "2.txt");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_run_on_multi_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=8 {
            fs::write(dir.path().join(format!("{n}.txt")), "x".repeat(n)).unwrap();
        }

        let options = RunOptions {
            concurrency: 4,
            show_progress: false,
        };
        let summary = run(dir.path(), &EchoAnnotator::default(), &options, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.written, 8);
        for n in 1..=8 {
            let record = read_json(&dir.path().join(format!("{n}.json")));
            assert_eq!(record["metadata"]["text_length"], n);
        }
    }

    #[tokio::test]
    async fn invalid_directory_fails_the_run() {
        let err = run(
            Path::new("/nonexistent/gdpr/cases"),
            &EchoAnnotator::default(),
            &RunOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }
}
