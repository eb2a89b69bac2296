//! Orchestrator: drives the pending queue through fetch attempts, commits
//! results, and checkpoints at fixed intervals.
//!
//! Strictly sequential by design — the browser session is one shared,
//! stateful resource (cookies, login state) and must never be used by two
//! tasks at once. All waits are plain timed sleeps on the single worker;
//! that pacing is itself part of the anti-detection behavior.
//!
//! The final persist and session release do not live here: the caller wraps
//! this loop in a finalizer that runs on every exit path, so an interrupt or
//! a run-level error can never lose committed results.

use crate::browser::BrowserSession;
use crate::checkpoint;
use crate::dataset::Dataset;
use crate::fetch::fetch_article_text;
use crate::login::bootstrap_session;
use crate::prompts::Credentials;
use crate::queue::build_queue;
use crate::utils::{jitter, truncate_for_log};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument};

/// Persist the checkpoint after this many completed tasks.
pub const PERSIST_EVERY: usize = 10;
/// Take a longer breather after this many completed tasks.
const LONG_PAUSE_EVERY: usize = 50;
const LONG_PAUSE: Duration = Duration::from_secs(10);

/// Process every pending task in queue order.
///
/// Bootstraps the login session against the first pending task's URL, then
/// for each task: fetch, commit the final text in one in-memory write, log
/// progress, checkpoint every [`PERSIST_EVERY`] completions, and pace the
/// next request. A task's text is only ever written after its fetch attempt
/// fully terminates, so cancellation at any await point leaves no torn row.
///
/// # Errors
///
/// Only checkpoint writes can fail here; fetch-level failures are recorded
/// in the dataset instead of surfacing.
#[instrument(level = "info", skip_all)]
pub async fn run<S: BrowserSession>(
    session: &mut S,
    dataset: &mut Dataset,
    output_path: &Path,
    credentials: &Credentials,
) -> Result<(), Box<dyn Error>> {
    let queue = build_queue(dataset);
    let total = queue.len();
    if total == 0 {
        info!("nothing pending; queue is empty");
        return Ok(());
    }
    info!(pending = total, rows = dataset.tasks.len(), "starting fetch loop");

    let landing_url = dataset.tasks[queue[0]].url.clone();
    bootstrap_session(session, &landing_url, credentials).await;

    for (done, &index) in queue.iter().enumerate() {
        let url = dataset.tasks[index].url.clone();
        info!(
            progress = format!("{}/{}", done + 1, total),
            index,
            title = %truncate_for_log(&dataset.tasks[index].title, 20),
            "fetching article"
        );

        let text = fetch_article_text(session, &url).await;
        dataset.tasks[index].text = Some(text);

        let completed = done + 1;
        if completed % PERSIST_EVERY == 0 {
            info!(completed, total, "periodic checkpoint");
            checkpoint::persist(dataset, output_path)?;
            if completed % LONG_PAUSE_EVERY == 0 {
                sleep(LONG_PAUSE).await;
            }
        } else {
            sleep(jitter(3.0, 6.0)).await;
        }
    }

    info!(total, "fetch loop complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::stub::{StubElement, StubPage, StubSession};
    use crate::classify::{FAILURE_SENTINEL, ROBOT_MARKER, TaskStatus, classify};
    use crate::dataset::tests::temp_csv;
    use std::fs;

    fn article_page(body: &str) -> StubPage {
        let mut page = StubPage::default();
        page.source = format!("<html>{body}</html>");
        page.elements
            .insert("#documentBody".into(), StubElement::visible(body));
        page
    }

    fn blocked_page() -> StubPage {
        StubPage {
            source: format!("<html>{ROBOT_MARKER}</html>"),
            ..StubPage::default()
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "reader@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    const BODY_A: &str = "Full text A, comfortably longer than the fifty character minimum.";
    const BODY_C: &str = "Full text C, comfortably longer than the fifty character minimum.";

    /// Scenario from the testable properties: A extracts, B is blocked on
    /// every attempt, C extracts. A second run against the persisted
    /// checkpoint re-queues only B.
    #[tokio::test(start_paused = true)]
    async fn scenario_block_failure_and_resume() {
        let input_csv = "DocumentUrl,Title\n\
                         https://ex.com/a,A\n\
                         https://ex.com/b,B\n\
                         https://ex.com/c,C\n";
        let input = temp_csv("scenario", input_csv);
        let output = checkpoint::output_path_for(&input);

        let mut dataset = Dataset::load(&input).unwrap();
        let mut session = StubSession::new()
            .with_page("https://ex.com/a", article_page(BODY_A))
            .with_page("https://ex.com/b", blocked_page())
            .with_page("https://ex.com/c", article_page(BODY_C));

        run(&mut session, &mut dataset, &output, &credentials()).await.unwrap();
        // the caller's finalizer does the last persist
        checkpoint::persist(&dataset, &output).unwrap();

        assert_eq!(dataset.tasks[0].text.as_deref(), Some(BODY_A));
        assert_eq!(dataset.tasks[1].text.as_deref(), Some(FAILURE_SENTINEL));
        assert_eq!(dataset.tasks[2].text.as_deref(), Some(BODY_C));

        // second run: reconcile against the checkpoint, only B re-queues
        let mut second = Dataset::load(&input).unwrap();
        let snapshot = checkpoint::load_if_present(&output).unwrap();
        checkpoint::reconcile(&mut second, snapshot);
        assert_eq!(build_queue(&second), vec![1]);

        let _ = fs::remove_file(input);
        let _ = fs::remove_file(output);
    }

    #[tokio::test(start_paused = true)]
    async fn done_rows_are_never_refetched() {
        let input_csv = "DocumentUrl,Title,Full_Text\n\
                         https://ex.com/a,A,Already have the full text of this one from before.\n\
                         https://ex.com/b,B,\n";
        let input = temp_csv("norefetch", input_csv);
        let output = checkpoint::output_path_for(&input);

        let mut dataset = Dataset::load(&input).unwrap();
        let mut session =
            StubSession::new().with_page("https://ex.com/b", article_page(BODY_A));

        run(&mut session, &mut dataset, &output, &credentials()).await.unwrap();

        // every visit (login included) targets B; A is never touched
        assert!(session.visits.iter().all(|v| v == "https://ex.com/b"));
        assert_eq!(classify(dataset.tasks[0].text.as_deref()), TaskStatus::Done);
        assert_eq!(classify(dataset.tasks[1].text.as_deref()), TaskStatus::Done);

        let _ = fs::remove_file(input);
        let _ = fs::remove_file(output);
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoint_is_written_every_ten_completions() {
        let mut input_csv = String::from("DocumentUrl,Title\n");
        for i in 0..12 {
            input_csv.push_str(&format!("https://ex.com/{i},T{i}\n"));
        }
        let input = temp_csv("periodic", &input_csv);
        let output = checkpoint::output_path_for(&input);

        let mut dataset = Dataset::load(&input).unwrap();
        let mut session = StubSession::new();
        for i in 0..12 {
            let body = format!("Article body number {i}, long enough to pass the threshold check.");
            session = session.with_page(&format!("https://ex.com/{i}"), article_page(&body));
        }

        run(&mut session, &mut dataset, &output, &credentials()).await.unwrap();

        // the loop persisted at task 10; tasks 11 and 12 are only in memory
        let snapshot = checkpoint::load_if_present(&output).unwrap();
        assert_eq!(snapshot.len(), 12);
        assert_eq!(snapshot.iter().filter(|t| t.is_some()).count(), 10);

        let _ = fs::remove_file(input);
        let _ = fs::remove_file(output);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_queue_short_circuits() {
        let input_csv = "DocumentUrl,Full_Text\nhttps://ex.com/a,All done already here.\n";
        let input = temp_csv("shortcircuit", input_csv);
        let output = checkpoint::output_path_for(&input);

        let mut dataset = Dataset::load(&input).unwrap();
        let mut session = StubSession::new();
        run(&mut session, &mut dataset, &output, &credentials()).await.unwrap();
        assert!(session.visits.is_empty(), "no navigation for an empty queue");

        let _ = fs::remove_file(input);
    }
}
