use std::error::Error;
use std::time::{Duration, Instant};

use soloist::supervisor::{ChildHandle, split_command};
use soloist_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

async fn poll_until_exit(child: &mut ChildHandle) -> std::process::ExitStatus {
    loop {
        if let Some(status) = child.poll().expect("poll should not error") {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn poll_reports_the_exit_code() -> TestResult {
    init_tracing();
    let mut child = ChildHandle::spawn("exit 4", true)?;
    let status = poll_until_exit(&mut child).await;
    assert_eq!(status.code(), Some(4));
    assert!(child.is_exited());
    Ok(())
}

#[tokio::test]
async fn nonshell_commands_are_tokenized_and_executed() -> TestResult {
    init_tracing();
    let mut child = ChildHandle::spawn("sleep 0.1", false)?;
    let status = poll_until_exit(&mut child).await;
    assert!(status.success());
    Ok(())
}

#[tokio::test]
async fn graceful_term_stops_the_child_within_the_grace_window() -> TestResult {
    init_tracing();
    let mut child = ChildHandle::spawn("sleep 30", true)?;
    assert!(child.poll()?.is_none(), "child should be running");

    let start = Instant::now();
    child.shutdown(Duration::from_secs(1)).await?;
    assert!(child.is_exited());
    assert!(
        start.elapsed() < Duration::from_secs(2),
        "TERM should have been enough, no full grace + kill wait"
    );
    Ok(())
}

#[tokio::test]
async fn term_resistant_child_is_killed_after_the_grace_window() -> TestResult {
    init_tracing();
    // The trap makes the shell ignore TERM, forcing the KILL escalation.
    let mut child = ChildHandle::spawn("trap '' TERM; sleep 30", true)?;

    let start = Instant::now();
    child.shutdown(Duration::from_millis(300)).await?;
    assert!(child.is_exited());
    assert!(
        start.elapsed() >= Duration::from_millis(300),
        "escalation must wait out the grace window first"
    );
    assert!(start.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[tokio::test]
async fn shutdown_is_idempotent() -> TestResult {
    init_tracing();
    let mut child = ChildHandle::spawn("sleep 30", true)?;
    child.shutdown(Duration::from_secs(1)).await?;
    assert!(child.is_exited());

    // Second call must not error or re-signal the reaped child.
    child.shutdown(Duration::from_secs(1)).await?;
    assert!(child.is_exited());
    Ok(())
}

#[tokio::test]
async fn shutdown_of_an_already_exited_child_is_a_noop() -> TestResult {
    init_tracing();
    let mut child = ChildHandle::spawn("true", true)?;
    poll_until_exit(&mut child).await;

    let start = Instant::now();
    child.shutdown(Duration::from_secs(1)).await?;
    assert!(start.elapsed() < Duration::from_millis(100), "no grace wait for a dead child");
    Ok(())
}

#[test]
fn tokenizer_splits_on_whitespace() {
    assert_eq!(
        split_command("prog --flag value").unwrap(),
        vec!["prog", "--flag", "value"]
    );
}

#[test]
fn tokenizer_honours_single_quotes() {
    assert_eq!(
        split_command("prog 'a b c' d").unwrap(),
        vec!["prog", "a b c", "d"]
    );
}

#[test]
fn tokenizer_honours_double_quotes_with_escapes() {
    assert_eq!(
        split_command(r#"prog "say \"hi\"" x"#).unwrap(),
        vec!["prog", r#"say "hi""#, "x"]
    );
}

#[test]
fn tokenizer_backslash_escapes_outside_quotes() {
    assert_eq!(split_command(r"prog a\ b").unwrap(), vec!["prog", "a b"]);
}

#[test]
fn tokenizer_rejects_unterminated_quotes() {
    assert!(split_command("prog 'oops").is_err());
    assert!(split_command("prog \"oops").is_err());
    assert!(split_command("prog oops\\").is_err());
}

#[test]
fn tokenizer_of_empty_string_is_empty() {
    assert_eq!(split_command("   ").unwrap(), Vec::<String>::new());
}
