//! Process-backed [`AgentRunner`].
//!
//! One invocation is one child process. The runner writes the prompt to the
//! child's stdin, closes it, then watches stdout until the turn settles:
//!
//! ```text
//!            spawn
//!              │
//!              ▼
//!   ┌──────────────────────┐  content seen   ┌────────────────────┐
//!   │ idle timer: Unarmed  │ ──────────────▶ │ idle timer: Armed  │◀─┐ chunk
//!   └──────────────────────┘                 └────────────────────┘──┘ (reset)
//!              │                                │          │
//!   exit / hard deadline               exit     idle or hard deadline
//!              ▼                                ▼          ▼
//!         Exited | HardTimeout               Exited     IdleSettled
//! ```
//!
//! The idle timer only starts once the output probe reports answer text.
//! CLIs routinely sit silent for a long time while they think, and that
//! silence must not end the turn. Once answer text exists the hard deadline
//! no longer fails the turn: it cuts the turn short and keeps what arrived,
//! reported as `IdleSettled` so `is_complete()` stays false.
//!
//! The child leads its own process group and a kill takes the whole group,
//! so helpers it spawned cannot hold the pipes open.

use super::templates::InvocationTable;
use async_trait::async_trait;
use roundtable_application::ports::agent_runner::{AgentRunner, RunError, RunOptions};
use roundtable_domain::{Participant, TurnOutcome, TurnResult, has_response_content, parse_output};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until, timeout};
use tracing::{debug, info, trace, warn};

/// How long to keep collecting output after the process is gone
const DRAIN_GRACE: Duration = Duration::from_secs(2);

const READ_BUFFER_SIZE: usize = 8192;

/// Idle detection state of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdleTimer {
    Unarmed,
    Armed { deadline: Instant },
}

impl IdleTimer {
    fn deadline(&self) -> Option<Instant> {
        match self {
            IdleTimer::Unarmed => None,
            IdleTimer::Armed { deadline } => Some(*deadline),
        }
    }
}

/// Why the watch loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Exited(Option<i32>),
    IdleSettled,
    /// Hard deadline reached after answer text arrived
    CappedAfterContent,
    HardTimeout,
}

/// Decodes UTF-8 across chunk boundaries.
///
/// A multi-byte character split between two reads is held back until the
/// rest arrives; bytes that can never form valid UTF-8 become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(std::str::from_utf8(&self.pending[..valid]).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

/// Runs participants as local CLI processes
pub struct ProcessAgentRunner {
    table: InvocationTable,
}

impl ProcessAgentRunner {
    pub fn new(table: InvocationTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &InvocationTable {
        &self.table
    }
}

impl Default for ProcessAgentRunner {
    fn default() -> Self {
        Self::new(InvocationTable::builtin())
    }
}

#[async_trait]
impl AgentRunner for ProcessAgentRunner {
    async fn run(
        &self,
        participant: Participant,
        prompt: &str,
        options: &RunOptions,
    ) -> Result<TurnResult, RunError> {
        let invocation = self.table.get(participant).ok_or_else(|| RunError::Spawn {
            participant,
            message: "no invocation template".to_string(),
        })?;

        let args = invocation.arguments(options.model.as_deref());
        debug!(
            "[{}:{}] spawning {} {}",
            participant,
            options.label,
            invocation.program,
            args.join(" ")
        );

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&args)
            .current_dir(&options.cwd)
            .envs(options.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        // The child also gets its own process group for kill_process_group.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                libc::setpgid(0, 0);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|e| RunError::Spawn {
            participant,
            message: e.to_string(),
        })?;
        let started = Instant::now();

        // Written from a task so a chatty child cannot deadlock us on a full pipe
        if let Some(mut stdin) = child.stdin.take() {
            let prompt = prompt.to_string();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                    debug!("Prompt delivery stopped early: {}", e);
                }
                let _ = stdin.shutdown().await;
            });
        }

        let stdout = child.stdout.take().ok_or_else(|| RunError::Io("stdout not captured".into()))?;
        let stderr = child.stderr.take().ok_or_else(|| RunError::Io("stderr not captured".into()))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_chunks(stdout, tx));
        let stderr_task = tokio::spawn(collect_all(stderr));

        let hard_deadline = started + options.hard_timeout;
        let mut idle = IdleTimer::Unarmed;
        let mut decoder = Utf8Decoder::default();
        let mut raw = String::new();
        let mut stdout_open = true;

        let settlement = loop {
            let idle_deadline = idle.deadline();
            let idle_expired = async move {
                match idle_deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;

                chunk = rx.recv(), if stdout_open => match chunk {
                    Some(bytes) => {
                        let text = decoder.push(&bytes);
                        trace!("[{}:{}] {}", participant, options.label, text);
                        raw.push_str(&text);
                        idle = match idle {
                            IdleTimer::Armed { .. } => IdleTimer::Armed {
                                deadline: Instant::now() + options.idle_timeout,
                            },
                            IdleTimer::Unarmed if has_response_content(participant, &raw) => {
                                debug!("[{}:{}] answer text started, idle timer armed", participant, options.label);
                                IdleTimer::Armed {
                                    deadline: Instant::now() + options.idle_timeout,
                                }
                            }
                            IdleTimer::Unarmed => IdleTimer::Unarmed,
                        };
                    }
                    None => stdout_open = false,
                },
                status = child.wait() => {
                    let status = status.map_err(|e| RunError::Io(e.to_string()))?;
                    break Settlement::Exited(status.code());
                }
                _ = sleep_until(hard_deadline) => break match idle {
                    IdleTimer::Armed { .. } => Settlement::CappedAfterContent,
                    IdleTimer::Unarmed => Settlement::HardTimeout,
                },
                _ = idle_expired => break Settlement::IdleSettled,
            }
        };

        if !matches!(settlement, Settlement::Exited(_)) {
            kill_process_group(&child);
            let _ = child.start_kill();
            let _ = timeout(DRAIN_GRACE, child.wait()).await;
        }

        // Pick up what is still in the pipe; a grandchild holding it open
        // must not stall us.
        if stdout_open {
            let _ = timeout(DRAIN_GRACE, async {
                while let Some(bytes) = rx.recv().await {
                    raw.push_str(&decoder.push(&bytes));
                }
            })
            .await;
        }
        raw.push_str(&decoder.finish());

        let stderr = match timeout(DRAIN_GRACE, stderr_task).await {
            Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            _ => String::new(),
        };
        let elapsed = started.elapsed();

        let (outcome, exit_code) = match settlement {
            Settlement::HardTimeout => {
                warn!(
                    "[{}:{}] hard timeout after {:?}, process killed",
                    participant, options.label, options.hard_timeout
                );
                return Err(RunError::HardTimeout(options.hard_timeout));
            }
            Settlement::IdleSettled => (TurnOutcome::IdleSettled, None),
            Settlement::CappedAfterContent => {
                info!(
                    "[{}:{}] hard timeout after {:?} with answer text, keeping output",
                    participant, options.label, options.hard_timeout
                );
                (TurnOutcome::IdleSettled, None)
            }
            Settlement::Exited(Some(0)) => (TurnOutcome::Exited, Some(0)),
            Settlement::Exited(code) if raw.trim().is_empty() => {
                warn!(
                    "[{}:{}] exited with {:?} and no output",
                    participant, options.label, code
                );
                return Err(RunError::ExitedWithoutOutput { code, stderr });
            }
            Settlement::Exited(code) => (TurnOutcome::PartialSuccess, code),
        };

        let parsed = parse_output(participant, &raw);
        let result = TurnResult {
            participant,
            clean_text: parsed.text,
            parse_source: parsed.source,
            raw_output: raw,
            stderr,
            exit_code,
            outcome,
            elapsed,
        };

        info!(
            "[{}:{}] settled as {} in {:.1}s ({} chars, {})",
            participant,
            options.label,
            outcome.as_str(),
            elapsed.as_secs_f64(),
            result.clean_text.chars().count(),
            result.parse_source.as_str()
        );

        if result.is_parse_anomaly() {
            warn!(
                "[{}:{}] {} bytes of output but no text recovered",
                participant,
                options.label,
                result.raw_output.len()
            );
            if let Some(dir) = &options.diagnostics_dir {
                dump_raw_output(dir, participant, &options.label, &result.raw_output).await;
            }
        }

        Ok(result)
    }
}

#[cfg(target_os = "linux")]
fn kill_process_group(child: &tokio::process::Child) {
    if let Some(pid) = child.id() {
        // Negative pid addresses the group the child leads
        unsafe {
            libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn kill_process_group(_child: &tokio::process::Child) {}

async fn forward_chunks<R: AsyncRead + Unpin>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("stdout read failed: {}", e);
                break;
            }
        }
    }
}

async fn collect_all<R: AsyncRead + Unpin>(mut reader: R) -> Vec<u8> {
    let mut bytes = Vec::new();
    if let Err(e) = reader.read_to_end(&mut bytes).await {
        debug!("stderr read failed: {}", e);
    }
    bytes
}

async fn dump_raw_output(dir: &Path, participant: Participant, label: &str, raw: &str) {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
    let path = dir.join(format!("{}-{}-{}.raw.log", participant, label, stamp));
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!("Could not create diagnostics directory {}: {}", dir.display(), e);
        return;
    }
    match tokio::fs::write(&path, raw).await {
        Ok(()) => info!("Raw output saved to {}", path.display()),
        Err(e) => warn!("Could not write {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::templates::Invocation;
    use roundtable_domain::ParseSource;

    const GEMINI_LINE: &str =
        r#"{"type":"message","role":"assistant","content":"Use a bounded queue here.","delta":true}"#;

    fn script_runner(participant: Participant, script: &str) -> ProcessAgentRunner {
        ProcessAgentRunner::new(
            InvocationTable::empty().with(participant, Invocation::new("sh", &["-c", script])),
        )
    }

    fn options(idle_ms: u64, hard_ms: u64) -> RunOptions {
        RunOptions::new(std::env::temp_dir())
            .with_idle_timeout(Duration::from_millis(idle_ms))
            .with_hard_timeout(Duration::from_millis(hard_ms))
            .with_label("test")
    }

    #[test]
    fn test_decoder_carries_split_characters() {
        let bytes = "héllo €".as_bytes();
        let mut decoder = Utf8Decoder::default();
        // Split inside the two-byte 'é' and the three-byte '€'
        let mut text = decoder.push(&bytes[..2]);
        text.push_str(&decoder.push(&bytes[2..8]));
        text.push_str(&decoder.push(&bytes[8..]));
        text.push_str(&decoder.finish());
        assert_eq!(text, "héllo €");
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.push(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[tokio::test]
    async fn test_clean_exit() {
        let runner = script_runner(Participant::Gemini, &format!("echo '{}'", GEMINI_LINE));
        let result = runner
            .run(Participant::Gemini, "hi", &options(2_000, 10_000))
            .await
            .unwrap();
        assert_eq!(result.outcome, TurnOutcome::Exited);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.clean_text, "Use a bounded queue here.");
        assert_eq!(result.parse_source, ParseSource::Streamed);
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_prompt_delivered_on_stdin() {
        let runner = script_runner(Participant::Claude, "cat");
        let result = runner
            .run(Participant::Claude, "plain prompt text", &options(2_000, 10_000))
            .await
            .unwrap();
        assert_eq!(result.clean_text, "plain prompt text");
        assert_eq!(result.parse_source, ParseSource::PlainText);
    }

    #[tokio::test]
    async fn test_idle_settles_before_hard_timeout() {
        // Answer text, then silence well past the idle window
        let script = format!("echo '{}'; sleep 30", GEMINI_LINE);
        let runner = script_runner(Participant::Gemini, &script);
        let started = std::time::Instant::now();
        let result = runner
            .run(Participant::Gemini, "hi", &options(300, 20_000))
            .await
            .unwrap();
        assert_eq!(result.outcome, TurnOutcome::IdleSettled);
        assert_eq!(result.clean_text, "Use a bounded queue here.");
        assert!(!result.is_complete());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_hard_deadline_after_content_keeps_answer() {
        // Answer at 0.5s; the 1s idle window would close at 1.5s, after the
        // 1.2s hard deadline
        let script = format!("sleep 0.5; echo '{}'; sleep 30", GEMINI_LINE);
        let runner = script_runner(Participant::Gemini, &script);
        let result = runner
            .run(Participant::Gemini, "hi", &options(1_000, 1_200))
            .await
            .unwrap();
        assert_eq!(result.outcome, TurnOutcome::IdleSettled);
        assert_eq!(result.clean_text, "Use a bounded queue here.");
        assert!(!result.is_complete());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_kill_reaches_background_helpers() {
        // The background sleep inherits stdout; killing only sh would leave
        // the pipe open until the drain grace runs out
        let runner = script_runner(Participant::Codex, "sleep 30 & sleep 30");
        let started = std::time::Instant::now();
        let err = runner
            .run(Participant::Codex, "hi", &options(100, 300))
            .await
            .unwrap_err();
        assert_eq!(err, RunError::HardTimeout(Duration::from_millis(300)));
        assert!(started.elapsed() < DRAIN_GRACE, "took {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn test_silence_before_content_does_not_arm_idle() {
        // Quiet for longer than the idle window, then answers and exits
        let script = format!("sleep 1; echo '{}'", GEMINI_LINE);
        let runner = script_runner(Participant::Gemini, &script);
        let result = runner
            .run(Participant::Gemini, "hi", &options(200, 10_000))
            .await
            .unwrap();
        assert_eq!(result.outcome, TurnOutcome::Exited);
    }

    #[tokio::test]
    async fn test_hard_timeout_kills_silent_process() {
        let runner = script_runner(Participant::Codex, "sleep 30");
        let err = runner
            .run(Participant::Codex, "hi", &options(100, 400))
            .await
            .unwrap_err();
        assert_eq!(err, RunError::HardTimeout(Duration::from_millis(400)));
    }

    #[tokio::test]
    async fn test_nonzero_exit_with_output_is_partial_success() {
        let script = format!("echo '{}'; exit 3", GEMINI_LINE);
        let runner = script_runner(Participant::Gemini, &script);
        let result = runner
            .run(Participant::Gemini, "hi", &options(2_000, 10_000))
            .await
            .unwrap();
        assert_eq!(result.outcome, TurnOutcome::PartialSuccess);
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_nonzero_exit_without_output_fails() {
        let runner = script_runner(Participant::Claude, "echo 'auth expired' >&2; exit 2");
        let err = runner
            .run(Participant::Claude, "hi", &options(2_000, 10_000))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RunError::ExitedWithoutOutput {
                code: Some(2),
                stderr: "auth expired\n".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = ProcessAgentRunner::new(InvocationTable::empty().with(
            Participant::Codex,
            Invocation::new("roundtable-no-such-binary-xyz", &[]),
        ));
        let err = runner
            .run(Participant::Codex, "hi", &options(100, 1_000))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Spawn { participant: Participant::Codex, .. }));
    }

    #[tokio::test]
    async fn test_missing_template_is_spawn_error() {
        let runner = ProcessAgentRunner::new(InvocationTable::empty());
        let err = runner
            .run(Participant::Gemini, "hi", &options(100, 1_000))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_parse_anomaly_dumps_raw_output() {
        let dir = tempfile::tempdir().unwrap();
        // Truncated JSON only: raw output present, no text recoverable
        let runner = script_runner(Participant::Codex, r#"printf '{"type":"item.comp'"#);
        let result = runner
            .run(
                Participant::Codex,
                "hi",
                &options(2_000, 10_000).with_diagnostics_dir(dir.path()),
            )
            .await
            .unwrap();
        assert!(result.is_parse_anomaly());

        let dumps: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(dumps.len(), 1);
        let name = dumps[0].file_name().to_string_lossy().into_owned();
        assert!(name.starts_with("codex-test-"));
    }

    #[tokio::test]
    async fn test_env_and_cwd_applied() {
        let dir = tempfile::tempdir().unwrap();
        let runner = script_runner(Participant::Claude, "echo \"$ROUNDTABLE_TEST_VAR $(pwd)\"");
        let result = runner
            .run(
                Participant::Claude,
                "hi",
                &RunOptions::new(dir.path())
                    .with_env("ROUNDTABLE_TEST_VAR", "marker")
                    .with_hard_timeout(Duration::from_secs(10)),
            )
            .await
            .unwrap();
        assert!(result.clean_text.starts_with("marker "));
        let canonical = dir.path().canonicalize().unwrap();
        assert!(result.clean_text.ends_with(&*canonical.to_string_lossy()));
    }
}
