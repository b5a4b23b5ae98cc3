//! Line-oriented input
//!
//! Reads `command arg arg...` lines, e.g. `cue Q1 {"x": 1}`. Each argument
//! is parsed as JSON when it is valid JSON and kept as a string otherwise.
//! Blank lines and lines starting with `#` are skipped.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{PluginError, PluginResult};
use crate::plugin::{Command, CommandSender, Input, Plugin};

/// Parse one input line into a command.
pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (name, rest) = match line.find(char::is_whitespace) {
        Some(at) => line.split_at(at),
        None => (line, ""),
    };

    Some(Command::new(name, parse_args(rest)))
}

fn parse_args(mut rest: &str) -> Vec<Value> {
    let mut args = Vec::new();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return args;
        }

        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if ends_token(rest, stream.byte_offset()) => {
                args.push(value);
                rest = &rest[stream.byte_offset()..];
            }
            _ => {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                args.push(Value::String(rest[..end].to_string()));
                rest = &rest[end..];
            }
        }
    }
}

/// A JSON value only counts when it is not glued to the next word,
/// so `1abc` stays a string.
fn ends_token(rest: &str, offset: usize) -> bool {
    rest[offset..]
        .chars()
        .next()
        .map_or(true, char::is_whitespace)
}

struct Reader {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct LineInput<R> {
    name: String,
    lines: Arc<Mutex<Lines<R>>>,
    sender: StdMutex<Option<CommandSender>>,
    reader: StdMutex<Option<Reader>>,
}

impl LineInput<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new("stdin", BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineInput<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            lines: Arc::new(Mutex::new(reader.lines())),
            sender: StdMutex::new(None),
            reader: StdMutex::new(None),
        }
    }

    /// Whether the reader task is running.
    pub fn is_reading(&self) -> bool {
        self.reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|reader| !reader.handle.is_finished())
    }

    fn halt(&self) {
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reader) = reader {
            reader.token.cancel();
        }
    }
}

#[async_trait]
impl<R> Plugin for LineInput<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> PluginResult<()> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| PluginError::failed("input is not attached"))?;

        let mut slot = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|reader| !reader.handle.is_finished()) {
            return Ok(());
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let lines = Arc::clone(&self.lines);
        let name = self.name.clone();

        let handle = tokio::spawn(async move {
            let mut lines = lines.lock().await;
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            let Some(command) = parse_line(&line) else {
                                continue;
                            };
                            if sender.send_command(command).is_err() {
                                break;
                            }
                        }
                        Ok(None) => {
                            tracing::info!(input = %name, "Input reached end of stream");
                            break;
                        }
                        Err(error) => {
                            tracing::warn!(input = %name, error = %error, "Input read failed");
                            break;
                        }
                    },
                }
            }
        });

        *slot = Some(Reader { token, handle });
        Ok(())
    }

    async fn stop(&self) -> PluginResult<()> {
        self.halt();
        Ok(())
    }

    async fn destroy(&self) -> PluginResult<()> {
        self.halt();
        Ok(())
    }
}

impl<R> Input for LineInput<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn bind(&self, commands: CommandSender) {
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = Some(commands);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    #[test]
    fn test_parse_line_with_json_args() {
        assert_eq!(
            parse_line(r#"cue Q1 {"x": 1}"#),
            Some(Command::new("cue", vec![json!("Q1"), json!({ "x": 1 })]))
        );
        assert_eq!(
            parse_line("interact 42 uid-1 true"),
            Some(Command::new("interact", vec![json!(42), json!("uid-1"), json!(true)]))
        );
        assert_eq!(parse_line("  start  "), Some(Command::new("start", vec![])));
    }

    #[test]
    fn test_parse_line_keeps_glued_words_as_strings() {
        assert_eq!(
            parse_line("cue 1abc"),
            Some(Command::new("cue", vec![json!("1abc")]))
        );
    }

    #[test]
    fn test_parse_line_skips_blank_and_comments() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("# cue Q1"), None);
    }

    #[tokio::test]
    async fn test_reads_lines_into_commands() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let input = LineInput::new("script", &b"start\n\ncue Q1\n"[..]);
        input.bind(CommandSender::new(tx));
        input.start().await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Command::new("start", vec![]));
        assert_eq!(rx.recv().await.unwrap(), Command::new("cue", vec![json!("Q1")]));
    }

    #[tokio::test]
    async fn test_start_requires_binding() {
        let input = LineInput::new("script", &b"start\n"[..]);
        assert!(input.start().await.is_err());
        assert!(!input.is_reading());
    }
}
