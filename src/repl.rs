//! Stdin REPL shared by the interactive entry points.

use std::future::Future;

use tokio::io::{AsyncBufReadExt, BufReader};

/// Words that end the interactive session.
const QUIT_WORDS: &[&str] = &["quit", "exit", "bye", "q", "goodbye"];

/// Check whether a line asks to leave the REPL.
pub fn is_quit(line: &str) -> bool {
    QUIT_WORDS.contains(&line.trim().to_ascii_lowercase().as_str())
}

/// Read lines from stdin until a quit word or EOF, handing each non-empty
/// line to the handler. Prompts go to stderr so stdout stays clean for
/// responses.
pub async fn run<F, Fut>(mut handler: F) -> std::io::Result<()>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ()>,
{
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        eprint!("You: ");
        match lines.next_line().await? {
            Some(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if is_quit(&line) {
                    eprintln!("Goodbye!");
                    break;
                }
                handler(line).await;
            }
            None => break, // EOF
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_words_are_recognized() {
        assert!(is_quit("quit"));
        assert!(is_quit("  EXIT "));
        assert!(is_quit("q"));
        assert!(is_quit("Goodbye"));
        assert!(!is_quit("quite interesting"));
        assert!(!is_quit("what is 2+2"));
    }
}
