//! Interactive confirmation prompts

use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::UserInputError;

/// Whether a human can answer questions on stdin
pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Ask a yes/no question on the terminal
///
/// An empty answer selects `default`. Fails with
/// [`UserInputError::NonInteractive`] when stdin is not a terminal.
pub fn confirm(question: &str, default: bool) -> Result<bool, UserInputError> {
    if !is_interactive() {
        return Err(UserInputError::NonInteractive {
            question: question.to_string(),
        });
    }
    ask(question, default, &mut io::stdin().lock(), &mut io::stdout()).map_err(|_| {
        UserInputError::NonInteractive {
            question: question.to_string(),
        }
    })
}

/// Write `question` to `output` and read one answer line from `input`
pub fn ask(
    question: &str,
    default: bool,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<bool> {
    let hint = if default { "[Y/n]" } else { "y/[N]" };
    write!(output, "{question} {hint} ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(parse_answer(&answer, default))
}

/// Interpret a typed answer
pub fn parse_answer(answer: &str, default: bool) -> bool {
    match answer.trim().to_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}
