use crate::error::RerollError;
use std::io::Write;

/// Source of operator answers. The workflows only ever talk to this trait,
/// so tests can drive them with a scripted sequence of responses instead of
/// a live terminal.
pub trait Prompter {
    /// Ask a question and return the operator's answer with surrounding
    /// whitespace trimmed.
    fn ask(&mut self, question: &str) -> Result<String, RerollError>;

    /// Yes/no question. An empty answer counts as yes.
    fn confirm(&mut self, question: &str) -> Result<bool, RerollError> {
        Ok(is_affirmative(&self.ask(question)?))
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "yes" | "y" | "ye" | "")
}

/// Reads answers from the terminal.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, question: &str) -> Result<String, RerollError> {
        print!("{} ", question);
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }
}

/// Replays a fixed sequence of answers. Running out of answers is an error
/// so a test that under-scripts a workflow fails loudly instead of hanging.
#[cfg(any(test, feature = "test-support"))]
pub struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
    pub transcript: Vec<String>,
}

#[cfg(any(test, feature = "test-support"))]
impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompter {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str) -> Result<String, RerollError> {
        self.transcript.push(question.to_string());
        self.answers.pop_front().ok_or_else(|| {
            RerollError::Generic(format!("no scripted answer left for: {}", question))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_answers() {
        for answer in ["yes", "y", "ye", "", "YES", "Y"] {
            assert!(is_affirmative(answer), "{:?} should be affirmative", answer);
        }
        for answer in ["no", "n", "nope", "si", "yess"] {
            assert!(!is_affirmative(answer), "{:?} should not be affirmative", answer);
        }
    }

    #[test]
    fn test_scripted_prompter_replays_in_order() {
        let mut prompter = ScriptedPrompter::new(["first", "second"]);
        assert_eq!(prompter.ask("q1?").unwrap(), "first");
        assert_eq!(prompter.ask("q2?").unwrap(), "second");
        assert!(prompter.ask("q3?").is_err());
        assert_eq!(prompter.transcript, vec!["q1?", "q2?", "q3?"]);
    }

    #[test]
    fn test_scripted_confirm() {
        let mut prompter = ScriptedPrompter::new(["", "n"]);
        assert!(prompter.confirm("go on?").unwrap());
        assert!(!prompter.confirm("really?").unwrap());
    }
}
