use std::io::{self, BufRead, Write};

use crate::core::Operator;

const RETRY_PROMPT: &str = "Please answer YES/NO";

/// Interactive operator on stdin/stdout.
#[derive(Debug, Clone, Default)]
pub struct StdinOperator;

impl StdinOperator {
    pub fn new() -> Self {
        Self
    }
}

impl Operator for StdinOperator {
    fn confirm(&self, question: &str) -> bool {
        let stdin = io::stdin();
        let stdout = io::stdout();
        confirm_with(&mut stdin.lock(), &mut stdout.lock(), question)
    }

    fn ask(&self, question: &str) -> Option<String> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        ask_with(&mut stdin.lock(), &mut stdout.lock(), question)
    }
}

/// `Some(true)` for yes/д/да, `Some(false)` for no/н/нет, `None` otherwise.
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" | "д" | "да" => Some(true),
        "n" | "no" | "н" | "нет" => Some(false),
        _ => None,
    }
}

/// 重複詢問直到得到有效答案；輸入關閉時視為拒絕
pub fn confirm_with<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> bool {
    loop {
        let Some(answer) = ask_with(input, output, question) else {
            return false;
        };
        if let Some(decision) = parse_yes_no(&answer) {
            return decision;
        }
        let _ = writeln!(output, "{}", RETRY_PROMPT);
    }
}

pub fn ask_with<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Option<String> {
    let _ = write!(output, "{}", question);
    let _ = output.flush();

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        Err(e) => {
            tracing::warn!("⚠️ Failed to read answer: {}", e);
            None
        }
    }
}
