use super::error::DialogueError;
use super::model::Turn;
use super::run_log::RunLog;
use super::speaker::SpeakerCode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static SPEAKER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*speaker\s*(\d+)\s*:(.*)$").expect("speaker line pattern is valid")
});

/// How lines without a speaker label are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserDialect {
    /// Only labelled lines become turns; unlabelled lines are dropped
    Strict,
    /// Unlabelled lines continue the most recently opened turn
    #[default]
    Lenient,
}

impl std::str::FromStr for ParserDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ParserDialect::Strict),
            "lenient" => Ok(ParserDialect::Lenient),
            other => Err(format!("unknown parser dialect: {}", other)),
        }
    }
}

enum OpenTurn {
    None,
    Speaker { code: SpeakerCode, parts: Vec<String> },
    /// A labelled line whose speaker has no code; its continuations go too
    Skipped,
}

pub struct DialogueParser {
    dialect: ParserDialect,
}

impl DialogueParser {
    pub fn new(dialect: ParserDialect) -> Self {
        Self { dialect }
    }

    /// Split a script into ordered speaker turns
    pub fn parse(&self, raw_text: &str, log: &RunLog) -> Result<Vec<Turn>, DialogueError> {
        let mut turns = Vec::new();
        let mut open = OpenTurn::None;

        for (index, line) in raw_text.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some((label, number, rest)) = Self::match_speaker_line(line) {
                Self::close_turn(std::mem::replace(&mut open, OpenTurn::None), &mut turns, log);

                open = match number.and_then(SpeakerCode::from_speaker_number) {
                    Some(code) => OpenTurn::Speaker {
                        code,
                        parts: vec![rest.trim().to_string()],
                    },
                    None => {
                        log.warn(format!(
                            "Line {}: unrecognized speaker label '{}', line skipped",
                            line_number, label
                        ));
                        OpenTurn::Skipped
                    }
                };
                continue;
            }

            match (self.dialect, &mut open) {
                (ParserDialect::Lenient, OpenTurn::Speaker { parts, .. }) => {
                    parts.push(trimmed.to_string());
                }
                (ParserDialect::Lenient, OpenTurn::Skipped) => {
                    log.debug(format!(
                        "Line {}: continuation of a skipped speaker, dropped",
                        line_number
                    ));
                }
                _ => {
                    log.warn(format!(
                        "Line {}: no speaker label, dropped: {}",
                        line_number,
                        preview(trimmed)
                    ));
                }
            }
        }

        Self::close_turn(open, &mut turns, log);

        if turns.is_empty() {
            log.error("No valid turns were parsed from the input text");
            return Err(DialogueError::NoDialogueFound);
        }

        log.info(format!(
            "Parsed {} turns ({:?} dialect)",
            turns.len(),
            self.dialect
        ));
        for (index, turn) in turns.iter().enumerate() {
            log.debug(format!(
                "Turn {}: {} - {}",
                index + 1,
                turn.speaker,
                preview(&turn.text)
            ));
        }

        Ok(turns)
    }

    /// Returns the raw label, its speaker number (if it fits), and the text after the colon
    fn match_speaker_line(line: &str) -> Option<(String, Option<u32>, &str)> {
        let captures = SPEAKER_LINE.captures(line)?;
        let digits = captures.get(1)?.as_str();
        let rest = captures.get(2)?.as_str();
        Some((format!("Speaker {}", digits), digits.parse().ok(), rest))
    }

    fn close_turn(open: OpenTurn, turns: &mut Vec<Turn>, log: &RunLog) {
        if let OpenTurn::Speaker { code, parts } = open {
            let text = parts
                .iter()
                .map(|part| part.as_str())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            if text.is_empty() {
                log.warn(format!("Discarding empty utterance for speaker {}", code));
            } else {
                turns.push(Turn::new(code, text));
            }
        }
    }
}

fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 80;
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(PREVIEW_CHARS).collect::<String>())
    }
}
