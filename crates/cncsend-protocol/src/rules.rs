//! Recognizer rules for GRBL/grblHAL response grammars
//!
//! Each rule attempts to match exactly one response grammar. A rule that
//! only partially matches (a required capture is missing or a numeric
//! field does not parse) reports no match rather than a coerced result.

use regex::Regex;
use std::sync::OnceLock;

use crate::decoder;
use crate::parser::ParsedLine;
use crate::status;

/// One line recognizer
///
/// Implementations are pure: `try_match` has no side effects and no
/// state, so rules can be shared freely between threads.
pub trait LineRule: Send + Sync {
    /// Attempt to match `line`, which has already been trimmed
    fn try_match(&self, line: &str) -> Option<ParsedLine>;
}

/// Default rule set in priority order
///
/// The bracketed grammars (`[GC:...]`, `[echo:...]`) are registered ahead
/// of the generic feedback rule so the feedback grammar cannot shadow
/// them. With this ordering each line matches at most one rule.
pub fn default_rules() -> Vec<Box<dyn LineRule>> {
    vec![
        Box::new(OkRule),
        Box::new(StatusRule),
        Box::new(AlarmRule),
        Box::new(ErrorRule),
        Box::new(StartupRule),
        Box::new(ParserStateRule),
        Box::new(EchoRule),
        Box::new(FeedbackRule),
        Box::new(SettingRule),
    ]
}

/// `ok` acknowledgment
pub struct OkRule;

impl LineRule for OkRule {
    fn try_match(&self, line: &str) -> Option<ParsedLine> {
        (line == "ok").then_some(ParsedLine::Ok)
    }
}

/// Status report: `<State|MPos:...|FS:...>`
pub struct StatusRule;

impl LineRule for StatusRule {
    fn try_match(&self, line: &str) -> Option<ParsedLine> {
        if !(line.starts_with('<') && line.ends_with('>')) {
            return None;
        }
        status::parse_report(&line[1..line.len() - 1]).map(ParsedLine::Status)
    }
}

/// Alarm: `ALARM:9` (numeric) or `ALARM:<text>` (grblHAL)
pub struct AlarmRule;

impl LineRule for AlarmRule {
    fn try_match(&self, line: &str) -> Option<ParsedLine> {
        let rest = line.strip_prefix("ALARM:")?.trim();
        if rest.is_empty() {
            return None;
        }
        match rest.parse::<u8>() {
            Ok(code) => Some(ParsedLine::Alarm {
                code: Some(code),
                message: decoder::decode_alarm(code).to_string(),
            }),
            Err(_) => Some(ParsedLine::Alarm {
                code: None,
                message: rest.to_string(),
            }),
        }
    }
}

/// Numbered error: `error:2`
pub struct ErrorRule;

impl LineRule for ErrorRule {
    fn try_match(&self, line: &str) -> Option<ParsedLine> {
        let rest = line.strip_prefix("error:")?.trim();
        let code = rest.parse::<u8>().ok()?;
        Some(ParsedLine::Error {
            code,
            message: decoder::decode_error(code).to_string(),
        })
    }
}

/// Startup banner: `Grbl 1.1h ['$' for help]`
pub struct StartupRule;

impl LineRule for StartupRule {
    fn try_match(&self, line: &str) -> Option<ParsedLine> {
        static BANNER: OnceLock<Regex> = OnceLock::new();
        let re = BANNER.get_or_init(|| {
            // GrblHAL alternations first so `Grbl` cannot match their prefix
            Regex::new(r"^(GrblHAL|grblHAL|Grbl)\s+(\d+\.\d+[A-Za-z0-9.]*)")
                .expect("invalid regex pattern")
        });
        let captures = re.captures(line)?;
        Some(ParsedLine::Startup {
            firmware: captures.get(1)?.as_str().to_string(),
            version: captures.get(2)?.as_str().to_string(),
        })
    }
}

/// G-code parser state: `[GC:G0 G54 G17 ...]`
pub struct ParserStateRule;

impl LineRule for ParserStateRule {
    fn try_match(&self, line: &str) -> Option<ParsedLine> {
        let inner = line.strip_prefix("[GC:")?.strip_suffix(']')?;
        if inner.is_empty() {
            return None;
        }
        Some(ParsedLine::ParserState {
            state: inner.to_string(),
        })
    }
}

/// Echoed input: `[echo:...]`
pub struct EchoRule;

impl LineRule for EchoRule {
    fn try_match(&self, line: &str) -> Option<ParsedLine> {
        let inner = line.strip_prefix("[echo:")?.strip_suffix(']')?;
        Some(ParsedLine::Echo {
            message: inner.to_string(),
        })
    }
}

/// Feedback message: `[...]` (Grbl v0.9) or `[MSG:...]` (Grbl v1.1)
pub struct FeedbackRule;

impl LineRule for FeedbackRule {
    fn try_match(&self, line: &str) -> Option<ParsedLine> {
        static FEEDBACK: OnceLock<Regex> = OnceLock::new();
        let re = FEEDBACK.get_or_init(|| {
            Regex::new(r"^\[(?:MSG:)?(.+)\]$").expect("invalid regex pattern")
        });
        let captures = re.captures(line)?;
        Some(ParsedLine::Feedback {
            message: captures.get(1)?.as_str().to_string(),
        })
    }
}

/// Settings report: `$100=250.000(steps/mm)`
///
/// The value is trimmed because a space may precede the comment
/// parenthesis; the comment itself is optional.
pub struct SettingRule;

impl LineRule for SettingRule {
    fn try_match(&self, line: &str) -> Option<ParsedLine> {
        static SETTING: OnceLock<Regex> = OnceLock::new();
        let re = SETTING.get_or_init(|| {
            Regex::new(r"^(\$[^=]+)=([^(]*)(\(.*\))?").expect("invalid regex pattern")
        });
        let captures = re.captures(line)?;
        let name = captures.get(1)?.as_str().to_string();
        let value = captures.get(2)?.as_str().trim().to_string();
        let message = captures
            .get(3)
            .map(|m| {
                m.as_str()
                    .trim_start_matches('(')
                    .trim_end_matches(')')
                    .to_string()
            })
            .unwrap_or_default();
        Some(ParsedLine::Setting {
            name,
            value,
            message,
        })
    }
}
