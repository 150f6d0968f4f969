//! Line parser registry
//!
//! Dispatches each raw controller line to an ordered, fixed set of
//! recognizer rules and returns the first match as a [`ParsedLine`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decoder;
use crate::rules::{self, LineRule};
use crate::status::StatusReport;

/// One parsed controller response line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParsedLine {
    /// OK acknowledgment
    Ok,
    /// Status report (`<Idle|MPos:...>`)
    Status(StatusReport),
    /// Alarm (`ALARM:9` or grblHAL `ALARM:<text>`)
    Alarm {
        /// Numeric alarm code when the controller reported one
        code: Option<u8>,
        /// Decoded description, or the raw text for textual alarms
        message: String,
    },
    /// Numbered error response (`error:2`)
    Error {
        /// Numeric error code
        code: u8,
        /// Decoded description
        message: String,
    },
    /// Startup banner (`Grbl 1.1h ['$' for help]`)
    Startup {
        /// Firmware name as printed in the banner
        firmware: String,
        /// Firmware version string
        version: String,
    },
    /// G-code parser state report (`[GC:G0 G54 ...]`)
    ParserState {
        /// Modal state text between `GC:` and the closing bracket
        state: String,
    },
    /// Echoed input line (`[echo:...]`)
    Echo {
        /// Echoed text
        message: String,
    },
    /// Feedback message (`[...]` or `[MSG:...]`)
    Feedback {
        /// Message text without brackets or the `MSG:` prefix
        message: String,
    },
    /// Settings report (`$100=250.000(steps/mm)`)
    Setting {
        /// Setting name including the leading `$`
        name: String,
        /// Setting value, trimmed
        value: String,
        /// Inline comment without parentheses, empty when absent
        message: String,
    },
}

impl fmt::Display for ParsedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Status(report) => write!(f, "status:{}", report.state),
            Self::Alarm { code, message } => match code {
                Some(code) => write!(f, "{}", decoder::format_alarm(*code)),
                None => write!(f, "alarm:{}", message),
            },
            Self::Error { code, .. } => write!(f, "{}", decoder::format_error(*code)),
            Self::Startup { firmware, version } => write!(f, "startup:{} {}", firmware, version),
            Self::ParserState { state } => write!(f, "parser_state:{}", state),
            Self::Echo { message } => write!(f, "echo:{}", message),
            Self::Feedback { message } => write!(f, "message:{}", message),
            Self::Setting { name, value, .. } => write!(f, "setting:{}={}", name, value),
        }
    }
}

/// Ordered registry of line recognizer rules
///
/// The rule list is fixed at construction and tried in priority order;
/// the first rule to match wins. Parsing holds no shared mutable state,
/// so one parser can serve independent lines concurrently.
pub struct LineParser {
    rules: Vec<Box<dyn LineRule>>,
}

impl LineParser {
    /// Create a parser with the default GRBL/grblHAL rule set
    pub fn new() -> Self {
        Self::with_rules(rules::default_rules())
    }

    /// Create a parser from an explicit, ordered rule list
    pub fn with_rules(rules: Vec<Box<dyn LineRule>>) -> Self {
        Self { rules }
    }

    /// Parse one raw controller line
    ///
    /// Returns `None` when no rule matches; callers treat that as an
    /// unrecognized line or echo, not as an error. A trailing carriage
    /// return and surrounding whitespace are tolerated.
    pub fn parse_line(&self, line: &str) -> Option<ParsedLine> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        self.rules.iter().find_map(|rule| rule.try_match(line))
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}
