//! GRBL 1.1 / grblHAL status report parsing
//!
//! Extracts the fields of a `<State|MPos:...|FS:...|WCO:...>` report.
//! GRBL can be configured (via `$10`) to report either `MPos` or `WPos`;
//! when only one is present alongside `WCO` the other is derived from
//! `WPos = MPos - WCO`.

use serde::{Deserialize, Serialize};

/// Axis position with optional rotary axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
    /// A axis (4th axis), when reported
    pub a: Option<f64>,
    /// B axis (5th axis), when reported
    pub b: Option<f64>,
    /// C axis (6th axis), when reported
    pub c: Option<f64>,
}

impl Position {
    /// Parse a comma-separated coordinate list
    pub fn parse(text: &str) -> Option<Self> {
        let coords: Vec<f64> = text
            .split(',')
            .map(|s| s.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        if coords.len() < 3 {
            return None;
        }
        Some(Self {
            x: coords[0],
            y: coords[1],
            z: coords[2],
            a: coords.get(3).copied(),
            b: coords.get(4).copied(),
            c: coords.get(5).copied(),
        })
    }

    fn offset_by(self, other: Position, sign: f64) -> Position {
        let opt = |lhs: Option<f64>, rhs: Option<f64>| match (lhs, rhs) {
            (Some(l), Some(r)) => Some(l + sign * r),
            _ => None,
        };
        Position {
            x: self.x + sign * other.x,
            y: self.y + sign * other.y,
            z: self.z + sign * other.z,
            a: opt(self.a, other.a),
            b: opt(self.b, other.b),
            c: opt(self.c, other.c),
        }
    }
}

/// Planner/serial buffer fill: `Bf:blocks,bytes`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferFill {
    /// Free planner blocks
    pub blocks: u16,
    /// Free serial RX bytes
    pub bytes: u16,
}

/// Override percentages: `Ov:feed,rapid,spindle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    /// Feed override percentage
    pub feed: u16,
    /// Rapid override percentage
    pub rapid: u16,
    /// Spindle override percentage
    pub spindle: u16,
}

/// Fully parsed status report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Machine state (Idle, Run, Hold, Jog, Alarm, Door, Check, Home, Sleep)
    pub state: String,
    /// Substate qualifier, e.g. the `1` in `Hold:1`
    pub substate: Option<u8>,
    /// Machine position
    pub mpos: Option<Position>,
    /// Work position
    pub wpos: Option<Position>,
    /// Work coordinate offset
    pub wco: Option<Position>,
    /// Buffer fill
    pub buffer: Option<BufferFill>,
    /// Feed rate (units/min)
    pub feed_rate: Option<f64>,
    /// Spindle speed (RPM)
    pub spindle_speed: Option<u32>,
    /// Override state
    pub overrides: Option<Overrides>,
    /// Triggered input pins, e.g. `XYZ` from `Pn:XYZ`
    pub pins: Option<String>,
}

/// Parse the inside of a status report (angle brackets already stripped)
pub fn parse_report(inner: &str) -> Option<StatusReport> {
    let mut fields = inner.split('|');

    let state_token = fields.next()?.trim();
    if state_token.is_empty() {
        return None;
    }
    let (state, substate) = match state_token.split_once(':') {
        Some((state, sub)) => (state.to_string(), sub.parse::<u8>().ok()),
        None => (state_token.to_string(), None),
    };

    let mut report = StatusReport {
        state,
        substate,
        mpos: None,
        wpos: None,
        wco: None,
        buffer: None,
        feed_rate: None,
        spindle_speed: None,
        overrides: None,
        pins: None,
    };

    for field in fields {
        let field = field.trim();
        if let Some(rest) = field.strip_prefix("MPos:") {
            report.mpos = Position::parse(rest);
        } else if let Some(rest) = field.strip_prefix("WPos:") {
            report.wpos = Position::parse(rest);
        } else if let Some(rest) = field.strip_prefix("WCO:") {
            report.wco = Position::parse(rest);
        } else if let Some(rest) = field.strip_prefix("Bf:") {
            report.buffer = parse_buffer(rest);
        } else if let Some(rest) = field.strip_prefix("FS:") {
            if let Some((feed, spindle)) = parse_feed_spindle(rest) {
                report.feed_rate = Some(feed);
                report.spindle_speed = Some(spindle);
            }
        } else if let Some(rest) = field.strip_prefix("F:") {
            report.feed_rate = rest.trim().parse::<f64>().ok();
        } else if let Some(rest) = field.strip_prefix("Ov:") {
            report.overrides = parse_overrides(rest);
        } else if let Some(rest) = field.strip_prefix("Pn:") {
            report.pins = Some(rest.to_string());
        }
        // Unrecognized fields (A:, Ln:, ...) are ignored, not rejected.
    }

    if report.wpos.is_none() {
        if let (Some(mpos), Some(wco)) = (report.mpos, report.wco) {
            report.wpos = Some(mpos.offset_by(wco, -1.0));
        }
    }
    if report.mpos.is_none() {
        if let (Some(wpos), Some(wco)) = (report.wpos, report.wco) {
            report.mpos = Some(wpos.offset_by(wco, 1.0));
        }
    }

    Some(report)
}

fn parse_buffer(text: &str) -> Option<BufferFill> {
    let (blocks, bytes) = text.split_once(',')?;
    Some(BufferFill {
        blocks: blocks.trim().parse().ok()?,
        bytes: bytes.trim().parse().ok()?,
    })
}

fn parse_feed_spindle(text: &str) -> Option<(f64, u32)> {
    let (feed, spindle) = text.split_once(',')?;
    Some((feed.trim().parse().ok()?, spindle.trim().parse().ok()?))
}

fn parse_overrides(text: &str) -> Option<Overrides> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() < 3 {
        return None;
    }
    Some(Overrides {
        feed: parts[0].trim().parse().ok()?,
        rapid: parts[1].trim().parse().ok()?,
        spindle: parts[2].trim().parse().ok()?,
    })
}
