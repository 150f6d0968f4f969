use cncsend_protocol::{LineParser, ParsedLine};

#[test]
fn test_parse_ok() {
    let parser = LineParser::new();
    assert_eq!(parser.parse_line("ok"), Some(ParsedLine::Ok));
}

#[test]
fn test_parse_feedback() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("[Caution: Unlocked]"),
        Some(ParsedLine::Feedback {
            message: "Caution: Unlocked".to_string()
        })
    );
}

#[test]
fn test_parse_feedback_with_msg_prefix() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("[MSG:Pgm End]"),
        Some(ParsedLine::Feedback {
            message: "Pgm End".to_string()
        })
    );
}

#[test]
fn test_parse_setting_with_comment() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("$100=250.000(steps/mm)"),
        Some(ParsedLine::Setting {
            name: "$100".to_string(),
            value: "250.000".to_string(),
            message: "steps/mm".to_string()
        })
    );
}

#[test]
fn test_parse_setting_without_comment() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("$13=0"),
        Some(ParsedLine::Setting {
            name: "$13".to_string(),
            value: "0".to_string(),
            message: String::new()
        })
    );
}

#[test]
fn test_parse_setting_trims_value_before_comment() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("$110=1000.000 (x max rate)"),
        Some(ParsedLine::Setting {
            name: "$110".to_string(),
            value: "1000.000".to_string(),
            message: "x max rate".to_string()
        })
    );
}

#[test]
fn test_parse_named_grblhal_setting() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("$N0=G20"),
        Some(ParsedLine::Setting {
            name: "$N0".to_string(),
            value: "G20".to_string(),
            message: String::new()
        })
    );
}

#[test]
fn test_parse_unrecognized_line() {
    let parser = LineParser::new();
    assert_eq!(parser.parse_line("garbage text"), None);
}

#[test]
fn test_parse_empty_line() {
    let parser = LineParser::new();
    assert_eq!(parser.parse_line(""), None);
    assert_eq!(parser.parse_line("   "), None);
}

#[test]
fn test_parse_tolerates_trailing_carriage_return() {
    let parser = LineParser::new();
    assert_eq!(parser.parse_line("ok\r"), Some(ParsedLine::Ok));
}

#[test]
fn test_parse_numeric_error() {
    let parser = LineParser::new();
    match parser.parse_line("error:2") {
        Some(ParsedLine::Error { code, message }) => {
            assert_eq!(code, 2);
            assert!(message.contains("Numeric value format"));
        }
        other => panic!("expected error, got {:?}", other),
    }
}

#[test]
fn test_parse_error_with_garbage_code_is_no_match() {
    let parser = LineParser::new();
    assert_eq!(parser.parse_line("error:notanumber"), None);
}

#[test]
fn test_parse_numeric_alarm() {
    let parser = LineParser::new();
    match parser.parse_line("ALARM:9") {
        Some(ParsedLine::Alarm { code, message }) => {
            assert_eq!(code, Some(9));
            assert!(message.contains("Homing fail"));
        }
        other => panic!("expected alarm, got {:?}", other),
    }
}

#[test]
fn test_parse_textual_grblhal_alarm() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("ALARM:Hard limit"),
        Some(ParsedLine::Alarm {
            code: None,
            message: "Hard limit".to_string()
        })
    );
}

#[test]
fn test_bare_alarm_prefix_is_no_match() {
    let parser = LineParser::new();
    assert_eq!(parser.parse_line("ALARM:"), None);
}

#[test]
fn test_parse_grbl_startup_banner() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("Grbl 1.1h ['$' for help]"),
        Some(ParsedLine::Startup {
            firmware: "Grbl".to_string(),
            version: "1.1h".to_string()
        })
    );
}

#[test]
fn test_parse_grblhal_startup_banner() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("GrblHAL 1.1f ['$' or '$HELP' for help]"),
        Some(ParsedLine::Startup {
            firmware: "GrblHAL".to_string(),
            version: "1.1f".to_string()
        })
    );
}

#[test]
fn test_parser_state_wins_over_feedback() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("[GC:G0 G54 G17 G21 G90 G94 M5 M9 T0 F0 S0]"),
        Some(ParsedLine::ParserState {
            state: "G0 G54 G17 G21 G90 G94 M5 M9 T0 F0 S0".to_string()
        })
    );
}

#[test]
fn test_echo_wins_over_feedback() {
    let parser = LineParser::new();
    assert_eq!(
        parser.parse_line("[echo:G1X10]"),
        Some(ParsedLine::Echo {
            message: "G1X10".to_string()
        })
    );
}

#[test]
fn test_parse_status_report() {
    let parser = LineParser::new();
    match parser.parse_line("<Idle|MPos:3.000,2.000,0.000|FS:0,0>") {
        Some(ParsedLine::Status(report)) => {
            assert_eq!(report.state, "Idle");
            assert_eq!(report.substate, None);
            let mpos = report.mpos.expect("machine position");
            assert_eq!(mpos.x, 3.0);
            assert_eq!(mpos.y, 2.0);
            assert_eq!(mpos.z, 0.0);
            assert_eq!(report.feed_rate, Some(0.0));
            assert_eq!(report.spindle_speed, Some(0));
        }
        other => panic!("expected status, got {:?}", other),
    }
}

#[test]
fn test_status_report_derives_wpos_from_wco() {
    let parser = LineParser::new();
    match parser.parse_line("<Run|MPos:10.000,5.000,-2.000|WCO:10.000,0.000,-2.000>") {
        Some(ParsedLine::Status(report)) => {
            let wpos = report.wpos.expect("derived work position");
            assert_eq!(wpos.x, 0.0);
            assert_eq!(wpos.y, 5.0);
            assert_eq!(wpos.z, 0.0);
        }
        other => panic!("expected status, got {:?}", other),
    }
}

#[test]
fn test_status_report_with_substate_buffer_and_overrides() {
    let parser = LineParser::new();
    match parser.parse_line("<Hold:1|MPos:0.000,0.000,0.000|Bf:15,128|Ov:100,100,100|Pn:XZ>") {
        Some(ParsedLine::Status(report)) => {
            assert_eq!(report.state, "Hold");
            assert_eq!(report.substate, Some(1));
            let buffer = report.buffer.expect("buffer fill");
            assert_eq!(buffer.blocks, 15);
            assert_eq!(buffer.bytes, 128);
            let overrides = report.overrides.expect("overrides");
            assert_eq!(overrides.feed, 100);
            assert_eq!(report.pins.as_deref(), Some("XZ"));
        }
        other => panic!("expected status, got {:?}", other),
    }
}

#[test]
fn test_status_report_with_rotary_axis() {
    let parser = LineParser::new();
    match parser.parse_line("<Jog|MPos:1.000,2.000,3.000,45.000|FS:500,0>") {
        Some(ParsedLine::Status(report)) => {
            let mpos = report.mpos.expect("machine position");
            assert_eq!(mpos.a, Some(45.0));
        }
        other => panic!("expected status, got {:?}", other),
    }
}

#[test]
fn test_malformed_status_is_no_match() {
    let parser = LineParser::new();
    assert_eq!(parser.parse_line("<>"), None);
}

#[test]
fn test_at_most_one_result_and_first_match_priority() {
    // Every representative line resolves to exactly one variant, and
    // repeated parsing is deterministic.
    let parser = LineParser::new();
    let lines = [
        "ok",
        "<Idle|MPos:0.000,0.000,0.000>",
        "ALARM:1",
        "error:20",
        "Grbl 1.1h ['$' for help]",
        "[GC:G0 G54]",
        "[echo:G0X1]",
        "[MSG:Check Door]",
        "$100=250.000(steps/mm)",
    ];
    for line in lines {
        let first = parser.parse_line(line);
        assert!(first.is_some(), "no match for {:?}", line);
        assert_eq!(first, parser.parse_line(line));
    }
}

#[test]
fn test_parsed_line_serde_round_trip() {
    let parser = LineParser::new();
    let parsed = parser.parse_line("$100=250.000(steps/mm)").unwrap();
    let json = serde_json::to_string(&parsed).unwrap();
    let back: ParsedLine = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, back);
}

#[test]
fn test_display_formats() {
    let parser = LineParser::new();
    assert_eq!(parser.parse_line("ok").unwrap().to_string(), "ok");
    assert_eq!(
        parser.parse_line("$100=250.000").unwrap().to_string(),
        "setting:$100=250.000"
    );
    assert!(parser
        .parse_line("error:2")
        .unwrap()
        .to_string()
        .starts_with("error:2"));
}
