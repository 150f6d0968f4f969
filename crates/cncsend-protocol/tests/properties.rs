use cncsend_protocol::LineParser;
use proptest::prelude::*;

proptest! {
    // Arbitrary input must never panic the parser and must parse
    // deterministically; unmatched lines are reported as None.
    #[test]
    fn parse_line_never_panics_and_is_deterministic(line in "\\PC{0,120}") {
        let parser = LineParser::new();
        let first = parser.parse_line(&line);
        let second = parser.parse_line(&line);
        prop_assert_eq!(first, second);
    }

    // Settings grammar: whatever whitespace surrounds the value, the
    // parsed value comes back trimmed.
    #[test]
    fn setting_values_are_trimmed(value in "[0-9]{1,4}\\.[0-9]{1,3}", pad in " {0,3}") {
        let parser = LineParser::new();
        let line = format!("$100={}{}(steps/mm)", value, pad);
        match parser.parse_line(&line) {
            Some(cncsend_protocol::ParsedLine::Setting { value: parsed, .. }) => {
                prop_assert_eq!(parsed, value);
            }
            other => prop_assert!(false, "expected setting, got {:?}", other),
        }
    }
}
