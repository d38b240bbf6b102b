//! Property tests for the range table and the response decoder.

use maestro_meter::protocol::codec::decode;
use maestro_meter::{Command, MeterError, RangeLevel};
use proptest::prelude::*;

proptest! {
    #[test]
    fn wire_code_round_trips(code in 0i64..=41) {
        let level = RangeLevel::from_code(code).unwrap();
        let wire = level.to_wire_code();
        prop_assert_eq!(wire.len(), 2);
        prop_assert_eq!(RangeLevel::from_wire(&wire).unwrap().code() as i64, code);
    }

    #[test]
    fn codes_below_zero_are_rejected(code in i64::MIN..0) {
        prop_assert!(matches!(RangeLevel::from_code(code), Err(MeterError::Value(_))));
    }

    #[test]
    fn codes_above_41_are_rejected(code in 42i64..) {
        prop_assert!(matches!(RangeLevel::from_code(code), Err(MeterError::Value(_))));
    }

    #[test]
    fn set_range_payload_is_the_wire_code(code in 0i64..=41) {
        let level = RangeLevel::from_code(code).unwrap();
        let command = Command::set_range(level);
        prop_assert_eq!(command.payload_text(), Some(format!("{code:02}")));
    }

    #[test]
    fn wavelength_payload_is_five_digits(nm in 0u32..=9_999) {
        let command = Command::set_wavelength(nm).unwrap();
        let payload = command.payload_text().unwrap();
        prop_assert_eq!(payload.len(), 5);
        prop_assert_eq!(payload.parse::<u32>().unwrap(), nm);
    }

    #[test]
    fn decode_returns_text_after_first_colon(key in "[A-Z]{1,4}", value in "[0-9A-Za-z.:]{1,12}") {
        let raw = format!("{key}:{value}\r\n");
        prop_assert_eq!(decode(raw.as_bytes()).unwrap(), value);
    }

    #[test]
    fn decode_passes_bare_tokens_through(token in "[0-9A-Za-z.+-]{1,16}") {
        let raw = format!(" {token}\r\n");
        prop_assert_eq!(decode(raw.as_bytes()).unwrap(), token);
    }
}
