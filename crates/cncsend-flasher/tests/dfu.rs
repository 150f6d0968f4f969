use cncsend_flasher::{DeviceStatus, DfuState, DfuStatus, FlashError};

#[test]
fn test_decode_getstatus_payload() {
    // bStatus=OK, bwPollTimeout=1000ms (LE), bState=dfuDNLOAD-IDLE, iString
    let raw = [0x00, 0xe8, 0x03, 0x00, 0x05, 0x00];
    let status = DeviceStatus::from_bytes(&raw).unwrap();
    assert_eq!(status.status, DfuStatus::Ok);
    assert_eq!(status.poll_timeout, 1000);
    assert_eq!(status.state, DfuState::DnloadIdle);
    assert!(status.is_ok());
}

#[test]
fn test_decode_error_status() {
    let raw = [0x07, 0x00, 0x00, 0x00, 0x0a, 0x00];
    let status = DeviceStatus::from_bytes(&raw).unwrap();
    assert_eq!(status.status, DfuStatus::ErrVerify);
    assert_eq!(status.state, DfuState::Error);
    assert!(!status.is_ok());
}

#[test]
fn test_short_getstatus_payload_is_rejected() {
    let err = DeviceStatus::from_bytes(&[0x00, 0x00, 0x00]).unwrap_err();
    assert!(matches!(err, FlashError::ShortStatus { got: 3 }));
}

#[test]
fn test_unknown_state_code_is_rejected() {
    let raw = [0x00, 0x00, 0x00, 0x00, 0x20, 0x00];
    let err = DeviceStatus::from_bytes(&raw).unwrap_err();
    assert!(matches!(err, FlashError::UnknownState(0x20)));
}

#[test]
fn test_unknown_status_code_is_rejected() {
    let raw = [0x42, 0x00, 0x00, 0x00, 0x02, 0x00];
    let err = DeviceStatus::from_bytes(&raw).unwrap_err();
    assert!(matches!(err, FlashError::UnknownStatus(0x42)));
}

#[test]
fn test_state_codes_round_trip() {
    for code in 0..=10u8 {
        let state = DfuState::from_code(code).unwrap();
        assert_eq!(state.code(), code);
    }
    assert!(DfuState::from_code(11).is_err());
}

#[test]
fn test_state_display_uses_spec_names() {
    assert_eq!(DfuState::DnBusy.to_string(), "dfuDNBUSY");
    assert_eq!(DfuState::Manifest.to_string(), "dfuMANIFEST");
    assert_eq!(DfuStatus::ErrVerify.to_string(), "errVERIFY");
}
