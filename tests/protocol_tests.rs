use botswarm::domains::radio::protocol::{checksum, BUFFER_END, STOP_ALL_FRAME};
use botswarm::domains::radio::{CommandKind, CommandProtocol, ProtocolError};

#[test]
fn motor_set_frame_matches_the_firmware_contract() {
    let protocol = CommandProtocol::new(0);
    let frame = protocol
        .generate(5, CommandKind::MotorSet, &[120, -120])
        .unwrap();

    // PP PP ID TT
    assert_eq!(&frame[..8], "00000503");
    // LL: "78,-78" is 6 characters
    assert_eq!(&frame[8..10], "06");
    assert_eq!(&frame[10..16], "78,-78");
    // CC over everything from ID onward
    let expected = checksum(&frame[..frame.len() - 2]).unwrap();
    assert_eq!(frame[frame.len() - 2..], format!("{:02X}", expected));
    assert_eq!(frame, "000005030678,-7867");
}

#[test]
fn checksum_is_reproducible() {
    let protocol = CommandProtocol::new(0);
    for (id, kind, data) in [
        (1, CommandKind::End, vec![0]),
        (2, CommandKind::Drive, vec![250]),
        (3, CommandKind::Turn, vec![-45, 100]),
        (254, CommandKind::MotorSet, vec![200, -200]),
    ] {
        let frame = protocol.generate(id, kind, &data).unwrap();
        let body = &frame[..frame.len() - 2];
        let recomputed = format!("{:02X}", checksum(body).unwrap());
        assert_eq!(&frame[frame.len() - 2..], recomputed, "frame {frame}");
    }
}

#[test]
fn corrupting_any_payload_character_breaks_the_checksum() {
    let protocol = CommandProtocol::new(0);
    let frame = protocol
        .generate(5, CommandKind::MotorSet, &[120, -120])
        .unwrap();
    let original = checksum(&frame[..frame.len() - 2]).unwrap();

    // flip each character after the preamble, one at a time
    for pos in 4..frame.len() - 2 {
        let mut corrupted: Vec<u8> = frame.as_bytes().to_vec();
        corrupted[pos] = if corrupted[pos] == b'0' { b'1' } else { b'0' };
        let corrupted = String::from_utf8(corrupted).unwrap();
        let recomputed = checksum(&corrupted[..corrupted.len() - 2]).unwrap();
        assert_ne!(recomputed, original, "flip at {pos} went undetected");
    }
}

#[test]
fn out_of_range_inputs_are_rejected() {
    let protocol = CommandProtocol::new(0);
    assert_eq!(
        protocol.generate(300, CommandKind::End, &[0]),
        Err(ProtocolError::IdRange(300))
    );

    let bad_preamble = CommandProtocol::new(256);
    assert_eq!(
        bad_preamble.generate(1, CommandKind::End, &[0]),
        Err(ProtocolError::PreambleRange(256))
    );

    assert_eq!(
        protocol.generate(1, CommandKind::End, &[]),
        Err(ProtocolError::DataLength(0))
    );

    // 128 values of "-7FFFFFFF," style render far past 255 characters
    let huge = vec![i32::MIN + 1; 128];
    assert!(matches!(
        protocol.generate(1, CommandKind::MotorSet, &huge),
        Err(ProtocolError::DataLength(_))
    ));
}

#[test]
fn stop_all_frame_carries_a_valid_checksum() {
    let body = &STOP_ALL_FRAME[..STOP_ALL_FRAME.len() - 2];
    assert_eq!(
        &STOP_ALL_FRAME[STOP_ALL_FRAME.len() - 2..],
        format!("{:02X}", checksum(body).unwrap())
    );
    assert_eq!(BUFFER_END, "G");
}

#[test]
fn too_short_frames_have_no_checksum() {
    assert_eq!(checksum("0000050300"), None);
}
