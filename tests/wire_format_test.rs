//! Payload formats exchanged with the board device.

use tictactoe_mqtt::{
    Board, CodecError, GameMode, Mark, Move, MoveIntent, Position, TOPIC_MODE, TOPIC_MOVE_O,
    decode_mode, decode_move_intent, decode_snapshot, encode_mode, encode_move,
};

#[test]
fn test_snapshot_with_spaces_and_extra_fields() {
    let board = decode_snapshot(br#"{"board":"X   O    ","seq":7}"#).unwrap();
    assert_eq!(board.get(Position::TopLeft).as_char(), 'X');
    assert_eq!(board.get(Position::Center).as_char(), 'O');
    assert_eq!(board.empty_positions().len(), 7);
}

#[test]
fn test_snapshot_missing_board_field() {
    assert!(matches!(
        decode_snapshot(br#"{"status":"ok"}"#),
        Err(CodecError::MissingField { .. })
    ));
}

#[test]
fn test_snapshot_wrong_shapes() {
    assert!(matches!(decode_snapshot(b"garbage"), Err(CodecError::NotJson { .. })));
    assert!(matches!(decode_snapshot(b"[1,2]"), Err(CodecError::NotAnObject)));
    for payload in [
        br#"{"board":"XO"}"#.to_vec(),
        br#"{"board":"XXXXXXXXXX"}"#.to_vec(),
        br#"{"board":"XOZ      "}"#.to_vec(),
        br#"{"board":9}"#.to_vec(),
    ] {
        assert!(matches!(
            decode_snapshot(&payload),
            Err(CodecError::MalformedField { .. })
        ));
    }
}

#[test]
fn test_unreachable_boards_rejected() {
    // Too many X, and two winners at once.
    assert!(decode_snapshot(br#"{"board":"XXX      "}"#).is_err());
    assert!(decode_snapshot(br#"{"board":"XXXOOO   "}"#).is_err());
}

#[test]
fn test_move_encoding() {
    let outbound = encode_move(Move::at(Mark::O, 2, 0).unwrap()).unwrap();
    assert_eq!(outbound.topic(), TOPIC_MOVE_O);
    assert_eq!(
        decode_move_intent(outbound.payload()).unwrap(),
        MoveIntent {
            player: Mark::O,
            row: 2,
            col: 0
        }
    );
}

#[test]
fn test_move_intent_out_of_range() {
    assert!(matches!(
        decode_move_intent(br#"{"player":"X","row":3,"col":0}"#),
        Err(CodecError::MalformedField { .. })
    ));
}

#[test]
fn test_mode_announcement() {
    for mode in [GameMode::HumanVsBot, GameMode::HumanVsHuman, GameMode::BotVsBot] {
        let outbound = encode_mode(mode).unwrap();
        assert_eq!(outbound.topic(), TOPIC_MODE);
        assert_eq!(decode_mode(outbound.payload()).unwrap(), mode);
    }
    assert!(decode_mode(br#"{"mode":4}"#).is_err());
}

#[test]
fn test_board_field_round_trip() {
    let board = Board::from_cells("XO..X...O").unwrap();
    let payload = format!(r#"{{"board":"{}"}}"#, board.cells());
    assert_eq!(decode_snapshot(payload.as_bytes()).unwrap(), board);
}
