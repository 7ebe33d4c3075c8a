//! Session lifecycle: subscribe, announce, play, disconnect.

mod common;

use common::{attach_device, fast_timing, random_decider};
use std::time::Duration;
use tictactoe_mqtt::{
    ClientErrorKind, GameMode, MemoryTransport, RecordingScreen, ScriptedInput, Session,
    TOPIC_BOARD, TOPIC_MODE, TOPIC_MOVE_O, TOPIC_MOVE_X, TurnCoordinator, decode_mode,
};

fn session(
    mode: GameMode,
    lines: Vec<String>,
) -> (Session<MemoryTransport>, tictactoe_mqtt::MemoryBus, RecordingScreen) {
    let (transport, bus) = MemoryTransport::new();
    let screen = RecordingScreen::default();
    let coordinator = TurnCoordinator::new(
        mode,
        random_decider(),
        Box::new(ScriptedInput::new(lines)),
        Box::new(screen.clone()),
        fast_timing(),
    )
    .with_seed(3);
    (Session::new(transport, coordinator), bus, screen)
}

fn all_cells() -> Vec<String> {
    (0..9).map(|i| i.to_string()).collect()
}

#[tokio::test]
async fn test_human_vs_bot_session_plays_to_the_end() {
    let (session, bus, screen) = session(GameMode::HumanVsBot, all_cells());
    attach_device(&bus);

    let result = tokio::time::timeout(Duration::from_secs(5), session.run())
        .await
        .expect("session did not finish")
        .unwrap();

    assert!(result.is_terminal());
    assert_eq!(bus.subscriptions(), vec![TOPIC_BOARD.to_string()]);

    let published = bus.published();
    assert_eq!(published[0].topic(), TOPIC_MODE);
    assert_eq!(decode_mode(published[0].payload()).unwrap(), GameMode::HumanVsBot);
    assert_eq!(published[0].payload().as_slice(), br#"{"mode":1}"#);
    assert!(!bus.published_on(TOPIC_MOVE_X).is_empty());
    assert!(bus.is_disconnected());
    assert!(!screen.boards().is_empty());
}

#[tokio::test]
async fn test_session_disconnects_after_failure() {
    // No input at all: the first prompt hits end of input.
    let (session, bus, _screen) = session(GameMode::HumanVsBot, Vec::new());
    attach_device(&bus);

    let err = tokio::time::timeout(Duration::from_secs(5), session.run())
        .await
        .expect("session did not finish")
        .unwrap_err();

    assert!(matches!(err.kind(), ClientErrorKind::Input(_)));
    assert!(bus.published_on(TOPIC_MOVE_X).is_empty());
    assert!(bus.is_disconnected());
}

#[tokio::test]
async fn test_unacknowledged_announcement_is_not_fatal() {
    let (session, bus, _screen) = session(GameMode::HumanVsBot, all_cells());
    bus.fail_publishes(true);
    // Without the device nothing arrives; deliver a finished board directly.
    bus.deliver(TOPIC_BOARD, br#"{"board":"XXXOO    "}"#.to_vec());

    let result = tokio::time::timeout(Duration::from_secs(5), session.run())
        .await
        .expect("session did not finish")
        .unwrap();

    assert_eq!(result, tictactoe_mqtt::GameOutcome::Won(tictactoe_mqtt::Mark::X));
    assert!(bus.published().is_empty());
    assert!(bus.is_disconnected());
}

#[tokio::test]
async fn test_bot_vs_bot_session() {
    let (session, bus, screen) = session(GameMode::BotVsBot, Vec::new());
    attach_device(&bus);

    let result = tokio::time::timeout(Duration::from_secs(10), session.run())
        .await
        .expect("bot game did not finish")
        .unwrap();

    assert!(result.is_terminal());
    assert_eq!(decode_mode(bus.published()[0].payload()).unwrap(), GameMode::BotVsBot);
    assert!(!bus.published_on(TOPIC_MOVE_X).is_empty());
    assert!(!bus.published_on(TOPIC_MOVE_O).is_empty());
    assert!(screen.prompts().is_empty());
    assert!(bus.is_disconnected());
}
