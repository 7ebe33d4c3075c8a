//! Human-vs-bot turn coordination over the in-memory transport.

mod common;

use common::{
    DelegatingDecider, FailingDecider, attach_device, board, coordinator, fast_timing,
    random_decider, snapshot_payload,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tictactoe_mqtt::{
    Board, GameMode, GameOutcome, Inbound, LineInput, Mark, MemoryTransport, MoveIntent,
    RecordingScreen, Step, THINKING, TOPIC_BOARD, TOPIC_MOVE_O, TOPIC_MOVE_X, Transport,
    TurnCoordinator, TurnState, decode_move_intent,
};

fn snapshot(b: &Board) -> Inbound {
    Inbound::new(TOPIC_BOARD.to_string(), snapshot_payload(b))
}

#[tokio::test]
async fn test_center_move_published_on_move_x() {
    let (mut coord, mut transport, bus, _screen) =
        coordinator(GameMode::HumanVsBot, random_decider(), &["4"]);
    let (publisher, _) = transport.split();

    let step = coord.handle_inbound(publisher, snapshot(&Board::new())).await.unwrap();
    assert_eq!(step, Step::Advanced(TurnState::AwaitingRemoteUpdate));

    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic(), TOPIC_MOVE_X);
    assert_eq!(
        decode_move_intent(published[0].payload()).unwrap(),
        MoveIntent {
            player: Mark::X,
            row: 1,
            col: 1
        }
    );
    assert_eq!(published[0].payload().as_slice(), br#"{"player":"X","row":1,"col":1}"#);
}

#[tokio::test]
async fn test_local_move_not_trusted_until_echoed() {
    let (mut coord, mut transport, _bus, _screen) =
        coordinator(GameMode::HumanVsBot, random_decider(), &["0"]);
    let (publisher, _) = transport.split();

    coord.handle_inbound(publisher, snapshot(&Board::new())).await.unwrap();
    assert_eq!(coord.board(), Some(Board::new()));
    assert_eq!(coord.state(), TurnState::AwaitingRemoteUpdate);
}

#[tokio::test]
async fn test_malformed_snapshot_changes_nothing() {
    let (mut coord, mut transport, bus, _screen) =
        coordinator(GameMode::HumanVsBot, random_decider(), &[]);
    let (publisher, _) = transport.split();

    for payload in [
        br#"{"status":"XO......."}"#.to_vec(),
        br#"{"board":"XO"}"#.to_vec(),
        b"not json".to_vec(),
    ] {
        let step = coord
            .handle_inbound(publisher, Inbound::new(TOPIC_BOARD.to_string(), payload))
            .await
            .unwrap();
        assert_eq!(step, Step::Ignored);
    }
    assert_eq!(coord.board(), None);
    assert_eq!(coord.state(), TurnState::AwaitingRemoteUpdate);
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn test_other_topics_ignored() {
    let (mut coord, mut transport, _bus, _screen) =
        coordinator(GameMode::HumanVsBot, random_decider(), &[]);
    let (publisher, _) = transport.split();

    let message = Inbound::new("game/other".to_string(), snapshot_payload(&Board::new()));
    assert_eq!(coord.handle_inbound(publisher, message).await.unwrap(), Step::Ignored);
    assert_eq!(coord.board(), None);
}

#[tokio::test]
async fn test_redelivered_snapshot_is_a_no_op() {
    let (mut coord, mut transport, bus, screen) =
        coordinator(GameMode::HumanVsBot, random_decider(), &["4", "0"]);
    let (publisher, _) = transport.split();

    coord.handle_inbound(publisher, snapshot(&Board::new())).await.unwrap();
    let again = coord.handle_inbound(publisher, snapshot(&Board::new())).await.unwrap();

    assert_eq!(again, Step::Ignored);
    assert_eq!(bus.published().len(), 1);
    assert_eq!(screen.prompts().len(), 1);
}

#[tokio::test]
async fn test_failed_publish_retried_on_redelivery() {
    let (mut coord, mut transport, bus, _screen) =
        coordinator(GameMode::HumanVsBot, random_decider(), &["4", "4"]);

    bus.fail_publishes(true);
    {
        let (publisher, _) = transport.split();
        let step = coord.handle_inbound(publisher, snapshot(&Board::new())).await.unwrap();
        assert_eq!(step, Step::Advanced(TurnState::LocalTurn(Mark::X)));
    }
    assert!(bus.published().is_empty());

    bus.fail_publishes(false);
    let (publisher, _) = transport.split();
    coord.handle_inbound(publisher, snapshot(&Board::new())).await.unwrap();
    assert_eq!(bus.published_on(TOPIC_MOVE_X).len(), 1);
}

#[tokio::test]
async fn test_remote_turn_consults_decider() {
    let (mut coord, mut transport, bus, screen) =
        coordinator(GameMode::HumanVsBot, random_decider(), &[]);
    let (publisher, _) = transport.split();

    let step = coord
        .handle_inbound(publisher, snapshot(&board("....X....")))
        .await
        .unwrap();
    assert_eq!(step, Step::Advanced(TurnState::AwaitingRemoteUpdate));
    assert!(screen.messages().contains(&THINKING.to_string()));

    let moves = bus.published_on(TOPIC_MOVE_O);
    assert_eq!(moves.len(), 1);
    let intent = decode_move_intent(moves[0].payload()).unwrap();
    assert_eq!(intent.player, Mark::O);
    assert_ne!((intent.row, intent.col), (1, 1));
}

#[tokio::test]
async fn test_delegating_decider_publishes_nothing_itself() {
    let (mut coord, mut transport, bus, _screen) =
        coordinator(GameMode::HumanVsBot, Box::new(DelegatingDecider), &[]);
    let (publisher, _) = transport.split();

    let step = coord
        .handle_inbound(publisher, snapshot(&board("....X....")))
        .await
        .unwrap();
    assert_eq!(step, Step::Advanced(TurnState::AwaitingRemoteUpdate));
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn test_decider_failure_is_not_fatal() {
    let (mut coord, mut transport, bus, screen) =
        coordinator(GameMode::HumanVsBot, Box::new(FailingDecider), &[]);
    let (publisher, _) = transport.split();

    let step = coord
        .handle_inbound(publisher, snapshot(&board("....X....")))
        .await
        .unwrap();
    assert_eq!(step, Step::Advanced(TurnState::RemoteTurn(Mark::O)));
    assert!(bus.published().is_empty());
    assert!(screen.messages().iter().any(|m| m.contains("bot script exploded")));

    // The same board redelivered gets another attempt.
    let retry = coord
        .handle_inbound(publisher, snapshot(&board("....X....")))
        .await
        .unwrap();
    assert_eq!(retry, Step::Advanced(TurnState::RemoteTurn(Mark::O)));
}

#[tokio::test]
async fn test_terminal_snapshot_finishes_with_message() {
    let (mut coord, mut transport, bus, screen) =
        coordinator(GameMode::HumanVsBot, random_decider(), &[]);
    let (publisher, _) = transport.split();

    let step = coord
        .handle_inbound(publisher, snapshot(&board("OOOXX.X..")))
        .await
        .unwrap();
    assert_eq!(step, Step::Finished(GameOutcome::Won(Mark::O)));
    assert_eq!(coord.state(), TurnState::Terminal(GameOutcome::Won(Mark::O)));
    assert_eq!(screen.messages().last().unwrap(), "Bot wins!");
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn test_full_game_against_device() {
    let lines: Vec<String> = (0..9).map(|i| i.to_string()).collect();
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let (mut coord, mut transport, bus, screen) =
        coordinator(GameMode::HumanVsBot, random_decider(), &line_refs);
    transport.subscribe(TOPIC_BOARD).await.unwrap();
    attach_device(&bus);
    bus.deliver(TOPIC_BOARD, snapshot_payload(&Board::new()));

    let result = tokio::time::timeout(Duration::from_secs(5), coord.run(&mut transport))
        .await
        .expect("game did not finish")
        .unwrap();
    assert!(result.is_terminal());

    let final_board = coord.board().unwrap();
    let x_moves = bus.published_on(TOPIC_MOVE_X);
    let o_moves = bus.published_on(TOPIC_MOVE_O);
    assert_eq!(x_moves.len(), final_board.count(Mark::X));
    assert_eq!(o_moves.len(), final_board.count(Mark::O));
    assert!(x_moves.len() == o_moves.len() || x_moves.len() == o_moves.len() + 1);
    for m in &x_moves {
        assert_eq!(decode_move_intent(m.payload()).unwrap().player, Mark::X);
    }
    for m in &o_moves {
        assert_eq!(decode_move_intent(m.payload()).unwrap().player, Mark::O);
    }
    assert_eq!(screen.boards().last(), Some(&final_board));
}

/// Keyboard that takes a while to answer, recording how far a ticker
/// advanced meanwhile.
struct SlowKeyboard {
    ticks: Arc<AtomicUsize>,
    ticks_while_reading: Arc<AtomicUsize>,
}

impl LineInput for SlowKeyboard {
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let before = self.ticks.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(300));
        let advanced = self.ticks.load(Ordering::SeqCst) - before;
        self.ticks_while_reading.store(advanced, Ordering::SeqCst);
        Ok(Some("4".to_string()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_slow_keyboard_leaves_other_tasks_running() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = ticks.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(5)).await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    let ticks_while_reading = Arc::new(AtomicUsize::new(0));
    let (mut transport, bus) = MemoryTransport::new();
    let mut coord = TurnCoordinator::new(
        GameMode::HumanVsBot,
        random_decider(),
        Box::new(SlowKeyboard {
            ticks: ticks.clone(),
            ticks_while_reading: ticks_while_reading.clone(),
        }),
        Box::new(RecordingScreen::default()),
        fast_timing(),
    );

    // Run the turn on the single worker, like the real event loop would share it.
    let turn = tokio::spawn(async move {
        let (publisher, _) = transport.split();
        coord.handle_inbound(publisher, snapshot(&Board::new())).await
    });
    let step = turn.await.unwrap().unwrap();
    ticker.abort();

    assert_eq!(step, Step::Advanced(TurnState::AwaitingRemoteUpdate));
    assert_eq!(bus.published_on(TOPIC_MOVE_X).len(), 1);
    assert!(ticks_while_reading.load(Ordering::SeqCst) > 0);
}
