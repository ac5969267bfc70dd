use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use remote_tetris::adapter::server::{run_server, ServerConfig};
use remote_tetris::adapter::{parse_reply, Envelope, MessageKind};
use remote_tetris::core::{encode, encode_value, BoardFormat};
use remote_tetris::input::InputQueue;
use remote_tetris::types::{Board, Command, ConnectionStatus, DisplayUpdate};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Display {
    addr: SocketAddr,
    queue: Arc<InputQueue>,
    updates: mpsc::UnboundedReceiver<DisplayUpdate>,
}

async fn start_display(log_path: Option<String>) -> Display {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        log_path,
    };
    let queue = Arc::new(InputQueue::new());
    let (display_tx, updates) = mpsc::unbounded_channel();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server_queue = Arc::clone(&queue);
    tokio::spawn(async move {
        let _ = run_server(config, server_queue, display_tx, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");

    Display {
        addr,
        queue,
        updates,
    }
}

impl Display {
    async fn connect(&mut self) -> Ws {
        let (ws, _) = connect_async(format!("ws://{}", self.addr))
            .await
            .expect("connect failed");
        // Wait for the session reset before producing input.
        match self.next_update().await {
            DisplayUpdate::Status(ConnectionStatus::Connected { .. }) => {}
            other => panic!("expected connected status, got {other:?}"),
        }
        ws
    }

    async fn next_update(&mut self) -> DisplayUpdate {
        tokio::time::timeout(Duration::from_secs(2), self.updates.recv())
            .await
            .expect("no display update")
            .expect("display channel closed")
    }
}

async fn next_command(ws: &mut Ws) -> Command {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("reply timed out")
        .expect("stream ended")
        .expect("transport error");
    match msg {
        Message::Text(text) => parse_reply(&text).expect("reply must parse"),
        other => panic!("unexpected frame {other:?}"),
    }
}

async fn assert_silent(ws: &mut Ws) {
    let res = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(res.is_err(), "expected no frame, got {res:?}");
}

fn sample_board() -> Board {
    let mut board = Board::new();
    for col in 0..5 {
        board.set(19, col, true);
    }
    board.set(0, 9, true);
    board
}

#[tokio::test]
async fn relay_full_session_with_typed_envelopes() {
    let mut display = start_display(None).await;
    let mut ws = display.connect().await;
    let board = sample_board();

    let queue = Envelope::new(MessageKind::Queue, "T I O L J".into()).to_json();
    let hold = Envelope::new(MessageKind::Hold, "S".into()).to_json();
    let frame = Envelope::new(MessageKind::Board, encode_value(&board, BoardFormat::ColumnBits)).to_json();

    ws.send(Message::Text(queue)).await.unwrap();
    ws.send(Message::Text(hold)).await.unwrap();
    ws.send(Message::Text(frame)).await.unwrap();

    assert_eq!(display.next_update().await, DisplayUpdate::QueueText("T I O L J".into()));
    assert_eq!(display.next_update().await, DisplayUpdate::HoldText("S".into()));
    assert_eq!(display.next_update().await, DisplayUpdate::Board(board));

    // No input yet: the reply waits.
    assert_silent(&mut ws).await;

    display.queue.enqueue(Command::RotateCw);
    display.queue.enqueue(Command::RotateCcw);
    assert_eq!(next_command(&mut ws).await, Command::RotateCw);
    assert_silent(&mut ws).await;

    ws.send(Message::Text(encode(&board, BoardFormat::Glyphs))).await.unwrap();
    assert_eq!(next_command(&mut ws).await, Command::RotateCcw);

    ws.close(None).await.unwrap();
    assert_eq!(display.next_update().await, DisplayUpdate::Board(board));
    assert_eq!(
        display.next_update().await,
        DisplayUpdate::Status(ConnectionStatus::Disconnected)
    );
}

#[tokio::test]
async fn relay_accepts_legacy_untagged_frames() {
    let mut display = start_display(None).await;
    let mut ws = display.connect().await;
    let board = sample_board();

    ws.send(Message::Text(r#"{"hold":"t","kind":"hold"}"#.into())).await.unwrap();
    ws.send(Message::Text("T, I, O, L, J".into())).await.unwrap();
    ws.send(Message::Text(encode(&board, BoardFormat::Rows))).await.unwrap();

    assert_eq!(display.next_update().await, DisplayUpdate::HoldText("t".into()));
    assert_eq!(display.next_update().await, DisplayUpdate::QueueText("T, I, O, L, J".into()));
    assert_eq!(display.next_update().await, DisplayUpdate::Board(board));

    display.queue.enqueue(Command::HoldPiece);
    assert_eq!(next_command(&mut ws).await, Command::HoldPiece);
}

#[tokio::test]
async fn malformed_board_gets_no_reply_and_does_not_break_the_session() {
    let mut display = start_display(None).await;
    let mut ws = display.connect().await;
    display.queue.enqueue(Command::HardDrop);

    let bad_rows = serde_json::to_string(&vec![vec![false; 10]; 23]).unwrap();
    let bad_bits = r#"{"info": "[1048576,0,0,0,0,0,0,0,0,0]"}"#.to_string();
    let bad_glyphs = "□ ".repeat(199);
    for frame in [bad_rows, bad_bits, bad_glyphs] {
        ws.send(Message::Text(frame)).await.unwrap();
    }
    assert_silent(&mut ws).await;
    assert_eq!(display.queue.len(), 1);

    ws.send(Message::Text(encode(&sample_board(), BoardFormat::Rows)))
        .await
        .unwrap();
    assert_eq!(next_command(&mut ws).await, Command::HardDrop);
    assert_eq!(display.next_update().await, DisplayUpdate::Board(sample_board()));
}

#[tokio::test]
async fn close_while_awaiting_input_leaves_queue_intact_for_next_peer() {
    let mut display = start_display(None).await;
    let mut ws = display.connect().await;

    ws.send(Message::Text(encode(&sample_board(), BoardFormat::Rows)))
        .await
        .unwrap();
    assert!(matches!(display.next_update().await, DisplayUpdate::Board(_)));
    ws.close(None).await.unwrap();
    assert_eq!(
        display.next_update().await,
        DisplayUpdate::Status(ConnectionStatus::Disconnected)
    );

    // Input produced between sessions stays queued until the next reset.
    display.queue.enqueue(Command::MoveLeft);
    assert_eq!(display.queue.snapshot(), vec![Command::MoveLeft]);

    // A new session starts clean.
    let mut ws = display.connect().await;
    assert!(display.queue.is_empty());
    ws.send(Message::Text(encode(&sample_board(), BoardFormat::Rows)))
        .await
        .unwrap();
    display.queue.enqueue(Command::MoveRight);
    assert_eq!(next_command(&mut ws).await, Command::MoveRight);
}

#[tokio::test]
async fn wire_log_records_both_directions() {
    let path = std::env::temp_dir().join(format!("remote-tetris-wire-{}.log", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let mut display = start_display(Some(path.to_string_lossy().into_owned())).await;
    let mut ws = display.connect().await;
    ws.send(Message::Text(encode(&Board::new(), BoardFormat::ColumnBits)))
        .await
        .unwrap();
    display.queue.enqueue(Command::SoftDrop);
    assert_eq!(next_command(&mut ws).await, Command::SoftDrop);
    ws.close(None).await.unwrap();

    let mut contents = String::new();
    for _ in 0..40 {
        contents = std::fs::read_to_string(&path).unwrap_or_default();
        if contents.lines().count() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2, "{contents}");
    assert!(lines[0].starts_with("1 < "));
    assert_eq!(lines[1], r#"1 > {"contents":"SoftDrop"}"#);
    let _ = std::fs::remove_file(&path);
}
