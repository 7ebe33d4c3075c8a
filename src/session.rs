//! One game from mode selection to outcome.

use crate::codec::{self, TOPIC_BOARD};
use crate::config::{ClientConfig, DeciderKind};
use crate::coordinator::TurnCoordinator;
use crate::error::ClientError;
use crate::local::play_local;
use crate::mode::GameMode;
use crate::players::{LineInput, MoveDecider, RandomDecider, ScriptDecider};
use crate::transport::{MqttTransport, Transport};
use crate::ui::Screen;
use tictactoe_rules::GameOutcome;
use tracing::{info, instrument, warn};

/// A networked game bound to its connection.
///
/// The connection is released by [`Session::run`] whether the game finishes
/// or fails.
pub struct Session<T: Transport> {
    transport: T,
    coordinator: TurnCoordinator,
}

impl<T: Transport> Session<T> {
    /// Binds a connected transport to a coordinator.
    pub fn new(transport: T, coordinator: TurnCoordinator) -> Self {
        Self {
            transport,
            coordinator,
        }
    }

    /// Subscribes to board updates, announces the mode, plays the game, and
    /// disconnects.
    #[instrument(skip_all, fields(mode = ?self.coordinator.mode()))]
    pub async fn run(mut self) -> Result<GameOutcome, ClientError> {
        let result = self.play().await;
        if let Err(e) = self.transport.disconnect().await {
            warn!(error = %e, "Disconnect failed");
        }
        info!(result = ?result, "Session ended");
        result
    }

    async fn play(&mut self) -> Result<GameOutcome, ClientError> {
        self.transport.subscribe(TOPIC_BOARD).await?;
        info!(topic = TOPIC_BOARD, "Subscribed to board updates");

        let announcement = codec::encode_mode(self.coordinator.mode())?;
        match self.transport.send(announcement).await {
            Ok(()) => info!("Mode announced"),
            Err(e) => warn!(error = %e, "Mode announcement not acknowledged"),
        }

        self.coordinator.run(&mut self.transport).await
    }
}

/// Builds the automated decider named by the config.
pub fn build_decider(config: &ClientConfig) -> Box<dyn MoveDecider> {
    match config.decider() {
        DeciderKind::Script => Box::new(ScriptDecider::new(config.decider_command().clone())),
        DeciderKind::Random => Box::new(RandomDecider::new("random bot")),
    }
}

/// Plays one game in `mode`.
///
/// Local games never touch the network. Networked games connect first; a
/// failed connection is returned before any play starts.
#[instrument(skip(config, input, screen))]
pub async fn run_game(
    config: &ClientConfig,
    mode: GameMode,
    mut input: Box<dyn LineInput>,
    mut screen: Box<dyn Screen>,
) -> Result<GameOutcome, ClientError> {
    if !mode.is_networked() {
        return play_local(input.as_mut(), screen.as_mut());
    }

    let transport = MqttTransport::connect(config.mqtt_settings()).await?;
    let coordinator =
        TurnCoordinator::new(mode, build_decider(config), input, screen, config.timing());
    Session::new(transport, coordinator).run().await
}
