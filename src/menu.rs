//! Startup mode menu.

use crate::error::{ClientError, ClientErrorKind};
use crate::mode::GameMode;
use crate::players::LineInput;
use crate::ui::{self, Screen};
use tracing::{info, instrument};

/// Parses a menu answer. Anything but 1, 2 or 3 is rejected.
#[instrument]
pub fn parse_menu_choice(line: &str) -> Result<GameMode, ClientError> {
    line.trim()
        .parse::<u8>()
        .ok()
        .and_then(GameMode::from_number)
        .ok_or_else(|| ClientError::new(ClientErrorKind::InvalidMenuChoice(line.trim().to_string())))
}

/// Shows the menu and reads one answer.
#[instrument(skip_all)]
pub fn choose_mode(
    input: &mut dyn LineInput,
    screen: &mut dyn Screen,
) -> Result<GameMode, ClientError> {
    screen.message(ui::menu_text().trim_end());
    screen.prompt(ui::MENU_PROMPT);
    let line = input
        .read_line()
        .map_err(|e| ClientError::new(ClientErrorKind::Input(e.to_string())))?
        .unwrap_or_default();
    let mode = parse_menu_choice(&line)?;
    info!(mode = ?mode, "Mode selected");
    Ok(mode)
}
