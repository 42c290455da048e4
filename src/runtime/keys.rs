//! Navigation keys and the stdin listener that produces them
//!
//! Lines typed on stdin stand in for key presses on the hero demo. The
//! listener reads on its own thread and forwards recognised keys to the
//! runtime's command channel. The thread is never joined; a read parked on
//! stdin must not hold up shutdown.

use std::io::{BufRead, BufReader};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::Command;

/// Navigation input for the hero demo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    /// Arrow right: next scene
    Right,
    /// Space: next scene
    Space,
    /// Arrow left: previous scene
    Left,
    /// Progress dot: jump to a scene
    Scene(usize),
    /// Auto-play button
    ToggleAutoPlay,
    /// Restart the walkthrough from the first scene
    Restart,
}

impl NavKey {
    /// Parse one line of input
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if line.contains(' ') && trimmed.is_empty() {
            return Some(NavKey::Space);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "right" | "n" | "l" => Some(NavKey::Right),
            "space" => Some(NavKey::Space),
            "left" | "p" | "h" => Some(NavKey::Left),
            "a" | "auto" => Some(NavKey::ToggleAutoPlay),
            "r" | "restart" => Some(NavKey::Restart),
            other => other.parse::<usize>().ok().map(NavKey::Scene),
        }
    }

    /// Whether this key moves the cursor by hand and so stops auto-play
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            NavKey::Right | NavKey::Space | NavKey::Left | NavKey::Scene(_)
        )
    }
}

/// Reads navigation keys from stdin until it closes
pub struct InputListener {
    command_tx: mpsc::Sender<Command>,
}

impl InputListener {
    pub fn new(command_tx: mpsc::Sender<Command>) -> Self {
        Self { command_tx }
    }

    /// Start the listener thread on stdin
    pub fn spawn(self) -> Result<(), InputError> {
        self.spawn_reader(BufReader::new(std::io::stdin()))
    }

    /// Start the listener thread on an arbitrary line source
    pub fn spawn_reader<R>(self, reader: R) -> Result<(), InputError>
    where
        R: BufRead + Send + 'static,
    {
        let command_tx = self.command_tx;

        thread::Builder::new()
            .name("input-listener".to_string())
            .spawn(move || {
                info!("input listener started (n/p/space, digits, a = auto, r = restart)");
                read_keys(reader, &command_tx);
                info!("input listener stopped");
            })
            .map_err(InputError::ThreadSpawn)?;

        Ok(())
    }
}

/// Errors that can occur starting the input listener
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to spawn input listener thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
}

/// Forward keys until the reader ends or the runtime goes away
fn read_keys<R: BufRead>(reader: R, command_tx: &mpsc::Sender<Command>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(?e, "failed to read input");
                break;
            }
        };

        match NavKey::parse(&line) {
            Some(key) => {
                debug!(?key, "key pressed");
                if command_tx.blocking_send(Command::Key(key)).is_err() {
                    debug!("runtime stopped, dropping key input");
                    break;
                }
            }
            None => warn!(input = %line.trim(), "unrecognised key"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_parse_keys() {
        assert_eq!(NavKey::parse("n"), Some(NavKey::Right));
        assert_eq!(NavKey::parse("RIGHT\n"), Some(NavKey::Right));
        assert_eq!(NavKey::parse(" "), Some(NavKey::Space));
        assert_eq!(NavKey::parse("space"), Some(NavKey::Space));
        assert_eq!(NavKey::parse("p"), Some(NavKey::Left));
        assert_eq!(NavKey::parse("a"), Some(NavKey::ToggleAutoPlay));
        assert_eq!(NavKey::parse("r"), Some(NavKey::Restart));
        assert_eq!(NavKey::parse("4"), Some(NavKey::Scene(4)));
        assert_eq!(NavKey::parse("x"), None);
        assert_eq!(NavKey::parse(""), None);
    }

    #[test]
    fn test_navigation_keys() {
        assert!(NavKey::Right.is_navigation());
        assert!(NavKey::Scene(2).is_navigation());
        assert!(!NavKey::ToggleAutoPlay.is_navigation());
        assert!(!NavKey::Restart.is_navigation());
    }

    #[tokio::test]
    async fn test_listener_forwards_keys_until_eof() {
        let (tx, mut rx) = mpsc::channel(8);
        let input = Cursor::new("n\nbogus\na\n");
        InputListener::new(tx).spawn_reader(input).unwrap();

        assert!(matches!(rx.recv().await, Some(Command::Key(NavKey::Right))));
        assert!(matches!(
            rx.recv().await,
            Some(Command::Key(NavKey::ToggleAutoPlay))
        ));
        // The thread drops its sender at end of input
        assert!(rx.recv().await.is_none());
    }
}
