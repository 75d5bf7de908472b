//! Host appearance notifications.

use tokio::sync::watch;

use super::ColorScheme;

/// Source of the host's light/dark appearance.
///
/// Implementors report the current appearance and hand out receivers that
/// are notified whenever it changes.
pub trait AppearanceSource: Send + Sync + std::fmt::Debug {
    /// The appearance right now.
    fn current(&self) -> ColorScheme;

    /// Subscribe to appearance changes.
    ///
    /// Dropping the receiver ends the subscription.
    fn subscribe(&self) -> watch::Receiver<ColorScheme>;
}

/// An appearance source whose value is set explicitly.
///
/// Used by the CLI (from configuration or `--appearance`) and by tests to
/// simulate the OS switching between light and dark.
#[derive(Debug)]
pub struct HostAppearance {
    tx: watch::Sender<ColorScheme>,
}

impl HostAppearance {
    /// Create a source reporting `initial`.
    #[must_use]
    pub fn new(initial: ColorScheme) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Change the reported appearance, notifying subscribers if it differs.
    pub fn set(&self, scheme: ColorScheme) {
        self.tx.send_if_modified(|current| {
            if *current == scheme {
                false
            } else {
                *current = scheme;
                true
            }
        });
    }
}

impl Default for HostAppearance {
    fn default() -> Self {
        Self::new(ColorScheme::default())
    }
}

impl AppearanceSource for HostAppearance {
    fn current(&self) -> ColorScheme {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<ColorScheme> {
        self.tx.subscribe()
    }
}
