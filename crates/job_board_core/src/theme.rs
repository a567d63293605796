//! crates/job_board_core/src/theme.rs
//!
//! Process-wide color scheme. Constructed once at startup and handed to every
//! consumer; clones share the same state.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::domain::{ColorScheme, Palette};
use crate::ports::PreferenceService;

#[derive(Clone)]
pub struct ThemeContext {
    scheme: Arc<watch::Sender<ColorScheme>>,
    preferences: Option<Arc<dyn PreferenceService>>,
    /// Preference writes run one at a time so the last one stores the current scheme.
    persisting: Arc<Mutex<()>>,
}

impl ThemeContext {
    /// A context that lives only as long as the process.
    pub fn new(initial: ColorScheme) -> Self {
        let (scheme, _) = watch::channel(initial);
        Self {
            scheme: Arc::new(scheme),
            preferences: None,
            persisting: Arc::new(Mutex::new(())),
        }
    }

    /// Starts from the stored scheme, then the system default, then light.
    /// Changes are written back to `preferences`.
    pub async fn load(preferences: Arc<dyn PreferenceService>) -> Self {
        let stored = preferences.read_scheme().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not read the stored color scheme");
            None
        });
        let initial = match stored {
            Some(scheme) => scheme,
            None => preferences
                .system_scheme()
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "could not read the system color scheme");
                    None
                })
                .unwrap_or_default(),
        };
        info!(scheme = %initial, "color scheme initialized");

        let (scheme, _) = watch::channel(initial);
        Self {
            scheme: Arc::new(scheme),
            preferences: Some(preferences),
            persisting: Arc::new(Mutex::new(())),
        }
    }

    pub fn scheme(&self) -> ColorScheme {
        *self.scheme.borrow()
    }

    pub fn is_dark(&self) -> bool {
        self.scheme() == ColorScheme::Dark
    }

    pub fn palette(&self) -> Palette {
        Palette::for_scheme(self.scheme())
    }

    /// Receivers observe every change as soon as it is made.
    pub fn subscribe(&self) -> watch::Receiver<ColorScheme> {
        self.scheme.subscribe()
    }

    /// Flips the scheme and returns the new one.
    ///
    /// Subscribers see the change before the preference write starts; a
    /// failed write is logged and does not undo the flip.
    pub async fn toggle(&self) -> ColorScheme {
        let mut next = ColorScheme::default();
        self.scheme.send_modify(|scheme| {
            *scheme = scheme.toggled();
            next = *scheme;
        });
        info!(scheme = %next, "color scheme toggled");
        self.persist().await;
        next
    }

    pub async fn set(&self, scheme: ColorScheme) {
        if self.scheme.send_replace(scheme) != scheme {
            self.persist().await;
        }
    }

    async fn persist(&self) {
        if let Some(preferences) = &self.preferences {
            let _guard = self.persisting.lock().await;
            let scheme = self.scheme();
            if let Err(e) = preferences.write_scheme(scheme).await {
                warn!(%scheme, error = %e, "could not store the color scheme");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryPreferences;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    #[tokio::test]
    async fn toggle_is_broadcast_to_every_subscriber() {
        let theme = ThemeContext::new(ColorScheme::Light);
        let mut first = theme.subscribe();
        let second = theme.clone().subscribe();

        assert_eq!(theme.toggle().await, ColorScheme::Dark);
        assert!(first.has_changed().unwrap());
        assert_eq!(*first.borrow_and_update(), ColorScheme::Dark);
        assert_eq!(*second.borrow(), ColorScheme::Dark);
        assert!(theme.is_dark());
        assert_eq!(theme.palette().primary, "#0A84FF");
    }

    #[tokio::test]
    async fn load_prefers_stored_then_system_scheme() {
        let stored = Arc::new(MemoryPreferences {
            stored: Mutex::new(Some(ColorScheme::Light)),
            system: Some(ColorScheme::Dark),
            ..Default::default()
        });
        assert_eq!(ThemeContext::load(stored).await.scheme(), ColorScheme::Light);

        let system_only = Arc::new(MemoryPreferences {
            system: Some(ColorScheme::Dark),
            ..Default::default()
        });
        assert_eq!(ThemeContext::load(system_only).await.scheme(), ColorScheme::Dark);

        let nothing = Arc::new(MemoryPreferences::default());
        assert_eq!(ThemeContext::load(nothing).await.scheme(), ColorScheme::Light);
    }

    #[tokio::test]
    async fn toggle_persists_and_survives_write_failures() {
        let preferences = Arc::new(MemoryPreferences::default());
        let theme = ThemeContext::load(preferences.clone()).await;

        theme.toggle().await;
        assert_eq!(*preferences.stored.lock().unwrap(), Some(ColorScheme::Dark));

        preferences.fail.store(true, Ordering::SeqCst);
        assert_eq!(theme.toggle().await, ColorScheme::Light);
        assert_eq!(theme.scheme(), ColorScheme::Light);
    }

    /// Stores a dark scheme slower than a light one.
    #[derive(Default)]
    struct SlowDarkPreferences {
        stored: tokio::sync::Mutex<Option<ColorScheme>>,
    }

    #[async_trait::async_trait]
    impl PreferenceService for SlowDarkPreferences {
        async fn read_scheme(&self) -> crate::ports::PortResult<Option<ColorScheme>> {
            Ok(*self.stored.lock().await)
        }

        async fn write_scheme(&self, scheme: ColorScheme) -> crate::ports::PortResult<()> {
            if scheme == ColorScheme::Dark {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
            *self.stored.lock().await = Some(scheme);
            Ok(())
        }

        async fn system_scheme(&self) -> crate::ports::PortResult<Option<ColorScheme>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn concurrent_toggles_store_the_final_scheme() {
        let preferences = Arc::new(SlowDarkPreferences::default());
        let theme = ThemeContext::load(preferences.clone()).await;

        tokio::join!(theme.toggle(), theme.toggle());

        assert_eq!(theme.scheme(), ColorScheme::Light);
        assert_eq!(*preferences.stored.lock().await, Some(ColorScheme::Light));
    }
}
