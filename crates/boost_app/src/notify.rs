use std::io::{self, Write};

use boost_core::Alert;
use boost_logging::boost_info;

/// Whether the user has allowed system notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    Undecided,
}

/// System notification boundary, only consulted while the app is unfocused.
pub trait Notifier {
    fn permission(&self) -> NotificationPermission;
    fn notify(&self, title: &str, body: &str);
}

/// Attention marker shown until focus returns.
pub trait AttentionBadge {
    fn set(&self, active: bool);
}

/// Reports whether the app currently has the user's attention.
pub trait FocusProbe {
    fn is_focused(&self) -> bool;
}

pub trait SoundPlayer {
    fn play_completion(&self);
}

/// Runs reconciler alerts against the injected boundaries.
pub struct AlertExecutor<'a> {
    pub notifier: &'a dyn Notifier,
    pub badge: &'a dyn AttentionBadge,
    pub focus: &'a dyn FocusProbe,
    pub sound: &'a dyn SoundPlayer,
}

impl AlertExecutor<'_> {
    pub fn execute(&self, alerts: &[Alert]) {
        if alerts.is_empty() {
            return;
        }
        let focused = self.focus.is_focused();
        for alert in alerts {
            match alert {
                Alert::FileReady { name } => {
                    boost_info!("alert: {name} is ready");
                    self.deliver("Image Ready", &format!("{name} has finished processing."));
                }
                Alert::AllDone => {
                    boost_info!("alert: all images processed");
                    self.sound.play_completion();
                    self.deliver("All Done", "All your images have been processed.");
                }
            }
        }
        if !focused {
            self.badge.set(true);
        }
    }

    /// Clears the attention badge once the user is looking again.
    pub fn focus_regained(&self) {
        self.badge.set(false);
    }

    fn deliver(&self, title: &str, body: &str) {
        if self.focus.is_focused() {
            return;
        }
        if self.notifier.permission() == NotificationPermission::Granted {
            self.notifier.notify(title, body);
        }
    }
}

/// Terminal stand-ins for the platform boundaries.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn notify(&self, title: &str, body: &str) {
        eprintln!("[{title}] {body}");
    }
}

pub struct TerminalBadge;

impl AttentionBadge for TerminalBadge {
    fn set(&self, active: bool) {
        // OSC 0 retitles the terminal window.
        let title = if active { "PhotoBoost (!)" } else { "PhotoBoost" };
        print!("\x1b]0;{title}\x07");
        let _ = io::stdout().flush();
    }
}

/// A headless run never has the user's eyes on it.
pub struct AlwaysUnfocused;

impl FocusProbe for AlwaysUnfocused {
    fn is_focused(&self) -> bool {
        false
    }
}

pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play_completion(&self) {
        print!("\x07");
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use boost_core::Alert;

    struct Recorder {
        notifications: RefCell<Vec<String>>,
        badge: Cell<bool>,
        focused: Cell<bool>,
        chimes: Cell<usize>,
        permission: Cell<NotificationPermission>,
    }

    impl Default for Recorder {
        fn default() -> Self {
            Self {
                notifications: RefCell::new(Vec::new()),
                badge: Cell::new(false),
                focused: Cell::new(false),
                chimes: Cell::new(0),
                permission: Cell::new(NotificationPermission::Granted),
            }
        }
    }

    impl Notifier for Recorder {
        fn permission(&self) -> NotificationPermission {
            self.permission.get()
        }
        fn notify(&self, title: &str, body: &str) {
            self.notifications.borrow_mut().push(format!("{title}: {body}"));
        }
    }

    impl AttentionBadge for Recorder {
        fn set(&self, active: bool) {
            self.badge.set(active);
        }
    }

    impl FocusProbe for Recorder {
        fn is_focused(&self) -> bool {
            self.focused.get()
        }
    }

    impl SoundPlayer for Recorder {
        fn play_completion(&self) {
            self.chimes.set(self.chimes.get() + 1);
        }
    }

    fn executor(recorder: &Recorder) -> AlertExecutor<'_> {
        AlertExecutor {
            notifier: recorder,
            badge: recorder,
            focus: recorder,
            sound: recorder,
        }
    }

    #[test]
    fn unfocused_alerts_notify_and_raise_the_badge() {
        let recorder = Recorder::default();
        executor(&recorder).execute(&[
            Alert::FileReady {
                name: "cat.png".to_string(),
            },
            Alert::AllDone,
        ]);

        assert_eq!(
            *recorder.notifications.borrow(),
            vec![
                "Image Ready: cat.png has finished processing.".to_string(),
                "All Done: All your images have been processed.".to_string(),
            ]
        );
        assert!(recorder.badge.get());
        assert_eq!(recorder.chimes.get(), 1);
    }

    #[test]
    fn focused_alerts_skip_notifications_and_badge_but_keep_the_sound() {
        let recorder = Recorder::default();
        recorder.focused.set(true);
        executor(&recorder).execute(&[Alert::AllDone]);

        assert!(recorder.notifications.borrow().is_empty());
        assert!(!recorder.badge.get());
        assert_eq!(recorder.chimes.get(), 1);
    }

    #[test]
    fn denied_permission_suppresses_notifications_only() {
        let recorder = Recorder::default();
        recorder.permission.set(NotificationPermission::Denied);
        executor(&recorder).execute(&[Alert::FileReady {
            name: "dog.png".to_string(),
        }]);

        assert!(recorder.notifications.borrow().is_empty());
        assert!(recorder.badge.get());
    }

    #[test]
    fn regained_focus_clears_the_badge() {
        let recorder = Recorder::default();
        executor(&recorder).execute(&[Alert::AllDone]);
        assert!(recorder.badge.get());

        executor(&recorder).focus_regained();
        assert!(!recorder.badge.get());
    }
}
