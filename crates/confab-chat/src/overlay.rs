//! Menu overlays and the transient drag indicator.
//!
//! The two language menus are independently toggled; opening one never
//! closes the other. Each overlay registers an outside-pointer listener only
//! while it is open, so a closed overlay can never swallow a pointer event
//! or leak a handler.

use std::fmt;
use std::sync::Mutex;

/// The menu-like overlays managed by the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Language picker in the header.
    HeaderLanguageMenu,
    /// Language picker next to the input composer.
    ComposerLanguageMenu,
}

impl OverlayKind {
    /// Stable name for events and logs.
    pub fn name(&self) -> &'static str {
        match self {
            OverlayKind::HeaderLanguageMenu => "header_language_menu",
            OverlayKind::ComposerLanguageMenu => "composer_language_menu",
        }
    }

    /// Every overlay kind, for iteration.
    pub fn all() -> [OverlayKind; 2] {
        [
            OverlayKind::HeaderLanguageMenu,
            OverlayKind::ComposerLanguageMenu,
        ]
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a pointer-down landed, as reported by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    /// Inside the header menu's anchoring region.
    HeaderMenuAnchor,
    /// Inside the composer menu's anchoring region.
    ComposerMenuAnchor,
    /// Anywhere else.
    Outside,
}

impl PointerTarget {
    /// Whether this target lies inside the given overlay's anchoring region.
    fn anchors(&self, overlay: OverlayKind) -> bool {
        matches!(
            (self, overlay),
            (PointerTarget::HeaderMenuAnchor, OverlayKind::HeaderLanguageMenu)
                | (
                    PointerTarget::ComposerMenuAnchor,
                    OverlayKind::ComposerLanguageMenu
                )
        )
    }
}

#[derive(Default)]
struct OverlayInner {
    header_open: bool,
    composer_open: bool,
    dragging: bool,
}

impl OverlayInner {
    fn flag(&mut self, overlay: OverlayKind) -> &mut bool {
        match overlay {
            OverlayKind::HeaderLanguageMenu => &mut self.header_open,
            OverlayKind::ComposerLanguageMenu => &mut self.composer_open,
        }
    }

    fn is_open(&self, overlay: OverlayKind) -> bool {
        match overlay {
            OverlayKind::HeaderLanguageMenu => self.header_open,
            OverlayKind::ComposerLanguageMenu => self.composer_open,
        }
    }
}

/// Exclusivity and outside-pointer dismissal for menu overlays, plus the
/// transient drag-over flag.
#[derive(Default)]
pub struct OverlayRouter {
    inner: Mutex<OverlayInner>,
}

impl OverlayRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle an overlay; returns the new visibility.
    pub fn toggle(&self, overlay: OverlayKind) -> bool {
        let mut inner = self.inner.lock().expect("overlay mutex poisoned");
        let flag = inner.flag(overlay);
        *flag = !*flag;
        let open = *flag;
        tracing::debug!(overlay = %overlay, open, "Overlay toggled");
        open
    }

    /// Close an overlay; returns true if it was open.
    pub fn close(&self, overlay: OverlayKind) -> bool {
        let mut inner = self.inner.lock().expect("overlay mutex poisoned");
        let flag = inner.flag(overlay);
        let was_open = *flag;
        *flag = false;
        was_open
    }

    pub fn is_open(&self, overlay: OverlayKind) -> bool {
        self.inner
            .lock()
            .expect("overlay mutex poisoned")
            .is_open(overlay)
    }

    /// Number of registered outside-pointer listeners.
    ///
    /// One per open overlay: registered when the overlay opens, unregistered
    /// when it closes or on unmount. Exposed so tests can prove no handler
    /// leaks past an overlay's lifetime.
    pub fn listener_count(&self) -> usize {
        let inner = self.inner.lock().expect("overlay mutex poisoned");
        OverlayKind::all()
            .iter()
            .filter(|o| inner.is_open(**o))
            .count()
    }

    /// Handle a pointer-down and dismiss overlays it landed outside of.
    ///
    /// Returns the overlays that were closed, in declaration order.
    pub fn pointer_down(&self, target: PointerTarget) -> Vec<OverlayKind> {
        let mut inner = self.inner.lock().expect("overlay mutex poisoned");
        let mut closed = Vec::new();
        for overlay in OverlayKind::all() {
            if inner.is_open(overlay) && !target.anchors(overlay) {
                *inner.flag(overlay) = false;
                closed.push(overlay);
            }
        }
        if !closed.is_empty() {
            tracing::debug!(count = closed.len(), "Overlays dismissed by outside pointer");
        }
        closed
    }

    /// A drag entered the drop zone; returns true if the flag changed.
    pub fn drag_over(&self) -> bool {
        let mut inner = self.inner.lock().expect("overlay mutex poisoned");
        let changed = !inner.dragging;
        inner.dragging = true;
        changed
    }

    /// The drag left without dropping; returns true if the flag changed.
    pub fn drag_leave(&self) -> bool {
        let mut inner = self.inner.lock().expect("overlay mutex poisoned");
        let changed = inner.dragging;
        inner.dragging = false;
        changed
    }

    /// A drop completed (with or without a usable payload); returns true if
    /// the flag changed.
    pub fn drop_ended(&self) -> bool {
        self.drag_leave()
    }

    pub fn is_dragging(&self) -> bool {
        self.inner.lock().expect("overlay mutex poisoned").dragging
    }

    /// Tear down all presentation state, as on unmount: overlays close and
    /// their listeners unregister.
    pub fn unmount(&self) {
        let mut inner = self.inner.lock().expect("overlay mutex poisoned");
        inner.header_open = false;
        inner.composer_open = false;
        inner.dragging = false;
    }
}

// =============================================================================
// Tests
// =============================================================================
