//! Typing indicator tracker
//!
//! 只在状态翻转时产生事件，按键不会刷屏。

/// Edge-triggered typing state
#[derive(Debug, Default)]
pub struct TypingTracker {
    is_typing: bool,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the current input state; returns the value to send when
    /// it changed, None when nothing needs to go out.
    pub fn update(&mut self, typing: bool) -> Option<bool> {
        if typing == self.is_typing {
            return None;
        }
        self.is_typing = typing;
        Some(typing)
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    /// Force back to idle (e.g. after sending a message)
    pub fn clear(&mut self) -> Option<bool> {
        self.update(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transitions_emit() {
        let mut tracker = TypingTracker::new();
        assert_eq!(tracker.update(true), Some(true));
        assert_eq!(tracker.update(true), None);
        assert_eq!(tracker.update(true), None);
        assert_eq!(tracker.update(false), Some(false));
        assert_eq!(tracker.update(false), None);
    }

    #[test]
    fn test_clear_after_send() {
        let mut tracker = TypingTracker::new();
        tracker.update(true);
        assert_eq!(tracker.clear(), Some(false));
        assert_eq!(tracker.clear(), None);
    }
}
