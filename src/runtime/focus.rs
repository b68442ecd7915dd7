//! Focus tracking and event delivery to the focused component.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::component::Component;
use crate::core::input_event::InputEvent;

/// Shared handle to a boxed component, as stored by the runtime.
pub type ComponentRc = Rc<RefCell<Box<dyn Component>>>;

/// Tracks which component currently receives input.
///
/// Focus changes flip the `Focusable` flag on the outgoing and incoming
/// components so widgets can restyle themselves (for example, show or hide
/// their software cursor).
#[derive(Default)]
pub struct FocusState {
    focused: Option<ComponentRc>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move focus to `target`. Refocusing the current target is a no-op.
    pub fn focus(&mut self, target: ComponentRc) {
        if let Some(current) = self.focused.as_ref() {
            if Rc::ptr_eq(current, &target) {
                return;
            }
        }
        self.blur();

        if let Some(focusable) = target.borrow_mut().as_focusable() {
            focusable.set_focused(true);
        }
        self.focused = Some(target);
    }

    /// Drop focus, notifying the outgoing component.
    pub fn blur(&mut self) {
        if let Some(previous) = self.focused.take() {
            if let Some(focusable) = previous.borrow_mut().as_focusable() {
                focusable.set_focused(false);
            }
        }
    }

    pub fn focused(&self) -> Option<ComponentRc> {
        self.focused.as_ref().map(Rc::clone)
    }

    /// Whether the focused component opted into key-release events.
    pub fn wants_key_release(&self) -> bool {
        self.focused
            .as_ref()
            .map(|component| component.borrow().wants_key_release())
            .unwrap_or(false)
    }

    /// Deliver `event` to the focused component. Returns false when nothing
    /// has focus.
    pub fn dispatch(&self, event: &InputEvent) -> bool {
        let Some(component) = self.focused.as_ref() else {
            return false;
        };
        component.borrow_mut().handle_event(event);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{ComponentRc, FocusState};
    use crate::core::component::{Component, Focusable};
    use crate::core::input::KeyEventType;
    use crate::core::input_event::InputEvent;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Probe {
        focused: bool,
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl Component for Probe {
        fn render(&mut self, _width: usize) -> Vec<String> {
            Vec::new()
        }

        fn handle_event(&mut self, event: &InputEvent) {
            if let InputEvent::Key { key_id, .. } = event {
                self.seen.borrow_mut().push(key_id.clone());
            }
        }

        fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
            Some(self)
        }
    }

    impl Focusable for Probe {
        fn set_focused(&mut self, focused: bool) {
            self.focused = focused;
        }

        fn is_focused(&self) -> bool {
            self.focused
        }
    }

    fn probe() -> ComponentRc {
        Rc::new(RefCell::new(Box::new(Probe::default())))
    }

    fn is_focused(handle: &ComponentRc) -> bool {
        handle
            .borrow_mut()
            .as_focusable()
            .map(|focusable| focusable.is_focused())
            .unwrap_or(false)
    }

    #[test]
    fn focus_moves_between_components() {
        let mut focus = FocusState::new();
        let first = probe();
        let second = probe();

        focus.focus(Rc::clone(&first));
        assert!(is_focused(&first));
        assert!(!is_focused(&second));

        focus.focus(Rc::clone(&second));
        assert!(!is_focused(&first));
        assert!(is_focused(&second));

        focus.blur();
        assert!(!is_focused(&second));
        assert!(focus.focused().is_none());
    }

    #[test]
    fn dispatch_reaches_only_the_focused_component() {
        let mut focus = FocusState::new();
        let event = InputEvent::Key {
            raw: "\r".to_string(),
            key_id: "enter".to_string(),
            event_type: KeyEventType::Press,
        };

        assert!(!focus.dispatch(&event));

        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let target: ComponentRc = Rc::new(RefCell::new(Box::new(Probe {
            focused: false,
            seen: Rc::clone(&seen),
        })));
        focus.focus(Rc::clone(&target));
        assert!(focus.dispatch(&event));
        assert_eq!(seen.borrow().as_slice(), ["enter"]);
    }
}
