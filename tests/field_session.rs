//! Runtime session: a focused tag field driven through the event loop.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tagfield::{
    default_field_keybindings_handle, Component, TagField, TagFieldTheme, Terminal, TUI,
};

#[derive(Clone)]
struct ScriptTerminal {
    written: Arc<Mutex<String>>,
}

impl ScriptTerminal {
    fn new() -> Self {
        Self {
            written: Arc::new(Mutex::new(String::new())),
        }
    }

    fn output(&self) -> String {
        self.written.lock().expect("written lock poisoned").clone()
    }
}

impl Terminal for ScriptTerminal {
    fn start(
        &mut self,
        _on_input: Box<dyn FnMut(String) + Send>,
        _on_resize: Box<dyn FnMut() + Send>,
    ) -> std::io::Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}

    fn write(&mut self, data: &str) {
        self.written
            .lock()
            .expect("written lock poisoned")
            .push_str(data);
    }

    fn columns(&self) -> u16 {
        60
    }

    fn rows(&self) -> u16 {
        20
    }
}

fn new_session() -> (TUI<ScriptTerminal>, ScriptTerminal, Rc<RefCell<Box<dyn Component>>>) {
    let terminal = ScriptTerminal::new();
    let field = TagField::new(
        vec!["React".to_string(), "CSS".to_string()],
        default_field_keybindings_handle(),
        TagFieldTheme::default(),
    );
    let root: Rc<RefCell<Box<dyn Component>>> = Rc::new(RefCell::new(Box::new(field)));
    let mut tui = TUI::new(terminal.clone(), Rc::clone(&root));
    tui.set_focus(Rc::clone(&root));
    (tui, terminal, root)
}

#[test]
fn typed_text_and_committed_segments_reach_the_screen() {
    let (mut tui, terminal, _root) = new_session();
    tui.start().expect("start failed");
    tui.run_once();

    for ch in ["h", "i"] {
        tui.handle_input(ch);
    }
    tui.run_once();
    assert!(terminal.output().contains("hi"));

    tui.handle_input("\r");
    tui.run_once();
    // Cursor at end: the split-before half and the full buffer both land.
    let output = terminal.output();
    assert!(output.contains("hi hi"));

    tui.stop().expect("stop failed");
}

#[test]
fn suggestion_row_and_inserted_pill_render() {
    let (mut tui, terminal, _root) = new_session();
    tui.start().expect("start failed");
    tui.run_once();
    assert!(terminal.output().contains("Suggested: [React] [CSS]"));

    tui.handle_input("\t");
    tui.handle_input("\r");
    tui.run_once();
    assert!(terminal.output().contains("[ React ]✕"));

    tui.stop().expect("stop failed");
}

#[test]
fn focused_field_reports_a_cursor_row_inside_the_border() {
    let (mut tui, _terminal, root) = new_session();
    tui.start().expect("start failed");
    tui.run_once();

    let pos = {
        let mut root = root.borrow_mut();
        root.render(60);
        root.cursor_pos().expect("cursor position missing")
    };
    assert_eq!(pos.row, 1);
    assert_eq!(pos.col, 2);

    tui.stop().expect("stop failed");
}
