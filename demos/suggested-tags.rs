use std::cell::RefCell;
use std::rc::Rc;

use tagfield::core::component::{Component, Focusable};
use tagfield::{
    default_field_keybindings_handle, InputEvent, ProcessTerminal, TagField, TagFieldTheme, Text,
    TUI,
};

const HEADER_TEXT: &str = "Add tags for your post. Type free text and press Enter to commit it; \
Tab cycles the suggestions and Enter inserts the highlighted one. Alt+Left/Right selects a tag \
pill, Delete removes it, Backspace removes a trailing tag. Press Ctrl+C to exit.";

const SUGGESTIONS: [&str; 5] = ["React", "Next.js", "Tailwind", "JavaScript", "CSS"];

// SGR on/off pairs used by the demo theme.
type Style = (&'static str, &'static str);

const DIM: Style = ("\x1b[2m", "\x1b[22m");
const BOLD: Style = ("\x1b[1m", "\x1b[22m");
const CYAN: Style = ("\x1b[36m", "\x1b[39m");
const INVERSE: Style = ("\x1b[7m", "\x1b[27m");
const RED: Style = ("\x1b[31m", "\x1b[39m");
const CYAN_PILL: Style = ("\x1b[46m\x1b[30m", "\x1b[39m\x1b[49m");

fn styled(style: Style) -> Box<dyn Fn(&str) -> String> {
    Box::new(move |text| format!("{}{text}{}", style.0, style.1))
}

fn layered(outer: Style, inner: Style) -> Box<dyn Fn(&str) -> String> {
    Box::new(move |text| format!("{}{}{text}{}{}", outer.0, inner.0, inner.1, outer.1))
}

fn field_theme() -> TagFieldTheme {
    TagFieldTheme {
        border: styled(DIM),
        pill: styled(CYAN_PILL),
        selected_pill: layered(INVERSE, CYAN_PILL),
        dismiss: styled(RED),
        suggestion: styled(CYAN),
        highlighted_suggestion: layered(INVERSE, BOLD),
        heading: styled(DIM),
    }
}

struct TagApp {
    header: Text,
    field: Rc<RefCell<TagField>>,
    field_row_offset: std::cell::Cell<usize>,
}

impl Component for TagApp {
    fn render(&mut self, width: usize) -> Vec<String> {
        let mut lines = self.header.render(width);
        let header_rows = lines.len();
        let mut field = self.field.borrow_mut();
        lines.extend(field.render(width));
        drop(field);
        self.field_row_offset.set(header_rows);
        lines
    }

    fn invalidate(&mut self) {
        self.header.invalidate();
        self.field.borrow_mut().invalidate();
    }

    fn cursor_pos(&self) -> Option<tagfield::CursorPos> {
        let offset = self.field_row_offset.get();
        self.field.borrow().cursor_pos().map(|pos| tagfield::CursorPos {
            row: pos.row + offset,
            col: pos.col,
        })
    }
}

struct FieldWrapper {
    field: Rc<RefCell<TagField>>,
    exit_flag: Rc<RefCell<bool>>,
}

impl Component for FieldWrapper {
    fn render(&mut self, width: usize) -> Vec<String> {
        self.field.borrow_mut().render(width)
    }

    fn handle_event(&mut self, event: &InputEvent) {
        if matches!(event, InputEvent::Key { key_id, .. } if key_id == "ctrl+c") {
            *self.exit_flag.borrow_mut() = true;
            return;
        }
        self.field.borrow_mut().handle_event(event);
    }

    fn invalidate(&mut self) {
        self.field.borrow_mut().invalidate();
    }

    fn wants_key_release(&self) -> bool {
        self.field.borrow().wants_key_release()
    }

    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }
}

impl Focusable for FieldWrapper {
    fn set_focused(&mut self, focused: bool) {
        self.field.borrow_mut().set_focused(focused);
    }

    fn is_focused(&self) -> bool {
        self.field.borrow().is_focused()
    }
}

#[derive(Default)]
struct EmptyRoot;

impl Component for EmptyRoot {
    fn render(&mut self, _width: usize) -> Vec<String> {
        Vec::new()
    }
}

fn main() -> std::io::Result<()> {
    let terminal = ProcessTerminal::new();
    let root: Rc<RefCell<Box<dyn Component>>> = Rc::new(RefCell::new(Box::new(EmptyRoot)));
    let mut tui = TUI::new(terminal, Rc::clone(&root));

    let field = Rc::new(RefCell::new(TagField::new(
        SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        default_field_keybindings_handle(),
        field_theme(),
    )));

    let app = TagApp {
        header: Text::new(HEADER_TEXT),
        field: Rc::clone(&field),
        field_row_offset: std::cell::Cell::new(0),
    };
    *root.borrow_mut() = Box::new(app);

    let exit_flag = Rc::new(RefCell::new(false));
    let wrapper: Rc<RefCell<Box<dyn Component>>> = Rc::new(RefCell::new(Box::new(FieldWrapper {
        field: Rc::clone(&field),
        exit_flag: Rc::clone(&exit_flag),
    })));
    tui.set_focus(wrapper);

    tui.start()?;

    loop {
        tui.run_blocking_once();

        if *exit_flag.borrow() {
            break;
        }
    }

    tui.stop()?;
    Ok(())
}
