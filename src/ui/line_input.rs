use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResult {
    /// Key consumed without changing the text (cursor movement, completion
    /// with no candidates, ignored keys).
    Continue,
    Changed,
    Submit,
    Cancel,
}

/// Single-line editor used for the authoring fields, the answer draft and
/// the import path prompt. Path inputs also tab-complete file names.
pub struct LineInput {
    text: String,
    /// Cursor position as a char index (0 = before first char).
    cursor: usize,
    path_completion: bool,
    completions: Vec<String>,
    completion_index: Option<usize>,
    /// True if the last directory read failed.
    pub completion_error: bool,
}

impl LineInput {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
            path_completion: false,
            completions: Vec::new(),
            completion_index: None,
            completion_error: false,
        }
    }

    pub fn path(text: &str) -> Self {
        Self {
            path_completion: true,
            ..Self::new(text)
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace the whole text and park the cursor at the end.
    pub fn set(&mut self, text: &str) {
        self.reset_completion();
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.set("");
    }

    /// Returns (before_cursor, cursor_char, after_cursor) for styled rendering.
    /// When cursor is at end of text, cursor_char is None.
    pub fn render_parts(&self) -> (&str, Option<char>, &str) {
        let byte_offset = self.char_to_byte(self.cursor);
        match self.text[byte_offset..].chars().next() {
            Some(ch) => {
                let next_byte = byte_offset + ch.len_utf8();
                (&self.text[..byte_offset], Some(ch), &self.text[next_byte..])
            }
            None => (&self.text, None, ""),
        }
    }

    pub fn handle(&mut self, key: KeyEvent) -> InputResult {
        let before = self.text.clone();
        match key.code {
            KeyCode::Esc => return InputResult::Cancel,
            KeyCode::Enter => return InputResult::Submit,
            KeyCode::Tab if self.path_completion => {
                self.tab_complete();
                return self.change_since(&before);
            }
            _ => {}
        }

        self.reset_completion();
        match key.code {
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.text.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.chars().count(),
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.remove_char_at(self.cursor);
            }
            KeyCode::Delete => self.remove_char_at(self.cursor),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.text.clear();
                self.cursor = 0;
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let byte_offset = self.char_to_byte(self.cursor);
                self.text.insert(byte_offset, ch);
                self.cursor += 1;
            }
            _ => {}
        }
        self.change_since(&before)
    }

    fn change_since(&self, before: &str) -> InputResult {
        if self.text != before {
            InputResult::Changed
        } else {
            InputResult::Continue
        }
    }

    /// Convert char index to byte offset.
    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    fn remove_char_at(&mut self, char_idx: usize) {
        let byte_offset = self.char_to_byte(char_idx);
        if let Some(ch) = self.text[byte_offset..].chars().next() {
            self.text
                .replace_range(byte_offset..byte_offset + ch.len_utf8(), "");
        }
    }

    fn reset_completion(&mut self) {
        self.completions.clear();
        self.completion_index = None;
        self.completion_error = false;
    }

    /// First Tab lists matches for the text before the last separator,
    /// further presses cycle through them.
    fn tab_complete(&mut self) {
        if self.cursor < self.text.chars().count() {
            return;
        }
        let next = match self.completion_index {
            Some(idx) => (idx + 1) % self.completions.len(),
            None => {
                self.completion_error = false;
                self.completions = self.build_completions();
                if self.completions.is_empty() {
                    return;
                }
                0
            }
        };
        self.completion_index = Some(next);
        self.text = self.completions[next].clone();
        self.cursor = self.text.chars().count();
    }

    /// Directories first, then `.json` files, then the rest. Hidden entries
    /// only match a partial name starting with a dot.
    fn build_completions(&mut self) -> Vec<String> {
        let seed = self.text.clone();
        let (dir_str, partial) = match seed.rfind(['/', '\\']) {
            Some(pos) => (&seed[..=pos], &seed[pos + 1..]),
            None => ("", seed.as_str()),
        };

        // ~ is expanded for the read only; the completed text keeps it.
        let read_dir = match dir_str.strip_prefix('~') {
            Some(rest) => match dirs::home_dir() {
                Some(home) => format!("{}{rest}", home.to_string_lossy()),
                None => dir_str.to_string(),
            },
            None if dir_str.is_empty() => ".".to_string(),
            None => dir_str.to_string(),
        };
        let entries = match std::fs::read_dir(&read_dir) {
            Ok(entries) => entries,
            Err(_) => {
                self.completion_error = true;
                return Vec::new();
            }
        };

        let sep = std::path::MAIN_SEPARATOR;
        let mut candidates: Vec<(u8, String)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.starts_with(partial) || (name.starts_with('.') && !partial.starts_with('.'))
                {
                    return None;
                }
                let is_dir = entry.file_type().is_ok_and(|ft| ft.is_dir());
                Some(if is_dir {
                    (0, format!("{dir_str}{name}{sep}"))
                } else if name.ends_with(".json") {
                    (1, format!("{dir_str}{name}"))
                } else {
                    (2, format!("{dir_str}{name}"))
                })
            })
            .collect();
        candidates.sort();
        candidates.into_iter().map(|(_, path)| path).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_insert_at_start_middle_end() {
        let mut input = LineInput::new("ac");
        assert_eq!(input.handle(key(KeyCode::Char('d'))), InputResult::Changed);
        assert_eq!(input.value(), "acd");

        input.handle(key(KeyCode::Home));
        input.handle(key(KeyCode::Char('z')));
        assert_eq!(input.value(), "zacd");
        assert_eq!(input.cursor, 1);

        input.handle(key(KeyCode::Right));
        input.handle(key(KeyCode::Char('b')));
        assert_eq!(input.value(), "zabcd");
        assert_eq!(input.cursor, 3);
    }

    #[test]
    fn test_multibyte_text_edits_by_char() {
        let mut input = LineInput::new("答案");
        assert_eq!(input.handle(key(KeyCode::Backspace)), InputResult::Changed);
        assert_eq!(input.value(), "答");
        input.handle(key(KeyCode::Char('题')));
        assert_eq!(input.value(), "答题");
    }

    #[test]
    fn test_backspace_and_delete_at_boundaries() {
        let mut input = LineInput::new("ab");
        input.handle(key(KeyCode::Backspace));
        input.handle(key(KeyCode::Backspace));
        assert_eq!(input.value(), "");
        assert_eq!(input.handle(key(KeyCode::Backspace)), InputResult::Continue);
        assert_eq!(input.cursor, 0);

        input.set("ab");
        input.handle(key(KeyCode::Home));
        input.handle(key(KeyCode::Delete));
        assert_eq!(input.value(), "b");
        input.handle(key(KeyCode::End));
        assert_eq!(input.handle(key(KeyCode::Delete)), InputResult::Continue);
    }

    #[test]
    fn test_ctrl_u_clears_and_cursor_moves_are_not_changes() {
        let mut input = LineInput::new("hello");
        assert_eq!(input.handle(key(KeyCode::Home)), InputResult::Continue);
        assert_eq!(input.handle(key(KeyCode::Left)), InputResult::Continue);
        assert_eq!(input.cursor, 0);

        let ctrl_u = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(input.handle(ctrl_u), InputResult::Changed);
        assert_eq!(input.value(), "");
        assert_eq!(input.handle(ctrl_u), InputResult::Continue);
    }

    #[test]
    fn test_tab_is_ignored_on_plain_input() {
        let mut input = LineInput::new("/");
        assert_eq!(input.handle(key(KeyCode::Tab)), InputResult::Continue);
        assert_eq!(input.value(), "/");
        assert!(input.completions.is_empty());
    }

    #[test]
    fn test_submit_and_cancel() {
        let mut input = LineInput::new("test");
        assert_eq!(input.handle(key(KeyCode::Enter)), InputResult::Submit);
        assert_eq!(input.handle(key(KeyCode::Esc)), InputResult::Cancel);
    }

    #[test]
    fn test_set_and_clear() {
        let mut input = LineInput::new("draft");
        input.set("other");
        assert_eq!(input.value(), "other");
        assert_eq!(input.cursor, 5);
        input.clear();
        assert!(input.is_blank());
    }

    #[test]
    fn test_render_parts_positions() {
        let mut input = LineInput::new("abc");
        assert_eq!(input.render_parts(), ("abc", None, ""));
        input.cursor = 1;
        assert_eq!(input.render_parts(), ("a", Some('b'), "c"));
        input.cursor = 0;
        assert_eq!(input.render_parts(), ("", Some('a'), "bc"));
    }

    #[test]
    fn test_path_completion_ranks_and_cycles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::write(dir.path().join("quiz_questions_2024-01-01.json"), "").unwrap();
        std::fs::write(dir.path().join(".hidden.json"), "").unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();
        let path = format!("{}/", dir.path().display());

        let mut input = LineInput::path(&path);
        assert_eq!(input.handle(key(KeyCode::Tab)), InputResult::Changed);
        assert_eq!(input.completions.len(), 3);
        assert!(input.value().ends_with("archive/"));

        input.handle(key(KeyCode::Tab));
        assert!(input.value().ends_with("quiz_questions_2024-01-01.json"));
        input.handle(key(KeyCode::Tab));
        assert!(input.value().ends_with("notes.txt"));
        input.handle(key(KeyCode::Tab));
        assert!(input.value().ends_with("archive/"));
    }

    #[test]
    fn test_path_completion_error_on_bad_dir() {
        let mut input = LineInput::path("/nonexistent_zzz_dir/");
        assert_eq!(input.handle(key(KeyCode::Tab)), InputResult::Continue);
        assert!(input.completion_error);
        assert!(input.completion_index.is_none());

        input.handle(key(KeyCode::Char('x')));
        assert!(!input.completion_error);
    }
}
