use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::ui::theme::Theme;
use crate::ui::view::InputView;

/// One line of editable text with a block cursor when focused.
pub fn input_line<'a>(input: &'a InputView, theme: &Theme) -> Line<'a> {
    let colors = &theme.colors;
    let text_style = Style::default().fg(colors.fg());

    if !input.focused {
        let mut text = input.before.clone();
        text.extend(input.cursor);
        text.push_str(&input.after);
        return Line::from(Span::styled(text, Style::default().fg(colors.muted())));
    }

    let cursor_style = Style::default()
        .fg(colors.bg())
        .bg(colors.accent())
        .add_modifier(Modifier::BOLD);
    let cursor = match input.cursor {
        Some(ch) => ch.to_string(),
        None => " ".to_string(),
    };

    Line::from(vec![
        Span::styled(input.before.as_str(), text_style),
        Span::styled(cursor, cursor_style),
        Span::styled(input.after.as_str(), text_style),
    ])
}
