use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::ui::components::text_field::input_line;
use crate::ui::theme::Theme;
use crate::ui::view::{ConfigView, InputView};

/// Authoring section: two input fields above the question list.
pub struct QuestionPanel<'a> {
    view: &'a ConfigView,
    theme: &'a Theme,
}

impl<'a> QuestionPanel<'a> {
    pub fn new(view: &'a ConfigView, theme: &'a Theme) -> Self {
        Self { view, theme }
    }

    fn render_field(&self, title: &str, input: &InputView, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let border = if input.focused {
            colors.border_focused()
        } else {
            colors.border()
        };
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        Paragraph::new(input_line(input, self.theme))
            .block(block)
            .render(area, buf);
    }
}

impl Widget for QuestionPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(4),
            ])
            .split(area);

        self.render_field(" Question ", &self.view.question_input, layout[0], buf);
        self.render_field(" Standard answer ", &self.view.answer_input, layout[1], buf);

        let border = if self.view.list_focused {
            colors.border_focused()
        } else {
            colors.border()
        };
        let title = format!(
            " Questions ({}) | history for {} ",
            self.view.count, self.view.history_keys
        );
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(layout[2]);
        block.render(layout[2], buf);

        if let Some(message) = self.view.empty_message {
            Paragraph::new(Line::from(Span::styled(
                message,
                Style::default().fg(colors.muted()),
            )))
            .wrap(Wrap { trim: false })
            .render(inner, buf);
            return;
        }

        // Two lines per row; keep the selected row on screen.
        let visible = (inner.height / 2).max(1) as usize;
        let selected = self.view.rows.iter().position(|r| r.selected).unwrap_or(0);
        let start = (selected + 1).saturating_sub(visible);

        let mut lines = Vec::new();
        for row in self.view.rows.iter().skip(start).take(visible) {
            let (question_style, answer_style) = if row.selected {
                (
                    Style::default()
                        .fg(colors.accent())
                        .bg(colors.selected_bg())
                        .add_modifier(Modifier::BOLD),
                    Style::default().fg(colors.fg()).bg(colors.selected_bg()),
                )
            } else {
                (
                    Style::default().fg(colors.fg()),
                    Style::default().fg(colors.muted()),
                )
            };
            let indicator = if row.selected { ">" } else { " " };
            lines.push(Line::from(Span::styled(
                format!("{indicator} #{}: {}", row.number, row.question),
                question_style,
            )));
            lines.push(Line::from(Span::styled(
                format!("    standard answer: {}", row.answer),
                answer_style,
            )));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
