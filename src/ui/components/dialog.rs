use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use crate::ui::components::text_field::input_line;
use crate::ui::layout::centered_rect;
use crate::ui::theme::Theme;
use crate::ui::view::PromptView;

/// Yes/no overlay for destructive actions.
pub struct ConfirmDialog<'a> {
    message: &'a str,
    theme: &'a Theme,
}

impl<'a> ConfirmDialog<'a> {
    pub fn new(message: &'a str, theme: &'a Theme) -> Self {
        Self { message, theme }
    }
}

impl Widget for ConfirmDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let popup = centered_rect(50, 30, area);
        Clear.render(popup, buf);

        let block = Block::bordered()
            .title(" Confirm ")
            .border_style(Style::default().fg(colors.warning()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(self.message, Style::default().fg(colors.fg()))),
            Line::from(""),
            Line::from(Span::styled(
                "[y] Yes   [n] No",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block)
        .render(popup, buf);
    }
}

/// File path prompt shown while choosing an import file.
pub struct PromptDialog<'a> {
    view: &'a PromptView,
    theme: &'a Theme,
}

impl<'a> PromptDialog<'a> {
    pub fn new(view: &'a PromptView, theme: &'a Theme) -> Self {
        Self { view, theme }
    }
}

impl Widget for PromptDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let popup = centered_rect(70, 20, area);
        Clear.render(popup, buf);

        let block = Block::bordered()
            .title(self.view.title)
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));

        let status = if self.view.completion_error {
            Span::styled(
                "Could not list that directory.",
                Style::default().fg(colors.error()),
            )
        } else {
            Span::styled(
                "A JSON file previously exported from quizr.",
                Style::default().fg(colors.muted()),
            )
        };

        Paragraph::new(vec![
            Line::from(""),
            input_line(&self.view.input, self.theme),
            Line::from(""),
            Line::from(status),
        ])
        .block(block)
        .render(popup, buf);
    }
}
