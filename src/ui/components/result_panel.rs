use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::ui::theme::Theme;
use crate::ui::view::ResultView;

pub struct ResultPanel<'a> {
    view: &'a ResultView,
    theme: &'a Theme,
}

impl<'a> ResultPanel<'a> {
    pub fn new(view: &'a ResultView, theme: &'a Theme) -> Self {
        Self { view, theme }
    }
}

impl Widget for ResultPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let label = Style::default().fg(colors.muted());
        let text = Style::default().fg(colors.fg());

        let block = Block::bordered()
            .title(" Results ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));

        let mut lines = vec![
            Line::from(Span::styled(
                self.view.summary.as_str(),
                Style::default()
                    .fg(colors.success())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        for entry in &self.view.blocks {
            lines.push(Line::from(Span::styled(
                entry.title.as_str(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(vec![
                Span::styled("  This attempt:    ", label),
                Span::styled(entry.answer.as_str(), text),
            ]));
            lines.push(Line::from(vec![
                Span::styled("  Standard answer: ", label),
                Span::styled(
                    entry.standard_answer.as_str(),
                    Style::default().fg(colors.success()),
                ),
            ]));
            if let Some(title) = &entry.history_title {
                lines.push(Line::from(Span::styled(format!("  {title}:"), label)));
                for record in &entry.history {
                    lines.push(Line::from(vec![
                        Span::styled(format!("    {}  ", record.timestamp), label),
                        Span::styled(record.answer.as_str(), text),
                    ]));
                }
            }
            lines.push(Line::from(""));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.view.scroll, 0))
            .block(block)
            .render(area, buf);
    }
}
