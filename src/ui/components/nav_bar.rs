use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;
use crate::ui::view::NavTab;

pub struct NavBar<'a> {
    tabs: &'a [NavTab],
    theme: &'a Theme,
}

impl<'a> NavBar<'a> {
    pub fn new(tabs: &'a [NavTab], theme: &'a Theme) -> Self {
        Self { tabs, theme }
    }
}

impl Widget for NavBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.header_bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut spans = vec![Span::styled(
            " quizr ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        )];

        for tab in self.tabs {
            spans.push(Span::raw("  "));
            let style = if tab.active {
                Style::default()
                    .fg(colors.bg())
                    .bg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.muted())
            };
            spans.push(Span::styled(format!(" [{}] {} ", tab.key, tab.label), style));
        }

        Paragraph::new(Line::from(spans)).render(inner, buf);
    }
}
