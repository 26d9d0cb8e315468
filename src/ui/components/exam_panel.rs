use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::ui::components::text_field::input_line;
use crate::ui::layout::wrapped_line_count;
use crate::ui::theme::Theme;
use crate::ui::view::{ExamPanel, ExamView, Feedback, NO_QUESTIONS_MESSAGE};

pub struct ExamWidget<'a> {
    view: &'a ExamView,
    theme: &'a Theme,
}

impl<'a> ExamWidget<'a> {
    pub fn new(view: &'a ExamView, theme: &'a Theme) -> Self {
        Self { view, theme }
    }
}

impl Widget for ExamWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        match self.view {
            ExamView::NoQuestions => {
                let block = Block::bordered()
                    .title(" Exam ")
                    .border_style(Style::default().fg(colors.border()))
                    .style(Style::default().bg(colors.bg()));
                let inner = block.inner(area);
                block.render(area, buf);
                Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled(
                        NO_QUESTIONS_MESSAGE,
                        Style::default().fg(colors.warning()),
                    )),
                ])
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(inner, buf);
            }
            ExamView::Active(panel) => render_active(panel, self.theme, area, buf),
        }
    }
}

fn render_active(panel: &ExamPanel, theme: &Theme, area: Rect, buf: &mut Buffer) {
    let colors = &theme.colors;

    let question_width = area.width.saturating_sub(2) as usize;
    let question_height = (wrapped_line_count(&panel.question, question_width) as u16)
        .min(area.height / 3)
        .max(1)
        + 2;
    let feedback_height = if panel.feedback.is_some() {
        Constraint::Min(4)
    } else {
        Constraint::Length(0)
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(question_height),
            Constraint::Length(3),
            Constraint::Length(1),
            feedback_height,
        ])
        .split(area);

    let mut title = format!(" Question {} ", panel.position);
    if panel.unsubmitted > 0 {
        title.push_str(&format!("| {} unanswered ", panel.unsubmitted));
    }
    let question_block = Block::bordered()
        .title(title)
        .border_style(Style::default().fg(colors.border()))
        .style(Style::default().bg(colors.bg()));
    Paragraph::new(Span::styled(
        panel.question.as_str(),
        Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
    ))
    .wrap(Wrap { trim: false })
    .block(question_block)
    .render(layout[0], buf);

    let (draft_title, draft_border) = if panel.draft_editable {
        (" Your answer ", colors.border_focused())
    } else {
        (" Your answer (submitted) ", colors.border())
    };
    let draft_block = Block::bordered()
        .title(draft_title)
        .border_style(Style::default().fg(draft_border))
        .style(Style::default().bg(colors.bg()));
    Paragraph::new(input_line(&panel.draft, theme))
        .block(draft_block)
        .render(layout[1], buf);

    Paragraph::new(controls_line(panel, theme)).render(layout[2], buf);

    if let Some(feedback) = &panel.feedback {
        render_feedback(feedback, theme, layout[3], buf);
    }
}

fn controls_line<'a>(panel: &ExamPanel, theme: &Theme) -> Line<'a> {
    let colors = &theme.colors;
    let on = Style::default().fg(colors.accent());
    let finish = Style::default()
        .fg(colors.success())
        .add_modifier(Modifier::BOLD);

    let mut spans = Vec::new();
    let mut push = |shown: bool, label: &'static str, style: Style| {
        if shown {
            spans.push(Span::styled(label, style));
            spans.push(Span::raw("  "));
        }
    };
    push(panel.show_previous, " < Previous ", on);
    push(panel.show_submit, " Submit answer ", on);
    push(panel.show_next, " Next > ", on);
    push(panel.show_finish, " Finish exam ", finish);
    Line::from(spans)
}

fn render_feedback(feedback: &Feedback, theme: &Theme, area: Rect, buf: &mut Buffer) {
    let colors = &theme.colors;
    let label = Style::default().fg(colors.muted());

    let block = Block::bordered()
        .title(" Feedback ")
        .border_style(Style::default().fg(colors.accent_dim()))
        .style(Style::default().bg(colors.bg()));

    let mut lines = vec![
        Line::from(Span::styled("Your answer:", label)),
        Line::from(Span::styled(
            feedback.answer.as_str(),
            Style::default().fg(colors.fg()),
        )),
        Line::from(Span::styled("Standard answer:", label)),
        Line::from(Span::styled(
            feedback.standard_answer.as_str(),
            Style::default().fg(colors.success()),
        )),
    ];

    if !feedback.history.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Answer history:",
            label.add_modifier(Modifier::BOLD),
        )));
        for record in &feedback.history {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}  ", record.timestamp), label),
                Span::styled(record.answer.as_str(), Style::default().fg(colors.fg())),
            ]));
        }
    }

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block)
        .render(area, buf);
}
