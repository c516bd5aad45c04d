use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::app::{App, Field};
use crate::session::Status;

const FORM_WIDTH: u16 = 48;
const FORM_HEIGHT: u16 = 14;
const LABEL_WIDTH: usize = 21;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // the flash covers everything, form included
        if let Some(color) = self.overlay.color() {
            Clear.render(area, buf);
            Block::default()
                .style(Style::default().bg(color.into()))
                .render(area, buf);
            return;
        }

        let controls = self.controls();
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let focus_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

        let form_area = centered(area, FORM_WIDTH, FORM_HEIGHT);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" Focus Flasher ", bold_style))
            .title_alignment(Alignment::Center);
        let inner = block.inner(form_area);
        block.render(form_area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(1)
            .constraints([
                Constraint::Length(Field::ALL.len() as u16),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(2),
                Constraint::Length(2),
            ])
            .split(inner);

        let value_style = |field: Field| {
            if !controls.inputs_enabled {
                dim_style
            } else if self.form.focus == field {
                focus_style
            } else {
                Style::default()
            }
        };

        let fields: Vec<Line> = Field::ALL
            .iter()
            .map(|&field| {
                let label = Span::styled(
                    format!("{:<width$}", field.to_string(), width = LABEL_WIDTH),
                    if controls.inputs_enabled {
                        Style::default()
                    } else {
                        dim_style
                    },
                );
                match self.form.text(field) {
                    Some(text) => {
                        Line::from(vec![label, Span::styled(text.to_string(), value_style(field))])
                    }
                    None => {
                        let color = self.form.color;
                        let name = color
                            .name()
                            .map(|n| format!(" ({n})"))
                            .unwrap_or_default();
                        Line::from(vec![
                            label,
                            Span::styled("  ", Style::default().bg(color.into())),
                            Span::raw(" "),
                            Span::styled(format!("{color}{name}"), value_style(field)),
                        ])
                    }
                }
            })
            .collect();
        Paragraph::new(fields).render(chunks[0], buf);

        let button = |label: &str, enabled: bool, color: Color| {
            let style = if enabled {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                dim_style
            };
            Span::styled(format!("[ {label} ]"), style)
        };
        Paragraph::new(Line::from(vec![
            button("Start Session", controls.start_enabled, Color::Green),
            Span::raw("  "),
            button("Stop Session", controls.stop_enabled, Color::Red),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        let status_style = match self.status {
            Status::Invalid(_) => Style::default().fg(Color::Red),
            Status::Finished => Style::default().fg(Color::Green),
            _ => Style::default().add_modifier(Modifier::ITALIC),
        };
        Paragraph::new(Span::styled(self.status.to_string(), status_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[4], buf);

        let help = if controls.stop_enabled {
            "(esc) stop session"
        } else {
            "(tab) next field  (←/→) color\n(enter) start  (q/esc) quit"
        };
        Paragraph::new(help)
            .style(dim_style.add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
