use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::App;
use crate::clock::Clock;
use crate::session::{Phase, TOTAL_DURATION_MS};
use crate::ticker::TickScheduler;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const BUTTON_WIDTH: u16 = 24;
const BUTTON_HEIGHT: u16 = 5;

/// Screen areas shared by the renderer and mouse hit-testing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regions {
    pub title: Rect,
    pub timer: Rect,
    pub clicks: Rect,
    pub button: Rect,
    pub result: Rect,
    pub legend: Rect,
}

pub fn regions(area: Rect) -> Regions {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Fill(1),
                Constraint::Length(1), // title
                Constraint::Length(1),
                Constraint::Length(1), // timer
                Constraint::Length(1), // clicks
                Constraint::Length(1),
                Constraint::Length(BUTTON_HEIGHT),
                Constraint::Length(1),
                Constraint::Length(1), // result
                Constraint::Fill(1),
                Constraint::Length(1), // legend
            ]
            .as_ref(),
        )
        .split(area);

    Regions {
        title: chunks[1],
        timer: chunks[3],
        clicks: chunks[4],
        button: centered(chunks[6], BUTTON_WIDTH),
        result: chunks[8],
        legend: chunks[10],
    }
}

fn centered(row: Rect, width: u16) -> Rect {
    let width = width.min(row.width);
    Rect {
        x: row.x + (row.width - width) / 2,
        width,
        ..row
    }
}

pub fn legend(phase: Phase, tap_key: &str) -> String {
    match phase {
        Phase::Idle => "(enter) start / (esc)ape".to_string(),
        Phase::Running => format!("({tap_key}) tap / (s)tart over / (r)eset / (esc)ape"),
        Phase::Finished => "(s)tart again / (r)eset / (esc)ape".to_string(),
    }
}

impl<C: Clock, S: TickScheduler> Widget for &App<C, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.controller.state();
        let phase = state.phase();
        let regions = regions(area);

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        Paragraph::new(Span::styled(
            format!("tap as fast as you can for {} seconds", TOTAL_DURATION_MS / 1000),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(regions.title, buf);

        let timer_style = match phase {
            Phase::Idle => dim_bold_style,
            Phase::Running => bold_style.fg(Color::Yellow),
            Phase::Finished => bold_style.fg(Color::Red),
        };
        Paragraph::new(Span::styled(
            format!("{} s", state.seconds_remaining_display()),
            timer_style,
        ))
        .alignment(Alignment::Center)
        .render(regions.timer, buf);

        Paragraph::new(Span::styled(
            format!("{} clicks", state.click_count()),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(regions.clicks, buf);

        // the button is drawn disabled outside a live session
        let button_style = if phase == Phase::Running {
            bold_style.fg(Color::Green)
        } else {
            dim_bold_style
        };
        let button = Paragraph::new(vec![Line::default(), Line::from("TAP")])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(button_style),
            )
            .style(button_style)
            .alignment(Alignment::Center);
        button.render(regions.button, buf);

        let result = match state.result() {
            Some(r) => Span::styled(
                format!("{} clicks · {:.2} clicks/s", r.clicks, r.clicks_per_second),
                bold_style.fg(Color::Magenta),
            ),
            None if phase == Phase::Idle => Span::styled("press enter to start", italic_style),
            None => Span::raw(""),
        };
        Paragraph::new(result)
            .alignment(Alignment::Center)
            .render(regions.result, buf);

        Paragraph::new(Span::styled(
            legend(phase, &self.settings.tap_key_label()),
            italic_style,
        ))
        .render(regions.legend, buf);
    }
}
