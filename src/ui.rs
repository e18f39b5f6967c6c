pub mod charting;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::celebration::Confetti;
use crate::history_chart::CHART_TITLE;
use crate::session::{CharState, Phase};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const LEGEND: &str = "(tab) language / (shift+tab) duration / (alt+1..4) 15·30·60·120s / (ctrl+r) reset / (ctrl+g) history / (ctrl+k) clear data / (esc) quit";

/// Draw the screen for the app's current state
pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

pub fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let passage_lines = ((session.passage().width() as f64 / max_chars_per_line as f64).ceil()
        as u16)
        .max(1)
        + 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // live readouts
            Constraint::Length(1), // language / duration
            Constraint::Min(1),
            Constraint::Length(passage_lines),
            Constraint::Length(1), // start hint
            Constraint::Min(1),
            Constraint::Length(1), // status message
            Constraint::Length(2), // legend
        ])
        .split(area);

    let live = session.live();
    let readouts = Paragraph::new(Line::from(vec![
        Span::styled(format!("{} wpm", live.wpm), bold_style),
        Span::raw("   "),
        Span::styled(format!("{}% acc", live.accuracy), bold_style),
        Span::raw("   "),
        Span::styled(format!("{} errors", live.errors), bold_style),
        Span::raw("   "),
        Span::styled(
            format!("{}s", session.remaining_secs()),
            Style::default().patch(bold_style).fg(Color::Magenta),
        ),
    ]))
    .alignment(Alignment::Center);
    readouts.render(chunks[0], buf);

    let settings = Paragraph::new(Span::styled(
        format!(
            "language: {}   duration: {}s",
            app.settings.language, app.settings.duration_secs
        ),
        dim_style,
    ))
    .alignment(Alignment::Center);
    settings.render(chunks[1], buf);

    Paragraph::new(Line::from(passage_spans(app)))
        .wrap(Wrap { trim: false })
        .render(chunks[3], buf);

    let hint = match session.phase() {
        Phase::Idle => Some("start typing to begin the test"),
        Phase::Ended => Some("test over: (ctrl+r) for a new one"),
        Phase::Running => None,
    };
    if let Some(hint) = hint {
        Paragraph::new(Span::styled(hint, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }

    if let Some(status) = &app.status {
        Paragraph::new(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
    }

    Paragraph::new(Span::styled(LEGEND, italic_style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[7], buf);
}

/// One span per passage character, styled by its classification
fn passage_spans(app: &App) -> Vec<Span<'static>> {
    let session = &app.session;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);

    let cursor = match session.phase() {
        Phase::Ended => None,
        _ => session.cursor(),
    };

    session
        .passage_chars()
        .iter()
        .zip(session.char_states())
        .enumerate()
        .map(|(idx, (&ch, state))| {
            let (text, mut style) = match state {
                CharState::Correct => (ch.to_string(), green_bold_style),
                CharState::Incorrect => (
                    match ch {
                        ' ' => "·".to_owned(),
                        c => c.to_string(),
                    },
                    red_bold_style,
                ),
                CharState::Untyped => (ch.to_string(), dim_bold_style),
            };
            if Some(idx) == cursor {
                style = style.add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);
            }
            Span::styled(text, style)
        })
        .collect()
}

pub fn render_results_overlay(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(overlay) = &app.overlay else {
        return;
    };

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let summary = &overlay.summary;

    let mut lines = Vec::new();
    if overlay.is_new_best() {
        lines.push(Line::from(Span::styled(
            "★ New personal best! ★",
            Style::default()
                .patch(bold_style)
                .fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("{} wpm", summary.wpm),
        Style::default().patch(bold_style).fg(Color::Magenta),
    )));
    lines.push(Line::from(format!(
        "{} cpm   {:.2} kps   {}% acc   {} errors",
        summary.cpm, summary.kps, summary.accuracy, summary.errors
    )));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!(
            "Best runs ({}, {}s)",
            overlay.record.language, overlay.record.duration
        ),
        bold_style,
    )));
    lines.extend(overlay.top_runs.iter().map(|l| Line::from(l.clone())));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "(n)ew test / (c)lose / (g)raph",
        Style::default().add_modifier(Modifier::ITALIC),
    )));

    let height = (lines.len() as u16 + 2).min(area.height);
    let popup = centered_rect(60, height, area);

    Clear.render(popup, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Results"))
        .render(popup, buf);
}

pub fn render_confirm_clear(area: Rect, buf: &mut Buffer) {
    let popup = centered_rect(50, 5, area);
    Clear.render(popup, buf);
    Paragraph::new(vec![
        Line::from("Clear saved personal bests and settings?"),
        Line::from(Span::styled(
            "(y)es / any other key cancels",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Confirm"))
    .render(popup, buf);
}

pub fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    match &app.progress {
        Some(series) => {
            let (x_max, y_max) = charting::compute_chart_bounds(series);
            let (first_label, last_label) = charting::x_axis_labels(series);
            let points = series.points();

            let datasets = vec![Dataset::default()
                .name("WPM")
                .marker(Marker::Braille)
                .style(Style::default().fg(Color::Magenta))
                .graph_type(GraphType::Line)
                .data(&points)];

            Chart::new(datasets)
                .block(Block::default().borders(Borders::ALL).title(CHART_TITLE))
                .x_axis(
                    Axis::default()
                        .title("run")
                        .bounds([1.0, x_max])
                        .labels(vec![
                            Span::styled(first_label, bold_style),
                            Span::styled(last_label, bold_style),
                        ]),
                )
                .y_axis(
                    Axis::default()
                        .title("wpm")
                        .bounds([0.0, y_max])
                        .labels(vec![
                            Span::styled("0", bold_style),
                            Span::styled(charting::format_label(y_max), bold_style),
                        ]),
                )
                .render(chunks[0], buf);
        }
        None => {
            Paragraph::new("No history yet.\nFinish a test to start tracking your progress!")
                .block(Block::default().borders(Borders::ALL).title(CHART_TITLE))
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .render(chunks[0], buf);
        }
    }

    Paragraph::new(Span::styled(
        "(esc) back",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[1], buf);
}

/// Render confetti pieces on top of the results screen
pub fn render_confetti(confetti: &Confetti, area: Rect, buf: &mut Buffer) {
    if !confetti.is_active {
        return;
    }

    let colors = [
        Color::Red,
        Color::LightRed,
        Color::Yellow,
        Color::Green,
        Color::Cyan,
        Color::Blue,
    ];

    for piece in &confetti.pieces {
        if piece.x < 0.0 || piece.y < 0.0 {
            continue;
        }
        let x = piece.x as u16;
        let y = piece.y as u16;

        if x < area.width && y < area.height {
            let style = Style::default()
                .fg(colors[piece.color_index % colors.len()])
                .add_modifier(Modifier::BOLD);

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&piece.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}

/// Rectangle `percent_x` wide and `height` rows tall, centered in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (area.width as u32 * percent_x as u32 / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Instant;

    fn render(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn app(prompt: &str) -> App {
        App::new(Box::new(MemoryStore::new()), Some(prompt.to_string()))
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), Instant::now());
        }
    }

    #[test]
    fn test_typing_screen_shows_passage_and_readouts() {
        let app = app("hello world");
        let rendered = render(&app, 100, 24);

        assert!(rendered.contains("hello world"));
        assert!(rendered.contains("0 wpm"));
        assert!(rendered.contains("100% acc"));
        assert!(rendered.contains("60s"));
        assert!(rendered.contains("start typing"));
    }

    #[test]
    fn test_incorrect_space_is_made_visible() {
        let mut app = app("a b");
        type_str(&mut app, "ax");
        let rendered = render(&app, 100, 24);
        assert!(rendered.contains("a·b"));
    }

    #[test]
    fn test_results_overlay_rendered() {
        let mut app = app("cat");
        type_str(&mut app, "cat");
        let rendered = render(&app, 100, 30);

        assert!(rendered.contains("Results"));
        assert!(rendered.contains("1 wpm"));
        assert!(rendered.contains("Best runs (english, 60s)"));
    }

    #[test]
    fn test_history_placeholder_and_chart() {
        let mut app = app("cat");
        app.open_history();
        let rendered = render(&app, 100, 24);
        assert!(rendered.contains("No history yet"));

        app.on_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), Instant::now());
        type_str(&mut app, "cat");
        app.open_history();
        let rendered = render(&app, 100, 24);
        assert!(rendered.contains(CHART_TITLE));
        assert!(!rendered.contains("No history yet"));
    }

    #[test]
    fn test_confirm_dialog_rendered() {
        let mut app = app("cat");
        app.request_clear();
        let rendered = render(&app, 100, 24);
        assert!(rendered.contains("Clear saved personal bests and settings?"));
    }

    #[test]
    fn test_small_area_does_not_panic() {
        let mut app = app("hello");
        render(&app, 10, 4);
        type_str(&mut app, "hello");
        render(&app, 10, 4);
        app.open_history();
        render(&app, 10, 4);
    }

    #[test]
    fn test_centered_rect_fits() {
        let area = Rect::new(0, 0, 80, 24);
        let r = centered_rect(50, 5, area);
        assert_eq!(r, Rect::new(20, 9, 40, 5));

        let tiny = centered_rect(50, 50, Rect::new(0, 0, 10, 4));
        assert_eq!(tiny.height, 4);
    }

    #[test]
    fn test_ui_constants() {
        assert_eq!(HORIZONTAL_MARGIN, 5);
        assert_eq!(VERTICAL_MARGIN, 2);
    }
}
