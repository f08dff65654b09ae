//! UI rendering for the TUI.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use keytrace_core::{PlaybackStatus, TextStats};

use crate::app::{App, ViewMode};

/// Render the application.
pub fn render(frame: &mut Frame, app: &mut App) {
    match app.view_mode {
        ViewMode::Record => render_record_view(frame, app),
        ViewMode::Replay => render_replay_view(frame, app),
    }
}

/// Render the writing surface.
fn render_record_view(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: header, editor, status, footer
    let chunks = Layout::vertical([
        Constraint::Length(2), // Header
        Constraint::Min(5),    // Editor
        Constraint::Length(1), // Status
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_record_header(frame, app, chunks[0]);
    render_editor(frame, app, chunks[1]);
    render_status(frame, app, chunks[2]);
    render_record_footer(frame, app, chunks[3]);
}

/// Render the playback view.
fn render_replay_view(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: header, controls, progress, text, status, footer
    let chunks = Layout::vertical([
        Constraint::Length(2), // Header
        Constraint::Length(3), // Controls
        Constraint::Length(1), // Progress
        Constraint::Min(5),    // Reconstructed text
        Constraint::Length(1), // Status
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_header(frame, "keytrace - playback", chunks[0]);
    render_playback_controls(frame, app, chunks[1]);
    render_progress(frame, app, chunks[2]);
    render_playback_text(frame, app, chunks[3]);
    render_status(frame, app, chunks[4]);
    render_replay_footer(frame, app, chunks[5]);
}

/// Render the header with title.
fn render_header(frame: &mut Frame, title: &str, area: Rect) {
    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn render_record_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        "keytrace",
        Style::default().fg(Color::Cyan).bold(),
    )];

    if app.session.is_active() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "● REC",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::styled("  stopped", Style::default().fg(Color::DarkGray)));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

/// Render the editor with a block caret.
fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let text = app.session.current_text();
    let border_color = if app.session.is_active() {
        Color::Green
    } else {
        Color::DarkGray
    };

    let lines = if text.is_empty() && !app.session.is_active() {
        vec![Line::styled(
            "Press Ctrl+R to start recording",
            Style::default().fg(Color::DarkGray).italic(),
        )]
    } else {
        lines_with_caret(text, app.caret)
    };

    let editor = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" Text "),
        );
    frame.render_widget(editor, area);
}

/// Split `text` into lines, highlighting the character at `caret`.
fn lines_with_caret(text: &str, caret: usize) -> Vec<Line<'static>> {
    let caret_style = Style::default().add_modifier(Modifier::REVERSED);
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();

    for (i, c) in text.chars().chain(std::iter::once('\n')).enumerate() {
        if i == caret {
            if !run.is_empty() {
                current.push(Span::raw(std::mem::take(&mut run)));
            }
            let shown = if c == '\n' { ' ' } else { c };
            current.push(Span::styled(shown.to_string(), caret_style));
            if c != '\n' {
                continue;
            }
        }

        if c == '\n' {
            if !run.is_empty() {
                current.push(Span::raw(std::mem::take(&mut run)));
            }
            lines.push(Line::from(std::mem::take(&mut current)));
        } else {
            run.push(c);
        }
    }

    lines
}

fn render_playback_controls(frame: &mut Frame, app: &App, area: Rect) {
    let engine = &app.engine;
    let status = engine.status();
    let status_color = match status {
        PlaybackStatus::Playing => Color::Green,
        PlaybackStatus::Finished => Color::Magenta,
        PlaybackStatus::Idle => Color::Yellow,
    };

    let line = Line::from(vec![
        Span::styled(" Space ", Style::default().fg(Color::Yellow)),
        Span::styled(
            status.control_label(),
            Style::default().fg(status_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled("Speed ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{}x", engine.speed()), Style::default().fg(Color::White).bold()),
        Span::raw("   "),
        Span::styled(
            format!("Event {} of {}", engine.cursor_index(), engine.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let controls = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(controls, area);
}

fn render_progress(frame: &mut Frame, app: &App, area: Rect) {
    let percent = app.engine.progress_percent();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Rgb(40, 40, 40)))
        .ratio((percent / 100.0).clamp(0.0, 1.0))
        .label(Span::styled(
            format!("{:.0}%", percent),
            Style::default().fg(Color::White).bold(),
        ));
    frame.render_widget(gauge, area);
}

fn render_playback_text(frame: &mut Frame, app: &App, area: Rect) {
    let engine = &app.engine;
    let body = if engine.is_empty() {
        Paragraph::new(Line::styled(
            "No recording available",
            Style::default().fg(Color::DarkGray).italic(),
        ))
    } else if engine.cursor_index() == 0 && !engine.is_playing() {
        Paragraph::new(Line::styled(
            "Press Space to start playback",
            Style::default().fg(Color::DarkGray).italic(),
        ))
    } else {
        Paragraph::new(engine.reconstructed_text().to_string())
    };

    let title = if engine.clamped_events() > 0 {
        format!(" Playback ({} events clamped) ", engine.clamped_events())
    } else {
        " Playback ".to_string()
    };

    let text = body
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(text, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let Some(status) = &app.status else {
        return;
    };
    let color = if status.is_error { Color::Red } else { Color::Green };
    let line = Line::from(Span::styled(
        format!(" {}", status.text),
        Style::default().fg(color),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_record_footer(frame: &mut Frame, app: &App, area: Rect) {
    let TextStats { words, chars } = app.session.stats();
    let record_label = if app.session.is_active() {
        " stop  "
    } else {
        " record  "
    };

    let footer = Line::from(vec![
        Span::styled(" ^R", Style::default().fg(Color::Yellow)),
        Span::raw(record_label),
        Span::styled("^S", Style::default().fg(Color::Yellow)),
        Span::raw(" save  "),
        Span::styled("^T", Style::default().fg(Color::Yellow)),
        Span::raw(" export text  "),
        Span::styled("^P", Style::default().fg(Color::Yellow)),
        Span::raw(" play  "),
        Span::styled("^N", Style::default().fg(Color::Yellow)),
        Span::raw(" new  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" quit  "),
        Span::raw("│ "),
        Span::styled(
            format!(
                "Words: {} | Characters: {} | Events: {}",
                words,
                chars,
                app.session.log().len()
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

fn render_replay_footer(frame: &mut Frame, app: &App, area: Rect) {
    let quit_label = if app.can_record { " back  " } else { " quit  " };

    let footer = Line::from(vec![
        Span::styled(" Space", Style::default().fg(Color::Yellow)),
        Span::raw(" play/pause  "),
        Span::styled("←/→", Style::default().fg(Color::Yellow)),
        Span::raw(" step  "),
        Span::styled("g/G", Style::default().fg(Color::Yellow)),
        Span::raw(" start/end  "),
        Span::styled("+/-", Style::default().fg(Color::Yellow)),
        Span::raw(" speed  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" reset  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(quit_label),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_caret_at_end_adds_cell() {
        let lines = lines_with_caret("ab", 2);
        assert_eq!(lines.len(), 1);
        assert_eq!(plain(&lines[0]), "ab ");
    }

    #[test]
    fn test_caret_inside_multiline_text() {
        let lines = lines_with_caret("ab\ncd", 1);
        assert_eq!(lines.len(), 2);
        assert_eq!(plain(&lines[0]), "ab");
        assert_eq!(lines[0].spans[1].content, "b");
        assert_eq!(plain(&lines[1]), "cd");
    }

    #[test]
    fn test_caret_on_newline() {
        let lines = lines_with_caret("ab\ncd", 2);
        assert_eq!(plain(&lines[0]), "ab ");
        assert_eq!(plain(&lines[1]), "cd");
    }
}
