use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};
use crate::analysis::{AnalysisResult, Section, NO_DATA};
use crate::app::{App, Focus};
use crate::files::EntryKind;

pub const APP_TITLE: &str = "DevOps Pipeline Analyzer";
const URL_PLACEHOLDER: &str =
    "e.g. https://raw.githubusercontent.com/org/repo/main/.github/workflows/ci.yml";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_analyzer(app, frame, body_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(format!(" {} ", APP_TITLE), Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(app.client.endpoint(), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = if app.focus == Focus::Url {
        (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CI/CD ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let pairs: Vec<(&str, &str)> = match app.focus {
        Focus::Files => vec![
            ("j/k", "nav"),
            ("Enter", "select"),
            ("h", "up dir"),
            ("u", "url"),
            ("a", "analyze"),
            ("Tab", "focus"),
            ("q", "quit"),
        ],
        Focus::Url => vec![
            ("Enter", "analyze"),
            ("^U", "clear"),
            ("Esc", "stop typing"),
            ("Tab", "focus"),
        ],
        Focus::Analyze => vec![
            ("Enter", "analyze"),
            ("Tab", "focus"),
            ("q", "quit"),
        ],
        Focus::Results => vec![
            ("j/k", "scroll"),
            ("^D/^U", "half page"),
            ("g/G", "top/bottom"),
            ("a", "analyze"),
            ("Tab", "focus"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_analyzer(app: &mut App, frame: &mut Frame, area: Rect) {
    let [inputs_area, button_area, message_area, results_area] = Layout::vertical([
        Constraint::Length(9),
        Constraint::Length(3),
        Constraint::Length(2),
        Constraint::Min(0),
    ])
    .areas(area);

    let [files_area, url_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(inputs_area);

    render_file_picker(app, frame, files_area);
    render_url_input(app, frame, url_area);
    render_analyze_button(app, frame, button_area);
    render_messages(app, frame, message_area);
    render_results(app, frame, results_area);
}

fn border_style(focused: bool) -> Style {
    Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray })
}

fn render_file_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let title_style = if app.analyzer.file.is_some() {
        Style::default().fg(Color::Green).bold()
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == Focus::Files))
        .title(Span::styled(app.file_title(), title_style))
        .title_bottom(format!(" {} ", app.current_dir.display()));

    if let Some(err) = &app.picker_error {
        let paragraph = Paragraph::new(err.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let selected_path = app.analyzer.file.as_ref().map(|f| f.path.clone());
    let items: Vec<ListItem> = app
        .dir_entries
        .iter()
        .map(|entry| {
            let style = match entry.kind {
                EntryKind::Parent | EntryKind::Directory => Style::default().fg(Color::Blue),
                EntryKind::Pipeline if selected_path.as_ref() == Some(&entry.path) => {
                    Style::default().fg(Color::Green).bold()
                }
                EntryKind::Pipeline => Style::default(),
            };
            ListItem::new(Span::styled(format!(" {} ", entry.label()), style))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.file_state);
}

fn render_url_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.focus == Focus::Url;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if editing {
            Style::default().fg(Color::Yellow)
        } else {
            border_style(false)
        })
        .title(" Paste raw .yaml URL ");

    let paragraph = if app.analyzer.url.is_empty() {
        Paragraph::new(URL_PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(app.analyzer.url.as_str()).style(Style::default().fg(Color::Cyan))
    };
    let inner = block.inner(area);
    frame.render_widget(paragraph.wrap(Wrap { trim: false }).block(block), area);

    // Show cursor when editing
    if editing && inner.width > 0 {
        let width = inner.width as usize;
        let col = (app.url_cursor % width) as u16;
        let row = ((app.url_cursor / width) as u16).min(inner.height.saturating_sub(1));
        frame.set_cursor_position((inner.x + col, inner.y + row));
    }
}

fn render_analyze_button(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Analyze;
    let style = if app.analyzer.loading {
        // Disabled look while a request is in flight
        Style::default().fg(Color::Gray).bg(Color::DarkGray)
    } else if focused {
        Style::default().fg(Color::White).bg(Color::Blue).bold()
    } else {
        Style::default().fg(Color::White).bg(Color::Black).bold()
    };

    let button = Paragraph::new(app.analyze_label())
        .alignment(Alignment::Center)
        .style(style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(focused)),
        );
    frame.render_widget(button, area);
}

fn render_messages(app: &App, frame: &mut Frame, area: Rect) {
    let mut lines = Vec::new();
    if let Some(error) = &app.analyzer.error {
        lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))));
    }
    if let Some(status) = app.status_line() {
        lines.push(Line::from(Span::styled(status, Style::default().fg(Color::Gray))));
    }
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn section_heading(section: Section) -> Line<'static> {
    Line::from(Span::styled(
        format!("{} {}", section.icon(), section.title()),
        Style::default().fg(Color::Yellow).bold(),
    ))
}

/// Section headings and bodies as one wrapped paragraph.
/// Also used to size the scroll range, so the count matches what is drawn.
pub fn results_paragraph(result: &AnalysisResult) -> Paragraph<'static> {
    let mut lines: Vec<Line> = Vec::new();
    for section in Section::all() {
        lines.push(section_heading(section));
        let text = result.section_text(section);
        let style = if text == NO_DATA {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        for line in text.lines() {
            lines.push(Line::from(Span::styled(line.to_string(), style)));
        }
        lines.push(Line::default());
    }
    Paragraph::new(lines).wrap(Wrap { trim: false })
}

fn render_results(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == Focus::Results))
        .title(" Results ");

    let inner = block.inner(area);
    app.results_area = Some(area);
    app.results_height = inner.height;
    app.results_width = inner.width;

    let Some(result) = app.analyzer.result.as_ref().filter(|r| r.has_sections()) else {
        frame.render_widget(block, area);
        return;
    };
    let paragraph = results_paragraph(result);

    // A resize can leave the offset past the new end
    let total_lines = app.total_result_lines();
    app.results_scroll = app
        .results_scroll
        .min(total_lines.saturating_sub(app.results_height));

    frame.render_widget(
        paragraph.block(block).scroll((app.results_scroll, 0)),
        area,
    );

    if total_lines > app.results_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(total_lines as usize)
            .position(app.results_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}
