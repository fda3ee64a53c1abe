use std::io;
use std::time::Duration;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::info;

use crate::app::{Action, BrowserState, Derived, Focus};
use crate::catalog::{Catalog, Topic};
use crate::error::AppResult;
use crate::highlight::Highlighter;
use crate::view::SidebarRow;

const SEARCH_PLACEHOLDER: &str = "Search concepts...";
const NO_RESULTS: &str = "No topics found";
const NO_TOPICS: &str = "No topics available";

#[derive(Clone, Copy)]
struct Palette {
    accent: Color,
    warm: Color,
    key: Color,
    text: Color,
    muted: Color,
}

const PALETTE: Palette = Palette {
    accent: Color::Rgb(72, 166, 255),
    warm: Color::Rgb(255, 181, 92),
    key: Color::Rgb(150, 150, 150),
    text: Color::Reset,
    muted: Color::Rgb(100, 116, 139),
};

pub fn run(catalog: &Catalog, highlighter: &mut Highlighter, language: &str) -> AppResult<()> {
    let (mut terminal, _guard) = setup_terminal()?;
    let mut state = BrowserState::new(catalog);
    info!(topics = catalog.len(), "browser started");

    loop {
        let derived = Derived::new(catalog.all(), &state);
        let size = terminal.size()?;
        let ui = compute_ui_layout(size.into());

        terminal.draw(|frame| {
            draw(
                frame,
                &ui,
                &mut state,
                &derived,
                highlighter,
                catalog.len(),
                language,
            );
        })?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if state.handle_key(key, &derived) == Action::Quit {
                    terminal.show_cursor()?;
                    info!("browser closed");
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => handle_mouse(&mut state, &derived, &ui, mouse),
            _ => {}
        }
    }
}

fn handle_mouse(state: &mut BrowserState, derived: &Derived, ui: &UiLayout, mouse: MouseEvent) {
    let (col, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if rect_contains(ui.results_area, col, row) {
                state.focus = Focus::Search;
                let index = state.list_offset + (row - ui.results_area.y) as usize;
                if let Some(SidebarRow::Topic(topic)) = derived.rows.get(index) {
                    state.select(&topic.id);
                }
            } else if rect_contains(ui.sidebar_area, col, row) {
                state.focus = Focus::Search;
            } else if rect_contains(ui.detail_area, col, row) {
                state.focus = Focus::Detail;
            }
        }
        MouseEventKind::ScrollUp => {
            if rect_contains(ui.detail_area, col, row) {
                state.scroll_detail(-1);
            } else if rect_contains(ui.results_area, col, row) {
                state.step(derived, -1);
            }
        }
        MouseEventKind::ScrollDown => {
            if rect_contains(ui.detail_area, col, row) {
                state.scroll_detail(1);
            } else if rect_contains(ui.results_area, col, row) {
                state.step(derived, 1);
            }
        }
        _ => {}
    }
}

#[derive(Clone, Copy)]
struct UiLayout {
    sidebar_area: Rect,
    search_area: Rect,
    results_area: Rect,
    detail_area: Rect,
    help_area: Rect,
}

fn compute_ui_layout(size: Rect) -> UiLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(3)])
        .split(size);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(chunks[0]);

    let sidebar_area = body[0];
    let sidebar_inner = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .inner(sidebar_area);
    let sidebar_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(sidebar_inner);

    UiLayout {
        sidebar_area,
        search_area: sidebar_chunks[0],
        results_area: sidebar_chunks[2],
        detail_area: body[1],
        help_area: chunks[1],
    }
}

fn draw(
    frame: &mut Frame,
    ui: &UiLayout,
    state: &mut BrowserState,
    derived: &Derived,
    highlighter: &mut Highlighter,
    total: usize,
    language: &str,
) {
    let palette = PALETTE;
    render_sidebar(frame, ui, state, derived, total, palette);
    render_detail(frame, ui, state, derived, highlighter, language, palette);

    let help = Paragraph::new(Text::from(build_help_line(state.focus, palette)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Keys")
                .border_style(Style::default().fg(palette.muted))
                .border_type(BorderType::Rounded),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    frame.render_widget(help, ui.help_area);
}

fn render_sidebar(
    frame: &mut Frame,
    ui: &UiLayout,
    state: &mut BrowserState,
    derived: &Derived,
    total: usize,
    palette: Palette,
) {
    let focused = state.focus == Focus::Search;
    let title = format!("Topics {}/{}", derived.match_count, total);
    let title = if focused { format!("* {}", title) } else { title };
    let border_style = if focused {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.muted)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style)
        .border_type(BorderType::Rounded);
    frame.render_widget(block, ui.sidebar_area);

    let search_area = ui.search_area;
    let search_width = search_area.width.saturating_sub(1) as usize;
    let scroll = if search_width > 0 {
        state.input.visual_scroll(search_width)
    } else {
        0
    };
    let search = if state.query().is_empty() {
        Paragraph::new(Span::styled(
            SEARCH_PLACEHOLDER,
            Style::default().fg(palette.muted),
        ))
    } else {
        Paragraph::new(state.query().to_string()).scroll((0, scroll as u16))
    };
    frame.render_widget(search, search_area);
    if focused && search_area.width > 0 && search_area.height > 0 {
        let cursor_x = state
            .input
            .visual_cursor()
            .max(scroll)
            .saturating_sub(scroll);
        frame.set_cursor_position((search_area.x + cursor_x as u16, search_area.y));
    }

    let height = ui.results_area.height as usize;
    let selected_row = derived.selected_row();
    state.list_offset = compute_list_window_offset(
        selected_row.unwrap_or(0),
        state.list_offset,
        height,
        derived.rows.len(),
    );
    let empty_message = if total == 0 { NO_TOPICS } else { NO_RESULTS };
    let (items, list_selected) = build_sidebar_items(
        &derived.rows,
        selected_row,
        state.list_offset,
        height,
        ui.results_area.width as usize,
        empty_message,
        palette,
    );
    let list = List::new(items).highlight_style(
        Style::default()
            .fg(Color::Black)
            .bg(palette.warm)
            .add_modifier(Modifier::BOLD),
    );
    let mut list_state = ListState::default();
    list_state.select(list_selected);
    frame.render_stateful_widget(list, ui.results_area, &mut list_state);
}

fn render_detail(
    frame: &mut Frame,
    ui: &UiLayout,
    state: &mut BrowserState,
    derived: &Derived,
    highlighter: &mut Highlighter,
    language: &str,
    palette: Palette,
) {
    let focused = state.focus == Focus::Detail;
    let (title, text) = match derived.selected {
        Ok(topic) => (
            topic.title.clone(),
            build_detail_text(topic, highlighter, language, palette),
        ),
        Err(_) => (
            "Topic".to_string(),
            Text::from(Line::from(Span::styled(
                NO_TOPICS,
                Style::default().fg(palette.muted),
            ))),
        ),
    };

    let label = if focused { format!("* {}", title) } else { title };
    let border_style = if focused {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.muted)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(Span::styled(label, Style::default().fg(palette.text))))
        .border_style(border_style)
        .border_type(BorderType::Rounded);
    let inner = block.inner(ui.detail_area);
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    // Scroll limits count wrapped rows, not logical lines.
    let height = inner.height as usize;
    let rows = paragraph.line_count(inner.width);
    state.detail_page_step = height.max(1);
    state.detail_max_scroll = rows.saturating_sub(height);
    state.detail_scroll = state.detail_scroll.min(state.detail_max_scroll);

    let paragraph = paragraph
        .block(block)
        .scroll((state.detail_scroll as u16, 0));
    frame.render_widget(paragraph, ui.detail_area);
}

fn build_detail_text(
    topic: &Topic,
    highlighter: &mut Highlighter,
    language: &str,
    palette: Palette,
) -> Text<'static> {
    let badge = Style::default()
        .fg(palette.accent)
        .add_modifier(Modifier::BOLD);
    let heading = Style::default()
        .fg(palette.text)
        .add_modifier(Modifier::BOLD);
    let body = Style::default().fg(palette.text);
    let subtle = Style::default().fg(palette.muted);

    let mut lines = vec![
        Line::from(Span::styled(format!("[ {} ]", topic.category), badge)),
        Line::from(""),
        Line::from(Span::styled(topic.title.clone(), heading)),
        Line::from(""),
    ];
    if !topic.description.is_empty() {
        lines.push(Line::from(Span::styled(topic.description.clone(), body)));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        format!("── {} ──", code_file_name(language)),
        subtle,
    )));
    let code = highlighter.code_text(topic, palette.text);
    if code.lines.is_empty() {
        lines.push(Line::from(Span::styled("(no example)", subtle)));
    } else {
        lines.extend(code.lines);
    }
    Text::from(lines)
}

pub(crate) fn code_file_name(language: &str) -> String {
    let lower = language.to_lowercase();
    let extension = match lower.as_str() {
        "rust" => "rs",
        "python" => "py",
        "javascript" => "js",
        "typescript" => "ts",
        "kotlin" => "kt",
        "csharp" | "c#" => "cs",
        "" => "txt",
        other => other,
    };
    format!("Example.{}", extension)
}

fn build_sidebar_items(
    rows: &[SidebarRow],
    selected: Option<usize>,
    offset: usize,
    height: usize,
    width: usize,
    empty_message: &str,
    palette: Palette,
) -> (Vec<ListItem<'static>>, Option<usize>) {
    if rows.is_empty() || height == 0 {
        let item = ListItem::new(Line::from(Span::styled(
            empty_message.to_string(),
            Style::default().fg(palette.muted),
        )));
        return (vec![item], None);
    }

    let header_style = Style::default()
        .fg(palette.muted)
        .add_modifier(Modifier::BOLD);
    let topic_style = Style::default().fg(palette.text);
    let end = (offset + height).min(rows.len());
    let items = rows[offset..end]
        .iter()
        .map(|row| match row {
            SidebarRow::Header(category) => ListItem::new(Line::from(Span::styled(
                truncate_with_ellipsis(&category.to_uppercase(), width),
                header_style,
            ))),
            SidebarRow::Topic(topic) => {
                let label = truncate_with_ellipsis(&topic.title, width.saturating_sub(2));
                ListItem::new(Line::from(Span::styled(format!("  {}", label), topic_style)))
            }
        })
        .collect();
    let list_selected = selected
        .filter(|index| *index >= offset && *index < end)
        .map(|index| index - offset);
    (items, list_selected)
}

fn build_help_line(focus: Focus, palette: Palette) -> Line<'static> {
    let key_style = Style::default()
        .fg(palette.key)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default()
        .fg(palette.accent)
        .add_modifier(Modifier::BOLD);
    let regular_style = Style::default().fg(palette.text);
    let mut spans: Vec<Span> = Vec::new();
    let mut push = |key: &'static str, label: &'static str| {
        spans.push(Span::styled(key, key_style));
        spans.push(Span::styled(label, regular_style));
    };

    match focus {
        Focus::Search => {
            push("Up/Down", " select  ");
            push("Tab", " details  ");
            push("Ctrl+U", " clear  ");
            push("Esc", " quit");
        }
        Focus::Detail => {
            push("Up/Down", " scroll  ");
            push("PgUp/PgDn", " page  ");
            push("Left", " search  ");
            push("Esc", " quit");
        }
    }

    let label = match focus {
        Focus::Search => "Search",
        Focus::Detail => "Details",
    };
    let mut line = vec![
        Span::styled(label, label_style),
        Span::styled("  ", regular_style),
    ];
    line.extend(spans);
    Line::from(line)
}

fn truncate_with_ellipsis(value: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let count = value.chars().count();
    if count <= max {
        return value.to_string();
    }
    if max <= 3 {
        return value.chars().take(max).collect();
    }
    let trimmed: String = value.chars().take(max - 3).collect();
    format!("{}...", trimmed)
}

fn compute_list_window_offset(
    selected: usize,
    current_offset: usize,
    height: usize,
    total: usize,
) -> usize {
    if total == 0 || height == 0 {
        return 0;
    }

    let mut offset = current_offset.min(total.saturating_sub(1));
    if selected < offset {
        offset = selected;
    } else if selected >= offset + height {
        offset = selected + 1 - height;
    }

    offset.min(total.saturating_sub(height))
}

fn rect_contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x
        && col < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen, DisableMouseCapture);
    }
}

fn setup_terminal() -> AppResult<(Terminal<CrosstermBackend<io::Stderr>>, TerminalGuard)> {
    enable_raw_mode()?;
    let guard = TerminalGuard;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;
    Ok((terminal, guard))
}
