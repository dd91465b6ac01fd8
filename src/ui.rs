//! The UI renders the application state into something visible and vim-able.
//!
//! The draw function dispatches based on the current view. The tree view shows the open guide
//! with box-drawing characters beside the selected section's body, where markers are resolved
//! into image links and coloured callout boxes.

use crate::app_state::{AppState, FormTarget, SectionForm, View};
use crate::blob::BlobStore;
use crate::game::Glyph;
use crate::markers::{self, MarkerKind, Segment};
use crate::section::{CalloutKind, Section};
use crate::store::Store;
use crate::tree_view::{self, Row};
use edtui::{EditorTheme, EditorView, SyntaxHighlighter};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// Renders the active view based on current application state.
pub fn draw<S: Store, B: BlobStore>(f: &mut Frame, app: &mut AppState<S, B>) {
    let base = match app.current_view {
        View::Command | View::Confirm => app.previous_view,
        view => view,
    };
    match base {
        View::GameList => draw_game_list(f, app),
        View::Editor => draw_editor(f, app),
        _ => draw_tree(f, app),
    }
}

/// Generate box-drawing prefix for tree structure
fn get_tree_prefix(row: &Row<'_>) -> String {
    let mut prefix = String::new();

    // Draw vertical lines for ancestor levels that still have siblings coming
    for &more in &row.rails {
        if more {
            prefix.push_str("│   ");
        } else {
            prefix.push_str("    ");
        }
    }

    // Draw branch for current level
    if row.is_last {
        prefix.push_str("└── ");
    } else {
        prefix.push_str("├── ");
    }

    prefix
}

fn callout_color(kind: CalloutKind) -> Color {
    match kind {
        CalloutKind::Info => Color::Blue,
        CalloutKind::Warn => Color::Yellow,
        CalloutKind::Note => Color::Magenta,
    }
}

fn flush(lines: &mut Vec<Line<'static>>, current: &mut Vec<Span<'static>>) {
    if !current.is_empty() {
        lines.push(Line::from(std::mem::take(current)));
    }
}

/// Lays out a section body with markers resolved; unresolved markers vanish.
fn content_lines(section: &Section) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();

    for segment in markers::resolve_section(section) {
        match segment {
            Segment::Plain(text) => {
                let mut parts = text.split('\n');
                if let Some(first) = parts.next().filter(|part| !part.is_empty()) {
                    current.push(Span::raw(first.to_string()));
                }
                for part in parts {
                    lines.push(Line::from(std::mem::take(&mut current)));
                    if !part.is_empty() {
                        current.push(Span::raw(part.to_string()));
                    }
                }
            }
            Segment::Image(image) => {
                flush(&mut lines, &mut current);
                lines.push(Line::from(Span::styled(
                    format!("🖼  {}", image.url),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                )));
            }
            Segment::Callout(callout) => {
                flush(&mut lines, &mut current);
                let bar = Span::styled("▌ ", Style::default().fg(callout_color(callout.kind)));
                lines.push(Line::from(vec![
                    bar.clone(),
                    Span::styled(
                        callout.title.to_uppercase(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]));
                lines.push(Line::from(vec![
                    bar,
                    Span::styled(callout.text.clone(), Style::default().fg(Color::Gray)),
                ]));
            }
            Segment::Unresolved(_) => {}
        }
    }
    flush(&mut lines, &mut current);
    lines
}

fn status_line<S, B>(app: &AppState<S, B>, hint: &str) -> String {
    match app.current_view {
        View::Command => format!(":{}", app.command_buffer),
        View::Search => format!("/{}", app.query),
        _ => app.message.clone().unwrap_or_else(|| hint.to_string()),
    }
}

fn draw_game_list<S: Store, B: BlobStore>(f: &mut Frame, app: &AppState<S, B>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let items: Vec<ListItem> = app
        .games
        .iter()
        .map(|game| {
            let glyph = match game.glyph() {
                Glyph::Image(_) => "🖼".to_string(),
                Glyph::Icon(icon) => icon.to_string(),
            };
            let mut spans = vec![
                Span::raw(format!("{glyph} ")),
                Span::styled(
                    game.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  👁 {}", game.click_count),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if !game.desc.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", game.desc),
                    Style::default().fg(Color::Gray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = format!("Games ({})", app.games.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if !app.games.is_empty() {
        state.select(Some(app.current_game_index));
    }
    f.render_stateful_widget(list, chunks[0], &mut state);

    let hint = if app.can_write {
        "↑/↓: Navigate | Enter: Open | :new <name> | :rename | :desc | :icon | :cover <file> | :delete | q: Quit"
    } else {
        "↑/↓: Navigate | Enter: Open | q: Quit"
    };
    let help = Paragraph::new(status_line(app, hint)).block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[1]);
}

fn draw_tree<S: Store, B: BlobStore>(f: &mut Frame, app: &AppState<S, B>) {
    let rows_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows_area[0]);

    let rows = app.rows();
    let searching = !app.query.trim().is_empty();

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let marker = match (row.has_children, row.expanded) {
                (false, _) => "  ",
                (true, true) => "▾ ",
                (true, false) => "▸ ",
            };
            let title_style = if searching && crate::search::matches(row.section, &app.query) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(get_tree_prefix(row), Style::default().fg(Color::DarkGray)),
                Span::raw(marker),
                Span::styled(row.section.title.clone(), title_style),
            ]))
        })
        .collect();

    let game_name = app
        .session
        .as_ref()
        .map_or_else(String::new, |session| session.game().name.clone());
    let title = if searching {
        let hits = app
            .session
            .as_ref()
            .map_or(0, |s| crate::search::count_matches(s.sections(), &app.query));
        format!("{game_name} (search \"{}\": {hits} matches)", app.query.trim())
    } else {
        game_name
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(app.current_row));
    }
    f.render_stateful_widget(list, panes[0], &mut state);

    draw_section_body(f, app, rows.get(app.current_row), panes[1]);

    let hint = if app.can_write {
        "↑/↓: Navigate | ←/→: Collapse/Expand | /: Search | a: Add child | A: Add top | e: Edit | d: Delete | q: Back"
    } else {
        "↑/↓: Navigate | ←/→: Collapse/Expand | Space: Toggle | /: Search | Esc: Clear search | q: Back"
    };
    let help = Paragraph::new(status_line(app, hint)).block(Block::default().borders(Borders::ALL));
    f.render_widget(help, rows_area[1]);
}

fn draw_section_body<S, B>(f: &mut Frame, app: &AppState<S, B>, row: Option<&Row<'_>>, area: Rect) {
    let Some(row) = row else {
        let empty = Paragraph::new("No sections").block(Block::default().borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    };

    // Breadcrumb navigation
    let breadcrumb = app.session.as_ref().map_or_else(String::new, |session| {
        tree_view::breadcrumb(session.sections(), &row.path).join(" > ")
    });

    let body = Paragraph::new(content_lines(row.section))
        .block(Block::default().borders(Borders::ALL).title(breadcrumb))
        .wrap(Wrap { trim: false });
    f.render_widget(body, area);
}

fn asset_lines(form: &SectionForm) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled("Title: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            if form.draft.title.is_empty() {
                "(none, set with :title)".to_string()
            } else {
                form.draft.title.clone()
            },
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ])];

    let retained = form.draft.retained_images.iter().map(|image| image.url.clone());
    let pending = form
        .draft
        .pending_images
        .iter()
        .map(|image| format!("{} (pending upload)", image.name));
    for (i, label) in retained.chain(pending).enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                markers::marker(MarkerKind::Image, i + 1),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(format!(" {label}")),
        ]));
    }
    for (i, callout) in form.draft.callouts.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                markers::marker(MarkerKind::Callout, i + 1),
                Style::default().fg(callout_color(callout.kind)),
            ),
            Span::raw(format!(" {} {}: {}", callout.kind, callout.title, callout.text)),
        ]));
    }
    lines
}

fn draw_editor<S: Store, B: BlobStore>(f: &mut Frame, app: &mut AppState<S, B>) {
    let asset_rows = app.form.as_ref().map_or(0, |form| {
        form.draft.image_count() + form.draft.callouts.len() + 1
    });
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(u16::try_from(asset_rows + 2).unwrap_or(u16::MAX)), // Assets
            Constraint::Min(0),                                                    // Editor
            Constraint::Length(3),                                                 // Help
        ])
        .split(f.area());

    let hint = ":w Save | :q Cancel | :title <t> | :img <file> | :rmimg <n> | :callout <info|warn|note> <title> | <text> | :rmcallout <n>";
    let status = status_line(app, hint);
    let max_width = app.wrap_width;

    if let Some(ref mut form) = app.form {
        let heading = match &form.target {
            FormTarget::Add { parent } if parent.is_root() => "New section".to_string(),
            FormTarget::Add { parent } => format!("New subsection under {parent}"),
            FormTarget::Edit { path } => format!("Edit section {path}"),
        };
        let assets = Paragraph::new(asset_lines(form))
            .block(Block::default().borders(Borders::ALL).title(heading));
        f.render_widget(assets, chunks[0]);

        // Editor
        let title = format!("Content (max line: {max_width} chars)");
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(chunks[1]);
        f.render_widget(block, chunks[1]);

        let syntax_highlighter = SyntaxHighlighter::new("dracula", "md");
        let editor = EditorView::new(&mut form.editor_state)
            .theme(EditorTheme::default())
            .syntax_highlighter(Some(syntax_highlighter))
            .wrap(true);

        f.render_widget(editor, inner);
    }

    let help = Paragraph::new(status).block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}

#[cfg(test)]
#[path = "tests/ui.rs"]
mod tests;
