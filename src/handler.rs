use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, Focus};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    // Every event is a chance to pick up a finished request
    app.poll_analysis().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any focus
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }
    match key.code {
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return;
        }
        KeyCode::BackTab => {
            app.focus = app.focus.prev();
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Url => handle_url_editing(app, key),
        _ => handle_normal(app, key),
    }
}

fn handle_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('a') => app.request_analysis(),
        KeyCode::Char('u') if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.focus = Focus::Url;
        }
        _ => match app.focus {
            Focus::Files => handle_files(app, key),
            Focus::Analyze => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    app.request_analysis();
                }
            }
            Focus::Results => handle_results(app, key),
            Focus::Url => {}
        },
    }
}

fn handle_files(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.picker_down(),
        KeyCode::Char('k') | KeyCode::Up => app.picker_up(),
        KeyCode::Char('g') | KeyCode::Home => app.picker_first(),
        KeyCode::Char('G') | KeyCode::End => app.picker_last(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.picker_enter(),
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => app.picker_parent(),
        _ => {}
    }
}

fn handle_results(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_bottom(),
        _ => {}
    }
}

fn handle_url_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.focus = Focus::Analyze;
        }
        KeyCode::Enter => app.request_analysis(),
        KeyCode::Backspace => app.url_backspace(),
        KeyCode::Delete => app.url_delete(),
        KeyCode::Left => app.url_cursor_left(),
        KeyCode::Right => app.url_cursor_right(),
        KeyCode::Home => app.url_cursor_home(),
        KeyCode::End => app.url_cursor_end(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.url_cursor_home();
            app.set_url(String::new());
        }
        KeyCode::Char(c) => app.url_insert(c),
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_results = app
        .results_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_results {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            for _ in 0..3 {
                app.scroll_down();
            }
        }
        MouseEventKind::ScrollUp => {
            for _ in 0..3 {
                app.scroll_up();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{app_with, settle, FakeAnalyzer};
    use crate::state::MISSING_INPUT_MESSAGE;
    use serde_json::json;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[tokio::test]
    async fn test_tab_cycles_focus() {
        let (mut app, _dir) = app_with(FakeAnalyzer::ok(json!({})));
        assert_eq!(app.focus, Focus::Files);
        handle_event(&mut app, key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.focus, Focus::Url);
        handle_event(&mut app, key(KeyCode::BackTab)).await.unwrap();
        assert_eq!(app.focus, Focus::Files);
    }

    #[tokio::test]
    async fn test_typing_url_then_enter_submits() {
        let client = FakeAnalyzer::ok(json!({ "llm_response": {} }));
        let (mut app, _dir) = app_with(client.clone());
        handle_event(&mut app, key(KeyCode::Char('u'))).await.unwrap();
        for c in "https://example.com/ci.yaml".chars() {
            handle_event(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        // 'q' and 'a' are text while editing
        assert_eq!(app.analyzer.url, "https://example.com/ci.yaml");
        assert!(!app.should_quit);

        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        settle(&mut app).await;
        assert_eq!(client.call_count(), 1);
        assert!(app.analyzer.result.as_ref().unwrap().has_sections());
    }

    #[tokio::test]
    async fn test_analyze_key_without_input_shows_validation_error() {
        let client = FakeAnalyzer::ok(json!({}));
        let (mut app, _dir) = app_with(client.clone());
        handle_event(&mut app, key(KeyCode::Char('a'))).await.unwrap();
        assert_eq!(app.analyzer.error.as_deref(), Some(MISSING_INPUT_MESSAGE));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_ctrl_u_clears_url() {
        let (mut app, _dir) = app_with(FakeAnalyzer::ok(json!({})));
        app.focus = Focus::Url;
        app.url_insert_str("https://example.com");
        handle_event(&mut app, ctrl('u')).await.unwrap();
        assert!(app.analyzer.url.is_empty());
        assert_eq!(app.url_cursor, 0);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, _dir) = app_with(FakeAnalyzer::ok(json!({})));
        handle_event(&mut app, key(KeyCode::Char('q'))).await.unwrap();
        assert!(app.should_quit);

        let (mut app, _dir) = app_with(FakeAnalyzer::ok(json!({})));
        app.focus = Focus::Url;
        handle_event(&mut app, ctrl('c')).await.unwrap();
        assert!(app.should_quit);
    }
}
