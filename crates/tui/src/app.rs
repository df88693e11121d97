use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gamedeck_core::{
    catalog::{CatalogLoad, GameCatalogClient, PAGE_COUNT},
    poster::{PosterEvent, PosterFetcher},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::grid::{self, PosterStatus, Tile, GRID_COLUMNS};

const TICK_RATE: Duration = Duration::from_millis(250);
const TILE_HEIGHT: u16 = 8;

/// Fixed message shown when no API key resolves; the network stage is
/// skipped entirely in that case.
pub const MISSING_KEY_MESSAGE: &str =
    "Error: API key not found. Set GAME_API_KEY or add api_key to the config file.";

const POSTER_FAILED_MESSAGE: &str =
    "Error loading poster image. Please check your internet connection and try again.";

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    accent_alt: Color,
    muted: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            muted: Color::DarkGray,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Main,
    Detail,
}

/// Startup progression for the catalog fetch sequence. `Failed` is only
/// reached when no API key resolves, and is terminal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

enum AppEvent {
    Input(Event),
    Tick,
    CatalogLoaded(CatalogLoad),
}

/// High-level application state for the gamedeck TUI.
pub struct GamedeckApp {
    client: Option<GameCatalogClient>,
    posters: PosterFetcher,
    state: UiState,
    screen: Screen,
    load_state: LoadState,
    detail: Option<Tile>,
    catalog_len: usize,
    failed_pages: Vec<u32>,
    fetched_at: Option<DateTime<Utc>>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    poster_tx: Option<mpsc::Sender<PosterEvent>>,
    theme: Theme,
}

impl GamedeckApp {
    /// Build the app. A `None` client means the API key presence check
    /// already failed: the session starts in `Failed` and never touches
    /// the network.
    pub fn new(client: Option<GameCatalogClient>) -> Self {
        let mut state = UiState::default();
        let load_state = if client.is_some() {
            LoadState::Idle
        } else {
            state.set_status(MISSING_KEY_MESSAGE.to_string());
            LoadState::Failed
        };
        Self {
            client,
            posters: PosterFetcher::new(),
            state,
            screen: Screen::Main,
            load_state,
            detail: None,
            catalog_len: 0,
            failed_pages: Vec::new(),
            fetched_at: None,
            event_tx: None,
            poster_tx: None,
            theme: Theme::default(),
        }
    }

    /// Run the event loop until quit.
    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        let (poster_tx, mut poster_rx) = mpsc::channel::<PosterEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);
        self.poster_tx = Some(poster_tx);
        self.begin_catalog_load();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            tokio::select! {
                maybe_event = event_rx.recv() => {
                    match maybe_event {
                        Some(event) => self.process_app_event(event),
                        None => break,
                    }
                }
                maybe_poster = poster_rx.recv() => {
                    if let Some(event) = maybe_poster {
                        self.handle_poster_event(event);
                    }
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        self.poster_tx = None;
        Ok(())
    }

    /// Kick off the startup fetch: `Idle → Loading`, one spawned task
    /// walking all pages, one completion event back. No retry and no
    /// cancellation; the sequence always runs to completion.
    fn begin_catalog_load(&mut self) {
        if self.load_state == LoadState::Failed {
            info!("Startup fetch skipped: no API key configured");
            return;
        }
        let Some(client) = self.client.clone() else {
            return;
        };
        let Some(sender) = self.event_tx.clone() else {
            self.state
                .set_status("Internal error: event channel unavailable".to_string());
            error!("event_channel_missing");
            return;
        };

        self.load_state = LoadState::Loading;
        self.state
            .set_status(format!("Loading {PAGE_COUNT} catalog pages…"));
        info!(pages = PAGE_COUNT, "Starting catalog fetch");
        tokio::spawn(async move {
            let load = client.fetch_catalog().await;
            let _ = sender.send(AppEvent::CatalogLoaded(load)).await;
        });
    }

    fn process_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(event) => self.handle_input(event),
            // Ticks only wake the loop for a redraw.
            AppEvent::Tick => {}
            AppEvent::CatalogLoaded(load) => self.finish_catalog_load(load),
        }
    }

    /// Apply the aggregated fetch result. The loading modal is dismissed
    /// here unconditionally: a fully failed fetch still lands in `Ready`
    /// with an empty grid and the failures on the status line.
    fn finish_catalog_load(&mut self, load: CatalogLoad) {
        self.load_state = LoadState::Ready;
        info!(
            games = load.games.len(),
            failed_pages = ?load.failed_pages,
            "Catalog fetch finished"
        );

        self.catalog_len = load.games.len();
        self.failed_pages = load.failed_pages;
        self.fetched_at = Some(load.fetched_at);
        self.state.tiles = grid::build_tiles(&load.games);
        self.state.cursor = 0;
        self.state.row_offset = 0;
        self.spawn_poster_fetches();

        let mut status = format!("Loaded {} games", self.catalog_len);
        if !self.failed_pages.is_empty() {
            status.push_str(&format!(
                " ({} of {PAGE_COUNT} pages failed)",
                self.failed_pages.len()
            ));
        }
        self.state.set_status(status);
    }

    fn spawn_poster_fetches(&self) {
        let Some(sender) = self.poster_tx.clone() else {
            return;
        };
        for (index, tile) in self.state.tiles.iter().enumerate() {
            self.posters
                .spawn_fetch(index, tile.record.image_url.clone(), sender.clone());
        }
    }

    /// Flip the matching tile; a failure keeps the tile on screen with
    /// its placeholder and surfaces on the shared status line.
    fn handle_poster_event(&mut self, event: PosterEvent) {
        match event {
            PosterEvent::Loaded { tile, bytes } => {
                if let Some(slot) = self.state.tiles.get_mut(tile) {
                    slot.poster = PosterStatus::Loaded;
                    debug!(game = %slot.record.name, bytes, "Poster loaded");
                }
            }
            PosterEvent::Failed { tile, error } => {
                if let Some(slot) = self.state.tiles.get_mut(tile) {
                    slot.poster = PosterStatus::Failed;
                    warn!(game = %slot.record.name, %error, "Poster load failed");
                }
                self.state.set_status(POSTER_FAILED_MESSAGE.to_string());
            }
        }
    }

    fn handle_input(&mut self, event: Event) {
        match event {
            Event::Key(key) => match self.screen {
                Screen::Main => self.handle_main_key(key),
                Screen::Detail => self.handle_detail_key(key),
            },
            Event::Resize(_, _) => {}
            Event::Mouse(_) => {}
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) {
        match self.state.mode {
            Mode::Search => self.handle_search_key(key),
            Mode::Browse => self.handle_browse_key(key),
        }
    }

    // The search field is rendered but deliberately not wired into the
    // grid; typing only edits the input.
    // TODO: filter the tile grid from this input.
    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.set_status("Search closed".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state
                    .set_status("Search does not filter the grid yet".to_string());
            }
            KeyCode::Backspace => {
                self.state.search.pop();
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.state.search.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1, 0),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1, 0),
            KeyCode::Char('h') | KeyCode::Left => self.state.move_cursor(0, -1),
            KeyCode::Char('l') | KeyCode::Right => self.state.move_cursor(0, 1),
            KeyCode::Char('g') if key.modifiers.is_empty() => self.state.move_to_start(),
            KeyCode::Char('G') => self.state.move_to_end(),
            KeyCode::Home => self.state.move_to_start(),
            KeyCode::End => self.state.move_to_end(),
            KeyCode::PageDown => self.state.page(1),
            KeyCode::PageUp => self.state.page(-1),
            KeyCode::Char('/') => {
                self.state.mode = Mode::Search;
                self.state.set_status("Search for a game...".to_string());
            }
            KeyCode::Enter => self.open_detail(),
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => self.go_back(),
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            _ => {}
        }
    }

    /// Navigate to the detail screen carrying the selected record.
    fn open_detail(&mut self) {
        let Some(tile) = self.state.current_tile() else {
            self.state.set_status("No game selected".to_string());
            return;
        };
        let tile = tile.clone();
        info!(game = %tile.record.name, "Opening game details");
        self.detail = Some(tile);
        self.screen = Screen::Detail;
    }

    /// Return to the main screen. Unconditional and synchronous; there is
    /// no navigation stack to unwind.
    fn go_back(&mut self) {
        self.screen = Screen::Main;
        self.detail = None;
        self.state.set_status("Returned to game list".to_string());
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Main => self.draw_main(frame),
            Screen::Detail => self.draw_detail(frame),
        }
        if self.load_state == LoadState::Loading {
            self.render_loading_modal(frame);
        }
    }

    fn draw_main(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(TILE_HEIGHT),
                Constraint::Length(4),
            ])
            .split(size);

        let title = Paragraph::new(Line::from(Span::styled(
            "Popular Games",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        self.render_search_bar(frame, chunks[1]);
        self.render_poster_grid(frame, chunks[2]);
        self.render_status(frame, chunks[3]);
    }

    fn render_search_bar(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Search");
        let content = if self.state.search.is_empty() && self.state.mode != Mode::Search {
            Line::from(Span::styled(
                "Search for a game...",
                Style::default().fg(self.theme.muted),
            ))
        } else {
            Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.accent)),
                Span::raw(self.state.search.clone()),
            ])
        };
        frame.render_widget(Paragraph::new(content).block(block), area);

        if self.state.mode == Mode::Search {
            let cursor_x = (area.x + 3 + self.state.search.len() as u16)
                .min(area.x + area.width.saturating_sub(2));
            frame.set_cursor(cursor_x, area.y + 1);
        }
    }

    fn render_poster_grid(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Games");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.state.tiles.is_empty() {
            let message = match self.load_state {
                LoadState::Idle | LoadState::Loading => "Loading catalog…",
                LoadState::Failed => "Catalog unavailable",
                LoadState::Ready => "No games with cover art to show",
            };
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, inner);
            return;
        }

        let visible_rows = (inner.height / TILE_HEIGHT).max(1) as usize;
        self.state.visible_rows = visible_rows;
        self.state.ensure_cursor_visible();

        let total_rows = grid::row_count(self.state.tiles.len());
        let first_row = self.state.row_offset;
        let last_row = (first_row + visible_rows).min(total_rows);
        let tile_width = inner.width / GRID_COLUMNS as u16;

        for row in first_row..last_row {
            for col in 0..GRID_COLUMNS {
                let index = row * GRID_COLUMNS + col;
                let Some(tile) = self.state.tiles.get(index) else {
                    break;
                };
                let x = inner.x + col as u16 * tile_width;
                let y = inner.y + (row - first_row) as u16 * TILE_HEIGHT;
                let cell = Rect::new(
                    x,
                    y,
                    tile_width.min(inner.right().saturating_sub(x)),
                    TILE_HEIGHT.min(inner.bottom().saturating_sub(y)),
                );
                self.render_tile(frame, cell, tile, index == self.state.cursor);
            }
        }
    }

    fn render_tile(&self, frame: &mut Frame, area: Rect, tile: &Tile, selected: bool) {
        if area.width < 4 || area.height < 3 {
            return;
        }
        let border_style = if selected {
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // Cover art stand-in: shaded fill once the bytes arrived, dots
        // while in flight, struck out on failure.
        let (fill, fill_style) = match tile.poster {
            PosterStatus::Loaded => ("▓", Style::default().fg(self.theme.accent_alt)),
            PosterStatus::Loading => ("·", Style::default().fg(self.theme.muted)),
            PosterStatus::Failed => ("╳", Style::default().fg(self.theme.danger)),
        };
        let art_height = inner.height.saturating_sub(2);
        let mut lines: Vec<Line> = (0..art_height)
            .map(|_| Line::from(Span::styled(fill.repeat(inner.width as usize), fill_style)))
            .collect();
        lines.push(Line::from(Span::styled(
            tile.record.name.clone(),
            Style::default()
                .fg(self.theme.primary_fg)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            tile.record.release_date.clone(),
            Style::default().fg(self.theme.muted),
        )));
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_detail(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(4),
            ])
            .split(size);

        let detail_block = Block::default().borders(Borders::ALL).title("Game Details");
        match &self.detail {
            Some(tile) => {
                let name = Paragraph::new(Line::from(Span::styled(
                    tile.record.name.clone(),
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                )))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
                frame.render_widget(name, chunks[0]);

                let mut lines = vec![
                    Line::from(vec![
                        Span::styled("Released: ", Style::default().fg(self.theme.muted)),
                        Span::raw(tile.record.release_date.clone()),
                    ]),
                    Line::from(""),
                ];
                for text_line in tile.record.description.lines() {
                    lines.push(Line::from(text_line.to_string()));
                }
                let body = Paragraph::new(lines)
                    .block(detail_block)
                    .wrap(Wrap { trim: true });
                frame.render_widget(body, chunks[1]);
            }
            None => {
                frame.render_widget(Block::default().borders(Borders::ALL), chunks[0]);
                let body = Paragraph::new("No game selected")
                    .alignment(Alignment::Center)
                    .block(detail_block);
                frame.render_widget(body, chunks[1]);
            }
        }

        let back = Paragraph::new(Line::from(vec![
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" back  "),
            Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" quit"),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Back"));
        frame.render_widget(back, chunks[2]);

        self.render_status(frame, chunks[3]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.state.mode == Mode::Search {
            format!("Search: {}", self.state.search)
        } else {
            self.state.status.clone()
        };
        let mut secondary = format!(
            "Games: {}  Tiles: {}",
            self.catalog_len,
            self.state.tiles.len()
        );
        if !self.failed_pages.is_empty() {
            secondary.push_str(&format!("  Failed pages: {:?}", self.failed_pages));
        }
        if let Some(at) = self.fetched_at {
            secondary.push_str(&format!(
                "  Fetched: {}",
                at.with_timezone(&Local).format("%H:%M:%S")
            ));
        }
        let paragraph = Paragraph::new(vec![Line::from(primary), Line::from(secondary)])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_loading_modal(&self, frame: &mut Frame) {
        let area = centered_rect(30, 5, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Fetching games…",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Loading"));
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

struct UiState {
    tiles: Vec<Tile>,
    cursor: usize,
    row_offset: usize,
    visible_rows: usize,
    search: String,
    status: String,
    mode: Mode,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tiles: Vec::new(),
            cursor: 0,
            row_offset: 0,
            visible_rows: 1,
            search: String::new(),
            status: "Ready".to_string(),
            mode: Mode::Browse,
            should_quit: false,
        }
    }
}

impl UiState {
    fn move_cursor(&mut self, delta_rows: isize, delta_cols: isize) {
        self.cursor = grid::step(self.cursor, self.tiles.len(), delta_rows, delta_cols);
        self.ensure_cursor_visible();
    }

    fn page(&mut self, direction: isize) {
        let rows = self.visible_rows.max(1) as isize;
        self.move_cursor(rows * direction, 0);
    }

    fn move_to_start(&mut self) {
        self.cursor = 0;
        self.ensure_cursor_visible();
    }

    fn move_to_end(&mut self) {
        self.cursor = self.tiles.len().saturating_sub(1);
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        self.row_offset = grid::scroll_offset(
            grid::row_of(self.cursor),
            self.row_offset,
            self.visible_rows.max(1),
            grid::row_count(self.tiles.len()),
        );
    }

    fn current_tile(&self) -> Option<&Tile> {
        self.tiles.get(self.cursor)
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }
}
