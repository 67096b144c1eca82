use super::{key_to_app_event, AppEvent, Debouncer, InputMode, TerminalManager, Theme};
use super::theme::Palette;
use crate::catalog::{CatalogInfo, Song, SourceFetcher};
use crate::config::Config;
use crate::store::KeyValueStore;
use crate::view::{DisplayRow, Notice, SearchScope, Session, SortField, ViewMode};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// How long a status flash stays on screen
const FLASH_DURATION: Duration = Duration::from_secs(3);
const SKELETON_ROWS: usize = 8;

pub struct App {
    terminal: TerminalManager,
    session: Session<SourceFetcher>,
    store: Arc<dyn KeyValueStore>,
    manifest: String,
    legacy_csv: Option<String>,

    // UI State
    theme: Theme,
    input_mode: InputMode,
    search_input: String,
    scope: SearchScope,
    debouncer: Debouncer,
    list_state: ListState,
    picker_state: ListState,
    status_message: Option<(String, Instant)>,
    /// Catalog name while a fetch is in flight; the list shows placeholders
    loading: Option<String>,
    celebrated_first_load: bool,
    should_quit: bool,
}

impl App {
    pub fn new(session: Session<SourceFetcher>, store: Arc<dyn KeyValueStore>, config: &Config) -> Result<Self> {
        let terminal = TerminalManager::new()?;
        let theme = Theme::load(store.as_ref());

        Ok(Self {
            terminal,
            session,
            store,
            manifest: config.catalog.manifest.clone(),
            legacy_csv: config.catalog.legacy_csv.clone(),
            theme,
            input_mode: InputMode::Browse,
            search_input: String::new(),
            scope: SearchScope::All,
            debouncer: Debouncer::new(Duration::from_millis(config.ui.search_debounce_ms)),
            list_state: ListState::default(),
            picker_state: ListState::default(),
            status_message: None,
            loading: None,
            celebrated_first_load: false,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.bootstrap().await?;

        while !self.should_quit {
            if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        if let Some(app_event) = key_to_app_event(self.input_mode, key) {
                            self.handle_event(app_event).await?;
                        }
                    }
                }
            }

            // Debounced search: runs once the input has been quiet long enough
            if self.debouncer.fire(Instant::now()) {
                self.run_search();
            }

            self.render()?;
            sleep(Duration::from_millis(30)).await;
        }

        info!("Songbook shutting down");
        Ok(())
    }

    /// Discover catalogs and load the first one, with placeholders on screen
    async fn bootstrap(&mut self) -> Result<()> {
        self.loading = Some(self.manifest.clone());
        self.render()?;

        let manifest = self.manifest.clone();
        let legacy_csv = self.legacy_csv.clone();
        let result = self.session.start(&manifest, legacy_csv.as_deref()).await;
        self.loading = None;

        match result {
            Ok(source) => {
                info!("Catalog list from {:?}", source);
                self.celebrate_load();
            }
            Err(e) => warn!("Startup load failed: {}", e),
        }
        self.reset_selection();
        Ok(())
    }

    async fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Quit => {
                self.should_quit = true;
            }

            AppEvent::Up => self.move_selection(-1),
            AppEvent::Down => self.move_selection(1),

            AppEvent::ShowAll => {
                self.search_input.clear();
                self.scope = SearchScope::All;
                self.debouncer.cancel();
                self.session.show_all();
                self.reset_selection();
                self.set_status("🎉 Showing every song");
            }
            AppEvent::ShowFavorites => {
                self.session.show_favorites();
                self.reset_selection();
            }
            AppEvent::ShowRecent => {
                self.session.show_recent();
                self.reset_selection();
            }
            AppEvent::ShowRandom => {
                self.session.show_random(&mut rand::thread_rng());
                self.reset_selection();
            }

            AppEvent::EnterSearch => {
                self.input_mode = InputMode::Search;
            }
            AppEvent::ExitSearch => {
                self.debouncer.cancel();
                self.input_mode = InputMode::Browse;
            }
            AppEvent::SearchInput(c) => {
                self.search_input.push(c);
                self.debouncer.touch(Instant::now());
            }
            AppEvent::SearchBackspace => {
                self.search_input.pop();
                self.debouncer.touch(Instant::now());
            }
            AppEvent::SubmitSearch => {
                self.debouncer.flush();
                self.run_search();
                self.input_mode = InputMode::Browse;
            }
            AppEvent::CycleScope => {
                self.scope = self.scope.next();
                debug!("Search scope is now {}", self.scope);
                if self.session.mode() == ViewMode::Search {
                    self.debouncer.cancel();
                    self.run_search();
                }
            }

            AppEvent::SortByTitle => self.sort_by(SortField::Title),
            AppEvent::SortByArtist => self.sort_by(SortField::Artist),

            AppEvent::ToggleFavorite => {
                if let Some(song) = self.selected_song() {
                    if self.session.toggle_favorite(&song) {
                        self.set_status(&format!("🎉 Added '{}' to favorites!", song.title));
                    } else {
                        self.set_status(&format!("Removed '{}' from favorites", song.title));
                    }
                    self.clamp_selection();
                }
            }
            AppEvent::ViewSong => {
                if let Some(song) = self.selected_song() {
                    self.session.record_view(&song);
                    self.set_status(&format!("♪ {}  {}", song.code, song.display_title()));
                }
            }

            AppEvent::OpenCatalogPicker => {
                if self.session.catalogs().is_empty() {
                    self.set_status("No catalogs available");
                } else {
                    let active = self.session.active_catalog().map(|c| c.id.clone());
                    let index = self
                        .session
                        .catalogs()
                        .iter()
                        .position(|c| Some(&c.id) == active.as_ref())
                        .unwrap_or(0);
                    self.picker_state.select(Some(index));
                    self.input_mode = InputMode::CatalogPicker;
                }
            }
            AppEvent::CloseCatalogPicker => {
                self.input_mode = InputMode::Browse;
            }
            AppEvent::PickCatalog => {
                self.input_mode = InputMode::Browse;
                let picked = self
                    .picker_state
                    .selected()
                    .and_then(|i| self.session.catalogs().get(i))
                    .cloned();
                if let Some(catalog) = picked {
                    self.switch_catalog(catalog).await?;
                }
            }

            AppEvent::ToggleTheme => {
                self.theme = self.theme.toggled();
                self.theme.save(self.store.as_ref());
                debug!("Theme switched to {:?}", self.theme);
            }
        }

        Ok(())
    }

    fn run_search(&mut self) {
        self.session.search(&self.search_input, self.scope);
        self.reset_selection();
    }

    fn sort_by(&mut self, field: SortField) {
        self.session.sort_by(field);
        self.reset_selection();
    }

    async fn switch_catalog(&mut self, catalog: CatalogInfo) -> Result<()> {
        let needs_fetch = !self.session.is_loaded(&catalog.id);
        if needs_fetch {
            self.loading = Some(catalog.display_name.clone());
            self.render()?;
        }

        let result = self.session.switch_catalog(&catalog.id).await;
        self.loading = None;

        match result {
            Ok(()) => {
                self.search_input.clear();
                self.debouncer.cancel();
                if needs_fetch {
                    self.celebrate_load();
                } else {
                    self.set_status(&format!("Switched to {}", catalog));
                }
            }
            Err(e) => debug!("Catalog switch to '{}' failed: {}", catalog.id, e),
        }
        self.reset_selection();
        Ok(())
    }

    fn celebrate_load(&mut self) {
        let Some(active) = self.session.active_catalog() else {
            return;
        };
        let message = if self.celebrated_first_load {
            format!("Loaded {}", active)
        } else {
            format!("🎉 {} ready. Happy singing!", active)
        };
        self.celebrated_first_load = true;
        self.set_status(&message);
    }

    fn set_status(&mut self, message: &str) {
        self.status_message = Some((message.to_string(), Instant::now()));
    }

    fn visible_len(&self) -> usize {
        if self.session.notice().is_some() {
            0
        } else {
            self.session.state().last_displayed.len()
        }
    }

    fn selected_song(&self) -> Option<Song> {
        if self.session.notice().is_some() {
            return None;
        }
        let index = self.list_state.selected()?;
        self.session.state().last_displayed.get(index).cloned()
    }

    fn reset_selection(&mut self) {
        let selection = if self.visible_len() == 0 { None } else { Some(0) };
        self.list_state.select(selection);
    }

    /// Keep the cursor on a row after the list shrank underneath it
    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: i32) {
        let (state, len) = match self.input_mode {
            InputMode::CatalogPicker => (&mut self.picker_state, self.session.catalogs().len()),
            _ => {
                let len = self.visible_len();
                (&mut self.list_state, len)
            }
        };
        if len == 0 {
            return;
        }

        let current = state.selected().unwrap_or(0) as i32;
        let next = (current + delta).rem_euclid(len as i32) as usize;
        state.select(Some(next));
    }

    fn render(&mut self) -> Result<()> {
        let session = &self.session;
        let rows = session.rows();
        let palette = self.theme.palette();
        let theme = self.theme;
        let status_message = self.status_message.clone();
        let results_label = session.results_label();
        let empty_message = session.empty_state().map(|e| e.message());
        let notice = session.notice();
        let state = session.state();
        let catalog_name = session
            .active_catalog()
            .map(|c| c.display_name.as_str())
            .unwrap_or("No catalog");
        let catalogs = session.catalogs();
        let active_id = session.active_catalog().map(|c| c.id.as_str());

        let sort_hint = format!(
            "{} {}",
            match state.sort_field {
                SortField::Title => "Title",
                SortField::Artist => "Artist",
            },
            state.sort_direction.arrow()
        );

        self.terminal.draw(|f| {
            let size = f.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // Header
                    Constraint::Length(3), // Search bar
                    Constraint::Min(5),    // Songs
                    Constraint::Length(3), // Status bar
                ])
                .split(size);

            Self::render_header(f, chunks[0], state.mode, catalog_name, theme, &palette);
            Self::render_search_bar(
                f,
                chunks[1],
                &self.search_input,
                self.scope,
                self.input_mode == InputMode::Search,
                self.debouncer.is_pending(),
                &palette,
            );

            if let Some(loading) = &self.loading {
                Self::render_skeleton(f, chunks[2], loading, &palette);
            } else if let Some(notice) = notice {
                Self::render_notice(f, chunks[2], notice, &palette);
            } else if let Some(message) = empty_message {
                Self::render_empty(f, chunks[2], message, &palette);
            } else {
                Self::render_song_list(f, chunks[2], &rows, &results_label, &palette, &mut self.list_state);
            }

            Self::render_status_bar(f, chunks[3], &results_label, &sort_hint, status_message, &palette);

            if self.input_mode == InputMode::CatalogPicker {
                Self::render_catalog_picker(f, size, catalogs, active_id, &palette, &mut self.picker_state);
            }
        })
    }

    fn render_header(f: &mut Frame, area: Rect, mode: ViewMode, catalog_name: &str, theme: Theme, palette: &Palette) {
        let tabs = [
            (ViewMode::Search, "s All"),
            (ViewMode::Favorites, "f Favorites"),
            (ViewMode::Recent, "r Recent"),
            (ViewMode::Random, "x Random"),
        ];

        let mut spans = Vec::new();
        for (i, (tab_mode, label)) in tabs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" | "));
            }
            let style = if *tab_mode == mode {
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.muted)
            };
            spans.push(Span::styled(*label, style));
        }
        spans.push(Span::raw("   "));
        spans.push(Span::styled(format!("T {}", theme.icon()), Style::default().fg(palette.muted)));

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("🎤 Songbook - {}", catalog_name)),
        );
        f.render_widget(header, area);
    }

    fn render_search_bar(
        f: &mut Frame,
        area: Rect,
        query: &str,
        scope: SearchScope,
        editing: bool,
        pending: bool,
        palette: &Palette,
    ) {
        let cursor = if editing { "▏" } else { "" };
        let pending_marker = if pending { " …" } else { "" };
        let text = format!("🔍 [{}] {}{}{}", scope, query, cursor, pending_marker);

        let (title, border) = if editing {
            ("Search - Enter to run, Esc to leave, Tab for scope", palette.accent)
        } else {
            ("Search - press /", palette.muted)
        };

        let search = Paragraph::new(text)
            .style(Style::default().fg(palette.text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(border)),
            );
        f.render_widget(search, area);
    }

    fn render_song_list(
        f: &mut Frame,
        area: Rect,
        rows: &[DisplayRow<'_>],
        results_label: &str,
        palette: &Palette,
        list_state: &mut ListState,
    ) {
        let items: Vec<ListItem> = rows
            .iter()
            .map(|row| {
                let marker = if row.is_favorite { "♥ " } else { "  " };
                let recent = if row.is_recent { " ·" } else { "" };
                let style = if row.is_favorite {
                    Style::default().fg(palette.favorite)
                } else {
                    Style::default().fg(palette.text)
                };

                ListItem::new(Line::from(vec![
                    Span::styled(marker, style),
                    Span::styled(format!("{:<7}", row.song.code), Style::default().fg(palette.muted)),
                    Span::styled(row.song.title.clone(), style.add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {}", row.song.artist), Style::default().fg(palette.muted)),
                    Span::styled(recent, Style::default().fg(palette.accent)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(results_label.to_string()))
            .highlight_style(Style::default().bg(palette.highlight_bg))
            .highlight_symbol("→ ");

        f.render_stateful_widget(list, area, list_state);
    }

    fn render_skeleton(f: &mut Frame, area: Rect, loading: &str, palette: &Palette) {
        let items: Vec<ListItem> = (0..SKELETON_ROWS)
            .map(|i| {
                let width = 14 + (i * 7) % 16;
                ListItem::new(format!("  ░░░░░  {}  {}", "░".repeat(width), "░".repeat(8)))
                    .style(Style::default().fg(palette.muted))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Loading {}...", loading)),
        );
        f.render_widget(list, area);
    }

    fn render_notice(f: &mut Frame, area: Rect, notice: &Notice, palette: &Palette) {
        let text = vec![
            Line::from(Span::styled(
                notice.message.clone(),
                Style::default().fg(palette.error).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("Could not load {}", notice.catalog),
                Style::default().fg(palette.muted),
            )),
        ];

        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn render_empty(f: &mut Frame, area: Rect, message: &str, palette: &Palette) {
        let paragraph = Paragraph::new(message.to_string())
            .style(Style::default().fg(palette.muted))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(
        f: &mut Frame,
        area: Rect,
        results_label: &str,
        sort_hint: &str,
        status_message: Option<(String, Instant)>,
        palette: &Palette,
    ) {
        let flash = status_message
            .filter(|(_, at)| at.elapsed() < FLASH_DURATION)
            .map(|(message, _)| message)
            .unwrap_or_else(|| "Ready".to_string());

        let line = Line::from(vec![
            Span::styled(results_label.to_string(), Style::default().fg(palette.accent)),
            Span::raw(" | "),
            Span::styled(format!("Sort: {}", sort_hint), Style::default().fg(palette.muted)),
            Span::raw(" | "),
            Span::styled(flash, Style::default().fg(palette.text)),
        ]);

        let status = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        f.render_widget(status, area);
    }

    fn render_catalog_picker(
        f: &mut Frame,
        area: Rect,
        catalogs: &[CatalogInfo],
        active_id: Option<&str>,
        palette: &Palette,
        list_state: &mut ListState,
    ) {
        let popup_area = Self::centered_rect(60, 60, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(" Choose a catalog ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent));
        f.render_widget(block, popup_area);

        let inner_area = popup_area.inner(Margin { horizontal: 1, vertical: 1 });
        let items: Vec<ListItem> = catalogs
            .iter()
            .map(|catalog| {
                let marker = if Some(catalog.id.as_str()) == active_id { "● " } else { "  " };
                ListItem::new(format!("{}{}", marker, catalog.display_name))
            })
            .collect();

        let list = List::new(items)
            .style(Style::default().fg(palette.text))
            .highlight_style(Style::default().bg(palette.highlight_bg))
            .highlight_symbol("▶ ");
        f.render_stateful_widget(list, inner_area, list_state);

        if popup_area.height > 2 {
            let instructions_area = Rect {
                x: popup_area.x + 1,
                y: popup_area.y + popup_area.height - 2,
                width: popup_area.width.saturating_sub(2),
                height: 1,
            };
            let instructions = Paragraph::new("↑↓: Navigate | Enter: Select | Esc: Cancel")
                .style(Style::default().fg(palette.muted))
                .alignment(Alignment::Center);
            f.render_widget(instructions, instructions_area);
        }
    }

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}
