use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

use crate::api::StatsProvider;
use crate::controller::{AddOutcome, DashboardController, PanelState};
use crate::models::REGION_MARKERS;
use super::{format_count, format_price, format_volume};

/// Terminal dashboard over the region statistics controller.
pub struct DashboardApp<P: StatsProvider> {
    controller: DashboardController<P>,
    region_list_state: ListState,
    status_message: String,
    should_quit: bool,
}

impl<P: StatsProvider> DashboardApp<P> {
    pub fn new(controller: DashboardController<P>) -> Self {
        let mut region_list_state = ListState::default();
        region_list_state.select(Some(0));

        Self {
            controller,
            region_list_state,
            status_message: "Listo".to_string(),
            should_quit: false,
        }
    }

    /// Run the application
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        io::stdout().execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_app(&mut terminal).await;

        disable_raw_mode()?;
        io::stdout().execute(LeaveAlternateScreen)?;

        result
    }

    async fn run_app(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        // Startup loads; region data waits for an explicit selection.
        self.controller.load_summary().await;
        self.controller.load_filter_options().await;

        loop {
            terminal.draw(|f| self.render(f))?;

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code).await;
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    async fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Down => self.next_region(),
            KeyCode::Up => self.previous_region(),
            KeyCode::Enter => {
                let region = self.cursor_region();
                self.status_message = format!("Cargando {}...", region.name);
                self.controller.select_region(region.id).await;
                self.status_message = region.name.to_string();
            }
            KeyCode::Char('a') => {
                let region = self.cursor_region();
                self.status_message = match self.controller.add_to_comparison(region.id) {
                    AddOutcome::Added => format!("{} agregada a la comparación", region.name),
                    AddOutcome::AlreadyPresent => {
                        format!("{} ya está en la comparación", region.name)
                    }
                };
            }
            KeyCode::Char('d') => {
                let region = self.cursor_region();
                self.controller.remove_from_comparison(region.id);
                self.status_message = format!("{} quitada de la comparación", region.name);
            }
            KeyCode::Char('c') => {
                if self.controller.compare_selected().await.is_err() {
                    self.status_message =
                        "Selecciona al menos una región antes de comparar".to_string();
                } else {
                    self.status_message = format!(
                        "Comparando {} regiones",
                        self.controller.comparison_ids().len()
                    );
                }
            }
            KeyCode::Char('x') => {
                self.controller.clear_comparison();
                self.status_message = "Comparación vaciada".to_string();
            }
            KeyCode::Char('s') => self.cycle_subsector().await,
            KeyCode::Char('p') => self.cycle_product().await,
            KeyCode::Char('y') => self.cycle_year().await,
            KeyCode::Char('l') => {
                self.controller.clear_filter().await;
                self.status_message = "Filtros limpiados".to_string();
            }
            KeyCode::Char('r') => {
                self.controller.load_summary().await;
                self.controller.load_filter_options().await;
                self.status_message = "Datos actualizados".to_string();
            }
            _ => {}
        }
    }

    fn cursor_region(&self) -> &'static crate::models::RegionMarker {
        let index = self.region_list_state.selected().unwrap_or(0);
        &REGION_MARKERS[index.min(REGION_MARKERS.len() - 1)]
    }

    fn next_region(&mut self) {
        let i = match self.region_list_state.selected() {
            Some(i) if i >= REGION_MARKERS.len() - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.region_list_state.select(Some(i));
    }

    fn previous_region(&mut self) {
        let i = match self.region_list_state.selected() {
            Some(0) | None => REGION_MARKERS.len() - 1,
            Some(i) => i - 1,
        };
        self.region_list_state.select(Some(i));
    }

    async fn cycle_subsector(&mut self) {
        let choices = match self.controller.filter_options.as_ready() {
            Some(choices) => choices.subsectors.clone(),
            None => return,
        };
        let next = next_choice(&choices, &self.controller.filters().subsector);
        self.status_message = filter_status("Subsector", &next);
        self.controller
            .set_filter(crate::models::FilterPatch { subsector: Some(next), ..Default::default() })
            .await;
    }

    async fn cycle_product(&mut self) {
        // Prefer the selected region's own product list when we have one.
        let choices = if !self.controller.region_product_options.is_empty() {
            self.controller.region_product_options.clone()
        } else {
            match self.controller.filter_options.as_ready() {
                Some(choices) => choices.products.clone(),
                None => return,
            }
        };
        let next = next_choice(&choices, &self.controller.filters().product);
        self.status_message = filter_status("Producto", &next);
        self.controller
            .set_filter(crate::models::FilterPatch { product: Some(next), ..Default::default() })
            .await;
    }

    async fn cycle_year(&mut self) {
        let choices: Vec<String> = match self.controller.filter_options.as_ready() {
            Some(choices) => choices.years.iter().map(|y| y.to_string()).collect(),
            None => return,
        };
        let next = next_choice(&choices, &self.controller.filters().year);
        self.status_message = filter_status("Año", &next);
        self.controller
            .set_filter(crate::models::FilterPatch { year: Some(next), ..Default::default() })
            .await;
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(f.area());

        let title = Paragraph::new("🗺️  Precios Agrícolas Regionales")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Cyan));
        f.render_widget(title, chunks[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
            .split(chunks[1]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(11),
                Constraint::Length(7),
                Constraint::Length(8),
            ])
            .split(columns[0]);

        self.render_regions(f, left[0]);
        self.render_filters(f, left[1]);
        self.render_summary(f, left[2]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(8),
                Constraint::Min(8),
                Constraint::Length(10),
            ])
            .split(columns[1]);

        self.render_region_info(f, right[0]);
        self.render_products(f, right[1]);
        self.render_comparison(f, right[2]);

        self.render_status_bar(f, chunks[2]);
    }

    fn render_regions(&mut self, f: &mut Frame, area: Rect) {
        let selected = self.controller.selected_region();
        let items: Vec<ListItem> = REGION_MARKERS
            .iter()
            .map(|marker| {
                let mut spans = vec![Span::raw(marker.name)];
                if selected == Some(marker.id) {
                    spans.push(Span::styled(
                        " ●",
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ));
                }
                if self.controller.comparison_contains(marker.id) {
                    spans.push(Span::styled(" [comp]", Style::default().fg(Color::Magenta)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("📍 Regiones"))
            .highlight_style(
                Style::default()
                    .bg(Color::LightBlue)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("→ ");

        f.render_stateful_widget(list, area, &mut self.region_list_state);
    }

    fn render_filters(&self, f: &mut Frame, area: Rect) {
        let filters = self.controller.filters();
        let label = |value: &str| {
            if value.is_empty() { "Todos".to_string() } else { value.to_string() }
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Subsector: ", Style::default().fg(Color::Yellow)),
                Span::raw(label(&filters.subsector)),
            ]),
            Line::from(vec![
                Span::styled("Producto:  ", Style::default().fg(Color::Yellow)),
                Span::raw(label(&filters.product)),
            ]),
            Line::from(vec![
                Span::styled("Año:       ", Style::default().fg(Color::Yellow)),
                Span::raw(label(&filters.year)),
            ]),
        ];

        match &self.controller.filter_options {
            PanelState::Loading => lines.push(Line::from("⏳ Cargando filtros...")),
            PanelState::Error(message) => lines.push(Line::from(Span::styled(
                format!("❌ {message}"),
                Style::default().fg(Color::Red),
            ))),
            _ => {}
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("🔍 Filtros"));
        f.render_widget(paragraph, area);
    }

    fn render_summary(&self, f: &mut Frame, area: Rect) {
        let lines = match &self.controller.summary {
            PanelState::Empty => vec![Line::from("Sin datos")],
            PanelState::Loading => vec![Line::from("⏳ Cargando estadísticas...")],
            PanelState::Error(message) => vec![Line::from(Span::styled(
                format!("❌ {message}"),
                Style::default().fg(Color::Red),
            ))],
            PanelState::Ready(summary) => {
                let fecha = summary
                    .fecha_reciente
                    .map(|d| d.format("%d-%m-%Y").to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                vec![
                    stat_line("📊 Registros: ", format_count(summary.total_registros)),
                    stat_line("🗺️ Regiones:  ", format_count(summary.total_regiones)),
                    stat_line("🍎 Productos: ", format_count(summary.total_productos)),
                    stat_line("🏪 Mercados:  ", format_count(summary.total_mercados)),
                    stat_line("📅 Última fecha: ", fecha),
                ]
            }
        };

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Resumen general"));
        f.render_widget(paragraph, area);
    }

    fn render_region_info(&self, f: &mut Frame, area: Rect) {
        let lines = match &self.controller.region_info {
            PanelState::Empty => vec![Line::from("Selecciona una región con Enter")],
            PanelState::Loading => vec![Line::from("⏳ Cargando información de la región...")],
            PanelState::Error(message) => vec![Line::from(Span::styled(
                format!("❌ {message}"),
                Style::default().fg(Color::Red),
            ))],
            PanelState::Ready(detail) => {
                let mut lines = vec![
                    Line::from(Span::styled(
                        format!("📍 {}", detail.region_nombre),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    )),
                    stat_line("Registros: ", format_count(detail.total_registros)),
                    stat_line("Productos: ", format_count(detail.total_productos)),
                    stat_line("Mercados:  ", format_count(detail.total_mercados)),
                ];
                if !detail.subsectores.is_empty() {
                    let badges = detail
                        .subsectores
                        .iter()
                        .take(5)
                        .map(|s| format!("{} ({})", s.nombre, s.total))
                        .collect::<Vec<_>>()
                        .join(" • ");
                    lines.push(Line::from(vec![
                        Span::styled("🌿 Subsectores: ", Style::default().fg(Color::Yellow)),
                        Span::raw(badges),
                    ]));
                }
                lines
            }
        };

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Región"))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_products(&self, f: &mut Frame, area: Rect) {
        match &self.controller.products {
            PanelState::Ready(list) if !list.productos.is_empty() => {
                let items: Vec<ListItem> = list
                    .productos
                    .iter()
                    .map(|row| {
                        ListItem::new(vec![
                            Line::from(vec![
                                Span::styled(
                                    row.producto.as_deref().unwrap_or("Nombre no disponible"),
                                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                                ),
                                Span::raw(" — "),
                                Span::raw(row.subsector.as_deref().unwrap_or("Sin subsector")),
                            ]),
                            Line::from(vec![
                                Span::raw("   Precio promedio: "),
                                Span::styled(
                                    format_price(row.precio_promedio),
                                    Style::default().fg(Color::Green),
                                ),
                                Span::raw(" | Volumen: "),
                                Span::raw(format_volume(row.volumen_total)),
                                Span::raw(" | Registros: "),
                                Span::raw(format_count(row.total_registros)),
                            ]),
                        ])
                    })
                    .collect();

                let title = format!("📦 Productos ({})", format_count(list.total_resultados));
                let widget =
                    List::new(items).block(Block::default().borders(Borders::ALL).title(title));
                f.render_widget(widget, area);
            }
            state => {
                let lines = match state {
                    PanelState::Empty => vec![Line::from("Sin región seleccionada")],
                    PanelState::Loading => vec![Line::from("⏳ Cargando productos...")],
                    PanelState::Error(message) => vec![Line::from(Span::styled(
                        format!("❌ {message}"),
                        Style::default().fg(Color::Red),
                    ))],
                    PanelState::Ready(_) => vec![
                        Line::from("🚫 No se encontraron productos"),
                        Line::from("Prueba ajustando los filtros"),
                    ],
                };
                let paragraph = Paragraph::new(lines)
                    .block(Block::default().borders(Borders::ALL).title("📦 Productos"));
                f.render_widget(paragraph, area);
            }
        }
    }

    fn render_comparison(&self, f: &mut Frame, area: Rect) {
        let lines = match &self.controller.comparison_panel {
            PanelState::Empty => {
                let ids = self.controller.comparison_ids();
                if ids.is_empty() {
                    vec![Line::from("Agrega regiones con 'a' y compara con 'c'")]
                } else {
                    vec![Line::from(format!("{} regiones en espera — pulsa 'c'", ids.len()))]
                }
            }
            PanelState::Loading => vec![Line::from("⏳ Comparando regiones...")],
            PanelState::Error(message) => vec![Line::from(Span::styled(
                format!("❌ {message}"),
                Style::default().fg(Color::Red),
            ))],
            PanelState::Ready(report) => {
                let mut lines: Vec<Line> = report
                    .rows
                    .iter()
                    .map(|row| {
                        Line::from(vec![
                            Span::styled(
                                row.region_nombre.clone(),
                                Style::default().fg(Color::Yellow),
                            ),
                            Span::raw(format!(
                                ": precio {} | volumen {} | {} productos",
                                format_price(row.estadisticas.precio_promedio),
                                format_volume(row.estadisticas.volumen_total),
                                format_count(row.estadisticas.productos_unicos),
                            )),
                        ])
                    })
                    .collect();

                let highlights = &report.highlights;
                if let Some(max) = &highlights.highest_price {
                    lines.push(stat_line(
                        "📈 Más cara: ",
                        format!("{} (${:.2})", max.region, max.value),
                    ));
                }
                if let Some(min) = &highlights.lowest_price {
                    lines.push(stat_line(
                        "📉 Más barata: ",
                        format!("{} (${:.2})", min.region, min.value),
                    ));
                }
                if let Some(volume) = &highlights.highest_volume {
                    lines.push(stat_line("🚛 Mayor volumen: ", volume.region.clone()));
                }
                if let Some(spread) = highlights.price_spread_percent {
                    lines.push(stat_line("↔ Brecha de precios: ", format!("{spread:.1}%")));
                }
                lines
            }
        };

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("⚖️ Comparación"))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(self.status_message.as_str(), Style::default().fg(Color::White)),
            Span::styled(
                "  |  ↑/↓ región • Enter ver • a/d comparar± • c comparar • x vaciar • s/p/y filtros • l limpiar • r refrescar • q salir",
                Style::default().fg(Color::Gray),
            ),
        ]);

        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label.to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(value, Style::default().fg(Color::Green)),
    ])
}

/// Advance through `choices`, wrapping back to unset ("") after the last.
fn next_choice(choices: &[String], current: &str) -> String {
    if choices.is_empty() {
        return String::new();
    }
    if current.is_empty() {
        return choices[0].clone();
    }
    match choices.iter().position(|c| c == current) {
        Some(i) if i + 1 < choices.len() => choices[i + 1].clone(),
        _ => String::new(),
    }
}

fn filter_status(field: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{field}: todos")
    } else {
        format!("{field}: {value}")
    }
}
