//! Rendering: bottle, sidebar, overlays and the clear fade.

use crate::block::{Block as BoardBlock, Connection, PillColor, Side};
use crate::game::{Game, GameState, Phase};
use crate::grid::Grid;
use crate::pill::Pill;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each board cell is two terminal columns wide so cells look square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 22;
const CLEAR_FADE_MS: u32 = 350;

/// Board length as terminal cells, saturating instead of wrapping.
fn to_cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Bottle size in terminal cells, border included.
fn bottle_size(grid: &Grid) -> (u16, u16) {
    (
        to_cells(grid.width())
            .saturating_mul(CELL_WIDTH)
            .saturating_add(2),
        to_cells(grid.height()).saturating_add(2),
    )
}

/// Fade over the cells removed by the most recent clear.
pub struct ClearFlash {
    enabled: bool,
    generation: u64,
    cells: Vec<(usize, usize)>,
    effect: Option<Effect>,
    processed_at: Option<Instant>,
}

impl ClearFlash {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            generation: 0,
            cells: Vec::new(),
            effect: None,
            processed_at: None,
        }
    }

    /// Pick up a new clear from the game. Cells already refilled (by the
    /// next level's layout) are skipped.
    fn sync(&mut self, game: &Game) {
        if game.clear_generation() == self.generation {
            return;
        }
        self.generation = game.clear_generation();
        self.effect = None;
        self.processed_at = None;
        self.cells = if self.enabled {
            game.last_clear()
                .iter()
                .copied()
                .filter(|&(x, y)| game.grid().get(x, y).is_none())
                .collect()
        } else {
            Vec::new()
        };
    }

    fn covers(&self, x: usize, y: usize) -> bool {
        self.cells.contains(&(x, y))
    }

    fn render(&mut self, frame: &mut Frame, board: Rect, theme: &Theme, now: Instant) {
        if self.cells.is_empty() {
            return;
        }
        let delta = self
            .processed_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
        self.processed_at = Some(now);

        if self.effect.is_none() {
            let positions = buffer_positions(board, &self.cells);
            let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
                positions.contains(&(pos.x, pos.y))
            }));
            let effect = fx::fade_to(theme.bg, theme.bg, (CLEAR_FADE_MS, Interpolation::Linear))
                .with_filter(filter)
                .with_area(board);
            self.effect = Some(effect);
        }

        let done = match self.effect.as_mut() {
            Some(effect) => {
                frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
                effect.done()
            }
            None => true,
        };
        if done {
            self.effect = None;
            self.cells.clear();
        }
    }
}

/// Buffer positions covered by the given board cells.
fn buffer_positions(board: Rect, cells: &[(usize, usize)]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(gx, gy) in cells {
        let x0 = board.x.saturating_add(to_cells(gx).saturating_mul(CELL_WIDTH));
        let y = board.y.saturating_add(to_cells(gy));
        if y >= board.bottom() {
            continue;
        }
        for x in x0..x0.saturating_add(CELL_WIDTH).min(board.right()) {
            set.insert((x, y));
        }
    }
    set
}

/// Glyph for one board cell: viruses get their own pattern, pill halves are
/// shaped toward their partner.
fn glyph(block: &BoardBlock) -> &'static str {
    if block.is_virus() {
        return "▞▚";
    }
    match block.connection {
        Connection::Connected(Side::Right) => "▐█",
        Connection::Connected(Side::Left) => "█▌",
        Connection::Connected(Side::Up | Side::Down) => "██",
        Connection::Unconnected => "▐▌",
    }
}

/// Draw the whole screen for the current game phase.
pub fn draw(
    frame: &mut Frame,
    game: &Game,
    theme: &Theme,
    paused: bool,
    flash: &mut ClearFlash,
    now: Instant,
) {
    let area = frame.area();
    flash.sync(game);

    let (pw, ph) = bottle_size(game.grid());
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(pw.saturating_add(SIDEBAR_WIDTH)),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);

    let board = draw_bottle(frame, game, theme, inner[0], flash);
    draw_sidebar(frame, game, theme, inner[1]);
    flash.render(frame, board, theme, now);

    match game.state().phase {
        Phase::Start => draw_start_overlay(frame, theme, area),
        Phase::GameOver => draw_game_over(frame, game.state(), theme, area),
        Phase::Playing if paused => draw_pause_overlay(frame, theme, area),
        Phase::Playing => {}
    }
}

/// Returns the inner board rect.
fn draw_bottle(
    frame: &mut Frame,
    game: &Game,
    theme: &Theme,
    area: Rect,
    flash: &ClearFlash,
) -> Rect {
    let title = format!(" Pilltui  Lv {} ", game.state().level);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, theme.title));
    let board = block.inner(area);
    block.render(area, frame.buffer_mut());

    let grid = game.grid();
    let pill = game.pill().map(Pill::blocks);
    let buf = frame.buffer_mut();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let rx = board.x.saturating_add(to_cells(x).saturating_mul(CELL_WIDTH));
            let ry = board.y.saturating_add(to_cells(y));
            if rx.saturating_add(CELL_WIDTH) > board.right() || ry >= board.bottom() {
                continue;
            }
            let cell = pill
                .iter()
                .flatten()
                .find(|b| b.x == x && b.y == y)
                .or_else(|| grid.get(x, y));
            let (symbol, style) = match cell {
                Some(b) => (
                    glyph(b),
                    Style::default().fg(theme.pill_color(b.color)).bg(theme.bg),
                ),
                None if flash.covers(x, y) => ("  ", Style::default().bg(Color::White)),
                None => ("  ", Style::default().bg(theme.bg)),
            };
            buf.set_string(rx, ry, symbol, style);
        }
    }
    board
}

fn draw_sidebar(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) {
    let state = game.state();
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // score, level, viruses, chain
            Constraint::Length(4), // colour strip
            Constraint::Min(0),
        ])
        .split(area);

    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let chain = match game.chain() {
        n if n > 1 => format!("x{n}"),
        _ => "-".to_string(),
    };
    Paragraph::new(vec![
        stat("Score:   ", state.score.to_string()),
        stat("Level:   ", state.level.to_string()),
        stat("Viruses: ", state.virus_count.to_string()),
        stat("Chain:   ", chain),
    ])
    .render(stats_inner, frame.buffer_mut());

    let colours_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let colours_inner = colours_block.inner(chunks[1]);
    colours_block.render(chunks[1], frame.buffer_mut());
    Paragraph::new(Line::from(Span::styled("Colours", title_style)))
        .render(colours_inner, frame.buffer_mut());
    let strip = Rect {
        y: colours_inner.y + 1,
        height: colours_inner.height.saturating_sub(1),
        ..colours_inner
    };
    draw_colour_strip(frame, theme, strip);
}

/// One virus glyph and one pill half per colour.
fn draw_colour_strip(frame: &mut Frame, theme: &Theme, area: Rect) {
    let spans: Vec<Span> = PillColor::ALL
        .iter()
        .flat_map(|&color| {
            let style = Style::default().fg(theme.pill_color(color));
            [
                Span::styled("▞▚", style),
                Span::styled("▐▌ ", style),
            ]
        })
        .collect();
    Paragraph::new(Line::from(spans)).render(area, frame.buffer_mut());
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_popup(frame: &mut Frame, theme: &Theme, area: Rect, lines: Vec<Line>) {
    let popup = centered(area, 30, lines.len() as u16 + 2);
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .style(Style::default().bg(theme.bg))
        .render(popup, frame.buffer_mut());
}

fn draw_start_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let hint = Style::default().fg(theme.inactive_fg);
    draw_popup(
        frame,
        theme,
        area,
        vec![
            Line::from(""),
            Line::from(Span::styled(" PILLTUI ", Style::default().fg(theme.title).bold())),
            Line::from(""),
            Line::from(Span::styled("Clear every virus", Style::default().fg(theme.main_fg))),
            Line::from(""),
            Line::from(Span::styled("Enter  Start    Q  Quit", hint)),
        ],
    );
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    draw_popup(
        frame,
        theme,
        area,
        vec![
            Line::from(""),
            Line::from(Span::styled(
                " Paused ",
                Style::default().fg(Color::Black).bg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "P  Resume    Q  Quit",
                Style::default().fg(theme.main_fg),
            )),
        ],
    );
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let score = state.final_score.unwrap_or(state.score);
    draw_popup(
        frame,
        theme,
        area,
        vec![
            Line::from(""),
            Line::from(Span::styled(
                " Game Over ",
                Style::default().fg(Color::Black).bg(Color::Red),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Score: ", Style::default().fg(theme.title)),
                Span::styled(score.to_string(), Style::default().fg(theme.main_fg)),
            ]),
            Line::from(vec![
                Span::styled("Level: ", Style::default().fg(theme.title)),
                Span::styled(state.level.to_string(), Style::default().fg(theme.main_fg)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "R  Restart    Q  Quit",
                Style::default().fg(theme.inactive_fg),
            )),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render(game: &Game, paused: bool) -> ratatui::buffer::Buffer {
        let mut terminal = Terminal::new(TestBackend::new(60, 24)).unwrap();
        let theme = Theme::default();
        let mut flash = ClearFlash::new(true);
        terminal
            .draw(|f| draw(f, game, &theme, paused, &mut flash, Instant::now()))
            .unwrap();
        terminal.backend().buffer().clone()
    }

    fn text(buf: &ratatui::buffer::Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_glyphs() {
        let virus = BoardBlock::virus(0, 0, PillColor::Red);
        assert_eq!(glyph(&virus), "▞▚");
        let left = BoardBlock::pill(0, 0, PillColor::Red, Connection::Connected(Side::Right));
        assert_eq!(glyph(&left), "▐█");
        let loose = BoardBlock::pill(0, 0, PillColor::Red, Connection::Unconnected);
        assert_eq!(glyph(&loose), "▐▌");
    }

    #[test]
    fn test_buffer_positions_are_two_wide() {
        let board = Rect::new(10, 5, 16, 16);
        let set = buffer_positions(board, &[(0, 0), (7, 15), (3, 40)]);
        assert_eq!(set.len(), 4);
        assert!(set.contains(&(10, 5)) && set.contains(&(11, 5)));
        assert!(set.contains(&(24, 20)) && set.contains(&(25, 20)));
    }

    #[test]
    fn test_bottle_size_saturates() {
        assert_eq!(bottle_size(&Grid::new(8, 16)), (18, 18));
        assert_eq!(bottle_size(&Grid::new(255, 255)), (512, 257));
        assert_eq!(bottle_size(&Grid::new(40_000, 6)), (u16::MAX, 8));
    }

    #[test]
    fn test_largest_board_draws_in_small_terminal() {
        let mut game = Game::new(&GameConfig {
            width: crate::MAX_BOARD_SIDE,
            height: crate::MAX_BOARD_SIDE,
            seed: Some(11),
            ..GameConfig::default()
        });
        game.start();
        assert!(text(&render(&game, false)).contains("Pilltui"));
    }

    #[test]
    fn test_start_screen_and_game_screen() {
        let mut game = Game::new(&GameConfig {
            seed: Some(3),
            ..GameConfig::default()
        });
        assert!(text(&render(&game, false)).contains("Enter  Start"));

        game.start();
        let screen = text(&render(&game, false));
        assert!(screen.contains("Viruses: 4"));
        assert!(screen.contains("▞▚"));
        assert!(!screen.contains("Enter  Start"));
        assert!(text(&render(&game, true)).contains("Paused"));
    }
}
