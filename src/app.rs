//! App: terminal init, frame loop, drop timer and key handling.

use crate::game::{Game, Phase};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, ClearFlash};
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

pub struct App {
    game: Game,
    theme: Theme,
    paused: bool,
    flash: ClearFlash,
    frame_interval: Duration,
    last_tick: Instant,
}

impl App {
    pub fn new(args: &Args, config: &GameConfig, theme: Theme) -> Self {
        Self {
            game: Game::new(config),
            theme,
            paused: false,
            flash: ClearFlash::new(!args.no_animation),
            frame_interval: Duration::from_secs_f64(1.0 / args.frame_rate.max(1.0)),
            last_tick: Instant::now(),
        }
    }

    /// Apply one action. Returns `false` when the player quits.
    fn handle(&mut self, action: Action) -> bool {
        let playing = self.game.state().phase == Phase::Playing;
        match action {
            Action::Quit => return false,
            Action::Start => {
                if self.game.start() {
                    self.paused = false;
                }
            }
            Action::Pause if playing => self.paused = !self.paused,
            _ if self.paused || !playing => {}
            Action::MoveLeft => {
                self.game.move_left();
            }
            Action::MoveRight => {
                self.game.move_right();
            }
            Action::Rotate => {
                self.game.rotate();
            }
            Action::SoftDrop => {
                self.game.soft_drop();
            }
            Action::HardDrop => {
                self.game.hard_drop();
            }
            Action::Pause | Action::None => {}
        }
        true
    }

    /// Feed elapsed time to the drop timer. Time spent paused is dropped.
    fn advance(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        if !self.paused {
            self.game.tick(elapsed);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.last_tick = Instant::now();
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                ui::draw(
                    f,
                    &self.game,
                    &self.theme,
                    self.paused,
                    &mut self.flash,
                    now,
                );
            })?;

            let timeout = self.frame_interval.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if !self.handle(key_to_action(key)) {
                        return Ok(());
                    }
                }
            }

            self.advance(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn app() -> App {
        let args = Args::parse_from(["pilltui", "--seed", "5"]);
        App::new(&args, &GameConfig::from(&args), Theme::default())
    }

    #[test]
    fn test_start_then_quit() {
        let mut app = app();
        assert!(app.handle(Action::MoveLeft));
        assert_eq!(app.game.state().phase, Phase::Start);
        assert!(app.handle(Action::Start));
        assert_eq!(app.game.state().phase, Phase::Playing);
        assert!(!app.handle(Action::Quit));
    }

    #[test]
    fn test_pause_freezes_pill_and_timer() {
        let mut app = app();
        app.handle(Action::Start);
        let before = app.game.pill().cloned();

        app.handle(Action::Pause);
        app.handle(Action::MoveRight);
        app.handle(Action::HardDrop);
        app.advance(app.last_tick + Duration::from_secs(3));
        assert_eq!(app.game.pill().cloned(), before);

        app.handle(Action::Pause);
        assert!(app.handle(Action::MoveRight));
        assert_ne!(app.game.pill().cloned(), before);
    }

    #[test]
    fn test_timer_drops_pill() {
        let mut app = app();
        app.handle(Action::Start);
        let start = app.game.pill().map(|p| p.cells()[0]);
        app.advance(app.last_tick + Duration::from_millis(1500));
        let after = app.game.pill().map(|p| p.cells()[0]);
        assert_eq!(after, start.map(|(x, y)| (x, y + 1)));
    }
}
