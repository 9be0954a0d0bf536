use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{backend::Backend, layout::Rect, Terminal};

use crate::clock::Clock;
use crate::config::RuntimeSettings;
use crate::controller::SessionController;
use crate::error::Result;
use crate::runtime::{EventSource, Runner, Step, TaprEvent};
use crate::session::Phase;
use crate::ticker::TickScheduler;
use crate::ui;

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Reset,
    Tap,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Presentation-side state wrapped around the session controller
pub struct App<C: Clock, S: TickScheduler> {
    pub controller: SessionController<C, S>,
    pub settings: RuntimeSettings,
    area: Rect,
}

impl<C: Clock, S: TickScheduler> App<C, S> {
    pub fn new(controller: SessionController<C, S>, settings: RuntimeSettings) -> Self {
        Self {
            controller,
            settings,
            area: Rect::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// Remember the last drawn area so mouse clicks can be hit-tested
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn intent_for_key(&self, key: &KeyEvent) -> Option<Intent> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Intent::Quit);
        }
        match key.code {
            KeyCode::Char(c) if c == self.settings.tap_key => Some(Intent::Tap),
            KeyCode::Enter | KeyCode::Char('s') | KeyCode::Char('S') => Some(Intent::Start),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Intent::Reset),
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Intent::Quit),
            _ => None,
        }
    }

    pub fn intent_for_mouse(&self, mouse: &MouseEvent) -> Option<Intent> {
        if !self.settings.mouse {
            return None;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let button = ui::regions(self.area).button;
                let hit = mouse.column >= button.x
                    && mouse.column < button.x + button.width
                    && mouse.row >= button.y
                    && mouse.row < button.y + button.height;
                hit.then_some(Intent::Tap)
            }
            _ => None,
        }
    }

    pub fn apply(&mut self, intent: Intent) -> Flow {
        match intent {
            Intent::Start => self.controller.start(),
            Intent::Reset => self.controller.reset(),
            // the controller ignores taps outside a live session
            Intent::Tap => {
                self.controller.register_tap();
            }
            Intent::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    pub fn handle_event(&mut self, event: TaprEvent) -> Flow {
        let intent = match event {
            TaprEvent::Tick(id) => {
                self.controller.on_tick(id);
                None
            }
            TaprEvent::Resize => None,
            TaprEvent::Key(key) => self.intent_for_key(&key),
            TaprEvent::Mouse(mouse) => self.intent_for_mouse(&mouse),
        };
        match intent {
            Some(intent) => self.apply(intent),
            None => Flow::Continue,
        }
    }
}

/// Draw, wait for the next event, dispatch; until the user quits or every
/// event producer is gone.
pub fn run_app<B, E, C, S>(
    terminal: &mut Terminal<B>,
    app: &mut App<C, S>,
    runner: &Runner<E>,
) -> Result<()>
where
    B: Backend,
    E: EventSource,
    C: Clock,
    S: TickScheduler,
{
    loop {
        terminal.draw(|f| {
            app.set_area(f.area());
            f.render_widget(&*app, f.area());
        })?;

        match runner.step() {
            Step::Event(ev) => {
                if app.handle_event(ev) == Flow::Quit {
                    break;
                }
            }
            Step::Idle => {}
            Step::Disconnected => {
                log::warn!("event channel closed, shutting down");
                break;
            }
        }
    }
    app.controller.reset();
    Ok(())
}
