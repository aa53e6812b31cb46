use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::rich_input::InputResult;
use crate::rich_input::RichInput;
use crate::tui;
use crate::tui::TuiEvent;
use color_eyre::eyre::Result;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use crossterm::event::MouseButton;
use crossterm::event::MouseEvent;
use crossterm::event::MouseEventKind;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use richinput_core::Config;
use richinput_core::StaticDirectory;
use richinput_core::interaction::ListenerId;
use richinput_core::interaction::OutsideClickListeners;
use richinput_core::interaction::Point;
use tokio::select;
use tokio::sync::mpsc::unbounded_channel;

pub(crate) struct App {
    input: RichInput,
    app_event_tx: AppEventSender,
    outside_clicks: OutsideClickListeners,
    /// Registration of the input (and its popup) for click-outside events.
    input_listener: ListenerId,
}

impl App {
    pub(crate) fn new(
        config: &Config,
        directory: StaticDirectory,
        app_event_tx: AppEventSender,
        initial_text: Option<String>,
    ) -> Self {
        let mut outside_clicks = OutsideClickListeners::default();
        let input_listener = outside_clicks.register(Vec::new());
        Self {
            input: RichInput::new(config, directory, initial_text),
            app_event_tx,
            outside_clicks,
            input_listener,
        }
    }

    /// Run until the user exits. Returns the final text.
    pub(crate) async fn run(
        terminal: &mut tui::Terminal,
        config: Config,
        directory: StaticDirectory,
        initial_text: Option<String>,
    ) -> Result<String> {
        use tokio_stream::StreamExt;
        let (app_event_tx, mut app_event_rx) = unbounded_channel();
        let app_event_tx = AppEventSender::new(app_event_tx);
        let mut app = Self::new(&config, directory, app_event_tx, initial_text);

        let tui_events = tui::event_stream();
        tokio::pin!(tui_events);

        app.app_event_tx.send(AppEvent::Redraw);

        // App events first: a caret placement queued by a commit must run
        // before the next keystroke is read.
        while select! {
            biased;
            Some(event) = app_event_rx.recv() => {
                app.handle_event(terminal, event)?
            }
            Some(event) = tui_events.next() => {
                app.handle_tui_event(event)
            }
        } {}
        terminal.clear()?;
        Ok(app.finish())
    }

    pub(crate) fn handle_tui_event(&mut self, event: TuiEvent) -> bool {
        let result = match event {
            TuiEvent::Key(key_event) if is_exit_key(&key_event) => {
                self.app_event_tx.send(AppEvent::ExitRequest);
                InputResult::Unchanged
            }
            TuiEvent::Key(key_event) => self.input.handle_key_event(key_event),
            TuiEvent::Paste(pasted) => self.input.handle_paste(&pasted),
            TuiEvent::Mouse(mouse_event) => self.handle_mouse_event(mouse_event),
            TuiEvent::Draw => InputResult::Changed,
        };
        self.schedule(result);
        true
    }

    pub(crate) fn handle_event<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        event: AppEvent,
    ) -> Result<bool> {
        match event {
            AppEvent::Redraw => self.draw(terminal)?,
            AppEvent::PlaceCaret(generation) => {
                if self.input.place_caret(generation) {
                    self.draw(terminal)?;
                }
            }
            AppEvent::ExitRequest => return Ok(false),
        }
        Ok(true)
    }

    fn handle_mouse_event(&mut self, mouse_event: MouseEvent) -> InputResult {
        let MouseEventKind::Down(MouseButton::Left) = mouse_event.kind else {
            return InputResult::Unchanged;
        };
        let point = Point {
            x: f32::from(mouse_event.column),
            y: f32::from(mouse_event.row),
        };
        if self
            .outside_clicks
            .dispatch(point)
            .contains(&self.input_listener)
        {
            self.input.on_outside_click()
        } else {
            self.input.handle_click(mouse_event.column, mouse_event.row)
        }
    }

    /// Queue the follow-up work for an input result. A commit is drawn before
    /// its caret placement fires.
    fn schedule(&self, result: InputResult) {
        match result {
            InputResult::Unchanged => {}
            InputResult::Changed => self.app_event_tx.send(AppEvent::Redraw),
            InputResult::Committed(generation) => {
                self.app_event_tx.send(AppEvent::Redraw);
                self.app_event_tx.send(AppEvent::PlaceCaret(generation));
            }
        }
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        self.input.prepare_frame(area);
        self.outside_clicks
            .set_regions(self.input_listener, self.input.hit_regions());

        terminal.draw(|frame| {
            frame.render_widget_ref(&self.input, frame.area());
            if let Some((x, y)) = self.input.cursor_pos(frame.area()) {
                frame.set_cursor_position((x, y));
            }
        })?;
        Ok(())
    }

    fn finish(mut self) -> String {
        self.outside_clicks.unregister(self.input_listener);
        self.input.text().to_string()
    }
}

fn is_exit_key(key_event: &KeyEvent) -> bool {
    key_event.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key_event.code, KeyCode::Char('c') | KeyCode::Char('d'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Position;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn app(initial_text: Option<&str>) -> (App, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let app = App::new(
            &Config::default(),
            StaticDirectory::new(["french", "sarah", "france", "frog"]),
            AppEventSender::new(tx),
            initial_text.map(str::to_string),
        );
        (app, rx)
    }

    fn key(code: KeyCode) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn click(column: u16, row: u16) -> TuiEvent {
        TuiEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    /// Process queued app events the way the run loop does; returns them.
    fn pump(
        app: &mut App,
        rx: &mut UnboundedReceiver<AppEvent>,
        terminal: &mut Terminal<TestBackend>,
    ) -> Vec<AppEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event.clone());
            app.handle_event(terminal, event).unwrap();
        }
        seen
    }

    #[test]
    fn commit_draws_before_placing_caret() {
        let (mut app, mut rx) = app(None);
        let mut terminal = Terminal::new(TestBackend::new(30, 10)).unwrap();

        for ch in "@fr".chars() {
            app.handle_tui_event(key(KeyCode::Char(ch)));
        }
        pump(&mut app, &mut rx, &mut terminal);

        app.handle_tui_event(key(KeyCode::Enter));
        let events = pump(&mut app, &mut rx, &mut terminal);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], AppEvent::Redraw);
        assert!(matches!(events[1], AppEvent::PlaceCaret(_)));
        assert_eq!(app.input.text(), "@french ");

        assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(9, 1));
    }

    #[test]
    fn click_outside_closes_popup_and_inside_does_not() {
        let (mut app, mut rx) = app(None);
        let mut terminal = Terminal::new(TestBackend::new(30, 10)).unwrap();
        for ch in "@f".chars() {
            app.handle_tui_event(key(KeyCode::Char(ch)));
        }
        pump(&mut app, &mut rx, &mut terminal);

        // On the input text: caret moves, the token stays open.
        app.handle_tui_event(click(2, 1));
        pump(&mut app, &mut rx, &mut terminal);
        assert_eq!(app.input.text(), "@f");
        assert_eq!(app.input.hit_regions().len(), 2);

        app.handle_tui_event(click(25, 8));
        let events = pump(&mut app, &mut rx, &mut terminal);
        assert_eq!(events, vec![AppEvent::Redraw]);
        assert_eq!(app.input.hit_regions().len(), 1);
        assert_eq!(app.input.text(), "@f");
    }

    #[test]
    fn ctrl_c_requests_exit() {
        let (mut app, mut rx) = app(Some("done"));
        let mut terminal = Terminal::new(TestBackend::new(30, 10)).unwrap();
        app.handle_tui_event(TuiEvent::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert_eq!(rx.try_recv().ok(), Some(AppEvent::ExitRequest));
        assert!(!app.handle_event(&mut terminal, AppEvent::ExitRequest).unwrap());
        assert_eq!(app.finish(), "done");
    }

    #[test]
    fn initial_text_is_rendered() {
        let (mut app, mut rx) = app(Some("hello #rust"));
        let mut terminal = Terminal::new(TestBackend::new(30, 5)).unwrap();
        app.handle_tui_event(TuiEvent::Draw);
        pump(&mut app, &mut rx, &mut terminal);

        let buffer = terminal.backend().buffer();
        let row: String = (1..12).map(|x| buffer[(x, 1)].symbol()).collect();
        assert_eq!(row, "hello #rust");
        let counter: String = (24..30).map(|x| buffer[(x, 3)].symbol()).collect();
        assert_eq!(counter, "11/200");
    }
}
