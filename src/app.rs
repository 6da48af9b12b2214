use crate::api::TodoApi;
use crate::detail::{DetailView, Field};
use crate::effect::{Effect, Nav, Status};
use crate::list::ListView;
use crate::optimistic::InFlight;
use crate::request::{Request, Response};
use crossterm::event::{KeyCode, KeyEvent};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

pub enum Screen {
    List(ListView),
    Detail(DetailView),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Insert,
}

/// A response tagged with the screen epoch of the request that produced it.
#[derive(Debug)]
pub struct Envelope {
    pub epoch: u64,
    pub response: Response,
}

pub struct App {
    pub screen: Screen,
    pub input_mode: InputMode,
    pub status: Option<Status>,
    epoch: u64,
    in_flight: InFlight,
    page_size: u32,
    api: Arc<dyn TodoApi>,
    responses: UnboundedSender<Envelope>,
}

impl App {
    pub fn new(
        api: Arc<dyn TodoApi>,
        page_size: u32,
        responses: UnboundedSender<Envelope>,
    ) -> App {
        let mut app = App {
            screen: Screen::List(ListView::new(page_size)),
            input_mode: InputMode::Normal,
            status: None,
            epoch: 0,
            in_flight: InFlight::default(),
            page_size,
            api,
            responses,
        };
        app.navigate(Nav::List);
        app
    }

    fn navigate(&mut self, nav: Nav) {
        self.epoch += 1;
        self.input_mode = InputMode::Normal;
        let request = match nav {
            Nav::List => {
                let view = ListView::new(self.page_size);
                let request = view.mount();
                self.screen = Screen::List(view);
                request
            }
            Nav::Detail(id) => {
                let view = DetailView::new(id);
                let request = view.mount();
                self.screen = Screen::Detail(view);
                request
            }
        };
        debug!(epoch = self.epoch, ?nav, "mounted screen");
        self.spawn(request);
    }

    fn spawn(&self, request: Request) {
        let api = Arc::clone(&self.api);
        let responses = self.responses.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let response = request.run(api.as_ref()).await;
            // receiver is gone once the app has quit
            let _ = responses.send(Envelope { epoch, response });
        });
    }

    fn dispatch(&mut self, effect: Effect) {
        if let Some(status) = effect.status {
            self.status = Some(status);
        }
        if let Some(nav) = effect.nav {
            self.navigate(nav);
        }
        if let Some(request) = effect.request {
            if let Request::Update(item) = &request {
                self.in_flight.insert(item.id);
            }
            self.spawn(request);
        }
    }

    pub fn handle_response(&mut self, envelope: Envelope) {
        if let Response::Updated(id, _) = &envelope.response {
            self.in_flight.release(*id);
        }
        if envelope.epoch != self.epoch {
            debug!(
                epoch = envelope.epoch,
                current = self.epoch,
                "dropping response for an unmounted screen"
            );
            if let Response::Updated(_, Ok(item)) = envelope.response {
                match &mut self.screen {
                    Screen::List(view) => view.refresh_item(item),
                    Screen::Detail(view) => view.refresh_item(item),
                }
            }
            return;
        }
        let effect = match &mut self.screen {
            Screen::List(view) => view.on_response(envelope.response),
            Screen::Detail(view) => view.on_response(envelope.response),
        };
        self.dispatch(effect);
    }

    /// Returns true when the app should quit.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        let effect = match (&mut self.screen, self.input_mode) {
            (Screen::List(view), InputMode::Normal) => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => {
                    view.next();
                    Effect::none()
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    view.previous();
                    Effect::none()
                }
                KeyCode::Char('h') | KeyCode::Char('l') | KeyCode::Tab => {
                    view.switch_column();
                    Effect::none()
                }
                KeyCode::Char(' ') | KeyCode::Char('x') => view.toggle_selected(&self.in_flight),
                KeyCode::Enter => view.open_selected(),
                KeyCode::Char('a') => {
                    self.input_mode = InputMode::Insert;
                    view.new_name.clear();
                    Effect::none()
                }
                KeyCode::Char('r') => Effect::nav(Nav::List),
                _ => Effect::none(),
            },
            (Screen::List(view), InputMode::Insert) => match key.code {
                KeyCode::Enter => {
                    let effect = view.submit_new();
                    if effect.request.is_some() {
                        self.input_mode = InputMode::Normal;
                    }
                    effect
                }
                KeyCode::Esc => {
                    view.new_name.clear();
                    self.input_mode = InputMode::Normal;
                    Effect::none()
                }
                KeyCode::Char(c) => {
                    view.new_name.push(c);
                    Effect::none()
                }
                KeyCode::Backspace => {
                    view.new_name.pop();
                    Effect::none()
                }
                _ => Effect::none(),
            },
            (Screen::Detail(view), InputMode::Normal) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Effect::nav(Nav::List),
                KeyCode::Tab => {
                    view.focus_next();
                    Effect::none()
                }
                KeyCode::Char('i') if view.item().is_some() => {
                    view.start_editing();
                    self.input_mode = InputMode::Insert;
                    Effect::none()
                }
                KeyCode::Char(' ') | KeyCode::Char('x') => view.toggle(&self.in_flight),
                KeyCode::Char('s') => view.save(&self.in_flight),
                KeyCode::Char('d') => view.delete(),
                _ => Effect::none(),
            },
            (Screen::Detail(view), InputMode::Insert) => match key.code {
                KeyCode::Esc => {
                    view.blur();
                    self.input_mode = InputMode::Normal;
                    Effect::none()
                }
                KeyCode::Tab => {
                    view.blur();
                    view.focus_next();
                    view.start_editing();
                    Effect::none()
                }
                KeyCode::Enter => match view.focus {
                    Field::Memo => {
                        view.input_char('\n');
                        Effect::none()
                    }
                    Field::Name => {
                        view.blur();
                        self.input_mode = InputMode::Normal;
                        Effect::none()
                    }
                    Field::Image => {
                        self.input_mode = InputMode::Normal;
                        view.upload_image()
                    }
                },
                KeyCode::Char(c) => {
                    view.input_char(c);
                    Effect::none()
                }
                KeyCode::Backspace => {
                    view.backspace();
                    Effect::none()
                }
                _ => Effect::none(),
            },
        };
        self.dispatch(effect);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::error::ApiError;
    use crate::models::{TodoId, TodoItem};
    use async_trait::async_trait;
    use crossterm::event::KeyModifiers;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use tokio::sync::Notify;

    /// Holds the first update until the test opens the gate.
    struct GatedApi {
        inner: FakeApi,
        gate: Notify,
        hold_first: AtomicBool,
    }

    #[async_trait]
    impl TodoApi for GatedApi {
        async fn list(&self, page: u32, page_size: u32) -> Result<Vec<TodoItem>, ApiError> {
            self.inner.list(page, page_size).await
        }

        async fn create(&self, name: &str) -> Result<TodoItem, ApiError> {
            self.inner.create(name).await
        }

        async fn get(&self, id: TodoId) -> Result<TodoItem, ApiError> {
            self.inner.get(id).await
        }

        async fn update(&self, item: &TodoItem) -> Result<TodoItem, ApiError> {
            if self.hold_first.swap(false, Ordering::SeqCst) {
                self.gate.notified().await;
            }
            self.inner.update(item).await
        }

        async fn remove(&self, id: TodoId) -> Result<(), ApiError> {
            self.inner.remove(id).await
        }

        async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
            self.inner.upload_image(file_name, bytes).await
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn item(id: u64, name: &str) -> TodoItem {
        TodoItem {
            id: TodoId(id),
            name: name.to_string(),
            is_completed: false,
            image_url: None,
            memo: None,
            tenant_id: "doit".to_string(),
        }
    }

    async fn pump(app: &mut App, rx: &mut UnboundedReceiver<Envelope>) {
        let envelope = rx.recv().await.unwrap();
        app.handle_response(envelope);
    }

    fn app_with(items: Vec<TodoItem>) -> (App, UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api: Arc<dyn TodoApi> = Arc::new(FakeApi::with_items(items));
        (App::new(api, 10, tx), rx)
    }

    #[tokio::test]
    async fn test_startup_loads_list() {
        let (mut app, mut rx) = app_with(vec![item(1, "A")]);
        pump(&mut app, &mut rx).await;

        match &app.screen {
            Screen::List(view) => assert_eq!(view.store.items().len(), 1),
            Screen::Detail(_) => panic!("expected list screen"),
        }
    }

    #[tokio::test]
    async fn test_stale_responses_are_dropped() {
        let (mut app, mut rx) = app_with(vec![item(1, "A")]);
        let first = rx.recv().await.unwrap();
        assert_eq!(first.epoch, 1);

        // reload mounts a new list screen before the first response is handled
        app.handle_input(key(KeyCode::Char('r')));
        assert_eq!(app.epoch, 2);
        app.handle_response(first);
        match &app.screen {
            Screen::List(view) => assert!(!view.loaded),
            Screen::Detail(_) => panic!("expected list screen"),
        }

        pump(&mut app, &mut rx).await;
        match &app.screen {
            Screen::List(view) => assert!(view.loaded),
            Screen::Detail(_) => panic!("expected list screen"),
        }
    }

    fn listed(app: &App, id: TodoId) -> TodoItem {
        match &app.screen {
            Screen::List(view) => view.store.get(id).cloned().unwrap(),
            Screen::Detail(_) => panic!("expected list screen"),
        }
    }

    #[tokio::test]
    async fn test_update_stays_exclusive_across_reload() {
        let api = Arc::new(GatedApi {
            inner: FakeApi::with_items(vec![item(1, "A")]),
            gate: Notify::new(),
            hold_first: AtomicBool::new(true),
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(api.clone(), 10, tx);
        pump(&mut app, &mut rx).await;

        app.handle_input(key(KeyCode::Char(' ')));
        assert!(listed(&app, TodoId(1)).is_completed);

        // the reloaded list still shows the old value since the update is held
        app.handle_input(key(KeyCode::Char('r')));
        pump(&mut app, &mut rx).await;
        assert!(!listed(&app, TodoId(1)).is_completed);

        app.handle_input(key(KeyCode::Char(' ')));
        assert!(app.status.as_ref().unwrap().is_error());
        assert!(!listed(&app, TodoId(1)).is_completed);
        assert!(!app.in_flight.is_empty());

        api.gate.notify_one();
        pump(&mut app, &mut rx).await;
        assert!(app.in_flight.is_empty());
        assert_eq!(
            listed(&app, TodoId(1)),
            api.inner.stored(TodoId(1)).unwrap()
        );
        assert!(listed(&app, TodoId(1)).is_completed);

        app.handle_input(key(KeyCode::Char('l')));
        app.handle_input(key(KeyCode::Char(' ')));
        pump(&mut app, &mut rx).await;
        assert!(!listed(&app, TodoId(1)).is_completed);
        assert_eq!(
            listed(&app, TodoId(1)),
            api.inner.stored(TodoId(1)).unwrap()
        );
        assert_eq!(api.inner.calls().iter().filter(|call| call.as_str() == "update").count(), 2);
    }

    #[tokio::test]
    async fn test_add_flow_through_keys() {
        let (mut app, mut rx) = app_with(vec![]);
        pump(&mut app, &mut rx).await;

        app.handle_input(key(KeyCode::Char('a')));
        assert_eq!(app.input_mode, InputMode::Insert);
        for c in "Milk".chars() {
            app.handle_input(key(KeyCode::Char(c)));
        }
        app.handle_input(key(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Normal);
        pump(&mut app, &mut rx).await;

        match &app.screen {
            Screen::List(view) => assert_eq!(view.store.items()[0].name, "Milk"),
            Screen::Detail(_) => panic!("expected list screen"),
        }
        assert!(!app.status.as_ref().unwrap().is_error());
    }

    #[tokio::test]
    async fn test_open_detail_and_go_back() {
        let (mut app, mut rx) = app_with(vec![item(1, "A")]);
        pump(&mut app, &mut rx).await;

        app.handle_input(key(KeyCode::Enter));
        pump(&mut app, &mut rx).await;
        match &app.screen {
            Screen::Detail(view) => assert_eq!(view.item().unwrap().name, "A"),
            Screen::List(_) => panic!("expected detail screen"),
        }

        assert!(!app.handle_input(key(KeyCode::Char('q'))));
        assert!(matches!(app.screen, Screen::List(_)));
        assert!(app.handle_input(key(KeyCode::Char('q'))));
    }
}
