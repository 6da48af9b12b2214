use crate::app::{App, Envelope, InputMode, Screen};
use crate::detail::{DetailView, Field};
use crate::list::{Column, ListView};
use crate::models::TodoItem;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

fn key_hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Red)),
        Span::raw(action),
    ]
}

fn get_legend(screen: &Screen, input_mode: InputMode) -> Text<'static> {
    let hints: Vec<[Span<'static>; 2]> = match (screen, input_mode) {
        (Screen::List(_), InputMode::Normal) => vec![
            key_hint(" q ", ": Quit "),
            key_hint(" j/k ", ": Down/Up "),
            key_hint(" h/l ", ": Switch Column "),
            key_hint(" Space ", ": Toggle "),
            key_hint(" Enter ", ": Details "),
            key_hint(" a ", ": Add "),
            key_hint(" r ", ": Reload "),
        ],
        (Screen::List(_), InputMode::Insert) => vec![
            key_hint(" Enter ", ": Add "),
            key_hint(" Esc ", ": Cancel "),
        ],
        (Screen::Detail(view), InputMode::Normal) => {
            let save = if view.is_updated() {
                key_hint(" s ", ": Save ")
            } else {
                [
                    Span::styled(" s ", Style::default().fg(Color::DarkGray)),
                    Span::styled(": Save ", Style::default().fg(Color::DarkGray)),
                ]
            };
            vec![
                key_hint(" q ", ": Back "),
                key_hint(" Tab ", ": Next Field "),
                key_hint(" i ", ": Edit "),
                key_hint(" Space ", ": Toggle "),
                save,
                key_hint(" d ", ": Delete "),
            ]
        }
        (Screen::Detail(view), InputMode::Insert) => match view.focus {
            Field::Image => vec![
                key_hint(" Enter ", ": Upload "),
                key_hint(" Esc ", ": Done "),
            ],
            _ => vec![
                key_hint(" Tab ", ": Next Field "),
                key_hint(" Esc ", ": Done "),
            ],
        },
    };
    Text::from(Line::from(hints.into_iter().flatten().collect::<Vec<_>>()))
}

pub async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    mut responses: UnboundedReceiver<Envelope>,
) -> io::Result<()> {
    loop {
        while let Ok(envelope) = responses.try_recv() {
            app.handle_response(envelope);
        }

        terminal.draw(|f| draw(f, &mut app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_input(key) {
                    return Ok(());
                }
            }
        }
    }
}

fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    // body, status line, legend
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .split(size);

    let input_mode = app.input_mode;
    match &mut app.screen {
        Screen::List(view) => draw_list(f, view, input_mode, chunks[0]),
        Screen::Detail(view) => draw_detail(f, view, input_mode, chunks[0]),
    }

    if let Some(status) = &app.status {
        let color = if status.is_error() {
            Color::Red
        } else {
            Color::Green
        };
        let line = Line::from(vec![
            Span::styled(
                status.at.format("%H:%M:%S ").to_string(),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(status.text.clone(), Style::default().fg(color)),
        ]);
        f.render_widget(Paragraph::new(line), chunks[1]);
    }

    let legend = Paragraph::new(get_legend(&app.screen, app.input_mode))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(legend, chunks[2]);
}

fn draw_list(f: &mut Frame, view: &mut ListView, input_mode: InputMode, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let input_style = match input_mode {
        InputMode::Insert => Style::default().fg(Color::Green),
        InputMode::Normal => Style::default(),
    };
    let input_text = if view.new_name.is_empty() && input_mode == InputMode::Normal {
        Span::styled("Press a to add a to-do", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(view.new_name.clone())
    };
    let input = Paragraph::new(Line::from(input_text)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("New To-Do ({} on page)", view.store.items().len()))
            .style(input_style),
    );
    f.render_widget(input, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let (todo, done) = view.store.partition();
    let todo_items = to_list_items(view, &todo);
    let done_items = to_list_items(view, &done);

    if !view.loaded {
        let loading = Paragraph::new("Loading...")
            .block(Block::default().borders(Borders::ALL).title("TO DO"));
        f.render_widget(loading, columns[0]);
        return;
    }

    let focused = view.column;
    render_column(
        f,
        columns[0],
        "TO DO",
        todo_items,
        ["No to-dos yet.", "Add a new TODO!"],
        focused == Column::Todo,
        &mut view.todo_state,
    );
    render_column(
        f,
        columns[1],
        "DONE",
        done_items,
        ["Nothing done yet.", "Check off a to-do!"],
        focused == Column::Done,
        &mut view.done_state,
    );
}

fn to_list_items(view: &ListView, items: &[&TodoItem]) -> Vec<ListItem<'static>> {
    items
        .iter()
        .map(|item| {
            let (mark, style) = if item.is_completed {
                (
                    "[x] ",
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::CROSSED_OUT),
                )
            } else {
                ("[ ] ", Style::default())
            };
            let mut spans = vec![Span::raw(mark), Span::styled(item.name.clone(), style)];
            if view.store.is_pending(item.id) {
                spans.push(Span::styled(" saving", Style::default().fg(Color::DarkGray)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect()
}

fn render_column(
    f: &mut Frame,
    area: Rect,
    title: &'static str,
    items: Vec<ListItem<'static>>,
    empty: [&'static str; 2],
    focused: bool,
    state: &mut ListState,
) {
    let border_style = if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style);

    if items.is_empty() {
        let message = Paragraph::new(vec![Line::from(empty[0]), Line::from(empty[1])])
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(message, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(if focused { ">> " } else { "   " });
    f.render_stateful_widget(list, area, state);
}

fn draw_detail(f: &mut Frame, view: &DetailView, input_mode: InputMode, area: Rect) {
    let Some(item) = view.item() else {
        let text = match &view.load_error {
            Some(err) => format!("Could not load this to-do: {}", err),
            None => "Loading...".to_string(),
        };
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("To-Do"))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let editing = |field: Field| input_mode == InputMode::Insert && view.focus == field;
    let field_style = |field: Field| {
        if editing(field) {
            Style::default().fg(Color::Green)
        } else if view.focus == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };

    let mark = if item.is_completed { "[x] " } else { "[ ] " };
    let mut name_line = vec![
        Span::raw(mark),
        Span::styled(
            view.draft.name.clone(),
            Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::UNDERLINED),
        ),
    ];
    if view.is_busy() {
        name_line.push(Span::styled(" saving", Style::default().fg(Color::DarkGray)));
    }
    let name = Paragraph::new(Line::from(name_line)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(if item.is_completed { "DONE" } else { "TO DO" })
            .border_style(field_style(Field::Name)),
    );
    f.render_widget(name, chunks[0]);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    let image_url = if view.draft.image_url.is_empty() {
        Line::from(Span::styled("No image", Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(view.draft.image_url.clone())
    };
    let image_lines = vec![
        image_url,
        Line::from(""),
        Line::from(vec![
            Span::styled("File: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(view.image_path.clone()),
        ]),
    ];
    let image = Paragraph::new(image_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Image")
                .border_style(field_style(Field::Image)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(image, panels[0]);

    let memo_text = if editing(Field::Memo) {
        view.memo_buffer.as_str()
    } else {
        view.draft.memo.as_str()
    };
    let memo = Paragraph::new(memo_text.to_string())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Memo")
                .border_style(field_style(Field::Memo)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    f.render_widget(memo, panels[1]);
}
