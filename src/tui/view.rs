use crate::client::NewsApi;
use crate::model::{NewsAlert, NewsEvent, format_time_lapsed};
use crate::state::Detail;
use crate::tui::action::InputMode;
use crate::tui::state::AppState;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

pub fn draw<A: NewsApi>(f: &mut Frame, state: &mut AppState<A>) {
    let full_help_text = vec![
        Line::from(vec![
            Span::styled(
                " GLOBAL ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" ?:Toggle Help  q:Quit  g:Go to link  [/]:Back/Forward"),
        ]),
        Line::from(vec![
            Span::styled(
                " NAVIGATION ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" h/l:Day  j/k:Entry  n/p:Next/Prev page  t:Today"),
        ]),
        Line::from(vec![
            Span::styled(
                " ITEMS ",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Enter:Open  Esc:Close"),
        ]),
        Line::from(vec![
            Span::styled(
                " VIEW & FILTER ",
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Tab:Toggle display  a:Alerts  e:Events  f:Cycle sender"),
        ]),
    ];

    let footer_height = if state.show_full_help {
        Constraint::Length(full_help_text.len() as u16 + 2)
    } else {
        Constraint::Length(3)
    };

    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), footer_height])
        .split(f.area());

    draw_location_bar(f, state, v_chunks[0]);
    draw_days(f, state, v_chunks[1]);

    // Footer
    let footer_area = v_chunks[2];
    f.render_widget(Clear, footer_area);

    match state.mode {
        InputMode::Linking => {
            let prefix = "? ";
            let input_text = format!("{}{}", prefix, state.input_buffer);
            let input = Paragraph::new(input_text)
                .style(Style::default().fg(Color::Green))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Go to link "),
                );
            f.render_widget(input, footer_area);

            let cursor_x = footer_area.x
                + 1
                + prefix.chars().count() as u16
                + state.input_buffer.chars().count() as u16;
            let max_x = footer_area.x + footer_area.width.saturating_sub(2);
            if cursor_x <= max_x {
                f.set_cursor_position((cursor_x, footer_area.y + 1));
            }
        }
        InputMode::Normal => {
            if state.show_full_help {
                let h_chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                    .split(footer_area);
                let block = Block::default()
                    .borders(Borders::ALL)
                    .title(" Keyboard Shortcuts (Press ? to minimize) ")
                    .border_style(Style::default().fg(Color::Cyan));
                let p = Paragraph::new(full_help_text)
                    .block(block)
                    .wrap(Wrap { trim: false });
                f.render_widget(p, h_chunks[0]);
                let status = Paragraph::new(state.message.clone())
                    .style(Style::default().fg(Color::Cyan))
                    .block(Block::default().borders(Borders::ALL).title(" Status "));
                f.render_widget(status, h_chunks[1]);
            } else {
                let f_chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(footer_area);
                let status = Paragraph::new(state.message.clone())
                    .style(Style::default().fg(Color::Cyan))
                    .block(
                        Block::default()
                            .borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)
                            .title(" Status "),
                    );
                let help_str = match state.session.dialog() {
                    Some(Detail::Event(_)) => "j/k:Alert Ret:Open alert Esc:Close ?:Help",
                    Some(Detail::Alert(_)) => "Esc:Close [:Back ?:Help",
                    None => "Ret:Open Tab:Display n/p:Page f:Sender g:Link ?:Help",
                };
                let help = Paragraph::new(help_str)
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Right)
                    .block(
                        Block::default()
                            .borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
                            .title(" Actions "),
                    );
                f.render_widget(status, f_chunks[0]);
                f.render_widget(help, f_chunks[1]);
            }
        }
    }

    // Popups. An alert opened from an event covers it.
    match state.session.dialog() {
        Some(Detail::Alert(alert)) => {
            let area = centered_rect(70, 70, f.area());
            f.render_widget(Clear, area);
            f.render_widget(alert_popup(alert), area);
        }
        Some(Detail::Event(event)) => {
            let area = centered_rect(80, 70, f.area());
            let (list, header) = event_popup(event);
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(header.height()), Constraint::Min(0)])
                .split(area);
            f.render_widget(Clear, area);
            f.render_widget(header.paragraph, chunks[0]);
            f.render_stateful_widget(list, chunks[1], &mut state.popup_state);
        }
        None => {}
    }
}

fn draw_location_bar<A: NewsApi>(f: &mut Frame, state: &AppState<A>, area: Rect) {
    let session = &state.session;
    let query = session.location().search().to_query_string();
    let mut spans = vec![
        Span::styled(
            format!(" {} ", session.display_mode()),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" ?{}", query)),
    ];
    if let Some(class) = session.filter().class() {
        let name = session
            .calendar()
            .senders()
            .get(class)
            .cloned()
            .unwrap_or_else(|| class.to_string());
        spans.push(Span::styled(
            format!("  [{}]", name),
            Style::default().fg(Color::Magenta),
        ));
    }
    if session.sync().range_in_flight().is_some() {
        spans.push(Span::styled(
            "  (Loading...)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", session.calendar().visible_range())),
    );
    f.render_widget(bar, area);
}

fn draw_days<A: NewsApi>(f: &mut Frame, state: &mut AppState<A>, area: Rect) {
    let days = state.days();
    let selected = state.selected_day();
    let constraints: Vec<Constraint> = days
        .iter()
        .map(|_| Constraint::Ratio(1, days.len().max(1) as u32))
        .collect();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (day, column) in days.iter().zip(columns.iter()) {
        let items: Vec<ListItem> = state
            .entries_on(*day)
            .into_iter()
            .map(|entry| {
                let time = entry.start.format("%H:%M").to_string();
                let mut lines = vec![Line::from(Span::styled(
                    time,
                    Style::default().fg(Color::DarkGray),
                ))];
                lines.extend(entry.title.lines().filter(|l| !l.is_empty()).map(|l| {
                    Line::from(l.to_string())
                }));
                ListItem::new(lines)
            })
            .collect();

        let is_selected = *day == selected;
        let border_style = if is_selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let title = format!(" {} ({}) ", day.format("%a %-d"), items.len());
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(border_style),
            )
            .highlight_style(
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .bg(Color::Green)
                    .fg(Color::Black),
            );
        if is_selected {
            f.render_stateful_widget(list, *column, &mut state.list_state);
        } else {
            f.render_widget(list, *column);
        }
    }
}

fn alert_popup(alert: &NewsAlert) -> Paragraph<'_> {
    let lite = &alert.lite;
    let mut lines = vec![
        Line::from(Span::styled(
            lite.subject.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "{}  {}",
            lite.sender,
            lite.timestamp.format("%Y-%m-%d %H:%M UTC")
        )),
        Line::from(""),
    ];
    if !lite.top_phrases.is_empty() {
        lines.push(Line::from(Span::styled(
            lite.top_phrases.join(", "),
            Style::default().fg(Color::Magenta),
        )));
        lines.push(Line::from(""));
    }
    if !lite.top_sentence.is_empty() {
        lines.push(Line::from(lite.top_sentence.clone()));
        lines.push(Line::from(""));
    }
    for sentence in &alert.sentences {
        lines.push(Line::from(sentence.value.clone()));
    }
    if alert.sentences.is_empty() && !alert.body.is_empty() {
        lines.push(Line::from(alert.body.clone()));
    }
    if !lite.article_url.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            lite.article_url.clone(),
            Style::default().fg(Color::Blue),
        )));
    }
    Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(" Alert (Esc to close) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    )
}

struct PopupHeader<'a> {
    paragraph: Paragraph<'a>,
    lines: u16,
}

impl PopupHeader<'_> {
    fn height(&self) -> u16 {
        self.lines + 1
    }
}

fn event_popup(event: &NewsEvent) -> (List<'_>, PopupHeader<'_>) {
    let mut header = vec![
        Line::from(Span::styled(
            event.top_phrases.join(", "),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "{} - {}",
            event.event_start.format("%Y-%m-%d %H:%M"),
            event.event_end.format("%Y-%m-%d %H:%M UTC")
        )),
    ];
    if !event.top_sentence.is_empty() {
        header.push(Line::from(event.top_sentence.clone()));
    }
    let lines = header.len() as u16;
    let paragraph = Paragraph::new(header).block(
        Block::default()
            .title(" Event (Esc to close) ")
            .borders(Borders::LEFT | Borders::RIGHT | Borders::TOP)
            .border_style(Style::default().fg(Color::Yellow)),
    );

    let items: Vec<ListItem> = event
        .news_alerts
        .iter()
        .map(|a| {
            let lapsed = if a.order == 0 {
                "first".to_string()
            } else {
                format!("+{}", format_time_lapsed(a.time_lapsed))
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<16}", a.sender),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(format!(" {} ", a.subject)),
                Span::styled(lapsed, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" {} alerts ", event.news_alerts.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::Blue),
        );
    (list, PopupHeader { paragraph, lines })
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
