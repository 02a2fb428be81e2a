use crate::app::{App, ScreenLabel};
use globe_labels::labels::LabelKind;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle},
        Block, Borders, Paragraph, Widget,
    },
    Frame,
};

/// Longest label drawn, in characters
const MAX_LABEL_CHARS: usize = 24;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Globe
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_globe(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_globe(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Globe ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // The limb in the camera's virtual pixel space; canvas y grows upward,
    // which is harmless for a circle centered on the viewport.
    let (w, h) = (app.camera.width, app.camera.height_px);
    let radius = app.camera.limb_radius_px();
    let limb = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(move |ctx| {
            ctx.draw(&Circle {
                x: w / 2.0,
                y: h / 2.0,
                radius,
                color: Color::Blue,
            });
        });
    frame.render_widget(limb, inner);

    frame.render_widget(LabelWidget { labels: app.screen_labels() }, inner);
}

/// Text labels drawn over the globe
struct LabelWidget {
    labels: Vec<ScreenLabel>,
}

impl LabelWidget {
    fn style(label: &ScreenLabel) -> Style {
        let style = match label.kind {
            LabelKind::Country => Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            LabelKind::City => Style::default().fg(Color::Yellow),
        };
        if label.faded {
            style.add_modifier(Modifier::DIM)
        } else {
            style
        }
    }
}

impl Widget for LabelWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let right = area.x as i32 + area.width as i32;
        let bottom = area.y as i32 + area.height as i32;

        for label in &self.labels {
            let y = area.y as i32 + label.row;
            if y < area.y as i32 || y >= bottom {
                continue;
            }

            let style = Self::style(label);
            let limit = (MAX_LABEL_CHARS as f64 * label.scale).round().max(1.0) as usize;
            let text: String = label.text.chars().take(limit).collect();

            // Countries are centered on their anchor; cities get a marker with the name after it
            let start = match label.kind {
                LabelKind::Country => area.x as i32 + label.col - text.chars().count() as i32 / 2,
                LabelKind::City => {
                    let x = area.x as i32 + label.col;
                    if x >= area.x as i32 && x < right {
                        buf[(x as u16, y as u16)].set_char('●').set_style(style);
                    }
                    x + 2
                }
            };

            for (i, ch) in text.chars().enumerate() {
                let x = start + i as i32;
                if x >= area.x as i32 && x < right {
                    buf[(x as u16, y as u16)].set_char(ch).set_style(style);
                }
            }
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (countries, cities) = app
        .labels
        .last_pass()
        .map_or((0, 0), |pass| (pass.visible_countries, pass.visible_cities));

    let config = app.labels.config();
    let height = app.camera.height();
    let city_mode = if !config.city_enabled(height) {
        "countries only"
    } else if config.city_cap(height) == config.max_city_near {
        "cities near"
    } else {
        "cities far"
    };

    let status = Line::from(vec![
        Span::styled(" Height: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.height_text(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(city_mode, Style::default().fg(Color::Magenta)),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{countries} countries, {cities} cities "),
            Style::default().fg(Color::Green),
        ),
        Span::styled(format!("[{}] ", app.source), Style::default().fg(Color::DarkGray)),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | hjkl:rotate +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}
