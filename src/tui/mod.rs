//! Terminal front end for a practice session.
//!
//! Drives the engine tick on a fixed period and forwards pad keys to it the
//! moment they arrive, so a hit is stamped with the audio clock as close to the
//! key press as the terminal allows.

mod widgets;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};

use groove_trainer::audio::timing::{beat_period, MAX_BPM, MIN_BPM};
use groove_trainer::audio::RodioClock;
use groove_trainer::console::{self, Level};
use groove_trainer::engine::stats::Snapshot;
use groove_trainer::engine::{Engine, Feedback, Phase};
use groove_trainer::model::rhythm::{Instrument, RhythmPattern, PRESETS};

use widgets::{tier_color, BeatIndicator, TierBar};

/// How long a beat dot stays lit.
const BEAT_FLASH: Duration = Duration::from_millis(120);

struct Message {
    text: String,
    level: Level,
}

pub struct TrainerApp {
    engine: Engine<RodioClock>,
    feedback: Feedback,
    messages: Vec<Message>,
    console: console::Subscription,
    summary: Option<Snapshot>,
    should_quit: bool,
}

impl TrainerApp {
    pub fn new(engine: Engine<RodioClock>) -> Self {
        let mut app = Self {
            engine,
            feedback: Feedback::Ready,
            messages: Vec::new(),
            console: console::subscribe(),
            summary: None,
            should_quit: false,
        };
        let missing = app.engine.clock().bank().missing();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|s| s.to_string()).collect();
            app.msg(&format!("silent: {}", names.join(", ")), Level::Warn);
        }
        app.msg("Press Enter to start.", Level::Info);
        app
    }

    /// Runs until the player quits; returns the summary of the last finished session.
    pub fn run(mut self) -> Result<Option<Snapshot>> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result?;
        if let Some(last) = self.engine.stop() {
            self.summary = Some(last);
        }
        Ok(self.summary)
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let tick = Duration::from_millis(self.engine.config().scheduler.tick_ms.max(1));
        let mut next_tick = Instant::now();

        loop {
            for log in self.console.drain() {
                self.msg(&log.text, log.level);
            }

            let now = Instant::now();
            if now >= next_tick {
                self.feedback = self.engine.tick();
                terminal.draw(|f| self.render(f))?;
                next_tick = now + tick;
            }

            let timeout = next_tick.saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }

            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d'))
        {
            self.should_quit = true;
            return;
        }

        match key.code {
            // Pads first: they are timing-critical.
            KeyCode::Left | KeyCode::Char('f') | KeyCode::Char('k') => {
                self.engine.register_hit(Instrument::Kick);
            }
            KeyCode::Right | KeyCode::Char('j') | KeyCode::Char('s') => {
                self.engine.register_hit(Instrument::Snare);
            }
            KeyCode::Char(' ') => {
                self.engine.toggle_pause();
            }
            KeyCode::Enter => {
                let restarting = self.engine.phase() != Phase::Ready;
                self.engine.begin();
                self.summary = None;
                let verb = if restarting { "restarted" } else { "started" };
                console::info(format!("{}: {} @ {} BPM", verb, self.engine.rhythm().label, self.engine.bpm()));
            }
            KeyCode::Esc | KeyCode::Char('q') => self.stop_or_quit(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_bpm(1),
            KeyCode::Char('-') => self.nudge_bpm(-1),
            KeyCode::Up => self.nudge_bpm(5),
            KeyCode::Down => self.nudge_bpm(-5),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                let pattern = PRESETS[idx].clone();
                console::info(format!("rhythm: {} ({})", pattern.label, pattern.grid()));
                self.engine.set_rhythm(pattern);
            }
            _ => {}
        }
    }

    fn stop_or_quit(&mut self) {
        match self.engine.stop() {
            Some(summary) => {
                for line in summary.summary_lines().into_iter().filter(|l| !l.is_empty()) {
                    self.msg(&line, Level::Info);
                }
                self.summary = Some(summary);
            }
            None => self.should_quit = true,
        }
    }

    fn nudge_bpm(&mut self, delta: i32) {
        let bpm = (self.engine.bpm() as i32 + delta).clamp(MIN_BPM as i32, MAX_BPM as i32);
        self.engine.set_bpm(bpm as u32);
    }

    fn msg(&mut self, text: &str, level: Level) {
        self.messages.push(Message { text: text.to_string(), level });
        if self.messages.len() > 50 {
            self.messages.remove(0);
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(ratatui::widgets::Clear, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(4), // Beat dots
                Constraint::Length(6), // Live score
                Constraint::Length(7), // Session stats
                Constraint::Min(3),    // Messages
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.render_beats(frame, chunks[1]);
        self.render_live(frame, chunks[2]);
        self.render_stats(frame, chunks[3]);
        self.render_messages(frame, chunks[4]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let transport = match self.engine.phase() {
            Phase::Running => Span::styled(
                " ▶ ",
                Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Phase::Paused => Span::styled(
                " ‖ ",
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Phase::Ready => Span::styled(" ■ ", Style::default().fg(Color::DarkGray).bg(Color::Rgb(40, 40, 40))),
        };
        let rhythm: &RhythmPattern = self.engine.rhythm();

        let line = Line::from(vec![
            Span::styled(" GROOVE TRAINER ", Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            transport,
            Span::raw("  "),
            Span::styled(format!("{} BPM", self.engine.bpm()), Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(format!("{} {}", rhythm.grid(), rhythm.label), Style::default().fg(Color::DarkGray)),
            Span::styled(
                "  Enter: begin  ←/→: kick/snare  Space: pause  1-4: rhythm  +/-: tempo  Esc: stop",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_beats(&self, frame: &mut Frame, area: Rect) {
        let lit = self.engine.current_beat().and_then(|beat| {
            let age = self.engine.now() - beat.time;
            let flash = BEAT_FLASH.min(beat_period(self.engine.bpm()) / 2);
            (age >= 0.0 && age < flash.as_secs_f64()).then(|| beat.position_in_bar())
        });
        let block = Block::default()
            .title(" Beat ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Rgb(60, 60, 60)));
        frame.render_widget(BeatIndicator::new(self.engine.rhythm()).lit(lit).block(block), area);
    }

    fn render_live(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Accuracy ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Rgb(60, 60, 60)));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height < 3 {
            return;
        }
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let window = self.engine.config().scoring.window_len();
        let (headline, detail, tier) = match self.feedback {
            Feedback::Ready => ("Ready".to_string(), "Press Enter to start.".to_string(), None),
            Feedback::Paused => ("Paused".to_string(), "Press Space to continue.".to_string(), None),
            Feedback::Idle if !self.engine.has_input() => {
                ("Listening…".to_string(), "Hit a pad to start scoring.".to_string(), None)
            }
            Feedback::Idle => {
                ("No recent input detected".to_string(), "Scoring resumes on your next hit.".to_string(), None)
            }
            Feedback::Waiting => ("Find the beat…".to_string(), String::new(), None),
            Feedback::Live(res) => (
                format!("{}  {}", res.tier, res.tier.message()),
                format!(
                    "Rolling accuracy (last {} beats): ~{}ms  misses {}  extras {}",
                    window,
                    res.avg_error_ms.round() as i64,
                    res.misses,
                    res.extras
                ),
                Some(res.tier),
            ),
        };
        let headline_style = tier
            .map(|t| Style::default().fg(tier_color(t)).add_modifier(Modifier::BOLD))
            .unwrap_or_else(|| Style::default().add_modifier(Modifier::BOLD));
        frame.render_widget(Paragraph::new(Line::styled(headline, headline_style)), rows[0]);
        frame.render_widget(TierBar::new(tier), rows[1]);
        frame.render_widget(
            Paragraph::new(Line::styled(detail, Style::default().fg(Color::DarkGray))),
            rows[2],
        );
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Session ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Rgb(60, 60, 60)));
        let snap = self.engine.snapshot();
        let dash = || "—".to_string();
        let ms = |v: Option<f64>| v.map(|v| format!("{}ms", v.round() as i64)).unwrap_or_else(dash);
        let lines = vec![
            Line::from(format!("Beats scored   {}", snap.beats_evaluated)),
            Line::from(format!(
                "Last score     {}",
                snap.last_tier.map(|t| t.to_string()).unwrap_or_else(dash)
            )),
            Line::from(format!(
                "Average score  {}",
                snap.running_avg_tier.map(|a| format!("{:.1}/5", a)).unwrap_or_else(dash)
            )),
            Line::from(format!("Average error  {}", ms(snap.running_avg_error_ms))),
            Line::from(format!("Best error     {}", ms(snap.best_error_ms))),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_messages(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Log ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Rgb(60, 60, 60)));
        let inner = block.inner(area);
        let max_lines = inner.height as usize;

        let mut lines: Vec<Line> = Vec::new();
        for msg in self.messages.iter().rev().take(max_lines) {
            let style = match msg.level {
                Level::Error => Style::default().fg(Color::Red),
                Level::Warn => Style::default().fg(Color::Yellow),
                Level::Info => Style::default().fg(Color::DarkGray),
            };
            lines.push(Line::styled(msg.text.as_str(), style));
        }
        lines.reverse();

        frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

pub fn run(engine: Engine<RodioClock>) -> Result<Option<Snapshot>> {
    TrainerApp::new(engine).run()
}
