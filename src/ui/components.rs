//! Panels of the import terminal view

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;
use std::collections::VecDeque;

use super::{Phase, Progress};

const MAX_LOG_ENTRIES: usize = 200;

/// Current step and the latest detail line
pub struct StatusPanel {
    phase: Phase,
    info: String,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Preparing,
            info: String::new(),
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    fn style(&self) -> (Style, &'static str) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        match self.phase {
            Phase::Preparing => (bold.fg(Color::Yellow), "◐"),
            Phase::Importing { .. } => (bold.fg(Color::Cyan), "↓"),
            Phase::Complete => (bold.fg(Color::Green), "✓"),
            Phase::Failed => (bold.fg(Color::Red), "✗"),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let (phase_style, indicator) = self.style();

        let lines = vec![
            Line::from(vec![
                Span::styled(format!(" {} ", indicator), phase_style),
                Span::styled(self.phase.to_string(), phase_style),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::raw("   "),
                Span::styled(&self.info, Style::default().fg(Color::Gray)),
            ]),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Pokedex Sync ")
            .border_style(Style::default().fg(Color::Red));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Gauge of processed items in the current step
pub struct ProgressPanel {
    progress: Option<Progress>,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self { progress: None }
    }

    pub fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn clear(&mut self) {
        self.progress = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Red));

        let Some(progress) = &self.progress else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        // The count probe can be smaller than what was actually processed
        let ratio = progress.ratio().min(1.0);
        let label = if progress.total > 0 {
            format!(
                "{}: {}/{} items ({:.0}%)",
                progress.label,
                progress.current,
                progress.total,
                ratio * 100.0
            )
        } else {
            format!("{}: {} items", progress.label, progress.current)
        };

        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Yellow).bg(Color::DarkGray))
            .ratio(ratio)
            .label(label);

        frame.render_widget(gauge, area);
    }
}

/// Bounded activity history; errors are highlighted
pub struct LogPanel {
    entries: VecDeque<String>,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_LOG_ENTRIES),
        }
    }

    pub fn add(&mut self, message: impl Into<String>) {
        if self.entries.len() == MAX_LOG_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(message.into());
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(Style::default().fg(Color::Red));

        let visible_height = area.height.saturating_sub(2) as usize; // -2 for borders
        let start = self.entries.len().saturating_sub(visible_height);
        let newest = self.entries.len().saturating_sub(1);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .enumerate()
            .skip(start)
            .map(|(i, entry)| {
                let style = if entry.starts_with("Error") {
                    Style::default().fg(Color::LightRed)
                } else if i == newest {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(Span::styled(format!(" {}", entry), style))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}
