//! Custom TUI widgets for the trainer screen.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Widget},
};

use groove_trainer::engine::scorer::Tier;
use groove_trainer::model::rhythm::{Instrument, RhythmPattern, BAR_LEN};

pub fn tier_color(tier: Tier) -> Color {
    match tier.get() {
        1 => Color::Red,
        2 => Color::LightRed,
        3 => Color::Yellow,
        4 => Color::LightGreen,
        _ => Color::Green,
    }
}

/// One bar of the current rhythm with the sounding beat lit.
pub struct BeatIndicator<'a> {
    pattern: &'a RhythmPattern,
    lit: Option<usize>,
    block: Option<Block<'a>>,
}

impl<'a> BeatIndicator<'a> {
    pub fn new(pattern: &'a RhythmPattern) -> Self {
        Self { pattern, lit: None, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn lit(mut self, position: Option<usize>) -> Self {
        self.lit = position;
        self
    }
}

impl Widget for BeatIndicator<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let BeatIndicator { pattern, lit, block } = self;
        let mut area = area;
        if let Some(block) = block {
            let inner = block.inner(area);
            block.render(area, buf);
            area = inner;
        }
        if area.height < 2 || area.width < (BAR_LEN * 4) as u16 {
            return;
        }

        let cell = (area.width / BAR_LEN as u16).max(4);
        for position in 0..BAR_LEN {
            let x = area.x + position as u16 * cell + cell / 2 - 1;
            let on = lit == Some(position);
            let dot_style = if on {
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Rgb(70, 70, 70))
            };
            buf.set_string(x, area.y, if on { "●" } else { "○" }, dot_style);

            let (label, style) = match pattern.expected_at(position) {
                Some(Instrument::Kick) => ("K", Style::default().fg(Color::Cyan)),
                Some(Instrument::Snare) => ("S", Style::default().fg(Color::LightBlue)),
                None => ("·", Style::default().fg(Color::DarkGray)),
            };
            buf.set_string(x, area.y + 1, label, style);
        }
    }
}

/// Horizontal bar filled to the tier, colored by tier.
pub struct TierBar {
    tier: Option<Tier>,
}

impl TierBar {
    pub fn new(tier: Option<Tier>) -> Self {
        Self { tier }
    }
}

impl Widget for TierBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let Some(tier) = self.tier else {
            for x in area.x..area.x + area.width {
                buf[(x, area.y)].set_char('─').set_style(Style::default().fg(Color::Rgb(50, 50, 50)));
            }
            return;
        };
        let filled = (area.width as u32 * tier.get() as u32 / Tier::MAX.get() as u32) as u16;
        let style = Style::default().fg(tier_color(tier));
        for x in area.x..area.x + area.width {
            let ch = if x < area.x + filled { '█' } else { '░' };
            buf[(x, area.y)].set_char(ch).set_style(style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_marks_rests_and_lit_beat() {
        let pattern = RhythmPattern::preset("r2");
        let area = Rect::new(0, 0, 16, 2);
        let mut buf = Buffer::empty(area);
        BeatIndicator::new(&pattern).lit(Some(2)).render(area, &mut buf);
        assert_eq!(buf[(1, 0)].symbol(), "○");
        assert_eq!(buf[(9, 0)].symbol(), "●");
        assert_eq!(buf[(1, 1)].symbol(), "K");
        assert_eq!(buf[(5, 1)].symbol(), "·");
        assert_eq!(buf[(9, 1)].symbol(), "S");
    }

    #[test]
    fn tier_bar_fills_proportionally() {
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        TierBar::new(Some(Tier::new(3))).render(area, &mut buf);
        assert_eq!(buf[(5, 0)].symbol(), "█");
        assert_eq!(buf[(6, 0)].symbol(), "░");
    }
}
