//! Neon-on-charcoal palette for the terminal chart.
//!
//! # Color Palette
//! - **Background**: deep charcoal
//! - **Price**: electric cyan
//! - **Moving average**: steel blue
//! - **Signals / kinetic energy**: neon green
//! - **Potential energy**: hot pink
//! - **Thresholds**: neon orange
//! - **Velocity / Lagrangian**: cool purple

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    /// Price line, panel borders.
    pub accent: Color,
    /// Buy markers, kinetic energy.
    pub positive: Color,
    /// Potential energy.
    pub negative: Color,
    /// Threshold lines.
    pub warning: Color,
    /// Velocity and Lagrangian series.
    pub neutral: Color,
    /// Moving average, axes.
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::parrot_neon()
    }
}

impl Theme {
    pub fn parrot_neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 255, 255),
            positive: Color::Rgb(0, 255, 128),
            negative: Color::Rgb(255, 20, 147),
            warning: Color::Rgb(255, 140, 0),
            neutral: Color::Rgb(147, 112, 219),
            muted: Color::Rgb(100, 149, 237),
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    /// Color for a Lagrangian reading relative to its threshold.
    pub fn lagrangian_color(&self, value: f64, threshold: f64) -> Color {
        if value > threshold {
            self.positive
        } else {
            self.negative
        }
    }

    pub fn panel_border(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.text_primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn axis(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn threshold(&self) -> Style {
        Style::default().fg(self.warning)
    }
}
