//! Plotters-powered chip panel widget for Ratatui.
//!
//! The panel is drawn by the same code that writes the SVG figure; only the
//! backend and the `PanelStyle` differ. Output goes into the Ratatui buffer
//! through `plotters-ratatui-backend`.

use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::plot::trace_chart::{ChipPanel, Layers, PanelStyle, draw_chip_panel};

/// Render-only view of one detector panel.
pub struct ChipPanelChart<'a> {
    pub panel: &'a ChipPanel,
    pub layers: Layers,
}

impl<'a> Widget for ChipPanelChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let panel = self.panel;
        let layers = self.layers;
        let widget = widget_fn(move |root| {
            draw_chip_panel(&root, panel, layers, &PanelStyle::TERMINAL)?;
            Ok(())
        });

        widget.render(area, buf);
    }
}
