//! # Cent Meter Widget
//!
//! Shows how far the played pitch is from the nearest note. The band in the
//! middle is the tolerance a note must stay within to count in the game.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Size, Theme, mouse};

/// The meter spans -50 to +50 cents.
const METER_RANGE: f32 = 50.0;

pub struct CentMeter {
    /// Smoothed deviation, `None` while nothing is played.
    cents: Option<f32>,
    tolerance: f32,
}

impl CentMeter {
    pub fn new(cents: Option<f32>, tolerance: f32) -> Self {
        Self { cents, tolerance }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(60.0)),
        )
        .into()
    }

    fn x_for(cents: f32, width: f32) -> f32 {
        (cents.clamp(-METER_RANGE, METER_RANGE) + METER_RANGE) / (2.0 * METER_RANGE) * width
    }
}

impl<Message> canvas::Program<Message> for CentMeter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x40, 0x40, 0x40));

        let band_left = Self::x_for(-self.tolerance, bounds.width);
        let band_right = Self::x_for(self.tolerance, bounds.width);
        let band = Path::rectangle(
            Point::new(band_left, 0.0),
            Size::new(band_right - band_left, bounds.height),
        );
        frame.fill(&band, Color::from_rgba8(0x34, 0xDB, 0x98, 0.15));

        let center_x = bounds.width / 2.0;
        let center_line = Path::line(
            Point::new(center_x, 0.0),
            Point::new(center_x, bounds.height),
        );
        frame.stroke(
            &center_line,
            Stroke::default().with_width(2.0).with_color(Color::WHITE),
        );

        if let Some(c) = self.cents {
            let needle_pos = Self::x_for(c, bounds.width);
            let color = if c.abs() <= self.tolerance / 3.0 {
                Color::from_rgb8(0x34, 0xDB, 0x98)
            } else if c.abs() <= self.tolerance {
                Color::from_rgb8(0xFF, 0xC3, 0x00)
            } else {
                Color::from_rgb8(0xFF, 0x33, 0x33)
            };

            let needle =
                Path::rectangle(Point::new(needle_pos - 2.0, 0.0), Size::new(4.0, bounds.height));
            frame.fill(&needle, color);
        }

        vec![frame.into_geometry()]
    }
}
