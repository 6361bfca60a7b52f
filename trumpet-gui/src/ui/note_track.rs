//! # Note Track Widget
//!
//! The game field: notes travel from the right edge towards the hit-line on
//! the left, one lane per pitch of the configured range.

use iced::widget::canvas::{self, Geometry, Path, Stroke, Text};
use iced::widget::container;
use iced::{Color, Element, Pixels, Point, Rectangle, Renderer, Size, Theme, mouse};
use trumpet_core::game::{GameNote, Particle, SoundCue};
use trumpet_core::tuning;

/// Share of the width left of the hit-line.
const HIT_LINE_X: f32 = 0.08;
const NOTE_RADIUS: f32 = 14.0;
const LANE_MARGIN: f32 = 24.0;

pub struct NoteTrack {
    notes: Vec<GameNote>,
    particles: Vec<Particle>,
    range: (i32, i32),
    prefer_flats: bool,
    cue: Option<SoundCue>,
}

impl NoteTrack {
    pub fn new(
        notes: Vec<GameNote>,
        particles: Vec<Particle>,
        range: (i32, i32),
        prefer_flats: bool,
        cue: Option<SoundCue>,
    ) -> Self {
        Self {
            notes,
            particles,
            range,
            prefer_flats,
            cue,
        }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fill),
        )
        .into()
    }

    /// Lane of `pitch`, low notes at the bottom.
    fn lane(&self, pitch: i32) -> f32 {
        let (min, max) = self.range;
        if max <= min {
            return 0.5;
        }
        ((pitch - min) as f32 / (max - min) as f32).clamp(0.0, 1.0)
    }

    fn to_point(&self, position: f32, lane: f32, bounds: Rectangle) -> Point {
        let hit_x = bounds.width * HIT_LINE_X;
        let x = hit_x + position * (bounds.width - hit_x - NOTE_RADIUS);
        let usable = (bounds.height - 2.0 * LANE_MARGIN).max(1.0);
        let y = bounds.height - LANE_MARGIN - lane * usable;
        Point::new(x, y)
    }

    fn hit_line_color(&self) -> Color {
        match self.cue {
            Some(SoundCue::Hit) => Color::from_rgb8(0x34, 0xDB, 0x98),
            Some(SoundCue::LevelUp) => Color::from_rgb8(0xFF, 0xD7, 0x00),
            Some(SoundCue::Miss) | Some(SoundCue::GameOver) => Color::from_rgb8(0xFF, 0x33, 0x33),
            None => Color::WHITE,
        }
    }
}

impl<Message> canvas::Program<Message> for NoteTrack {
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

        if !bounds.width.is_finite() || !bounds.height.is_finite() {
            return vec![frame.into_geometry()];
        }

        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x20, 0x22, 0x28));

        // One faint guide per semitone of the range.
        let (min, max) = self.range;
        for pitch in min..=max {
            let y = self.to_point(0.0, self.lane(pitch), bounds).y;
            let guide = Path::line(Point::new(0.0, y), Point::new(bounds.width, y));
            frame.stroke(
                &guide,
                Stroke::default()
                    .with_width(1.0)
                    .with_color(Color::from_rgba8(0xFF, 0xFF, 0xFF, 0.05)),
            );
        }

        let hit_x = bounds.width * HIT_LINE_X;
        let hit_line = Path::line(Point::new(hit_x, 0.0), Point::new(hit_x, bounds.height));
        frame.stroke(
            &hit_line,
            Stroke::default()
                .with_width(3.0)
                .with_color(self.hit_line_color()),
        );

        for note in &self.notes {
            let center = self.to_point(note.position, self.lane(note.pitch), bounds);
            let color = if note.hit {
                Color::from_rgb8(0x34, 0xDB, 0x98)
            } else if note.missed {
                Color::from_rgba8(0xFF, 0x33, 0x33, 0.5)
            } else {
                Color::from_rgb8(0x34, 0x98, 0xDB)
            };
            frame.fill(&Path::circle(center, NOTE_RADIUS), color);
            frame.fill_text(Text {
                content: tuning::midi_note_name(note.pitch, self.prefer_flats),
                position: Point::new(center.x - NOTE_RADIUS + 2.0, center.y - 7.0),
                color: Color::WHITE,
                size: Pixels(12.0),
                ..Text::default()
            });
        }

        for particle in &self.particles {
            let center = self.to_point(particle.x, particle.y, bounds);
            let [r, g, b] = particle.color;
            let alpha = particle.life.clamp(0.0, 1.0);
            frame.fill(
                &Path::rectangle(
                    Point::new(center.x - particle.size / 2.0, center.y - particle.size / 2.0),
                    Size::new(particle.size, particle.size),
                ),
                Color::from_rgba(r, g, b, alpha),
            );
        }

        vec![frame.into_geometry()]
    }
}
