use drawille::{Canvas, PixelColor};
use nalgebra::Vector2;

use crate::sim::robot::SimRobot;
use crate::sim::world::Room;

const PIXELS_PER_METER: f64 = 20.0;
const HEADING_LENGTH: f64 = 0.3;

/// Renders walls, trail and robot into a braille frame.
pub fn render(room: &Room, robot: &SimRobot) -> String {
    let min = room.min();
    let extent = room.max() - min;
    let width_pixels = (extent.x * PIXELS_PER_METER).ceil() as u32 + 1;
    let height_pixels = (extent.y * PIXELS_PER_METER).ceil() as u32 + 1;

    // saturating casts keep everything on the canvas
    let pixels_from_meter = |p: &Vector2<f64>| -> (u32, u32) {
        (
            ((p.x - min.x) * PIXELS_PER_METER) as u32,
            ((extent.y - (p.y - min.y)) * PIXELS_PER_METER) as u32,
        )
    };

    let mut canvas = Canvas::new(width_pixels, height_pixels);
    for segment in room.segments() {
        let (u0, v0) = pixels_from_meter(&segment.start);
        let (u1, v1) = pixels_from_meter(&segment.end);
        canvas.line(u0, v0, u1, v1);
    }

    for point in robot.trail() {
        let (u, v) = pixels_from_meter(point);
        canvas.set_colored(u, v, PixelColor::Green);
    }

    let position = robot.position();
    let nose = position + Vector2::new(robot.yaw().cos(), robot.yaw().sin()) * HEADING_LENGTH;
    let (u0, v0) = pixels_from_meter(&position);
    let (u1, v1) = pixels_from_meter(&nose);
    canvas.line_colored(u0, v0, u1, v1, PixelColor::Red);

    canvas.frame()
}
