//! Cursor position wrappers.

use crate::backend::Point;
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, SetCursorPos};

/// Gets the cursor position in screen coordinates.
pub fn get_cursor_position() -> windows::core::Result<Point> {
    let mut point = POINT::default();
    unsafe { GetCursorPos(&mut point)? };
    Ok(Point::new(point.x, point.y))
}

/// Moves the cursor to `point` in screen coordinates.
pub fn set_cursor_position(point: Point) -> windows::core::Result<()> {
    unsafe { SetCursorPos(point.x, point.y) }
}
