//! Modal message box.

use crate::idler::prompt::Prompt;
use windows::core::PCWSTR;
use windows::Win32::UI::WindowsAndMessaging::{
    MessageBoxW, MB_CANCELTRYCONTINUE, MB_TOPMOST, MESSAGEBOX_STYLE,
};

/// Null-terminated UTF-16 copy of `text`.
fn to_wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

fn style(prompt: &Prompt) -> MESSAGEBOX_STYLE {
    let topmost = if prompt.topmost {
        MB_TOPMOST
    } else {
        MESSAGEBOX_STYLE(0)
    };
    MB_CANCELTRYCONTINUE | topmost
}

/// Shows a modal message box and returns the id of the pressed button.
///
/// Blocks the calling thread until the box is closed.
pub fn show_message_box(prompt: &Prompt) -> windows::core::Result<i32> {
    let text = to_wide(&prompt.text);
    let caption = to_wide(&prompt.caption);

    let result = unsafe {
        MessageBoxW(
            None,
            PCWSTR(text.as_ptr()),
            PCWSTR(caption.as_ptr()),
            style(prompt),
        )
    };
    if result.0 == 0 {
        return Err(windows::core::Error::from_win32());
    }
    Ok(result.0)
}
