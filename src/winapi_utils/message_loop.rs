//! Windows message loop utilities.
//!
//! Low-level hooks only fire while the installing thread pumps messages, and
//! the only way to end that pump from outside is a `WM_QUIT` posted to the
//! thread by id.

use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW, TranslateMessage, MSG,
    PM_NOREMOVE, WM_QUIT,
};

/// Creates the calling thread's message queue and returns its id.
///
/// A thread has no queue until it first calls a message function; posting
/// to it before then fails. Calling this before reporting the id to other
/// threads closes that window.
pub fn prepare_message_queue() -> u32 {
    let mut msg = MSG::default();
    unsafe {
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
        GetCurrentThreadId()
    }
}

/// Runs the Windows message loop until a WM_QUIT message is received.
///
/// This function blocks the calling thread and pumps messages, which is
/// where low-level hook callbacks run.
pub fn run_message_loop() -> windows::core::Result<()> {
    let thread_id = unsafe { GetCurrentThreadId() };
    tracing::debug!(thread_id, "Message loop starting");

    let mut msg = MSG::default();

    unsafe {
        loop {
            // GetMessageW returns:
            // - Positive: message retrieved
            // - 0: WM_QUIT received
            // - -1: error occurred
            match GetMessageW(&mut msg, None, 0, 0).0 {
                0 => break,
                -1 => return Err(windows::core::Error::from_win32()),
                _ => {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }
    }

    tracing::debug!(thread_id, "Message loop exited");
    Ok(())
}

/// Posts a WM_QUIT message to the given thread's message loop.
///
/// This can be called from any thread.
pub fn post_quit_message(thread_id: u32) -> windows::core::Result<()> {
    unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0))? };
    tracing::debug!(thread_id, "Posted quit message");
    Ok(())
}
