//! Modal prompt shown while the idler runs.

use std::time::Duration;

/// Description of the modal prompt. It always offers CANCEL, TRY AGAIN and
/// CONTINUE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub caption: String,
    pub text: String,
    /// Keep the prompt above every other window.
    pub topmost: bool,
}

impl Prompt {
    /// The idler's control prompt. `pause` is how long the idler waits after
    /// the user last touched the mouse or keyboard.
    pub fn idler(pause: Duration) -> Self {
        let text = format!(
            "The idler will randomly move your mouse.\n\n\
             Taking control will pause the idler; after {} seconds it will resume. \
             CONTINUE will pause the program until TRY AGAIN is selected. \
             CANCEL exits the program entirely.",
            pause.as_secs()
        );
        Self {
            caption: "Mouse Idler".to_string(),
            text,
            topmost: true,
        }
    }
}

/// The button a user picked, by native result id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Ok,
    Cancel,
    Abort,
    Retry,
    Ignore,
    Yes,
    No,
    Close,
    Help,
    TryAgain,
    Continue,
    Other(i32),
}

impl PromptChoice {
    pub fn from_id(id: i32) -> Self {
        match id {
            1 => Self::Ok,
            2 => Self::Cancel,
            3 => Self::Abort,
            4 => Self::Retry,
            5 => Self::Ignore,
            6 => Self::Yes,
            7 => Self::No,
            8 => Self::Close,
            9 => Self::Help,
            10 => Self::TryAgain,
            11 => Self::Continue,
            other => Self::Other(other),
        }
    }

    /// Whether the idler should show the prompt again after this answer.
    pub fn keeps_running(self) -> bool {
        matches!(self, Self::TryAgain | Self::Continue)
    }
}
