mod session_button;
mod session_notice;
mod spinner;

pub use session_button::SessionButton;
pub use session_notice::SessionNotice;
pub use spinner::LoadingSpinner as Spinner;
