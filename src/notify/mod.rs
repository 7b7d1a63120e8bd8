pub mod composer;
pub mod telegram;
pub mod traits;

pub use composer::NotificationComposer;
pub use telegram::TelegramNotifier;
pub use traits::Notifier;
