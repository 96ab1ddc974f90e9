//! Impls - 実装
//!
//! - **mailbox**: tokio mpsc ベースのコマンドキュー（crate 内部）
//! - **RecordingFatalHandler**: abort せずに致命的失敗を記録する（テスト用）

pub(crate) mod mailbox;
pub mod recording_fatal;

pub use self::recording_fatal::RecordingFatalHandler;
