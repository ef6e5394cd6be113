//! Building blocks of the text report: header banner, summary panel and
//! per-message cards. Each returns plain `String` lines already painted with
//! the active [`Theme`](crate::themes::Theme).

pub mod card;
pub mod header;
pub mod summary;
