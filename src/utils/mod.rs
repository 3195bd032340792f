pub mod path;
pub mod slug;
pub mod watch;
