pub mod record;
pub mod card;
pub mod sink;
pub mod webhook;
pub mod layer;

pub mod init;
pub mod env;
