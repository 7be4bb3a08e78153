mod common;
mod projection;
